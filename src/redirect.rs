use axum::{
	http::{header, StatusCode},
	response::{IntoResponse, Response},
};

pub const LOGIN_URL: &str = "/auth/login/";

/// A `302 Found` redirect, used after every successful form submission.
pub fn found(location: &str) -> Response {
	(StatusCode::FOUND, [(header::LOCATION, location.to_owned())]).into_response()
}

/// A `301 Moved Permanently` redirect.
///
/// Follow and unfollow answer with this, so the response is marked
/// `no-store` to keep browsers from replaying it without hitting the server.
pub fn moved_permanently(location: &str) -> Response {
	(
		StatusCode::MOVED_PERMANENTLY,
		[
			(header::LOCATION, location.to_owned()),
			(header::CACHE_CONTROL, "no-store".to_owned()),
		],
	)
		.into_response()
}

/// Sends a guest to the login page, remembering where they were headed.
pub fn to_login(next: &str) -> Response {
	found(&format!("{LOGIN_URL}?next={}", urlencoding::encode(next)))
}

/// Whether `next` is safe to redirect to after logging in.
///
/// Only local absolute paths are accepted; `//host` is protocol-relative
/// and would leave the site.
pub fn is_local(next: &str) -> bool {
	next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}
