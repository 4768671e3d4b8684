use axum::{
	extract::{FromRef, FromRequestParts},
	http::{request, HeaderMap},
};
use uuid::Uuid;

use crate::{error::Error, route::auth, session, Database};

/// Extracts the session and related user from the request.
///
/// Guests, and visitors whose cookie names no live session, are rejected
/// with [`Error::LoginRequired`], which redirects them to the login page
/// and back. Pages open to everyone take an `Option<Session>` instead.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: auth::model::User,
}

impl Session {
	/// Finds the session named by the request's cookie, if it is still live.
	pub async fn lookup(
		database: &Database,
		headers: &HeaderMap,
	) -> Result<Option<Self>, sqlx::Error> {
		let Some(session_id) =
			session::cookie_value(headers).and_then(|value| Uuid::parse_str(&value).ok())
		else {
			return Ok(None);
		};

		let user = sqlx::query_as::<_, auth::model::User>(
			r#"
				SELECT "user".* FROM "user"
				JOIN session ON session.user_id = "user".id
				WHERE session.id = $1
			"#,
		)
		.bind(session_id)
		.fetch_optional(database)
		.await?;

		if user.is_none() {
			tracing::debug!(%session_id, "stale session cookie");
		}

		Ok(user.map(|user| Self {
			user,
			id: session_id,
		}))
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let database = Database::from_ref(state);

		Self::lookup(&database, &parts.headers)
			.await?
			.ok_or_else(|| Error::LoginRequired(super::original_path(parts)))
	}
}
