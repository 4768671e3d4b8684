use axum::{
	extract::{
		multipart::{MultipartError, MultipartRejection},
		rejection, Request, State,
	},
	http::StatusCode,
	middleware::Next,
	response::{IntoResponse, Response},
};

use crate::{extract::Session, redirect, route::auth, session, template, Database};

/// Error type for the application.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("resource not found")]
	NotFound,
	#[error("login required to access {0}")]
	LoginRequired(String),
	#[error("too many requests")]
	RateLimited,
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("form error: {0}")]
	Form(#[from] rejection::FormRejection),
	#[error("query error: {0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("multipart error: {0}")]
	Multipart(#[from] MultipartRejection),
	#[error("multipart field error: {0}")]
	MultipartField(#[from] MultipartError),
	#[error("auth error: {0}")]
	Auth(#[from] auth::Error),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("template error: {0}")]
	Template(#[from] tera::Error),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::NotFound => StatusCode::NOT_FOUND,
			Self::LoginRequired(..) => StatusCode::FOUND,
			Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
			Self::Validation(..)
			| Self::Form(..)
			| Self::Query(..)
			| Self::Multipart(..)
			| Self::MultipartField(..) => StatusCode::BAD_REQUEST,
			Self::Auth(error) => error.status(),
			Self::Database(..) | Self::Template(..) | Self::Io(..) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}
}

/// Marks a response as a rendered error page, so it can be rendered again
/// for the signed-in user by [`personalize_error_page`].
#[derive(Debug, Clone, Copy)]
pub struct ErrorPage(pub &'static str);

/// Renders an error page, falling back to the status text if the template
/// itself cannot be rendered.
fn error_page(status: StatusCode, name: &'static str, session: Option<&Session>) -> Response {
	match template::render(name, template::context(session)) {
		Ok(html) => {
			let mut response = (status, html).into_response();

			response.extensions_mut().insert(ErrorPage(name));
			response
		}
		Err(error) => {
			tracing::error!(%error, "failed to render error page");
			status.into_response()
		}
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = self.status();

		match self {
			Self::NotFound => error_page(status, "core/404.html", None),
			Self::LoginRequired(next) => redirect::to_login(&next),
			Self::RateLimited => (status, "Too many requests, slow down.").into_response(),
			error if status.is_client_error() => {
				tracing::debug!(%error, "rejected request");
				(status, error.to_string()).into_response()
			}
			error => {
				tracing::error!(%error, "request failed");
				error_page(status, "core/500.html", None)
			}
		}
	}
}

/// Middleware that renders error pages again with the visitor's session,
/// since errors are turned into responses without access to it.
pub async fn personalize_error_page(
	State(database): State<Database>,
	request: Request,
	next: Next,
) -> Response {
	let headers = session::cookie_value(request.headers()).map(|_| request.headers().clone());
	let response = next.run(request).await;

	let Some(headers) = headers else {
		return response;
	};
	let Some(&ErrorPage(name)) = response.extensions().get::<ErrorPage>() else {
		return response;
	};

	match Session::lookup(&database, &headers).await {
		Ok(Some(session)) => error_page(response.status(), name, Some(&session)),
		Ok(None) => response,
		Err(error) => {
			tracing::error!(%error, "failed to load session for error page");
			response
		}
	}
}
