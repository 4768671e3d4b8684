mod form;
mod session;

pub use form::{FormData, Upload};
pub use session::Session;

use axum::{
	extract::{FromRequestParts, Request},
	http::request,
};
use serde::de;

use crate::error::Error;

/// Extractor that deserializes a query string and validates it.
///
/// ```rust
/// async fn route(Query(params): Query<Params>) {
///   // ...
/// }
/// ```
pub struct Query<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Query<T>
where
	T: de::DeserializeOwned + validator::Validate,
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let result = axum::extract::Query::<T>::from_request_parts(parts, state)
			.await?
			.0;

		result.validate().map_err(Self::Rejection::Validation)?;
		Ok(Self(result))
	}
}

/// Extractor for path parameters.
///
/// A parameter that does not parse (say, `/posts/abc/` where an id is
/// expected) can never name an existing resource, so it is reported as
/// [`Error::NotFound`] rather than a bad request.
pub struct Path<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
	T: de::DeserializeOwned + Send,
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let result = axum::extract::Path::<T>::from_request_parts(parts, state)
			.await
			.map_err(|rejection| {
				tracing::debug!(%rejection, "unmatched path parameter");
				Error::NotFound
			})?
			.0;

		Ok(Self(result))
	}
}

/// The path and query the client asked for, before any nesting stripped it.
pub(crate) fn original_path(parts: &request::Parts) -> String {
	let uri = parts
		.extensions
		.get::<axum::extract::OriginalUri>()
		.map_or(&parts.uri, |original| &original.0);

	uri.path_and_query()
		.map_or_else(|| uri.path().to_owned(), ToString::to_string)
}

/// Whether a request body is `multipart/form-data`.
pub(crate) fn is_multipart(request: &Request) -> bool {
	request
		.headers()
		.get(axum::http::header::CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.is_some_and(|value| value.starts_with("multipart/form-data"))
}
