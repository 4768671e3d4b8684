use axum::{extract::DefaultBodyLimit, middleware, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{error, media, AppState, Error};

pub mod about;
pub mod auth;
pub mod follow;
pub mod model;
pub mod post;

pub fn routes(state: AppState) -> Router {
	Router::new()
		.merge(post::routes(&state))
		.merge(follow::routes())
		.nest("/auth", auth::routes())
		.nest("/about", about::routes())
		.nest_service(media::URL_PREFIX, ServeDir::new(state.media.path()))
		.fallback(not_found)
		.layer(middleware::from_fn_with_state(
			state.database.clone(),
			error::personalize_error_page,
		))
		.layer(DefaultBodyLimit::max(media::MAX_UPLOAD_SIZE))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

async fn not_found() -> Error {
	Error::NotFound
}
