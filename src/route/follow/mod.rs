use axum::{routing::get, Router};

use crate::AppState;

pub mod model;
pub mod route;

pub fn routes() -> Router<AppState> {
	use route::*;

	Router::new()
		.route("/follow/", get(follow_index))
		.route("/profile/:username/follow/", get(profile_follow))
		.route("/profile/:username/unfollow/", get(profile_unfollow))
}
