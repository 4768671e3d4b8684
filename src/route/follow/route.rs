use axum::{
	extract::State,
	response::{Html, Response},
};

use crate::{
	extract::{Path, Query, Session},
	redirect,
	route::{
		auth::model::User,
		post::model::{Feed, Paginate},
	},
	template, Database, Error,
};

use super::model;

/// Posts by the authors the user follows.
pub async fn follow_index(
	State(database): State<Database>,
	session: Session,
	Query(paginate): Query<Paginate>,
) -> Result<Html<String>, Error> {
	let page = Feed::Following(session.user.id)
		.page(&database, &paginate)
		.await?;

	let mut context = template::context(Some(&session));
	context.insert("page_obj", &page);

	template::render("posts/follow.html", context)
}

pub async fn profile_follow(
	State(database): State<Database>,
	session: Session,
	Path(username): Path<String>,
) -> Result<Response, Error> {
	let author = User::find_by_username(&database, &username)
		.await?
		.ok_or(Error::NotFound)?;

	if model::follow(&database, session.user.id, author.id).await? {
		tracing::debug!(follower = %session.user.username, author = %author.username, "followed");
	}

	Ok(redirect::moved_permanently(&format!("/profile/{username}/")))
}

pub async fn profile_unfollow(
	State(database): State<Database>,
	session: Session,
	Path(username): Path<String>,
) -> Result<Response, Error> {
	let author = User::find_by_username(&database, &username)
		.await?
		.ok_or(Error::NotFound)?;

	if model::unfollow(&database, session.user.id, author.id).await? {
		tracing::debug!(follower = %session.user.username, author = %author.username, "unfollowed");
	}

	Ok(redirect::moved_permanently(&format!("/profile/{username}/")))
}
