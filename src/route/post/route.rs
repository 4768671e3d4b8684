use axum::{
	extract::State,
	response::{Html, IntoResponse, Response},
	Form,
};
use chrono::Utc;
use validator::Validate;

use crate::{
	extract::{FormData, Path, Query, Session},
	media::MediaRoot,
	redirect,
	route::{auth::model::User, follow},
	template, AppState, Database, Error,
};

use super::model::{self, Feed, Paginate};

fn profile_url(username: &str) -> String {
	format!("/profile/{username}/")
}

fn detail_url(post_id: i64) -> String {
	format!("/posts/{post_id}/")
}

/// Main page: every post, newest first.
pub async fn index(
	State(database): State<Database>,
	session: Option<Session>,
	Query(paginate): Query<Paginate>,
) -> Result<Html<String>, Error> {
	let page = Feed::All.page(&database, &paginate).await?;

	let mut context = template::context(session.as_ref());
	context.insert("page_obj", &page);

	template::render("posts/index.html", context)
}

pub async fn group_list(
	State(database): State<Database>,
	session: Option<Session>,
	Path(slug): Path<String>,
	Query(paginate): Query<Paginate>,
) -> Result<Html<String>, Error> {
	let group = model::find_group(&database, &slug)
		.await?
		.ok_or(Error::NotFound)?;
	let page = Feed::Group(group.id).page(&database, &paginate).await?;

	let mut context = template::context(session.as_ref());
	context.insert("group", &group);
	context.insert("page_obj", &page);

	template::render("posts/group_list.html", context)
}

/// An author's posts, with a follow button for other signed-in users.
pub async fn profile(
	State(database): State<Database>,
	session: Option<Session>,
	Path(username): Path<String>,
	Query(paginate): Query<Paginate>,
) -> Result<Html<String>, Error> {
	let author = User::find_by_username(&database, &username)
		.await?
		.ok_or(Error::NotFound)?;
	let page = Feed::Author(author.id).page(&database, &paginate).await?;

	let can_follow = session.as_ref().is_some_and(|s| s.user.id != author.id);
	let following = match &session {
		Some(session) if can_follow => {
			follow::model::is_following(&database, session.user.id, author.id).await?
		}
		_ => false,
	};

	let mut context = template::context(session.as_ref());
	context.insert("author", &author);
	context.insert("page_obj", &page);
	context.insert("can_follow", &can_follow);
	context.insert("following", &following);

	template::render("posts/profile.html", context)
}

async fn render_detail(
	database: &Database,
	session: Option<&Session>,
	post_id: i64,
) -> Result<Html<String>, Error> {
	let post = model::find_post_view(database, post_id)
		.await?
		.ok_or(Error::NotFound)?;
	let comments = model::comments(database, post_id).await?;
	let post_count = model::post_count(database, post.author_id).await?;
	let is_owner = session.is_some_and(|s| s.user.id == post.author_id);

	let mut context = template::context(session);
	context.insert("post", &post);
	context.insert("comments", &comments);
	context.insert("post_count", &post_count);
	context.insert("is_owner", &is_owner);

	template::render("posts/post_detail.html", context)
}

pub async fn post_detail(
	State(database): State<Database>,
	session: Option<Session>,
	Path(post_id): Path<i64>,
) -> Result<Html<String>, Error> {
	render_detail(&database, session.as_ref(), post_id).await
}

async fn render_form(
	database: &Database,
	session: &Session,
	form: &model::PostForm,
	post_id: Option<i64>,
) -> Result<Response, Error> {
	let groups = model::group_choices(database, &form.group).await?;

	let mut context = template::context(Some(session));
	context.insert("form", form);
	context.insert("groups", &groups);
	context.insert("is_edit", &post_id.is_some());
	context.insert("post_id", &post_id);

	Ok(template::render("posts/create_post.html", context)?.into_response())
}

pub async fn create_post_form(
	State(database): State<Database>,
	session: Session,
) -> Result<Response, Error> {
	render_form(&database, &session, &model::PostForm::default(), None).await
}

/// Publishes a new post and sends the author to their profile.
pub async fn create_post(
	State(state): State<AppState>,
	session: Session,
	data: FormData,
) -> Result<Response, Error> {
	let mut form = model::PostForm::from_data(data);
	let Some(input) = form.clean(&state.database).await? else {
		return render_form(&state.database, &session, &form, None).await;
	};

	let image = match &input.image {
		Some(image) => Some(state.media.save(image).await?),
		None => None,
	};

	let inserted = sqlx::query_scalar::<_, i64>(
		r#"
			INSERT INTO post (author_id, group_id, text, image, pub_date)
			VALUES ($1, $2, $3, $4, $5)
			RETURNING id
		"#,
	)
	.bind(session.user.id)
	.bind(input.group_id)
	.bind(&input.text)
	.bind(&image)
	.bind(Utc::now())
	.fetch_one(&state.database)
	.await;

	let post_id = discard_on_error(&state.media, image.as_deref(), inserted).await?;

	tracing::info!(post_id, author = %session.user.username, "post created");

	Ok(redirect::found(&profile_url(&session.user.username)))
}

/// Removes a freshly saved upload when the write that would have
/// referenced it failed.
async fn discard_on_error<T>(
	media: &MediaRoot,
	image: Option<&str>,
	result: Result<T, sqlx::Error>,
) -> Result<T, Error> {
	match result {
		Ok(value) => Ok(value),
		Err(error) => {
			if let Some(image) = image {
				media.remove(image).await;
			}

			Err(match error {
				sqlx::Error::RowNotFound => Error::NotFound,
				error => error.into(),
			})
		}
	}
}

/// Loads a post for its author. Anyone else is sent back to the post.
async fn owned_post(
	database: &Database,
	session: &Session,
	post_id: i64,
) -> Result<Result<model::Post, Response>, Error> {
	let post = model::find_post(database, post_id)
		.await?
		.ok_or(Error::NotFound)?;

	if post.author_id != session.user.id {
		return Ok(Err(redirect::found(&detail_url(post_id))));
	}

	Ok(Ok(post))
}

pub async fn edit_post_form(
	State(database): State<Database>,
	session: Session,
	Path(post_id): Path<i64>,
) -> Result<Response, Error> {
	let post = match owned_post(&database, &session, post_id).await? {
		Ok(post) => post,
		Err(response) => return Ok(response),
	};

	render_form(
		&database,
		&session,
		&model::PostForm::from_post(&post),
		Some(post_id),
	)
	.await
}

/// Saves changes to a post. A new image replaces the old one; submitting
/// none keeps it.
pub async fn edit_post(
	State(state): State<AppState>,
	session: Session,
	Path(post_id): Path<i64>,
	data: FormData,
) -> Result<Response, Error> {
	let post = match owned_post(&state.database, &session, post_id).await? {
		Ok(post) => post,
		Err(response) => return Ok(response),
	};

	let mut form = model::PostForm::from_data(data);
	let Some(input) = form.clean(&state.database).await? else {
		return render_form(&state.database, &session, &form, Some(post_id)).await;
	};

	let image = match &input.image {
		Some(image) => Some(state.media.save(image).await?),
		None => None,
	};

	let updated = sqlx::query(
		r#"
			UPDATE post
			SET text = $1, group_id = $2, image = COALESCE($3, image)
			WHERE id = $4 AND author_id = $5
		"#,
	)
	.bind(&input.text)
	.bind(input.group_id)
	.bind(&image)
	.bind(post_id)
	.bind(session.user.id)
	.execute(&state.database)
	.await
	.and_then(|result| match result.rows_affected() {
		0 => Err(sqlx::Error::RowNotFound),
		_ => Ok(result),
	});

	discard_on_error(&state.media, image.as_deref(), updated).await?;

	if let (Some(_), Some(old)) = (&image, &post.image) {
		state.media.remove(old).await;
	}

	tracing::info!(post_id, "post edited");

	Ok(redirect::found(&detail_url(post_id)))
}

pub async fn delete_post(
	State(state): State<AppState>,
	session: Session,
	Path(post_id): Path<i64>,
) -> Result<Response, Error> {
	let post = match owned_post(&state.database, &session, post_id).await? {
		Ok(post) => post,
		Err(response) => return Ok(response),
	};

	sqlx::query("DELETE FROM post WHERE id = $1 AND author_id = $2")
		.bind(post_id)
		.bind(session.user.id)
		.execute(&state.database)
		.await?;

	if let Some(image) = &post.image {
		state.media.remove(image).await;
	}

	tracing::info!(post_id, "post deleted");

	Ok(redirect::found(&profile_url(&session.user.username)))
}

/// The comment address shows the post itself to signed-in users.
pub async fn comment_form(
	State(database): State<Database>,
	session: Session,
	Path(post_id): Path<i64>,
) -> Result<Html<String>, Error> {
	render_detail(&database, Some(&session), post_id).await
}

/// Adds a comment and returns to the post. Blank comments are dropped.
pub async fn add_comment(
	State(database): State<Database>,
	session: Session,
	Path(post_id): Path<i64>,
	Form(input): Form<model::CommentForm>,
) -> Result<Response, Error> {
	model::find_post(&database, post_id)
		.await?
		.ok_or(Error::NotFound)?;

	if input.validate().is_ok() {
		sqlx::query(
			"INSERT INTO comment (post_id, author_id, text, created) VALUES ($1, $2, $3, $4)",
		)
		.bind(post_id)
		.bind(session.user.id)
		.bind(input.text.trim())
		.bind(Utc::now())
		.execute(&database)
		.await?;
	}

	Ok(redirect::found(&detail_url(post_id)))
}
