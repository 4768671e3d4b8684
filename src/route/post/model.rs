pub use crate::route::model::{FormErrors, Page, Paginate};

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;
use validator::Validate;

use crate::{
	extract::{FormData, Upload},
	media::Image,
	route::model::validate_not_blank,
	Database,
};

/// Columns of [`PostView`], joined with the author and group.
const POST_VIEW: &str = r#"
	SELECT
		post.id, post.text, post.pub_date, post.image,
		post.author_id, "user".username AS author,
		post.group_id, "group".slug AS group_slug, "group".title AS group_title
	FROM post
	JOIN "user" ON "user".id = post.author_id
	LEFT JOIN "group" ON "group".id = post.group_id
"#;

/// A community posts can be published in.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Group {
	pub id: i64,
	pub title: String,
	/// Unique key used in the group's URL.
	pub slug: String,
	pub description: String,
}

impl fmt::Display for Group {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.title)
	}
}

/// A single post, as stored.
#[derive(Debug, sqlx::FromRow)]
pub struct Post {
	pub author_id: Uuid,
	pub group_id: Option<i64>,
	pub text: String,
	/// Path of the attached image, relative to the media root.
	pub image: Option<String>,
}

impl fmt::Display for Post {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.text)
	}
}

/// A post ready for display, with its author's name and group.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PostView {
	pub id: i64,
	pub text: String,
	pub pub_date: DateTime<Utc>,
	pub image: Option<String>,
	pub author_id: Uuid,
	/// The author's username.
	pub author: String,
	pub group_id: Option<i64>,
	pub group_slug: Option<String>,
	pub group_title: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CommentView {
	pub id: i64,
	pub text: String,
	pub created: DateTime<Utc>,
	/// The commenter's username.
	pub author: String,
}

/// The set of posts a feed page draws from.
#[derive(Debug, Clone, Copy)]
pub enum Feed {
	/// Every post.
	All,
	/// Posts published in a group.
	Group(i64),
	/// Posts written by one author.
	Author(Uuid),
	/// Posts by the authors a user follows.
	Following(Uuid),
}

impl Feed {
	fn filter(self, query: &mut QueryBuilder<'_, Sqlite>) {
		match self {
			Self::All => {}
			Self::Group(group_id) => {
				query.push(" WHERE post.group_id = ").push_bind(group_id);
			}
			Self::Author(author_id) => {
				query.push(" WHERE post.author_id = ").push_bind(author_id);
			}
			Self::Following(user_id) => {
				query
					.push(" WHERE post.author_id IN (SELECT author_id FROM follow WHERE user_id = ")
					.push_bind(user_id)
					.push(")");
			}
		}
	}

	/// Returns the requested page of this feed, newest first.
	pub async fn page(
		self,
		database: &Database,
		paginate: &Paginate,
	) -> Result<Page<PostView>, sqlx::Error> {
		let mut query = QueryBuilder::new("SELECT COUNT(*) FROM post");
		self.filter(&mut query);

		let count: i64 = query.build_query_scalar().fetch_one(database).await?;
		let window = paginate.window(count);

		let mut query = QueryBuilder::new(POST_VIEW);
		self.filter(&mut query);
		query
			.push(" ORDER BY post.pub_date DESC, post.id DESC LIMIT ")
			.push_bind(window.limit())
			.push(" OFFSET ")
			.push_bind(window.offset());

		let posts = query.build_query_as::<PostView>().fetch_all(database).await?;

		Ok(window.page(posts, count))
	}
}

pub async fn find_post(database: &Database, post_id: i64) -> Result<Option<Post>, sqlx::Error> {
	sqlx::query_as::<_, Post>("SELECT author_id, group_id, text, image FROM post WHERE id = $1")
		.bind(post_id)
		.fetch_optional(database)
		.await
}

pub async fn find_post_view(
	database: &Database,
	post_id: i64,
) -> Result<Option<PostView>, sqlx::Error> {
	sqlx::query_as::<_, PostView>(&format!("{POST_VIEW} WHERE post.id = $1"))
		.bind(post_id)
		.fetch_optional(database)
		.await
}

pub async fn find_group(database: &Database, slug: &str) -> Result<Option<Group>, sqlx::Error> {
	sqlx::query_as::<_, Group>(r#"SELECT * FROM "group" WHERE slug = $1"#)
		.bind(slug)
		.fetch_optional(database)
		.await
}

/// Comments on a post, oldest first.
pub async fn comments(database: &Database, post_id: i64) -> Result<Vec<CommentView>, sqlx::Error> {
	sqlx::query_as::<_, CommentView>(
		r#"
			SELECT comment.id, comment.text, comment.created, "user".username AS author
			FROM comment
			JOIN "user" ON "user".id = comment.author_id
			WHERE comment.post_id = $1
			ORDER BY comment.created, comment.id
		"#,
	)
	.bind(post_id)
	.fetch_all(database)
	.await
}

pub async fn post_count(database: &Database, author_id: Uuid) -> Result<i64, sqlx::Error> {
	sqlx::query_scalar("SELECT COUNT(*) FROM post WHERE author_id = $1")
		.bind(author_id)
		.fetch_one(database)
		.await
}

/// A group option of the post form.
#[derive(Debug, Serialize)]
pub struct GroupChoice {
	pub id: i64,
	pub title: String,
	pub selected: bool,
}

/// Every group, marking the one currently chosen in the form.
pub async fn group_choices(
	database: &Database,
	selected: &str,
) -> Result<Vec<GroupChoice>, sqlx::Error> {
	let groups = sqlx::query_as::<_, Group>(r#"SELECT * FROM "group" ORDER BY title"#)
		.fetch_all(database)
		.await?;

	Ok(groups
		.into_iter()
		.map(|group| GroupChoice {
			selected: group.id.to_string() == selected,
			id: group.id,
			title: group.title,
		})
		.collect())
}

async fn group_exists(database: &Database, group_id: i64) -> Result<bool, sqlx::Error> {
	let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "group" WHERE id = $1"#)
		.bind(group_id)
		.fetch_one(database)
		.await?;

	Ok(count > 0)
}

/// The create/edit post form, holding the submitted values so it can be
/// redisplayed along with its errors.
#[derive(Debug, Default, Serialize, Validate)]
pub struct PostForm {
	#[validate(custom(function = "validate_not_blank"))]
	pub text: String,
	/// The selected group id, or empty for none.
	pub group: String,
	#[serde(skip)]
	pub image: Option<Upload>,
	pub errors: FormErrors,
}

/// A post form that passed validation.
#[derive(Debug)]
pub struct PostInput {
	pub text: String,
	pub group_id: Option<i64>,
	pub image: Option<Image>,
}

impl PostForm {
	pub fn from_data(mut data: FormData) -> Self {
		Self {
			text: data.take("text"),
			group: data.take("group"),
			image: data.files.remove("image"),
			errors: FormErrors::default(),
		}
	}

	/// The form pre-filled with an existing post.
	pub fn from_post(post: &Post) -> Self {
		Self {
			text: post.text.clone(),
			group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
			..Self::default()
		}
	}

	/// Validates the submission, collecting problems into `errors`.
	///
	/// Returns `None` when the form has to be shown again.
	pub async fn clean(&mut self, database: &Database) -> Result<Option<PostInput>, sqlx::Error> {
		if let Err(errors) = self.validate() {
			self.errors = errors.into();
		}

		let group_id = match self.group.trim() {
			"" => None,
			group => match group.parse::<i64>() {
				Ok(group_id) if group_exists(database, group_id).await? => Some(group_id),
				_ => {
					self.errors.add("group", "Select a valid choice.");
					None
				}
			},
		};

		let image = match self.image.take() {
			None => None,
			Some(upload) => match Image::decode(upload.bytes) {
				Ok(image) => Some(image),
				Err(error) => {
					tracing::debug!(
						%error,
						file_name = %upload.file_name,
						content_type = ?upload.content_type,
						"rejected upload"
					);
					self.errors.add(
						"image",
						"Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
					);
					None
				}
			},
		};

		if !self.errors.is_empty() {
			return Ok(None);
		}

		Ok(Some(PostInput {
			text: self.text.trim().to_owned(),
			group_id,
			image,
		}))
	}
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CommentForm {
	#[serde(default)]
	#[validate(custom(function = "validate_not_blank"))]
	pub text: String,
}
