use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{redirect, Database};

fn validate_username(username: &str) -> Result<(), ValidationError> {
	if username
		.chars()
		.any(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '@' | '+')))
	{
		let mut error = ValidationError::new("username_charset");
		error.message = Some("Letters, digits and @/./+/-/_ only.".into());

		return Err(error);
	}

	Ok(())
}

/// A single user.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct User {
	/// The unique identifier of the user.
	pub id: Uuid,
	/// The username that is displayed to the public and used in profile URLs.
	pub username: String,
	/// The hashed password, salted with `id`.
	#[serde(skip)]
	pub password: Vec<u8>,
	/// The creation time of the user.
	pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
	pub async fn find_by_username(
		database: &Database,
		username: &str,
	) -> Result<Option<Self>, sqlx::Error> {
		sqlx::query_as::<_, Self>(r#"SELECT * FROM "user" WHERE username = $1"#)
			.bind(username)
			.fetch_optional(database)
			.await
	}
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginInput {
	#[serde(default)]
	pub username: String,
	#[serde(default)]
	pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SignupInput {
	/// The username that is displayed to the public.
	#[serde(default)]
	#[validate(
		length(min = 3, max = 150, message = "Use between 3 and 150 characters."),
		custom(function = "validate_username")
	)]
	pub username: String,
	#[serde(default)]
	#[validate(length(min = 8, max = 128, message = "Use between 8 and 128 characters."))]
	pub password1: String,
	#[serde(default)]
	#[validate(must_match(other = "password1", message = "The two passwords do not match."))]
	pub password2: String,
}

/// Where to go once logged in.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
	pub next: Option<String>,
}

impl LoginQuery {
	/// The requested destination, unless it would leave the site.
	pub fn next(&self) -> Option<&str> {
		self.next.as_deref().filter(|next| redirect::is_local(next))
	}
}
