use uuid::Uuid;

use crate::Database;

pub async fn is_following(
	database: &Database,
	user_id: Uuid,
	author_id: Uuid,
) -> Result<bool, sqlx::Error> {
	let count: i64 =
		sqlx::query_scalar("SELECT COUNT(*) FROM follow WHERE user_id = $1 AND author_id = $2")
			.bind(user_id)
			.bind(author_id)
			.fetch_one(database)
			.await?;

	Ok(count > 0)
}

/// Subscribes `user_id` to `author_id`.
///
/// Following twice, or following yourself, changes nothing. Returns whether
/// a subscription was added.
pub async fn follow(
	database: &Database,
	user_id: Uuid,
	author_id: Uuid,
) -> Result<bool, sqlx::Error> {
	if user_id == author_id {
		return Ok(false);
	}

	let result = sqlx::query("INSERT OR IGNORE INTO follow (user_id, author_id) VALUES ($1, $2)")
		.bind(user_id)
		.bind(author_id)
		.execute(database)
		.await?;

	Ok(result.rows_affected() > 0)
}

/// Removes a subscription, if there is one.
pub async fn unfollow(
	database: &Database,
	user_id: Uuid,
	author_id: Uuid,
) -> Result<bool, sqlx::Error> {
	let result = sqlx::query("DELETE FROM follow WHERE user_id = $1 AND author_id = $2")
		.bind(user_id)
		.bind(author_id)
		.execute(database)
		.await?;

	Ok(result.rows_affected() > 0)
}
