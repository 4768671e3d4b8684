use argon2::Argon2;
use axum::{
	extract::{Query, State},
	http::header,
	response::{IntoResponse, Response},
	Form,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
	extract::Session,
	redirect,
	route::model::FormErrors,
	session, template, AppState, Database, Error as AppError,
};

use super::{model, Error};

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the user's id as a salt.
/// Since this is only used for logging in and creating a new password,
/// the scope of this function can remain in here with no issues.
fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Opens a new session for `user_id`, returning the cookie that carries it.
async fn start_session<'c, E>(executor: E, user_id: Uuid) -> Result<String, sqlx::Error>
where
	E: sqlx::Executor<'c, Database = sqlx::Sqlite>,
{
	let session_id = Uuid::new_v4();

	sqlx::query("INSERT INTO session (id, user_id) VALUES ($1, $2)")
		.bind(session_id)
		.bind(user_id)
		.execute(executor)
		.await?;

	Ok(session::create_cookie(session_id).to_string())
}

fn render_signup(username: &str, errors: &FormErrors) -> Result<Response, AppError> {
	let mut context = template::context(None);
	context.insert("username", username);
	context.insert("errors", errors);

	Ok(template::render("users/signup.html", context)?.into_response())
}

fn render_login(
	username: &str,
	next: Option<&str>,
	errors: &FormErrors,
) -> Result<Response, AppError> {
	let mut context = template::context(None);
	context.insert("username", username);
	context.insert("next", &next);
	context.insert("errors", errors);

	Ok(template::render("users/login.html", context)?.into_response())
}

/// Sign up page. Signed-in users have no use for it and go home.
pub async fn signup_form(session: Option<Session>) -> Result<Response, AppError> {
	if session.is_some() {
		return Ok(redirect::found("/"));
	}

	render_signup("", &FormErrors::default())
}

/// Registers a new account and signs it in.
pub async fn signup(
	State(state): State<AppState>,
	Form(input): Form<model::SignupInput>,
) -> Result<Response, AppError> {
	if let Err(errors) = input.validate() {
		return render_signup(&input.username, &errors.into());
	}

	let user_id = Uuid::new_v4();
	let hashed = hash_password(&state.hasher, &input.password1, &user_id).map_err(Error::Argon)?;

	let mut tx = state.database.begin().await?;

	let inserted = sqlx::query(r#"INSERT INTO "user" (id, username, password) VALUES ($1, $2, $3)"#)
		.bind(user_id)
		.bind(&input.username)
		.bind(&hashed[..])
		.execute(&mut *tx)
		.await;

	match inserted {
		Err(sqlx::Error::Database(ref error)) if error.is_unique_violation() => {
			let mut errors = FormErrors::default();
			errors.add("username", Error::UsernameTaken.to_string());

			return render_signup(&input.username, &errors);
		}
		inserted => inserted?,
	};

	let cookie = start_session(&mut *tx, user_id).await?;

	tx.commit().await?;

	tracing::info!(username = %input.username, "user signed up");

	Ok(([(header::SET_COOKIE, cookie)], redirect::found("/")).into_response())
}

/// Login page.
pub async fn login_form(Query(query): Query<model::LoginQuery>) -> Result<Response, AppError> {
	render_login("", query.next(), &FormErrors::default())
}

/// Checks the credentials and opens a session, then sends the user on to
/// `next` or the main page.
pub async fn login(
	State(state): State<AppState>,
	Query(query): Query<model::LoginQuery>,
	Form(input): Form<model::LoginInput>,
) -> Result<Response, AppError> {
	let user = model::User::find_by_username(&state.database, &input.username).await?;

	let verified = match &user {
		Some(user) => {
			user.password
				== hash_password(&state.hasher, &input.password, &user.id).map_err(Error::Argon)?
		}
		None => false,
	};

	let Some(user) = user.filter(|_| verified) else {
		let mut errors = FormErrors::default();
		errors.add("__all__", Error::InvalidUsernameOrPassword.to_string());

		return render_login(&input.username, query.next(), &errors);
	};

	let cookie = start_session(&state.database, user.id).await?;

	tracing::debug!(username = %user.username, "user logged in");

	let next = query.next().unwrap_or("/");

	Ok(([(header::SET_COOKIE, cookie)], redirect::found(next)).into_response())
}

/// Ends the current session, if there is one.
pub async fn logout(
	State(database): State<Database>,
	session: Option<Session>,
) -> Result<Response, AppError> {
	if let Some(session) = session {
		sqlx::query("DELETE FROM session WHERE id = $1")
			.bind(session.id)
			.execute(&database)
			.await?;
	}

	let page = template::render("users/logged_out.html", template::context(None))?;

	Ok((
		[(header::SET_COOKIE, session::clear_cookie().to_string())],
		page,
	)
		.into_response())
}
