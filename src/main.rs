#![warn(clippy::pedantic)]

mod cache;
mod config;
mod error;
mod extract;
mod media;
mod ratelimit;
mod redirect;
mod route;
mod session;
mod template;
mod trace;

use std::{net::SocketAddr, str::FromStr};

use argon2::Argon2;
use axum::Router;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower_governor::GovernorLayer;

pub use error::Error;

pub type Database = sqlx::Pool<sqlx::Sqlite>;
pub type AppState = State;

/// The shared application state.
///
/// Every handler receives a clone of this, so each field must be cheap to clone.
/// Handlers that only need one dependency extract it directly through [`axum::extract::FromRef`].
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub feed_cache: cache::PageCache,
	pub media: media::MediaRoot,
}

/// Builds the application router over the given state.
pub fn app(state: State) -> Router {
	route::routes(state)
}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	let config = config::Config::from_env().expect("invalid configuration");

	trace::init_tracing_subscriber(config.log_level);
	once_cell::sync::Lazy::force(&template::TEMPLATES);

	let options = SqliteConnectOptions::from_str(&config.database_url)
		.expect("DATABASE_URL must be a sqlite url")
		.create_if_missing(true);

	let database = SqlitePoolOptions::new()
		.connect_with(options)
		.await
		.expect("failed to connect to database");

	sqlx::migrate!()
		.run(&database)
		.await
		.expect("failed to run migrations");

	let state = State {
		database,
		hasher: Argon2::default(),
		feed_cache: cache::PageCache::new(config.feed_cache_ttl),
		media: media::MediaRoot::new(config.media_root.clone()),
	};

	let limits = ratelimit::per_ip(config.rate_limit_per_second, config.rate_limit_burst)
		.expect("rate limits must be non-zero");
	ratelimit::spawn_cleanup(&limits);

	let app = app(state).layer(GovernorLayer { config: limits });

	let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port))
		.await
		.expect("failed to bind to port");

	tracing::info!(
		port = config.port,
		media_root = %config.media_root.display(),
		"listening"
	);

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.await
	.expect("server error");
}
