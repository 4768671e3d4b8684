use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::Level;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0} must be set")]
	Missing(&'static str),
	#[error("invalid {key} value: {message}")]
	Invalid { key: &'static str, message: String },
}

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub port: u16,
	/// Directory uploaded images are written to and served from.
	pub media_root: PathBuf,
	/// How long a rendered main feed page is served from the cache.
	pub feed_cache_ttl: Duration,
	pub log_level: Level,
	/// Requests a single client may make per second.
	pub rate_limit_per_second: u32,
	pub rate_limit_burst: u32,
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		Ok(Self {
			database_url: env::var("DATABASE_URL").map_err(|_| Error::Missing("DATABASE_URL"))?,
			port: try_load("PORT", 3000)?,
			media_root: try_load("MEDIA_ROOT", PathBuf::from("media"))?,
			feed_cache_ttl: Duration::from_secs(try_load("FEED_CACHE_TTL", 20)?),
			log_level: try_load("LOG_LEVEL", Level::INFO)?,
			rate_limit_per_second: try_load("RATE_LIMIT_PER_SECOND", 10)?,
			rate_limit_burst: try_load("RATE_LIMIT_BURST", 50)?,
		})
	}
}

fn try_load<T>(key: &'static str, default: T) -> Result<T, Error>
where
	T: FromStr,
	T::Err: Display,
{
	match env::var(key) {
		Ok(value) => value.parse().map_err(|e: T::Err| Error::Invalid {
			key,
			message: e.to_string(),
		}),
		Err(_) => Ok(default),
	}
}
