use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	response::{IntoResponse, Response},
};
use governor::{
	clock::QuantaInstant,
	middleware::{RateLimitingMiddleware, StateInformationMiddleware},
};
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::{KeyExtractor, PeerIpKeyExtractor},
	GovernorError,
};

pub type Limits = Arc<GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>>;

/// How often idle clients are dropped from the limiter.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Per-IP limit of `per_second` requests, allowing bursts of `burst`.
///
/// A spent request comes back every `1 / per_second` seconds. Returns `None`
/// if either number is zero.
pub fn per_ip(per_second: u32, burst: u32) -> Option<Limits> {
	if per_second == 0 {
		return None;
	}

	GovernorConfigBuilder::default()
		.period(Duration::from_secs(1) / per_second)
		.burst_size(burst)
		.use_headers()
		.error_handler(error_handler)
		.finish()
		.map(Arc::new)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	tracing::debug!(?error, "rate limited");

	crate::Error::RateLimited.into_response()
}

/// Forgets clients that have gone quiet, once every [`CLEANUP_INTERVAL`].
pub fn spawn_cleanup<T, M>(limits: &Arc<GovernorConfig<T, M>>)
where
	T: KeyExtractor,
	<T as KeyExtractor>::Key: Send + Sync + 'static,
	M: RateLimitingMiddleware<QuantaInstant> + Send + Sync + 'static,
{
	let limiter = limits.limiter().clone();

	tokio::spawn(async move {
		let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

		loop {
			interval.tick().await;
			limiter.retain_recent();
			tracing::debug!(clients = limiter.len(), "pruned rate limiter");
		}
	});
}
