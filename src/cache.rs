use std::time::Duration;

use axum::{
	body::{Body, Bytes},
	extract::{Request, State},
	http::{Method, StatusCode},
	middleware::Next,
	response::{Html, IntoResponse, Response},
};
use moka::future::Cache;

use crate::session;

const MAX_ENTRIES: u64 = 10_000;

/// Rendered pages keyed by address, expiring after a fixed time to live.
///
/// Writes to the database do not touch this cache: a cached page keeps being
/// served until it expires or [`PageCache::clear`] is called.
#[derive(Clone)]
pub struct PageCache {
	pages: Cache<String, Bytes>,
}

impl PageCache {
	pub fn new(ttl: Duration) -> Self {
		tracing::info!(?ttl, "initialized page cache");

		Self {
			pages: Cache::builder()
				.max_capacity(MAX_ENTRIES)
				.time_to_live(ttl)
				.build(),
		}
	}

	pub async fn get(&self, key: &str) -> Option<Bytes> {
		self.pages.get(key).await
	}

	pub async fn insert(&self, key: String, page: Bytes) {
		self.pages.insert(key, page).await;
	}

	/// Drops every cached page; the next request renders fresh.
	#[cfg(test)]
	pub fn clear(&self) {
		self.pages.invalidate_all();
	}
}

/// Cache key for a request: its address plus the session cookie, so a page
/// rendered for one visitor is never handed to another.
fn key(request: &Request) -> String {
	let address = request
		.uri()
		.path_and_query()
		.map_or_else(|| request.uri().path(), |path| path.as_str());
	let session = session::cookie_value(request.headers()).unwrap_or_default();

	format!("{address}#{session}")
}

/// Middleware serving `GET` requests from the page cache.
///
/// Only `200 OK` responses are stored.
pub async fn cache_page(State(cache): State<PageCache>, request: Request, next: Next) -> Response {
	if request.method() != Method::GET {
		return next.run(request).await;
	}

	let key = key(&request);

	if let Some(page) = cache.get(&key).await {
		tracing::debug!(%key, "page cache hit");
		return Html(page).into_response();
	}

	let response = next.run(request).await;

	if response.status() != StatusCode::OK {
		return response;
	}

	let (parts, body) = response.into_parts();
	let page = match axum::body::to_bytes(body, usize::MAX).await {
		Ok(page) => page,
		Err(error) => {
			tracing::error!(%error, "failed to buffer page for caching");
			return StatusCode::INTERNAL_SERVER_ERROR.into_response();
		}
	};

	cache.insert(key, page.clone()).await;

	Response::from_parts(parts, Body::from(page))
}
