use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// Number of posts on every feed page.
pub const PAGE_SIZE: i64 = 10;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct Paginate {
	/// The page number to return (1-indexed).
	///
	/// Kept as a string so a malformed value falls back to the first page
	/// instead of failing the request.
	pub page: Option<String>,
}

impl Paginate {
	pub fn requested(&self) -> Option<i64> {
		self.page.as_deref().and_then(|page| page.trim().parse().ok())
	}

	/// Resolves the requested page against `count` items.
	///
	/// A missing or non-numeric page gives the first page; a number out of
	/// range gives the last one.
	pub fn window(&self, count: i64) -> Window {
		let num_pages = ((count + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
		let number = match self.requested() {
			None => 1,
			Some(page) if (1..=num_pages).contains(&page) => page,
			Some(_) => num_pages,
		};

		Window { number, num_pages }
	}
}

/// A resolved page position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
	pub number: i64,
	pub num_pages: i64,
}

impl Window {
	pub fn offset(&self) -> i64 {
		(self.number - 1) * PAGE_SIZE
	}

	pub fn limit(&self) -> i64 {
		PAGE_SIZE
	}

	pub fn page<T>(self, items: Vec<T>, count: i64) -> Page<T> {
		Page {
			items,
			count,
			number: self.number,
			num_pages: self.num_pages,
			has_previous: self.number > 1,
			has_next: self.number < self.num_pages,
		}
	}
}

/// One page of a feed, as handed to the templates.
#[derive(Debug, Serialize)]
pub struct Page<T> {
	pub items: Vec<T>,
	/// Total number of items across all pages.
	pub count: i64,
	pub number: i64,
	pub num_pages: i64,
	pub has_previous: bool,
	pub has_next: bool,
}

/// Field errors of a submitted form, keyed by field name.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
	pub fn add(&mut self, field: &str, message: impl Into<String>) {
		self.0
			.entry(field.to_owned())
			.or_default()
			.push(message.into());
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[cfg(test)]
	pub fn contains(&self, field: &str) -> bool {
		self.0.contains_key(field)
	}
}

impl From<ValidationErrors> for FormErrors {
	fn from(errors: ValidationErrors) -> Self {
		let mut form = Self::default();

		for (field, errors) in errors.field_errors() {
			for error in errors {
				let message = error
					.message
					.as_ref()
					.map_or_else(|| error.code.to_string(), ToString::to_string);

				form.add(&field.to_string(), message);
			}
		}

		form
	}
}

/// Rejects text that is empty once surrounding whitespace is removed.
pub fn validate_not_blank(text: &str) -> Result<(), ValidationError> {
	if text.trim().is_empty() {
		let mut error = ValidationError::new("blank");
		error.message = Some("This field is required.".into());

		return Err(error);
	}

	Ok(())
}
