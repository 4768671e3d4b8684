use std::collections::HashMap;

use axum::{
	body::Bytes,
	extract::{FromRequest, Multipart, Request},
};

use crate::error::Error;

/// A file sent in a multipart form.
#[derive(Debug)]
pub struct Upload {
	pub file_name: String,
	pub content_type: Option<String>,
	pub bytes: Bytes,
}

/// A submitted HTML form, either url-encoded or multipart.
///
/// Text fields land in `fields`, files in `files`. A file input left empty
/// by the browser (no name, no content) is dropped. Validation is left to
/// the handler so it can redisplay the form with errors.
#[derive(Debug, Default)]
pub struct FormData {
	pub fields: HashMap<String, String>,
	pub files: HashMap<String, Upload>,
}

impl FormData {
	/// Takes a text field out of the form, defaulting to empty.
	pub fn take(&mut self, name: &str) -> String {
		self.fields.remove(name).unwrap_or_default()
	}
}

#[axum::async_trait]
impl<S> FromRequest<S> for FormData
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		if !super::is_multipart(&req) {
			let axum::Form(fields) =
				axum::Form::<HashMap<String, String>>::from_request(req, state).await?;

			return Ok(Self {
				fields,
				files: HashMap::new(),
			});
		}

		let mut multipart = Multipart::from_request(req, state).await?;
		let mut form = Self::default();

		while let Some(field) = multipart.next_field().await? {
			let Some(name) = field.name().map(str::to_owned) else {
				continue;
			};

			if let Some(file_name) = field.file_name().map(str::to_owned) {
				let content_type = field.content_type().map(str::to_owned);
				let bytes = field.bytes().await?;

				if file_name.is_empty() && bytes.is_empty() {
					continue;
				}

				form.files.insert(
					name,
					Upload {
						file_name,
						content_type,
						bytes,
					},
				);
			} else {
				form.fields.insert(name, field.text().await?);
			}
		}

		Ok(form)
	}
}
