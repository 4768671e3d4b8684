use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

use axum::body::Bytes;
use image::ImageError;
use uuid::Uuid;

/// URL prefix uploaded files are served under.
pub const URL_PREFIX: &str = "/media";

/// Largest accepted upload, in bytes.
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// An uploaded file that decoded as an image.
#[derive(Debug)]
pub struct Image {
	bytes: Bytes,
	extension: &'static str,
}

impl Image {
	/// Decodes the upload to make sure it really is an image.
	pub fn decode(bytes: Bytes) -> Result<Self, ImageError> {
		let format = image::guess_format(&bytes)?;
		image::load_from_memory_with_format(&bytes, format)?;

		Ok(Self {
			bytes,
			extension: format.extensions_str().first().copied().unwrap_or("bin"),
		})
	}
}

/// The directory post images are stored in.
#[derive(Clone, Debug)]
pub struct MediaRoot(Arc<PathBuf>);

impl MediaRoot {
	pub fn new(root: PathBuf) -> Self {
		Self(Arc::new(root))
	}

	pub fn path(&self) -> &Path {
		&self.0
	}

	/// Writes the image under `posts/` with a fresh name, returning the
	/// path relative to the media root.
	pub async fn save(&self, image: &Image) -> std::io::Result<String> {
		let name = format!("posts/{}.{}", Uuid::new_v4(), image.extension);
		let path = self.0.join(&name);

		if let Some(parent) = path.parent() {
			tokio::fs::create_dir_all(parent).await?;
		}

		tokio::fs::write(&path, &image.bytes).await?;
		tracing::debug!(%name, size = image.bytes.len(), "saved upload");

		Ok(name)
	}

	/// Removes a stored file. A file that is already gone is not an error.
	pub async fn remove(&self, name: &str) {
		if let Err(error) = tokio::fs::remove_file(self.0.join(name)).await {
			if error.kind() != std::io::ErrorKind::NotFound {
				tracing::warn!(%name, %error, "failed to remove upload");
			}
		}
	}
}
