//! Base64 data-URI images for recipes and avatars.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use foodgram_common::{AppError, AppResult, StorageBackend, generate_storage_key};

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG format
    Jpeg,
    /// PNG format
    Png,
    /// WebP format
    WebP,
    /// GIF format
    Gif,
}

impl ImageFormat {
    /// Get MIME type for this format.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Get file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }
}

/// A decoded upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

/// Decode `data:image/<type>;base64,<payload>`.
///
/// Failures are reported as a validation error on `field`.
pub fn decode_data_uri(field: &str, value: &str) -> AppResult<DecodedImage> {
    let invalid = |message: &str| AppError::field(field, message);

    let rest = value
        .strip_prefix("data:")
        .ok_or_else(|| invalid("Expected a base64 data URI."))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| invalid("Expected a base64 data URI."))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| invalid("Only base64-encoded images are accepted."))?;
    let format = ImageFormat::from_mime_type(&mime.to_ascii_lowercase())
        .ok_or_else(|| invalid("Unsupported image type."))?;

    let data = STANDARD
        .decode(payload.trim())
        .map_err(|_| invalid("Invalid base64 payload."))?;
    if data.is_empty() {
        return Err(invalid("The submitted image is empty."));
    }

    Ok(DecodedImage { format, data })
}

/// Stores decoded images through a [`StorageBackend`].
#[derive(Clone)]
pub struct ImageService {
    storage: Arc<dyn StorageBackend>,
}

impl ImageService {
    /// Create a new image service.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Decode a data URI and store it under `directory`. Returns the public URL.
    pub async fn store(&self, directory: &str, field: &str, value: &str) -> AppResult<String> {
        let image = decode_data_uri(field, value)?;
        self.store_decoded(directory, &image).await
    }

    /// Store an already decoded image under `directory`. Returns the public URL.
    pub async fn store_decoded(&self, directory: &str, image: &DecodedImage) -> AppResult<String> {
        let key = generate_storage_key(directory, image.format.extension());
        let stored = self
            .storage
            .upload(&key, &image.data, image.format.mime_type())
            .await?;
        Ok(stored.url)
    }

    /// Remove a previously stored image by its public URL.
    ///
    /// URLs that do not belong to the backend are left alone.
    pub async fn remove(&self, url: &str) {
        let Some(key) = self.storage.key_from_url(url) else {
            return;
        };
        if let Err(e) = self.storage.delete(key).await {
            tracing::warn!(error = %e, key = %key, "Failed to remove stored image");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use foodgram_common::LocalStorage;

    /// 1x1 transparent GIF.
    pub(crate) const GIF_URI: &str =
        "data:image/gif;base64,R0lGODlhAQABAIAAAP///wAAACH5BAEAAAAALAAAAAABAAEAAAICRAEAOw==";

    pub(crate) fn temp_images() -> ImageService {
        let dir = std::env::temp_dir().join(format!("foodgram-images-{}", std::process::id()));
        ImageService::new(Arc::new(LocalStorage::new(dir, "/media")))
    }

    #[test]
    fn test_decode_valid_uri() {
        let image = decode_data_uri("image", GIF_URI).unwrap();
        assert_eq!(image.format, ImageFormat::Gif);
        assert!(image.data.starts_with(b"GIF89a"));
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        for value in [
            "https://example.com/a.png",
            "data:image/png,plain",
            "data:text/plain;base64,aGVsbG8=",
            "data:image/png;base64,@@@",
            "data:image/png;base64,",
        ] {
            let err = decode_data_uri("image", value).unwrap_err();
            match err {
                AppError::Validation(fields) => assert!(fields.get("image").is_some(), "{value}"),
                other => panic!("unexpected error for {value}: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_store_and_remove() {
        let images = temp_images();
        let url = images.store("recipes", "image", GIF_URI).await.unwrap();
        assert!(url.starts_with("/media/recipes/"));
        assert!(url.ends_with(".gif"));

        images.remove(&url).await;
        images.remove("https://elsewhere.example/x.gif").await;
    }
}
