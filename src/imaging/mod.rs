//! Logo loading and rasterization.
//!
//! A store logo can be configured as a remote URL, an inline `data:` URI or
//! a local file. [`LogoLoader`] resolves any of these to a decoded image and
//! [`rasterize`] turns it into a printable raster.

pub mod rasterize;

use std::path::PathBuf;
use std::time::Duration;

use base64::Engine as _;
use image::DynamicImage;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::raster::RasterImage;

pub use rasterize::rasterize;

/// Query parameter appended to logo URLs to defeat intermediate caches.
const CACHE_BUST_PARAM: &str = "_cb";

/// Timeout for a single logo download.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a logo comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoSource {
    /// Image bytes already in memory (decoded from a `data:` URI).
    Inline(Vec<u8>),
    /// An `http` or `https` URL.
    Remote(String),
    /// A path on the local filesystem.
    File(PathBuf),
}

impl LogoSource {
    /// Classify a logo string from the store configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageDecode`] for a malformed `data:` URI.
    pub fn parse(source: &str) -> Result<Self> {
        let source = source.trim();

        if let Some(rest) = source.strip_prefix("data:") {
            let (meta, payload) = rest.split_once(',').ok_or_else(|| Error::ImageDecode {
                reason: "data URI has no payload".to_string(),
            })?;
            let bytes = if meta.ends_with(";base64") {
                base64::engine::general_purpose::STANDARD
                    .decode(payload.trim())
                    .map_err(|e| Error::ImageDecode {
                        reason: format!("invalid base64 in data URI: {}", e),
                    })?
            } else {
                payload.as_bytes().to_vec()
            };
            return Ok(Self::Inline(bytes));
        }

        let lower = source.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(Self::Remote(source.to_string()));
        }

        Ok(Self::File(PathBuf::from(source)))
    }
}

/// Append a cache-busting parameter to a URL.
pub fn cache_busted(url: &str, stamp: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", url, separator, CACHE_BUST_PARAM, stamp)
}

/// Decode image bytes in any format the `image` crate recognizes.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| Error::ImageDecode {
        reason: format!("failed to decode image: {}", e),
    })
}

/// Resolves logo sources to decoded images.
#[derive(Debug, Clone)]
pub struct LogoLoader {
    client: reqwest::Client,
}

impl Default for LogoLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl LogoLoader {
    /// Create a loader with its own HTTP client.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("thermal-printer-ble/", env!("CARGO_PKG_VERSION")))
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    /// Create a loader that shares an existing HTTP client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Load and decode a logo.
    ///
    /// Remote logos are first fetched with a cache-busting parameter; if that
    /// fails they are fetched again by their plain URL.
    pub async fn load(&self, source: &LogoSource) -> Result<DynamicImage> {
        match source {
            LogoSource::Inline(bytes) => decode(bytes),
            LogoSource::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| Error::ImageDecode {
                    reason: format!("failed to read {}: {}", path.display(), e),
                })?;
                decode(&bytes)
            }
            LogoSource::Remote(url) => {
                let busted = cache_busted(url, chrono::Utc::now().timestamp_millis());
                let bytes = match self.fetch(&busted).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("Cache-busted logo fetch failed ({}), retrying plain URL", e);
                        self.fetch(url).await?
                    }
                };
                decode(&bytes)
            }
        }
    }

    /// Load a logo and rasterize it at no more than `max_width` dots.
    pub async fn process(&self, source: &str, max_width: u32) -> Result<RasterImage> {
        let source = LogoSource::parse(source)?;
        let image = self.load(&source).await?;
        debug!(
            "Decoded logo {}x{}, rasterizing at max width {}",
            image.width(),
            image.height(),
            max_width
        );
        rasterize(&image, max_width)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::ImageDecode {
                reason: format!("failed to download {}: {}", url, e),
            })?;

        if !response.status().is_success() {
            return Err(Error::ImageDecode {
                reason: format!("failed to download {}: HTTP {}", url, response.status()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| Error::ImageDecode {
            reason: format!("failed to read image data: {}", e),
        })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_data_uri(width: u32, height: u32, rgba: [u8; 4]) -> String {
        let image = RgbaImage::from_pixel(width, height, Rgba(rgba));
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        )
    }

    #[test]
    fn test_parse_sources() {
        assert_eq!(
            LogoSource::parse("https://example.com/logo.png").unwrap(),
            LogoSource::Remote("https://example.com/logo.png".to_string())
        );
        assert_eq!(
            LogoSource::parse("/srv/logo.png").unwrap(),
            LogoSource::File(PathBuf::from("/srv/logo.png"))
        );
        assert_eq!(
            LogoSource::parse("data:image/png;base64,AAEC").unwrap(),
            LogoSource::Inline(vec![0, 1, 2])
        );
        assert!(LogoSource::parse("data:image/png;base64,@@@").is_err());
        assert!(LogoSource::parse("data:nothing").is_err());
    }

    #[test]
    fn test_cache_busted() {
        assert_eq!(cache_busted("http://a/logo.png", 7), "http://a/logo.png?_cb=7");
        assert_eq!(cache_busted("http://a/logo?v=1", 7), "http://a/logo?v=1&_cb=7");
    }

    #[tokio::test]
    async fn test_process_inline_png() {
        let loader = LogoLoader::new();
        let raster = loader
            .process(&png_data_uri(100, 20, [0, 0, 0, 255]), 64)
            .await
            .unwrap();
        assert_eq!(raster.width(), 64);
        assert_eq!(raster.height(), 13);
        assert!(raster.data().iter().all(|&b| b == 0xFF));
    }

    #[tokio::test]
    async fn test_undecodable_inline_is_image_error() {
        let loader = LogoLoader::new();
        let err = loader
            .process("data:image/png;base64,bm90IGFuIGltYWdl", 64)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ImageDecode { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_is_image_error() {
        let loader = LogoLoader::new();
        let err = loader
            .process("/definitely/not/here/logo.png", 64)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ImageDecode { .. }));
    }
}
