//! Pixel acquisition for scan targets.
//!
//! Images are loaded directly first; when that is refused (cross-origin),
//! the raw bytes are fetched through the privileged loader and decoded
//! locally. Canvases are read directly, falling back to their own data URL
//! export when tainted. Only one fallback layer is tried.

use crate::error::AcquireError;
use crate::models::{CanvasTarget, ScanTarget};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::RgbaImage;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Host primitives for loading image resources
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Load an image the way the page would, subject to cross-origin rules
    async fn load_image(&self, url: &str) -> Result<RgbaImage, AcquireError>;

    /// Privileged GET returning the raw response body
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, AcquireError>;
}

/// Decode an encoded image (PNG, JPEG, GIF, ...) into RGBA pixels
pub fn decode_bytes(bytes: &[u8]) -> Result<RgbaImage, AcquireError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Decode a base64 `data:` URL into RGBA pixels
pub fn decode_data_url(url: &str) -> Result<RgbaImage, AcquireError> {
    let rest = url.strip_prefix("data:").ok_or(AcquireError::DataUrl)?;
    let (meta, payload) = rest.split_once(',').ok_or(AcquireError::DataUrl)?;
    if !meta.ends_with(";base64") {
        return Err(AcquireError::DataUrl);
    }
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| AcquireError::DataUrl)?;
    decode_bytes(&bytes)
}

/// Obtains pixels for targets through a [`ResourceLoader`]
#[derive(Clone)]
pub struct Acquirer {
    loader: Arc<dyn ResourceLoader>,
}

impl Acquirer {
    /// Create an acquirer backed by `loader`
    pub fn new(loader: Arc<dyn ResourceLoader>) -> Self {
        Self { loader }
    }

    /// Fetch the current pixels of `target`. The target is never modified.
    pub async fn acquire(&self, target: &ScanTarget) -> Result<RgbaImage, AcquireError> {
        match target {
            ScanTarget::Image(img) => self.acquire_image(img.url()).await,
            ScanTarget::Canvas(canvas) => acquire_canvas(canvas),
        }
    }

    async fn acquire_image(&self, url: &str) -> Result<RgbaImage, AcquireError> {
        if url.starts_with("data:") {
            return decode_data_url(url);
        }

        match self.loader.load_image(url).await {
            Ok(bitmap) => Ok(bitmap),
            Err(err) => {
                debug!(url, %err, "direct load failed, fetching raw bytes");
                let bytes = self.loader.fetch_bytes(url).await?;
                decode_bytes(&bytes)
            }
        }
    }
}

fn acquire_canvas(canvas: &CanvasTarget) -> Result<RgbaImage, AcquireError> {
    if let Some(pixels) = canvas.surface().read_pixels() {
        return Ok(pixels);
    }
    debug!(id = canvas.id().get(), "canvas tainted, exporting data url");
    let data_url = canvas
        .surface()
        .to_data_url()
        .ok_or(AcquireError::CanvasUnreadable)?;
    decode_data_url(&data_url)
}

/// Loader for a process outside the browser.
///
/// Local paths and `file:` URLs are read from disk. Remote URLs have no
/// cross-origin-safe direct path, so `load_image` refuses them and the
/// acquirer goes through `fetch_bytes` instead.
pub struct HttpLoader {
    client: Client,
}

impl HttpLoader {
    /// Create a loader whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("autoqr/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ResourceLoader for HttpLoader {
    async fn load_image(&self, url: &str) -> Result<RgbaImage, AcquireError> {
        let path = match url::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                return Err(AcquireError::CrossOrigin(url.to_string()));
            }
            Ok(parsed) if parsed.scheme() == "file" => parsed
                .to_file_path()
                .map_err(|_| AcquireError::Fetch(format!("bad file url: {url}")))?,
            _ => std::path::PathBuf::from(url),
        };
        let bytes = tokio::fs::read(&path).await?;
        decode_bytes(&bytes)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, AcquireError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(AcquireError::Fetch(format!("empty body from {url}")));
        }
        Ok(bytes.to_vec())
    }
}
