//! Error types.
//!
//! Nothing here reaches the interaction layer as an error: the scanner
//! converts every `ScanError` into a terminal `CacheEntry`.

use crate::models::{CacheEntry, FailReason, SkipReason};
use std::time::Duration;
use thiserror::Error;

/// Failure to obtain pixels for a target
#[derive(Debug, Error)]
pub enum AcquireError {
    /// Direct load refused; the fetch fallback applies
    #[error("Cross-origin load refused: {0}")]
    CrossOrigin(String),

    /// Privileged fetch returned no usable body
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Transport error from the HTTP client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Bytes could not be decoded as an image
    #[error("Image decode failed: {0}")]
    Image(#[from] image::ImageError),

    /// Not a base64 `data:` URL
    #[error("Malformed data URL")]
    DataUrl,

    /// Tainted canvas that also refused export
    #[error("Canvas pixels unreadable and no export path")]
    CanvasUnreadable,

    /// Local file read failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Draw plan rejection
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    /// Target has a zero dimension
    #[error("Draw plan has zero size ({width}x{height})")]
    InvalidSize { width: u32, height: u32 },
}

/// Failure of one remote decoding service
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport or status error
    #[error("{service}: HTTP error: {source}")]
    Http {
        service: String,
        #[source]
        source: reqwest::Error,
    },

    /// No response within the per-request bound
    #[error("{service}: timed out after {after:?}")]
    Timeout { service: String, after: Duration },

    /// Response carried no decoded payload
    #[error("{service}: no payload found in response")]
    NoPayload { service: String },

    /// Service reported a failure code
    #[error("{service}: rejected ({message})")]
    Rejected { service: String, message: String },

    /// Target has no http(s) URL
    #[error("Not a remotely decodable target: {0}")]
    Unsupported(String),
}

/// Size policy rejection; not a real error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeRejection {
    /// Zero-sized draw plan
    InvalidSize,
    /// Above the automatic scan limit
    TooLarge,
}

/// Pipeline-level failure taxonomy
#[derive(Debug, Error)]
pub enum ScanError {
    /// Pixels could not be obtained
    #[error("Acquisition failed: {0}")]
    Acquisition(#[from] AcquireError),

    /// Every ladder stage failed
    #[error("All decode stages failed (forced: {forced})")]
    DecodeExhausted { forced: bool },

    /// Size policy refused the target
    #[error("Size rejected: {0:?}")]
    SizeRejected(SizeRejection),

    /// Every remote participant failed
    #[error("All remote decoders failed ({} errors)", .0.len())]
    RemoteRaceExhausted(Vec<RemoteError>),
}

impl From<GeometryError> for ScanError {
    fn from(_: GeometryError) -> Self {
        ScanError::SizeRejected(SizeRejection::InvalidSize)
    }
}

impl ScanError {
    /// Terminal cache entry recording this failure
    pub fn to_entry(&self) -> CacheEntry {
        match self {
            ScanError::Acquisition(_) => CacheEntry::failed(FailReason::LoadFailed),
            ScanError::DecodeExhausted { forced: false } => {
                CacheEntry::failed(FailReason::StandardFailed)
            }
            ScanError::DecodeExhausted { forced: true } => {
                CacheEntry::failed(FailReason::ForceFailed)
            }
            ScanError::SizeRejected(SizeRejection::InvalidSize) => {
                CacheEntry::failed(FailReason::InvalidSize)
            }
            ScanError::SizeRejected(SizeRejection::TooLarge) => {
                CacheEntry::skipped(SkipReason::TooLarge)
            }
            ScanError::RemoteRaceExhausted(_) => CacheEntry::failed(FailReason::RemoteAllFailed),
        }
    }
}
