//! Policy constants for geometry, gestures and remote decoding.
//!
//! Every value has a built-in default and can be overridden through an
//! `AUTOQR_*` environment variable. Unparseable values fall back to the
//! default instead of failing.

use crate::models::Size;
use std::time::Duration;

/// Default endpoint of the HTML decoding service
pub const DEFAULT_ZXING_ENDPOINT: &str = "https://zxing.org/w/decode";
/// Default endpoint of the JSON decoding service
pub const DEFAULT_QR_API_ENDPOINT: &str = "https://api.2dcode.biz/v1/read-qr-code";

/// Scanner and controller configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Larger side of a scaled crop, in pixels
    pub crop_target_size: u32,
    /// White quiet-zone border drawn around the payload, per side
    pub padding: u32,
    /// Size used when neither natural nor display size is known
    pub fallback_size: u32,
    /// Targets above this natural size are never scanned automatically
    pub max_auto_size: u32,
    /// Minimum displayed side for hover eligibility
    pub min_size: u32,
    /// Allowed |width - height| for the near-square check
    pub square_tolerance: u32,
    /// Hover time before an automatic scan fires
    pub hover_delay: Duration,
    /// Press time that counts as a long press
    pub long_press: Duration,
    /// Minimum crop rectangle side
    pub min_crop: u32,
    /// Bound on each remote request
    pub remote_timeout: Duration,
    /// HTML service endpoint
    pub zxing_endpoint: String,
    /// JSON service endpoint
    pub qr_api_endpoint: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            crop_target_size: 800,
            padding: 50,
            fallback_size: 300,
            max_auto_size: 2000,
            min_size: 30,
            square_tolerance: 2,
            hover_delay: Duration::from_millis(500),
            long_press: Duration::from_millis(500),
            min_crop: 5,
            remote_timeout: Duration::from_secs(10),
            zxing_endpoint: DEFAULT_ZXING_ENDPOINT.to_string(),
            qr_api_endpoint: DEFAULT_QR_API_ENDPOINT.to_string(),
        }
    }
}

fn parse_u32<F>(lookup: &F, name: &str, default: u32) -> u32
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn parse_millis<F>(lookup: &F, name: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

fn parse_string<F>(lookup: &F, name: &str, default: String) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

impl ScanConfig {
    /// Defaults overridden by `AUTOQR_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable name
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        Self {
            crop_target_size: parse_u32(&lookup, "AUTOQR_CROP_TARGET_SIZE", d.crop_target_size)
                .max(1),
            padding: parse_u32(&lookup, "AUTOQR_PADDING", d.padding),
            fallback_size: parse_u32(&lookup, "AUTOQR_FALLBACK_SIZE", d.fallback_size).max(1),
            max_auto_size: parse_u32(&lookup, "AUTOQR_MAX_AUTO_SIZE", d.max_auto_size),
            min_size: parse_u32(&lookup, "AUTOQR_MIN_SIZE", d.min_size),
            square_tolerance: parse_u32(&lookup, "AUTOQR_SQUARE_TOLERANCE", d.square_tolerance),
            hover_delay: parse_millis(&lookup, "AUTOQR_HOVER_DELAY_MS", d.hover_delay),
            long_press: parse_millis(&lookup, "AUTOQR_LONG_PRESS_MS", d.long_press),
            min_crop: parse_u32(&lookup, "AUTOQR_MIN_CROP", d.min_crop),
            remote_timeout: parse_millis(&lookup, "AUTOQR_REMOTE_TIMEOUT_MS", d.remote_timeout),
            zxing_endpoint: parse_string(&lookup, "AUTOQR_ZXING_ENDPOINT", d.zxing_endpoint),
            qr_api_endpoint: parse_string(&lookup, "AUTOQR_QR_API_ENDPOINT", d.qr_api_endpoint),
        }
    }

    /// Whether a target of this natural size is above the automatic scan limit
    pub fn exceeds_auto_size(&self, natural: Size) -> bool {
        natural.width > self.max_auto_size || natural.height > self.max_auto_size
    }
}
