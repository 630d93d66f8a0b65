use serde::Serialize;
use std::fmt;

/// Why a target ended in a failed state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailReason {
    /// Draw plan had a zero dimension
    InvalidSize,
    /// The standard (normal variant) stage found nothing
    StandardFailed,
    /// The full forced ladder found nothing
    ForceFailed,
    /// Every remote service failed or timed out
    RemoteAllFailed,
    /// Pixels could not be acquired
    LoadFailed,
}

impl FailReason {
    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            FailReason::InvalidSize => "invalid_size",
            FailReason::StandardFailed => "standard_failed",
            FailReason::ForceFailed => "force_failed",
            FailReason::RemoteAllFailed => "remote_all_failed",
            FailReason::LoadFailed => "load_failed",
        }
    }
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a target was never scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Above the automatic scan size limit
    TooLarge,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooLarge => f.write_str("too_large"),
        }
    }
}

/// Terminal decode outcome for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CacheEntry {
    /// Decoded payload and the method that produced it
    Success {
        /// Decoded text
        text: String,
        /// Display label of the decoder / variant / remote source
        method: String,
    },
    /// Decode attempted and failed
    Failed {
        /// Failure reason
        reason: FailReason,
    },
    /// Decode deliberately not attempted
    Skipped {
        /// Skip reason
        reason: SkipReason,
    },
}

impl CacheEntry {
    /// Successful decode
    pub fn success(text: impl Into<String>, method: impl Into<String>) -> Self {
        CacheEntry::Success {
            text: text.into(),
            method: method.into(),
        }
    }

    /// Failed decode
    pub fn failed(reason: FailReason) -> Self {
        CacheEntry::Failed { reason }
    }

    /// Skipped decode
    pub fn skipped(reason: SkipReason) -> Self {
        CacheEntry::Skipped { reason }
    }

    /// True for `Success`
    pub fn is_success(&self) -> bool {
        matches!(self, CacheEntry::Success { .. })
    }

    /// Decoded text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            CacheEntry::Success { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Exactly `Failed{standard_failed}`
    pub fn is_standard_failed(&self) -> bool {
        matches!(
            self,
            CacheEntry::Failed {
                reason: FailReason::StandardFailed
            }
        )
    }
}

impl fmt::Display for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheEntry::Success { text, method } => write!(f, "success via {method}: {text}"),
            CacheEntry::Failed { reason } => write!(f, "failed ({reason})"),
            CacheEntry::Skipped { reason } => write!(f, "skipped ({reason})"),
        }
    }
}

/// True when `text` is an absolute http(s) URL
pub fn is_link(text: &str) -> bool {
    url::Url::parse(text.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_names() {
        assert_eq!(FailReason::StandardFailed.to_string(), "standard_failed");
        assert_eq!(FailReason::RemoteAllFailed.as_str(), "remote_all_failed");
        assert_eq!(SkipReason::TooLarge.to_string(), "too_large");
    }

    #[test]
    fn test_standard_failed_is_narrow() {
        assert!(CacheEntry::failed(FailReason::StandardFailed).is_standard_failed());
        assert!(!CacheEntry::failed(FailReason::InvalidSize).is_standard_failed());
        assert!(!CacheEntry::skipped(SkipReason::TooLarge).is_standard_failed());
    }

    #[test]
    fn test_entry_serializes_tagged() {
        let json = serde_json::to_value(CacheEntry::failed(FailReason::ForceFailed)).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "force_failed");
    }

    #[test]
    fn test_is_link() {
        assert!(is_link("https://example.com/a?b=c"));
        assert!(is_link("http://example.com"));
        assert!(!is_link("ftp://example.com"));
        assert!(!is_link("WIFI:S:home;T:WPA;P:secret;;"));
        assert!(!is_link("just text"));
    }
}
