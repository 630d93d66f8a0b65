//! autoqr - hover-to-decode QR and barcode scanning for page images
//!
//! Given an image or canvas target on a page, autoqr computes a draw plan,
//! acquires pixels (falling back to a privileged fetch when the direct load
//! is refused), renders a padded white canvas and runs two decoders over a
//! normal / inverted / binarized ladder. Outcomes are cached per target.
//! Remote HTTP decoders can be raced as a last resort, and the interaction
//! layer turns pointer gestures into scans and tooltips.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Pixel acquisition with cross-origin fallback
pub mod acquire;
/// URL- and identity-keyed result cache
pub mod cache;
/// Scan configuration and environment overrides
pub mod config;
/// Local decoders and the decode ladder
pub mod decode;
/// Error types for each stage
pub mod error;
/// Draw plans and canvas rendering
pub mod geometry;
/// Gestures, tooltip dispatch and session wiring
pub mod interaction;
/// Core data structures (targets, sizes, cache entries)
pub mod models;
/// Remote decode services and the race between them
pub mod remote;
/// The scan pipeline
pub mod scanner;
/// Dataset and CLI helpers
pub mod tools;
/// Pixel utilities (grayscale, binarization, resizing)
pub mod utils;

pub use cache::ResultCache;
pub use config::ScanConfig;
pub use error::ScanError;
pub use models::{CacheEntry, CropRegion, ElementBox, ImageTarget, Point, ScanTarget, Size};
pub use scanner::{ScanRequest, Scanner, ScannerBuilder};
