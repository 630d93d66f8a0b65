//! Core data structures shared across the pipeline

/// Cache entries and failure reasons
pub mod outcome;
/// Page coordinates and pixel sizes
pub mod point;
/// Crop and source rectangles
pub mod region;
/// Scan targets and their cache keys
pub mod target;

pub use outcome::{CacheEntry, FailReason, SkipReason, is_link};
pub use point::{ElementBox, Point, Size};
pub use region::{CropRegion, SourceRect};
pub use target::{CanvasId, CanvasSurface, CanvasTarget, ImageTarget, ScanTarget, TargetKey};
