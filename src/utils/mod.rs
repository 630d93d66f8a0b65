//! Utility functions for image processing
//!
//! This module provides the pixel-level helpers used by the decode pipeline:
//! - Grayscale / luminance conversion
//! - Inversion and global-mean binarization
//! - Progressive downscaling

pub mod binarization;
pub mod downscale;
pub mod grayscale;
