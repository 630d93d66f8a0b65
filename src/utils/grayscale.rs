/// Luminance helpers.
///
/// Two flavours are kept on purpose:
/// - `rgba_to_grayscale` is the fast 8-bit conversion fed to the pixel-buffer
///   decoder: Y = (76*R + 150*G + 29*B) >> 8
/// - `luma_milli` is the exact BT.601 weighting scaled by 1000
///   (299*R + 587*G + 114*B), used where thresholds must compare exactly
use rayon::prelude::*;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Convert RGBA to 8-bit grayscale (alpha ignored), rows in parallel
pub fn rgba_to_grayscale(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut gray = vec![0u8; width * height];
    if width == 0 {
        return gray;
    }

    gray.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let row_start = y * width * 4;
        for (x, out) in row.iter_mut().enumerate() {
            let idx = row_start + x * 4;
            let r = rgba[idx] as u32;
            let g = rgba[idx + 1] as u32;
            let b = rgba[idx + 2] as u32;
            let lum = (COEF_R * r + COEF_G * g + COEF_B * b) >> 8;
            *out = lum.min(255) as u8;
        }
    });

    gray
}

/// BT.601 luminance `0.299R + 0.587G + 0.114B`, scaled by 1000 so that
/// comparisons against a mean stay exact.
#[inline]
pub fn luma_milli(r: u8, g: u8, b: u8) -> u32 {
    299 * r as u32 + 587 * g as u32 + 114 * b as u32
}
