//! Decoder A: synchronous decoding from a raw RGBA buffer.

use crate::utils::grayscale::rgba_to_grayscale;
use rqrr::PreparedImage;

/// Decoder working on a raw RGBA pixel buffer
pub trait PixelDecoder: Send + Sync {
    /// Label used in result methods
    fn name(&self) -> &str;

    /// Decode a `width` x `height` RGBA buffer
    fn decode(&self, rgba: &[u8], width: u32, height: u32) -> Option<String>;
}

/// QR decoder backed by `rqrr`
#[derive(Debug, Default, Clone, Copy)]
pub struct RqrrDecoder;

impl PixelDecoder for RqrrDecoder {
    fn name(&self) -> &str {
        "rqrr"
    }

    fn decode(&self, rgba: &[u8], width: u32, height: u32) -> Option<String> {
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 || rgba.len() < w * h * 4 {
            return None;
        }

        let grey = rgba_to_grayscale(rgba, w, h);
        let mut prepared = PreparedImage::prepare_from_greyscale(w, h, |x, y| grey[y * w + x]);
        prepared
            .detect_grids()
            .iter()
            .find_map(|grid| grid.decode().ok())
            .map(|(_, content)| content)
    }
}
