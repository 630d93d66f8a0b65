//! Pixel variants fed to the decode ladder: inversion and global-mean
//! binarization. Both keep the RGBA layout so either decoder can consume
//! the result.

use super::grayscale::luma_milli;
use image::RgbaImage;
use rayon::prelude::*;

const BLACK: [u8; 4] = [0, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Invert R, G, B (`255 - c`) and force alpha to opaque
pub fn invert(image: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    out.par_chunks_mut(4).for_each(|px| {
        px[0] = 255 - px[0];
        px[1] = 255 - px[1];
        px[2] = 255 - px[2];
        px[3] = 255;
    });
    out
}

/// Sum of `luma_milli` over all pixels, along with the pixel count
fn luma_sum(image: &RgbaImage) -> (u64, u64) {
    let sum = image
        .par_chunks(4)
        .map(|px| luma_milli(px[0], px[1], px[2]) as u64)
        .sum();
    (sum, image.width() as u64 * image.height() as u64)
}

/// Threshold every pixel against the global mean luminance.
///
/// Pixels darker than the mean become black; pixels at or above it become
/// white. The comparison is done in integers (`lum * n` against the sum), so
/// a uniform image is exactly at the mean and stays white.
pub fn mean_binarize(image: &RgbaImage) -> RgbaImage {
    let (sum, count) = luma_sum(image);
    let mut out = image.clone();
    if count == 0 {
        return out;
    }

    out.par_chunks_mut(4).for_each(|px| {
        let lum = luma_milli(px[0], px[1], px[2]) as u64;
        let value = if lum * count < sum { BLACK } else { WHITE };
        px.copy_from_slice(&value);
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn checkerboard(size: u32, cell: u32) -> RgbaImage {
        RgbaImage::from_fn(size, size, |x, y| {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                Rgba([20, 30, 40, 255])
            } else {
                Rgba([230, 220, 210, 255])
            }
        })
    }

    #[test]
    fn test_invert_forces_alpha() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 200, 255, 0]));
        let inv = invert(&img);
        assert_eq!(inv.get_pixel(1, 1), &Rgba([245, 55, 0, 255]));
    }

    #[test]
    fn test_invert_twice_restores_opaque_image() {
        let img = checkerboard(8, 2);
        assert_eq!(invert(&invert(&img)), img);
    }

    #[test]
    fn test_all_white_stays_white() {
        let img = RgbaImage::from_pixel(7, 5, Rgba([255, 255, 255, 255]));
        let bin = mean_binarize(&img);
        assert!(bin.pixels().all(|p| p.0 == WHITE));
    }

    #[test]
    fn test_uniform_gray_stays_white() {
        // Not representable exactly as f64 mean; integer comparison must tie
        let img = RgbaImage::from_pixel(13, 11, Rgba([77, 131, 19, 255]));
        let bin = mean_binarize(&img);
        assert!(bin.pixels().all(|p| p.0 == WHITE));
    }

    #[test]
    fn test_checkerboard_gives_two_levels() {
        let img = checkerboard(16, 4);
        let bin = mean_binarize(&img);
        assert_eq!(bin.get_pixel(0, 0).0, BLACK);
        assert_eq!(bin.get_pixel(4, 0).0, WHITE);
        assert!(bin.pixels().all(|p| p.0 == BLACK || p.0 == WHITE));
        let blacks = bin.pixels().filter(|p| p.0 == BLACK).count();
        assert_eq!(blacks, 16 * 16 / 2);
    }

    #[test]
    fn test_luma_sum_counts_pixels() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        assert_eq!(luma_sum(&img), (16 * 255_000, 16));
        assert_eq!(luma_sum(&RgbaImage::new(0, 0)), (0, 0));
        assert_eq!(mean_binarize(&RgbaImage::new(0, 0)).dimensions(), (0, 0));
    }
}
