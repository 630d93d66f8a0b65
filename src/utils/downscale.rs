//! Progressive ("smart") downscaling.
//!
//! Reductions above 2x are split into a chain of halvings followed by one
//! final resample of at most 2x, which keeps module edges crisp.

use crate::models::Size;
use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Intermediate sizes visited when going from `src` to `dst`.
///
/// Every step shrinks each axis by at most 2x. The last element is always
/// `dst`. An empty result means no resampling is needed.
pub fn pass_sizes(src: Size, dst: Size) -> Vec<Size> {
    let mut passes = Vec::new();
    if src == dst || dst.is_empty() {
        return passes;
    }

    let mut current = src;
    while current.width > dst.width * 2 || current.height > dst.height * 2 {
        let next = Size::new(
            (current.width / 2).max(dst.width),
            (current.height / 2).max(dst.height),
        );
        if next == current {
            break;
        }
        passes.push(next);
        current = next;
    }
    if current != dst {
        passes.push(dst);
    }
    passes
}

/// Halve an image by averaging each 2x2 block
fn downscale_by_2(image: &RgbaImage) -> RgbaImage {
    let dst_width = (image.width() / 2).max(1);
    let dst_height = (image.height() / 2).max(1);
    let max_x = image.width() - 1;
    let max_y = image.height() - 1;

    RgbaImage::from_fn(dst_width, dst_height, |x, y| {
        let sx = x * 2;
        let sy = y * 2;
        let block = [
            image.get_pixel(sx, sy),
            image.get_pixel((sx + 1).min(max_x), sy),
            image.get_pixel(sx, (sy + 1).min(max_y)),
            image.get_pixel((sx + 1).min(max_x), (sy + 1).min(max_y)),
        ];
        let mut acc = [0u16; 4];
        for px in block {
            for (c, v) in acc.iter_mut().zip(px.0) {
                *c += v as u16;
            }
        }
        image::Rgba(acc.map(|c| ((c + 2) / 4) as u8))
    })
}

/// Resize to exactly `width` x `height`, halving progressively when
/// shrinking by more than 2x.
pub fn smart_resize(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let src = Size::new(image.width(), image.height());
    let passes = pass_sizes(src, Size::new(width, height));
    if passes.is_empty() {
        return image.clone();
    }

    let mut current = image.clone();
    for step in passes {
        let halved = Size::new(current.width() / 2, current.height() / 2);
        current = if step == halved {
            downscale_by_2(&current)
        } else {
            imageops::resize(&current, step.width, step.height, FilterType::Triangle)
        };
    }
    current
}
