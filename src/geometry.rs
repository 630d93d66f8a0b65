//! Draw plans: which source pixels are drawn where on the padded
//! offscreen canvas handed to the decoders.

use crate::config::ScanConfig;
use crate::error::GeometryError;
use crate::models::{CropRegion, Size, SourceRect};
use crate::utils::downscale::smart_resize;
use image::imageops;
use image::{Rgba, RgbaImage};
use tracing::trace;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Placement of a target's pixels on the decode canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawPlan {
    /// Coordinate space `source` is expressed in
    pub source_space: Size,
    /// Region of the source that is drawn
    pub source: SourceRect,
    /// Size the region is drawn at
    pub target: Size,
    /// Full canvas size, target plus padding on every side
    pub canvas: Size,
    /// White border width
    pub padding: u32,
}

/// Pixel space a target is drawn from.
///
/// Vector resources and images without a natural size are drawn at their
/// display size, or at the fallback square when that is unknown too.
pub fn source_space(natural: Size, display: Size, vector: bool, config: &ScanConfig) -> Size {
    if !vector && !natural.is_empty() {
        return natural;
    }
    if !display.is_empty() {
        return display;
    }
    Size::new(config.fallback_size, config.fallback_size)
}

/// Compute the draw plan for a target, optionally restricted to a crop.
///
/// Without a crop the whole source is drawn at its own size, however large.
/// A crop is mapped from display to source space, clamped to the source,
/// and reduced so its larger side is at most `crop_target_size` unless
/// `no_scale` is set.
pub fn compute_draw_plan(
    natural: Size,
    display: Size,
    vector: bool,
    crop: Option<&CropRegion>,
    config: &ScanConfig,
) -> Result<DrawPlan, GeometryError> {
    let space = source_space(natural, display, vector, config);

    let (source, target) = match crop {
        None => (
            SourceRect {
                x: 0,
                y: 0,
                width: space.width,
                height: space.height,
            },
            space,
        ),
        Some(crop) => {
            let source = scale_crop(crop, space, display);
            let target = reduce_crop(source, crop.no_scale, config.crop_target_size);
            (source, target)
        }
    };

    if target.is_empty() {
        return Err(GeometryError::InvalidSize {
            width: target.width,
            height: target.height,
        });
    }

    let pad = config.padding;
    let plan = DrawPlan {
        source_space: space,
        source,
        target,
        canvas: Size::new(target.width + 2 * pad, target.height + 2 * pad),
        padding: pad,
    };
    trace!(?plan, "draw plan");
    Ok(plan)
}

/// Map a display-space crop into source pixels and clamp it to the source
fn scale_crop(crop: &CropRegion, space: Size, display: Size) -> SourceRect {
    let scale = |src: u32, disp: u32| {
        if disp == 0 {
            1.0
        } else {
            src as f64 / disp as f64
        }
    };
    let scale_x = scale(space.width, display.width);
    let scale_y = scale(space.height, display.height);

    // Clamp both edges so a crop hanging off the source keeps only the overlap
    let span = |start: f64, len: f64, limit: u32| {
        let begin = start.floor();
        let end = begin + len.round().max(0.0);
        let limit = limit as f64;
        let begin = begin.clamp(0.0, limit);
        (begin as u32, (end.clamp(0.0, limit) - begin).max(0.0) as u32)
    };
    let (x, width) = span(crop.x * scale_x, crop.w * scale_x, space.width);
    let (y, height) = span(crop.y * scale_y, crop.h * scale_y, space.height);

    SourceRect {
        x,
        y,
        width,
        height,
    }
}

fn reduce_crop(source: SourceRect, no_scale: bool, target_size: u32) -> Size {
    let size = Size::new(source.width, source.height);
    let larger = size.max_side();
    if no_scale || size.is_empty() || larger <= target_size {
        return size;
    }

    let factor = target_size as f64 / larger as f64;
    Size::new(
        ((source.width as f64 * factor).round() as u32).max(1),
        ((source.height as f64 * factor).round() as u32).max(1),
    )
}

/// Draw `bitmap` onto a fresh white canvas according to `plan`.
///
/// When the bitmap's real size differs from the plan's source space (a
/// vector rasterized at another size, or a stale natural size) the source
/// rectangle is rescaled proportionally first.
pub fn render(bitmap: &RgbaImage, plan: &DrawPlan) -> Result<RgbaImage, GeometryError> {
    let (bw, bh) = bitmap.dimensions();
    if bw == 0 || bh == 0 {
        return Err(GeometryError::InvalidSize {
            width: bw,
            height: bh,
        });
    }

    let rect = fit_rect(plan.source, plan.source_space, Size::new(bw, bh));
    let region = imageops::crop_imm(bitmap, rect.x, rect.y, rect.width, rect.height).to_image();
    let drawn = smart_resize(&region, plan.target.width, plan.target.height);

    let mut canvas = RgbaImage::from_pixel(plan.canvas.width, plan.canvas.height, WHITE);
    imageops::overlay(&mut canvas, &drawn, plan.padding as i64, plan.padding as i64);
    Ok(canvas)
}

fn fit_rect(rect: SourceRect, space: Size, actual: Size) -> SourceRect {
    if space == actual || space.is_empty() {
        return clamp_rect(rect, actual);
    }
    let sx = actual.width as f64 / space.width as f64;
    let sy = actual.height as f64 / space.height as f64;
    clamp_rect(
        SourceRect {
            x: (rect.x as f64 * sx).floor() as u32,
            y: (rect.y as f64 * sy).floor() as u32,
            width: (rect.width as f64 * sx).round() as u32,
            height: (rect.height as f64 * sy).round() as u32,
        },
        actual,
    )
}

fn clamp_rect(rect: SourceRect, bounds: Size) -> SourceRect {
    let x = rect.x.min(bounds.width - 1);
    let y = rect.y.min(bounds.height - 1);
    SourceRect {
        x,
        y,
        width: rect.width.clamp(1, bounds.width - x),
        height: rect.height.clamp(1, bounds.height - y),
    }
}
