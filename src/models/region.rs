/// User-selected sub-rectangle of a target, in the element's display space
/// (CSS pixels relative to the element's top-left corner).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    /// Left offset
    pub x: f64,
    /// Top offset
    pub y: f64,
    /// Width
    pub w: f64,
    /// Height
    pub h: f64,
    /// Keep the cropped pixels at natural resolution
    pub no_scale: bool,
}

impl CropRegion {
    /// Create a crop region that may be reduced to the crop target size
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            w,
            h,
            no_scale: false,
        }
    }

    /// Same region with size reduction disabled
    pub fn unscaled(mut self) -> Self {
        self.no_scale = true;
        self
    }
}

/// Pixel rectangle inside a bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRect {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}
