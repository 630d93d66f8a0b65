use serde::{Deserialize, Serialize};

/// 2D point in page (CSS pixel) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Translate point by (dx, dy)
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Layout box of an element in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementBox {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Rendered width
    pub width: f32,
    /// Rendered height
    pub height: f32,
}

impl ElementBox {
    /// Create a new box
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clamp a point so it lies inside the box
    pub fn clamp(&self, p: Point) -> Point {
        Point {
            x: p.x.clamp(self.x, self.x + self.width),
            y: p.y.clamp(self.y, self.y + self.height),
        }
    }

    /// Point just below the bottom-left corner, where tooltips anchor
    pub fn tooltip_anchor(&self) -> Point {
        Point::new(self.x, self.y + self.height + 4.0)
    }
}

/// Integer pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Size {
    /// Create a new size
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Larger of the two dimensions
    pub fn max_side(&self) -> u32 {
        self.width.max(self.height)
    }
}
