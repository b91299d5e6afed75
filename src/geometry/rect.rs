use serde::{Deserialize, Serialize};

/// Width and height, in whatever unit the pipeline stage uses.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn square(side: f64) -> Self {
        Self::new(side, side)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// How `x`/`y` of a [`Rect`] are anchored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxConvention {
    /// `x`/`y` is the top-left corner.
    Origin,
    /// `x`/`y` is the box center (YOLO-style output).
    Center,
}

/// Axis-aligned rectangle: `x`, `y`, `width`, `height`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a top-left rect from two corners.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs())
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Re-anchor a box given in `convention` so that `x`/`y` is the top-left corner.
    pub fn to_origin(self, convention: BoxConvention) -> Self {
        match convention {
            BoxConvention::Origin => self,
            BoxConvention::Center => Self::new(
                self.x - self.width / 2.0,
                self.y - self.height / 2.0,
                self.width,
                self.height,
            ),
        }
    }

    /// Intersection over union. Zero when either box is empty.
    pub fn iou(&self, other: &Rect) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = self.max_x().min(other.max_x());
        let iy2 = self.max_y().min(other.max_y());
        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            return 0.0;
        }
        inter / union
    }

    /// Clip to `[0, size.width] x [0, size.height]`.
    ///
    /// The coordinate mapper never clamps; renderers that need clipping call this.
    pub fn clamp_to(&self, size: Size) -> Rect {
        let x1 = self.x.clamp(0.0, size.width);
        let y1 = self.y.clamp(0.0, size.height);
        let x2 = self.max_x().clamp(0.0, size.width);
        let y2 = self.max_y().clamp(0.0, size.height);
        Rect::new(x1, y1, (x2 - x1).max(0.0), (y2 - y1).max(0.0))
    }
}
