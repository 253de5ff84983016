use serde::{Deserialize, Serialize};

use crate::common::BoxFormat;

/// Axis-aligned box in the canonical corner layout `(y_min, x_min, y_max, x_max)`.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize, PartialOrd)]
pub struct BvrBox {
    pub y1: f32,
    pub x1: f32,
    pub y2: f32,
    pub x2: f32,
}

impl BvrBox {
    pub fn new(y1: f32, x1: f32, y2: f32, x2: f32) -> Self {
        Self { y1, x1, y2, x2 }
    }

    /// Builds a box from one row in `format`. Relative rows keep their normalized values.
    pub fn from_row(row: [f32; 4], format: BoxFormat) -> Self {
        let [y1, x1, y2, x2] = format.to_yxyx(row);
        Self { y1, x1, y2, x2 }
    }

    /// Returns the box as one row in `format`.
    pub fn to_row(&self, format: BoxFormat) -> [f32; 4] {
        format.from_yxyx(self.yxyx())
    }

    /// Returns the width of the bounding box.
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    /// Returns the height of the bounding box.
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Returns the bounding box coordinates as `[y1, x1, y2, x2]`.
    pub fn yxyx(&self) -> [f32; 4] {
        [self.y1, self.x1, self.y2, self.x2]
    }

    /// Computes the area of the bounding box.
    ///
    /// Not clamped: inverted boxes report a non-positive area.
    pub fn area(&self) -> f32 {
        self.height() * self.width()
    }

    /// Computes the intersection area between this bounding box and another.
    pub fn intersect(&self, other: &BvrBox) -> f32 {
        let top = self.y1.max(other.y1);
        let left = self.x1.max(other.x1);
        let bottom = self.y2.min(other.y2);
        let right = self.x2.min(other.x2);
        (bottom - top).max(0.) * (right - left).max(0.)
    }

    /// Computes the intersection over union (IoU) between this bounding box and another.
    ///
    /// A zero union (two degenerate boxes) gives 0 instead of NaN.
    pub fn iou(&self, other: &BvrBox) -> f32 {
        let intersection = self.intersect(other);
        let union = self.area() + other.area() - intersection;
        if union > 0. {
            (intersection / union).clamp(0., 1.)
        } else {
            0.
        }
    }

    /// Clips the box into `[0, height] x [0, width]`.
    pub fn clip(mut self, height: f32, width: f32) -> Self {
        self.y1 = self.y1.clamp(0., height);
        self.x1 = self.x1.clamp(0., width);
        self.y2 = self.y2.clamp(0., height);
        self.x2 = self.x2.clamp(0., width);
        self
    }

    /// Scales y by `sy` and x by `sx`.
    pub fn scale(mut self, sy: f32, sx: f32) -> Self {
        self.y1 *= sy;
        self.y2 *= sy;
        self.x1 *= sx;
        self.x2 *= sx;
        self
    }

    /// Divides y by `sy` and x by `sx`.
    pub fn unscale(mut self, sy: f32, sx: f32) -> Self {
        self.y1 /= sy;
        self.y2 /= sy;
        self.x1 /= sx;
        self.x2 /= sx;
        self
    }

    /// Sets the bounding box's coordinates and dimensions using `(cx, cy, w, h)`.
    ///
    /// # Arguments
    ///
    /// * `cx` - The x-coordinate of the horizontal center.
    /// * `cy` - The y-coordinate of the vertical center.
    /// * `w` - The width of the bounding box.
    /// * `h` - The height of the bounding box.
    ///
    /// # Returns
    ///
    /// A `BvrBox` instance with updated coordinates.
    pub fn with_cxcy_wh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.x1 = cx - (w / 2.0);
        self.y1 = cy - (h / 2.0);
        self.x2 = cx + (w / 2.0);
        self.y2 = cy + (h / 2.0);
        self
    }
}
