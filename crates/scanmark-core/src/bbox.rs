use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in integer pixel coordinates.
///
/// The serialized field names are part of the annotation file contract and
/// must not be renamed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BBox {
    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Width in pixels; zero for inverted or collapsed extents.
    #[inline]
    pub fn width(&self) -> i64 {
        (self.x_max - self.x_min).max(0) as i64
    }

    /// Height in pixels; zero for inverted or collapsed extents.
    #[inline]
    pub fn height(&self) -> i64 {
        (self.y_max - self.y_min).max(0) as i64
    }

    #[inline]
    pub fn area(&self) -> i64 {
        self.width() * self.height()
    }

    /// True when the box spans a positive area with ordered extents.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.x_min < self.x_max && self.y_min < self.y_max
    }

    /// Overlap area with `other`; zero when the boxes are disjoint.
    pub fn intersection_area(&self, other: &BBox) -> i64 {
        let w = (self.x_max.min(other.x_max) as i64 - self.x_min.max(other.x_min) as i64).max(0);
        let h = (self.y_max.min(other.y_max) as i64 - self.y_min.max(other.y_min) as i64).max(0);
        w * h
    }

    /// Intersection-over-union with `other`, in `[0, 1]`.
    ///
    /// Returns `0.0` when the union is empty, which only happens for two
    /// degenerate boxes.
    pub fn iou(&self, other: &BBox) -> f64 {
        let inter = self.intersection_area(other);
        let union = self.area() + other.area() - inter;
        if union <= 0 {
            return 0.0;
        }
        inter as f64 / union as f64
    }
}
