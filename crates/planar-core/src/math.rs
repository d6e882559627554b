//! Math utilities
//!
//! Re-exports from glam and the 2D bounding-box type shared by collision code.
//! All simulation math runs in double precision.

use serde::{Deserialize, Serialize};

pub use glam::DVec2;

/// Axis-aligned bounding box stored as top-left corner plus size.
///
/// `y` grows downward, so `y` is the top edge and `y + height` the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Horizontal extent
    pub width: f64,
    /// Vertical extent
    pub height: f64,
}

impl Aabb {
    /// Create an AABB from its top-left corner and size
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Create an AABB from center and half-extents
    pub fn from_center_half_extents(center: DVec2, half_extents: DVec2) -> Self {
        Self {
            x: center.x - half_extents.x,
            y: center.y - half_extents.y,
            width: half_extents.x * 2.0,
            height: half_extents.y * 2.0,
        }
    }

    /// Top-left corner
    pub fn min(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// Bottom-right corner
    pub fn max(&self) -> DVec2 {
        DVec2::new(self.right(), self.bottom())
    }

    /// Right edge
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Get the center of the AABB
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Get the half-extents of the AABB
    pub fn half_extents(&self) -> DVec2 {
        DVec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Check if a point lies inside or on the boundary
    pub fn contains_point(&self, point: DVec2) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Strict overlap test. Boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Closest point on (or in) the box to `point`
    pub fn closest_point(&self, point: DVec2) -> DVec2 {
        DVec2::new(
            point.x.max(self.x).min(self.right()),
            point.y.max(self.y).min(self.bottom()),
        )
    }

    /// Merge with another AABB
    pub fn merge(&self, other: &Aabb) -> Aabb {
        let min = self.min().min(other.min());
        let max = self.max().max(other.max());
        Aabb::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }
}

/// Rotate `v` counter-clockwise (in a y-up frame) by `angle` radians
pub fn rotate(v: DVec2, angle: f64) -> DVec2 {
    let (sin, cos) = angle.sin_cos();
    DVec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}
