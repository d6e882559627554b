//! Collision shapes
//!
//! The shape set is closed: rectangles, circles and height-field curves. Each
//! variant computes its bounding box and point containment from the owning
//! transform and anchor. Pairwise overlap and separation live in
//! [`crate::narrowphase`].

use std::fmt;
use std::sync::Arc;

use planar_core::math::{rotate, Aabb, DVec2};
use planar_core::Transform2D;
use serde::{Deserialize, Serialize};

use crate::error::ShapeError;

/// Default horizontal span of a curve
pub const DEFAULT_CURVE_WIDTH: f64 = 9999.0;

/// Vertical extent of a curve's bounding box, centred on its transform
pub const CURVE_VERTICAL_EXTENT: f64 = 10_000.0;

/// Where the transform's position sits on the shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    #[default]
    Center,
    TopLeft,
}

fn validate(shape: &'static str, dimension: &'static str, value: f64) -> Result<f64, ShapeError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ShapeError::InvalidDimension {
            shape,
            dimension,
            value,
        })
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    width: f64,
    height: f64,
}

impl Rectangle {
    pub fn new(width: f64, height: f64) -> Result<Self, ShapeError> {
        Ok(Self {
            width: validate("rectangle", "width", width)?,
            height: validate("rectangle", "height", height)?,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Set the width and, if given, the height
    pub fn resize(&mut self, width: f64, height: Option<f64>) -> Result<(), ShapeError> {
        let width = validate("rectangle", "width", width)?;
        let height = match height {
            Some(h) => validate("rectangle", "height", h)?,
            None => self.height,
        };
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Bounding box of the scaled rectangle. A rotated rectangle is bounded
    /// by the box around its rotated corners, pivoting on the transform's
    /// position.
    pub fn aabb(&self, transform: &Transform2D, anchor: Anchor) -> Aabb {
        let scale = transform.scale.abs();
        let w = self.width * scale;
        let h = self.height * scale;
        let offset = match anchor {
            Anchor::Center => DVec2::new(-w * 0.5, -h * 0.5),
            Anchor::TopLeft => DVec2::ZERO,
        };

        if transform.rotation == 0.0 {
            let min = transform.position + offset;
            return Aabb::new(min.x, min.y, w, h);
        }

        let corners = [
            offset,
            offset + DVec2::new(w, 0.0),
            offset + DVec2::new(0.0, h),
            offset + DVec2::new(w, h),
        ];
        let mut min = DVec2::splat(f64::INFINITY);
        let mut max = DVec2::splat(f64::NEG_INFINITY);
        for corner in corners {
            let world = transform.position + rotate(corner, transform.rotation);
            min = min.min(world);
            max = max.max(world);
        }
        Aabb::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Exact containment: the point is rotated into the rectangle's local frame
    pub fn contains_point(&self, point: DVec2, transform: &Transform2D, anchor: Anchor) -> bool {
        let scale = transform.scale.abs();
        let w = self.width * scale;
        let h = self.height * scale;

        let mut local = point - transform.position;
        if transform.rotation != 0.0 {
            local = rotate(local, -transform.rotation);
        }
        if anchor == Anchor::Center {
            local += DVec2::new(w * 0.5, h * 0.5);
        }

        local.x >= 0.0 && local.x <= w && local.y >= 0.0 && local.y <= h
    }
}

/// Circle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    radius: f64,
}

impl Circle {
    pub fn new(radius: f64) -> Result<Self, ShapeError> {
        Ok(Self {
            radius: validate("circle", "radius", radius)?,
        })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f64) -> Result<(), ShapeError> {
        self.radius = validate("circle", "radius", radius)?;
        Ok(())
    }

    /// Radius after applying the transform's scale
    pub fn world_radius(&self, transform: &Transform2D) -> f64 {
        self.radius * transform.scale.abs()
    }

    /// World-space center
    pub fn center(&self, transform: &Transform2D, anchor: Anchor) -> DVec2 {
        match anchor {
            Anchor::Center => transform.position,
            Anchor::TopLeft => transform.position + DVec2::splat(self.world_radius(transform)),
        }
    }

    pub fn aabb(&self, transform: &Transform2D, anchor: Anchor) -> Aabb {
        let r = self.world_radius(transform);
        Aabb::from_center_half_extents(self.center(transform, anchor), DVec2::splat(r))
    }

    pub fn contains_point(&self, point: DVec2, transform: &Transform2D, anchor: Anchor) -> bool {
        let r = self.world_radius(transform);
        (point - self.center(transform, anchor)).length_squared() <= r * r
    }
}

/// Height function of a curve: world `x` to surface `y`
pub type HeightFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Static terrain surface. Everything at or below the surface (`y >= height(x)`)
/// is solid.
#[derive(Clone)]
pub struct Curve {
    height_fn: HeightFn,
    width: f64,
}

impl Curve {
    pub fn new(height_fn: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            height_fn: Arc::new(height_fn),
            width: DEFAULT_CURVE_WIDTH,
        }
    }

    pub fn with_width(
        height_fn: impl Fn(f64) -> f64 + Send + Sync + 'static,
        width: f64,
    ) -> Result<Self, ShapeError> {
        Ok(Self {
            height_fn: Arc::new(height_fn),
            width: validate("curve", "width", width)?,
        })
    }

    /// Surface height at world `x`
    pub fn height_at(&self, x: f64) -> f64 {
        (self.height_fn)(x)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Curves are immobile terrain: rotation and scale are rejected
    pub fn aabb(&self, transform: &Transform2D) -> Result<Aabb, ShapeError> {
        if transform.rotation != 0.0 {
            return Err(ShapeError::CurveRotation(transform.rotation));
        }
        if transform.scale != 1.0 {
            return Err(ShapeError::CurveScale(transform.scale));
        }
        Ok(Aabb::new(
            transform.position.x,
            transform.position.y - CURVE_VERTICAL_EXTENT * 0.5,
            self.width,
            CURVE_VERTICAL_EXTENT,
        ))
    }

    pub fn contains_point(&self, point: DVec2) -> bool {
        point.y >= self.height_at(point.x)
    }
}

impl fmt::Debug for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Curve")
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

/// Collision shape
#[derive(Debug, Clone)]
pub enum Shape {
    Rectangle(Rectangle),
    Circle(Circle),
    Curve(Curve),
}

impl Shape {
    pub fn rectangle(width: f64, height: f64) -> Result<Self, ShapeError> {
        Rectangle::new(width, height).map(Self::Rectangle)
    }

    pub fn circle(radius: f64) -> Result<Self, ShapeError> {
        Circle::new(radius).map(Self::Circle)
    }

    pub fn curve(height_fn: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self::Curve(Curve::new(height_fn))
    }

    /// Variant name, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rectangle(_) => "rectangle",
            Self::Circle(_) => "circle",
            Self::Curve(_) => "curve",
        }
    }

    pub fn is_curve(&self) -> bool {
        matches!(self, Self::Curve(_))
    }

    pub fn aabb(&self, transform: &Transform2D, anchor: Anchor) -> Result<Aabb, ShapeError> {
        match self {
            Self::Rectangle(rect) => Ok(rect.aabb(transform, anchor)),
            Self::Circle(circle) => Ok(circle.aabb(transform, anchor)),
            Self::Curve(curve) => curve.aabb(transform),
        }
    }

    pub fn contains_point(&self, point: DVec2, transform: &Transform2D, anchor: Anchor) -> bool {
        match self {
            Self::Rectangle(rect) => rect.contains_point(point, transform, anchor),
            Self::Circle(circle) => circle.contains_point(point, transform, anchor),
            Self::Curve(curve) => curve.contains_point(point),
        }
    }

    /// Change the intrinsic size. Rectangles take a width and optional height,
    /// circles take their radius in `primary`. Curves cannot be resized.
    pub fn resize(&mut self, primary: f64, secondary: Option<f64>) -> Result<(), ShapeError> {
        match self {
            Self::Rectangle(rect) => rect.resize(primary, secondary),
            Self::Circle(circle) => circle.set_radius(primary),
            Self::Curve(_) => Err(ShapeError::CurveResize),
        }
    }
}
