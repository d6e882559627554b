//! Narrow phase
//!
//! Exact overlap tests and minimum-translation vectors (MTV) between shape
//! pairs. Every pair is dispatched by an exhaustive match; mirrored pairs
//! reuse the same routine with the arguments swapped.
//!
//! The MTV returned by [`Shape::collision_normal`] is the displacement that
//! pushes `self` out of `other`.

use planar_core::math::{Aabb, DVec2};
use planar_core::Transform2D;

use crate::error::ShapeError;
use crate::shape::{Anchor, Circle, Curve, Rectangle, Shape};

/// Below this, two circle centres are treated as coincident
const COINCIDENT_EPSILON: f64 = 1e-12;

impl Shape {
    /// Symmetric overlap test
    pub fn is_colliding_with(
        &self,
        other: &Shape,
        transform_a: &Transform2D,
        anchor_a: Anchor,
        transform_b: &Transform2D,
        anchor_b: Anchor,
    ) -> Result<bool, ShapeError> {
        match (self, other) {
            (Shape::Curve(_), Shape::Curve(_)) => Err(unsupported(self, other)),
            (Shape::Rectangle(a), Shape::Rectangle(b)) => Ok(a
                .aabb(transform_a, anchor_a)
                .overlaps(&b.aabb(transform_b, anchor_b))),
            (Shape::Circle(a), Shape::Circle(b)) => {
                let delta = a.center(transform_a, anchor_a) - b.center(transform_b, anchor_b);
                let radius_sum = a.world_radius(transform_a) + b.world_radius(transform_b);
                Ok(delta.length_squared() < radius_sum * radius_sum)
            }
            (Shape::Circle(circle), Shape::Rectangle(rect)) => Ok(circle_overlaps_rect(
                circle,
                transform_a,
                anchor_a,
                &rect.aabb(transform_b, anchor_b),
            )),
            (Shape::Rectangle(rect), Shape::Circle(circle)) => Ok(circle_overlaps_rect(
                circle,
                transform_b,
                anchor_b,
                &rect.aabb(transform_a, anchor_a),
            )),
            (Shape::Curve(curve), _) => Ok(surface_depth(curve, transform_a, other, transform_b, anchor_b)?
                .is_some_and(|depth| depth >= 0.0)),
            (_, Shape::Curve(curve)) => Ok(surface_depth(curve, transform_b, self, transform_a, anchor_a)?
                .is_some_and(|depth| depth >= 0.0)),
        }
    }

    /// MTV pushing `self` out of `other`, or `None` if they do not overlap
    pub fn collision_normal(
        &self,
        other: &Shape,
        transform_a: &Transform2D,
        anchor_a: Anchor,
        transform_b: &Transform2D,
        anchor_b: Anchor,
    ) -> Result<Option<DVec2>, ShapeError> {
        match (self, other) {
            (Shape::Curve(_), Shape::Curve(_)) => Err(unsupported(self, other)),
            (Shape::Rectangle(a), Shape::Rectangle(b)) => Ok(rect_rect_mtv(
                &a.aabb(transform_a, anchor_a),
                &b.aabb(transform_b, anchor_b),
            )),
            (Shape::Circle(a), Shape::Circle(b)) => Ok(circle_circle_mtv(
                a.center(transform_a, anchor_a),
                a.world_radius(transform_a),
                b.center(transform_b, anchor_b),
                b.world_radius(transform_b),
            )),
            (Shape::Circle(circle), Shape::Rectangle(rect)) => Ok(circle_rect_mtv(
                circle,
                transform_a,
                anchor_a,
                &rect.aabb(transform_b, anchor_b),
            )),
            (Shape::Rectangle(rect), Shape::Circle(circle)) => Ok(circle_rect_mtv(
                circle,
                transform_b,
                anchor_b,
                &rect.aabb(transform_a, anchor_a),
            )
            .map(|mtv| -mtv)),
            // The curve is pushed down, away from whatever sits on it
            (Shape::Curve(curve), _) => {
                let depth = surface_depth(curve, transform_a, other, transform_b, anchor_b)?;
                Ok(depth.filter(|d| *d > 0.0).map(|d| DVec2::new(0.0, d)))
            }
            (_, Shape::Curve(curve)) => {
                let depth = surface_depth(curve, transform_b, self, transform_a, anchor_a)?;
                Ok(depth.filter(|d| *d > 0.0).map(|d| DVec2::new(0.0, -d)))
            }
        }
    }
}

fn unsupported(a: &Shape, b: &Shape) -> ShapeError {
    ShapeError::UnsupportedPair(a.kind(), b.kind())
}

fn circle_overlaps_rect(circle: &Circle, transform: &Transform2D, anchor: Anchor, rect: &Aabb) -> bool {
    let center = circle.center(transform, anchor);
    let r = circle.world_radius(transform);
    (center - rect.closest_point(center)).length_squared() < r * r
}

/// Push `a` out of `b` along the axis of least overlap
fn rect_rect_mtv(a: &Aabb, b: &Aabb) -> Option<DVec2> {
    let delta = b.center() - a.center();
    let overlap_x = (a.width + b.width) * 0.5 - delta.x.abs();
    let overlap_y = (a.height + b.height) * 0.5 - delta.y.abs();

    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return None;
    }

    if overlap_x < overlap_y {
        let x = if delta.x > 0.0 { -overlap_x } else { overlap_x };
        Some(DVec2::new(x, 0.0))
    } else {
        let y = if delta.y > 0.0 { -overlap_y } else { overlap_y };
        Some(DVec2::new(0.0, y))
    }
}

/// Push circle `a` out of circle `b`. Coincident centres separate along +X.
fn circle_circle_mtv(center_a: DVec2, radius_a: f64, center_b: DVec2, radius_b: f64) -> Option<DVec2> {
    let delta = center_a - center_b;
    let radius_sum = radius_a + radius_b;
    let distance_sq = delta.length_squared();
    if distance_sq >= radius_sum * radius_sum {
        return None;
    }

    let distance = distance_sq.sqrt();
    if distance <= COINCIDENT_EPSILON {
        return Some(DVec2::new(radius_sum, 0.0));
    }
    Some(delta / distance * (radius_sum - distance))
}

/// Push the circle out of the rectangle's box
fn circle_rect_mtv(circle: &Circle, transform: &Transform2D, anchor: Anchor, rect: &Aabb) -> Option<DVec2> {
    let center = circle.center(transform, anchor);
    let r = circle.world_radius(transform);
    let delta = center - rect.closest_point(center);
    let distance_sq = delta.length_squared();

    if distance_sq > 0.0 {
        if distance_sq >= r * r {
            return None;
        }
        let distance = distance_sq.sqrt();
        return Some(delta / distance * (r - distance));
    }

    // Centre is inside or on the boundary: leave through the nearest edge
    let exits = [
        (center.x - rect.x, DVec2::NEG_X),
        (rect.right() - center.x, DVec2::X),
        (center.y - rect.y, DVec2::NEG_Y),
        (rect.bottom() - center.y, DVec2::Y),
    ];
    let (distance, direction) = exits
        .into_iter()
        .fold(exits[0], |best, exit| if exit.0 < best.0 { exit } else { best });
    Some(direction * (distance + r))
}

/// How far the lowest point of `other` reaches below the curve's surface.
/// Negative when it is clear of the surface, `None` when it lies outside the
/// curve's horizontal span.
fn surface_depth(
    curve: &Curve,
    curve_transform: &Transform2D,
    other: &Shape,
    transform: &Transform2D,
    anchor: Anchor,
) -> Result<Option<f64>, ShapeError> {
    let span = curve.aabb(curve_transform)?;
    let extent = other.aabb(transform, anchor)?;
    if extent.right() <= span.x || extent.x >= span.right() {
        return Ok(None);
    }

    let depth = match other {
        Shape::Rectangle(rect) => rect_surface_depth(curve, rect, transform, anchor),
        Shape::Circle(circle) => {
            let center = circle.center(transform, anchor);
            center.y + circle.world_radius(transform) - curve.height_at(center.x)
        }
        Shape::Curve(_) => return Err(ShapeError::UnsupportedPair("curve", other.kind())),
    };
    Ok(Some(depth))
}

fn rect_surface_depth(curve: &Curve, rect: &Rectangle, transform: &Transform2D, anchor: Anchor) -> f64 {
    let aabb = rect.aabb(transform, anchor);
    let surface = curve.height_at(aabb.x).min(curve.height_at(aabb.right()));
    aabb.bottom() - surface
}
