//! Collider component: a shape plus anchor and collision filtering.

use planar_core::math::{Aabb, DVec2};
use planar_core::Transform2D;

use crate::error::ShapeError;
use crate::shape::{Anchor, Shape};

/// Collision layer mask
pub type LayerMask = u32;

/// Collider component
#[derive(Debug, Clone)]
pub struct Collider {
    shape: Shape,
    anchor: Anchor,
    layer: LayerMask,
    collision_mask: LayerMask,
}

impl Collider {
    /// Centre-anchored collider on layer 1 that collides with every layer
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            anchor: Anchor::Center,
            layer: 1,
            collision_mask: LayerMask::MAX,
        }
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_layer(mut self, layer: LayerMask) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_mask(mut self, mask: LayerMask) -> Self {
        self.collision_mask = mask;
        self
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn set_anchor(&mut self, anchor: Anchor) -> &mut Self {
        self.anchor = anchor;
        self
    }

    pub fn layer(&self) -> LayerMask {
        self.layer
    }

    pub fn set_layer(&mut self, layer: LayerMask) -> &mut Self {
        self.layer = layer;
        self
    }

    pub fn collision_mask(&self) -> LayerMask {
        self.collision_mask
    }

    pub fn set_mask(&mut self, mask: LayerMask) -> &mut Self {
        self.collision_mask = mask;
        self
    }

    /// Both colliders must accept each other's layer
    pub fn can_collide_with(&self, other: &Collider) -> bool {
        layers_compatible(self.layer, self.collision_mask, other.layer, other.collision_mask)
    }

    pub fn bbox(&self, transform: &Transform2D) -> Result<Aabb, ShapeError> {
        self.shape.aabb(transform, self.anchor)
    }

    pub fn resize(&mut self, primary: f64, secondary: Option<f64>) -> Result<(), ShapeError> {
        self.shape.resize(primary, secondary)
    }

    pub fn contains_point(&self, point: DVec2, transform: &Transform2D) -> bool {
        self.shape.contains_point(point, transform, self.anchor)
    }

    /// Overlap test. Always false for colliders filtered out by layer/mask.
    pub fn is_colliding(
        &self,
        transform: &Transform2D,
        other: &Collider,
        other_transform: &Transform2D,
    ) -> Result<bool, ShapeError> {
        if !self.can_collide_with(other) {
            return Ok(false);
        }
        self.shape.is_colliding_with(
            &other.shape,
            transform,
            self.anchor,
            other_transform,
            other.anchor,
        )
    }

    /// MTV pushing this collider out of `other`. `None` when filtered out by
    /// layer/mask or not overlapping.
    pub fn collision_normal(
        &self,
        transform: &Transform2D,
        other: &Collider,
        other_transform: &Transform2D,
    ) -> Result<Option<DVec2>, ShapeError> {
        if !self.can_collide_with(other) {
            return Ok(None);
        }
        self.shape.collision_normal(
            &other.shape,
            transform,
            self.anchor,
            other_transform,
            other.anchor,
        )
    }
}

/// Symmetric layer/mask test
pub fn layers_compatible(
    layer_a: LayerMask,
    mask_a: LayerMask,
    layer_b: LayerMask,
    mask_b: LayerMask,
) -> bool {
    (mask_a & layer_b) != 0 && (mask_b & layer_a) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(x: f64) -> (Collider, Transform2D) {
        (
            Collider::new(Shape::rectangle(10.0, 20.0).unwrap()),
            Transform2D::from_position(DVec2::new(x, 0.0)),
        )
    }

    #[test]
    fn test_bbox_uses_anchor() {
        let (collider, t) = boxed(0.0);
        assert_eq!(collider.bbox(&t).unwrap(), Aabb::new(-5.0, -10.0, 10.0, 20.0));

        let collider = collider.with_anchor(Anchor::TopLeft);
        assert_eq!(collider.anchor(), Anchor::TopLeft);
        assert_eq!(collider.bbox(&t).unwrap(), Aabb::new(0.0, 0.0, 10.0, 20.0));
    }

    #[test]
    fn test_is_colliding_contains_point_and_resize() {
        let (mut a, ta) = boxed(0.0);
        let (b, tb) = boxed(6.0);

        assert!(a.is_colliding(&ta, &b, &tb).unwrap());
        assert!(a.contains_point(DVec2::new(3.0, 3.0), &ta));

        // shrunk to x in [-1, 1], only touching b's left edge at x = 1
        a.resize(2.0, None).unwrap();
        assert_eq!(a.bbox(&ta).unwrap().width, 2.0);
        assert!(!a.is_colliding(&ta, &b, &tb).unwrap());
    }

    #[test]
    fn test_mask_test_is_symmetric() {
        let (a, ta) = boxed(0.0);
        let (b, tb) = boxed(2.0);
        let a = a.with_layer(0b01).with_mask(0b10);
        let b = b.with_layer(0b10).with_mask(0b10);

        // b does not accept a's layer
        assert!(!a.can_collide_with(&b));
        assert!(!b.can_collide_with(&a));
        assert!(!a.is_colliding(&ta, &b, &tb).unwrap());
        assert_eq!(a.collision_normal(&ta, &b, &tb).unwrap(), None);

        let b = b.with_mask(0b11);
        assert!(a.can_collide_with(&b));
        assert!(b.can_collide_with(&a));
        assert!(a.collision_normal(&ta, &b, &tb).unwrap().is_some());
    }

    #[test]
    fn test_setters() {
        let (mut collider, _) = boxed(0.0);
        collider.set_layer(4).set_mask(8).set_anchor(Anchor::TopLeft);
        assert_eq!(collider.layer(), 4);
        assert_eq!(collider.collision_mask(), 8);
        assert_eq!(collider.anchor(), Anchor::TopLeft);
    }
}
