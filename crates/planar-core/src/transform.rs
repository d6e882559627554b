//! 2D transforms
//!
//! Position, rotation and uniform scale for an entity. The physics core reads
//! these as world-space values and writes back positions.

use serde::{Deserialize, Serialize};

use crate::math::DVec2;

/// Transform component for entities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform2D {
    /// Position in world units
    pub position: DVec2,
    /// Rotation in radians
    pub rotation: f64,
    /// Uniform scale
    pub scale: f64,
}

impl Transform2D {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        position: DVec2::ZERO,
        rotation: 0.0,
        scale: 1.0,
    };

    /// Create a new transform from all components
    pub fn new(position: DVec2, rotation: f64, scale: f64) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Create a new transform with the given position
    pub fn from_position(position: DVec2) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Translate the transform
    pub fn translate(&mut self, delta: DVec2) -> &mut Self {
        self.position += delta;
        self
    }

    /// Add to the rotation
    pub fn rotate(&mut self, angle: f64) -> &mut Self {
        self.rotation += angle;
        self
    }

    /// Multiply the scale by `factor`
    pub fn scale_by(&mut self, factor: f64) -> &mut Self {
        self.scale *= factor;
        self
    }

    pub fn set_position(&mut self, position: DVec2) -> &mut Self {
        self.position = position;
        self
    }

    pub fn set_rotation(&mut self, rotation: f64) -> &mut Self {
        self.rotation = rotation;
        self
    }

    pub fn set_scale(&mut self, scale: f64) -> &mut Self {
        self.scale = scale;
        self
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_identity() {
        let t = Transform2D::default();
        assert_eq!(t.position, DVec2::ZERO);
        assert_eq!(t.rotation, 0.0);
        assert_eq!(t.scale, 1.0);
    }

    #[test]
    fn test_chained_mutation() {
        let mut t = Transform2D::from_position(DVec2::new(1.0, 2.0));
        t.translate(DVec2::new(3.0, -1.0)).rotate(0.5).scale_by(2.0);

        assert_eq!(t.position, DVec2::new(4.0, 1.0));
        assert_eq!(t.rotation, 0.5);
        assert_eq!(t.scale, 2.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let t: Transform2D = serde_json::from_str(r#"{ "position": [3.0, 4.0] }"#).unwrap();
        assert_eq!(t.position, DVec2::new(3.0, 4.0));
        assert_eq!(t.scale, 1.0);
    }
}
