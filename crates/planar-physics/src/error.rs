//! Error types for shape construction, configuration and stepping.

use planar_core::Entity;
use thiserror::Error;

/// Shape errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("invalid {dimension} for {shape}: {value} (must be finite and > 0)")]
    InvalidDimension {
        shape: &'static str,
        dimension: &'static str,
        value: f64,
    },

    #[error("curve colliders do not support resizing")]
    CurveResize,

    #[error("curve colliders do not support rotation (got {0} rad)")]
    CurveRotation(f64),

    #[error("curve colliders do not support scaling (got {0})")]
    CurveScale(f64),

    #[error("unsupported shape pair: {0} vs {1}")]
    UnsupportedPair(&'static str, &'static str),
}

/// Physics errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("broadphase cell size must be finite and > 0 (got {0})")]
    InvalidCellSize(f64),

    #[error("shape error on entity {entity}: {source}")]
    Shape {
        entity: Entity,
        #[source]
        source: ShapeError,
    },
}

/// Result type for physics operations
pub type PhysicsResult<T> = Result<T, PhysicsError>;

pub(crate) trait ShapeResultExt<T> {
    fn for_entity(self, entity: Entity) -> PhysicsResult<T>;
}

impl<T> ShapeResultExt<T> for Result<T, ShapeError> {
    fn for_entity(self, entity: Entity) -> PhysicsResult<T> {
        self.map_err(|source| PhysicsError::Shape { entity, source })
    }
}
