//! Entity collaborator seam consumed by the physics step.

use planar_core::{Entity, Transform2D, World};

use crate::body::RigidBody;
use crate::collider::Collider;

/// Source of bodies for [`crate::PhysicsStep::update`]
///
/// `bodies` must enumerate in a stable order for identical state, otherwise
/// stepping is not reproducible.
pub trait BodyRegistry {
    /// Every entity carrying a [`RigidBody`]
    fn bodies(&self) -> Vec<Entity>;

    fn transform_mut(&mut self, entity: Entity) -> Option<&mut Transform2D>;

    fn body_mut(&mut self, entity: Entity) -> Option<&mut RigidBody>;

    fn collider(&self, entity: Entity) -> Option<&Collider>;
}

impl BodyRegistry for World {
    fn bodies(&self) -> Vec<Entity> {
        self.entities_with::<RigidBody>()
    }

    fn transform_mut(&mut self, entity: Entity) -> Option<&mut Transform2D> {
        self.get_component_mut::<Transform2D>(entity)
    }

    fn body_mut(&mut self, entity: Entity) -> Option<&mut RigidBody> {
        self.get_component_mut::<RigidBody>(entity)
    }

    fn collider(&self, entity: Entity) -> Option<&Collider> {
        self.get_component::<Collider>(entity)
    }
}
