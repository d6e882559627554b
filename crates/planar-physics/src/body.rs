//! Rigid body component

use planar_core::math::DVec2;
use serde::{Deserialize, Serialize};

/// Smallest mass a body may carry
pub const MIN_MASS: f64 = 1e-4;

/// Rigid body type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    Static,
    Kinematic,
    #[default]
    Dynamic,
}

/// Serializable construction record for a [`RigidBody`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidBodyDesc {
    pub body_type: BodyType,
    pub mass: f64,
    pub restitution: f64,
    pub friction: f64,
    pub gravity_scale: f64,
    pub linear_damping: f64,
    /// Defaults to true for dynamic bodies
    pub can_sleep: Option<bool>,
}

impl Default for RigidBodyDesc {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            mass: 1.0,
            restitution: 0.0,
            friction: 0.2,
            gravity_scale: 1.0,
            linear_damping: 0.0,
            can_sleep: None,
        }
    }
}

/// Rigid body component
///
/// Point-mass, translation only. Every mutator keeps the body consistent:
/// only dynamic bodies sleep, take forces or take impulses.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    body_type: BodyType,
    mass: f64,
    restitution: f64,
    friction: f64,
    gravity_scale: f64,
    linear_damping: f64,
    can_sleep: bool,
    is_sleeping: bool,
    velocity: DVec2,
    pending_forces: DVec2,
    sleep_time: f64,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::from_desc(&RigidBodyDesc::default())
    }
}

fn clamp_unit(value: f64) -> f64 {
    value.max(0.0).min(1.0)
}

impl RigidBody {
    pub fn from_desc(desc: &RigidBodyDesc) -> Self {
        let dynamic = desc.body_type == BodyType::Dynamic;
        Self {
            body_type: desc.body_type,
            mass: desc.mass.max(MIN_MASS),
            restitution: clamp_unit(desc.restitution),
            friction: clamp_unit(desc.friction),
            gravity_scale: desc.gravity_scale.max(0.0),
            linear_damping: desc.linear_damping.max(0.0),
            can_sleep: dynamic && desc.can_sleep.unwrap_or(true),
            is_sleeping: false,
            velocity: DVec2::ZERO,
            pending_forces: DVec2::ZERO,
            sleep_time: 0.0,
        }
    }

    pub fn dynamic(mass: f64) -> Self {
        Self::from_desc(&RigidBodyDesc {
            mass,
            ..Default::default()
        })
    }

    pub fn kinematic() -> Self {
        Self::from_desc(&RigidBodyDesc {
            body_type: BodyType::Kinematic,
            ..Default::default()
        })
    }

    pub fn new_static() -> Self {
        Self::from_desc(&RigidBodyDesc {
            body_type: BodyType::Static,
            ..Default::default()
        })
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Zero for anything but dynamic bodies
    pub fn inv_mass(&self) -> f64 {
        if self.is_dynamic() {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    pub fn restitution(&self) -> f64 {
        self.restitution
    }

    pub fn friction(&self) -> f64 {
        self.friction
    }

    pub fn gravity_scale(&self) -> f64 {
        self.gravity_scale
    }

    pub fn linear_damping(&self) -> f64 {
        self.linear_damping
    }

    pub fn can_sleep(&self) -> bool {
        self.can_sleep
    }

    pub fn is_sleeping(&self) -> bool {
        self.is_sleeping
    }

    pub fn velocity(&self) -> DVec2 {
        self.velocity
    }

    pub fn pending_forces(&self) -> DVec2 {
        self.pending_forces
    }

    pub fn sleep_time(&self) -> f64 {
        self.sleep_time
    }

    pub fn set_body_type(&mut self, body_type: BodyType) {
        self.body_type = body_type;
        if body_type != BodyType::Dynamic {
            self.can_sleep = false;
            self.is_sleeping = false;
            self.sleep_time = 0.0;
            self.pending_forces = DVec2::ZERO;
        }
    }

    pub fn set_mass(&mut self, mass: f64) {
        self.mass = mass.max(MIN_MASS);
    }

    pub fn set_restitution(&mut self, restitution: f64) {
        self.restitution = clamp_unit(restitution);
    }

    pub fn set_friction(&mut self, friction: f64) {
        self.friction = clamp_unit(friction);
    }

    pub fn set_gravity_scale(&mut self, scale: f64) {
        self.gravity_scale = scale.max(0.0);
    }

    pub fn set_linear_damping(&mut self, damping: f64) {
        self.linear_damping = damping.max(0.0);
    }

    /// Ignored for non-dynamic bodies. Disabling sleep wakes the body.
    pub fn set_can_sleep(&mut self, can_sleep: bool) {
        self.can_sleep = can_sleep && self.is_dynamic();
        if !self.can_sleep {
            self.wake();
        }
    }

    pub fn set_velocity(&mut self, velocity: DVec2) {
        self.velocity = velocity;
        if self.is_dynamic() && velocity.length_squared() > 0.0 {
            self.wake();
        }
    }

    /// Integration result; leaves the sleep timer alone
    pub(crate) fn set_integrated_velocity(&mut self, velocity: DVec2) {
        self.velocity = velocity;
    }

    pub fn add_force(&mut self, force: DVec2) {
        if !self.is_dynamic() {
            return;
        }
        self.pending_forces += force;
        if force.length_squared() > 0.0 {
            self.wake();
        }
    }

    /// Returns and clears the accumulated force
    pub fn consume_forces(&mut self) -> DVec2 {
        std::mem::take(&mut self.pending_forces)
    }

    pub fn apply_impulse(&mut self, impulse: DVec2) {
        if !self.is_dynamic() {
            return;
        }
        self.velocity += impulse * self.inv_mass();
        if impulse.length_squared() > 0.0 {
            self.wake();
        }
    }

    pub fn wake(&mut self) {
        self.is_sleeping = false;
        self.sleep_time = 0.0;
    }

    pub fn sleep(&mut self) {
        if !self.can_sleep || !self.is_dynamic() {
            return;
        }
        self.is_sleeping = true;
        self.velocity = DVec2::ZERO;
        self.pending_forces = DVec2::ZERO;
    }

    pub fn accumulate_sleep_time(&mut self, dt: f64) {
        self.sleep_time += dt;
    }

    pub fn reset_sleep_time(&mut self) {
        self.sleep_time = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let body = RigidBody::default();
        assert_eq!(body.body_type(), BodyType::Dynamic);
        assert_eq!(body.mass(), 1.0);
        assert_eq!(body.inv_mass(), 1.0);
        assert_eq!(body.friction(), 0.2);
        assert_eq!(body.restitution(), 0.0);
        assert_eq!(body.gravity_scale(), 1.0);
        assert!(body.can_sleep());
        assert!(!body.is_sleeping());
    }

    #[test]
    fn test_desc_clamping() {
        let body = RigidBody::from_desc(&RigidBodyDesc {
            mass: 0.0,
            restitution: 3.0,
            friction: -1.0,
            gravity_scale: -2.0,
            linear_damping: -0.5,
            ..Default::default()
        });
        assert_eq!(body.mass(), MIN_MASS);
        assert_eq!(body.restitution(), 1.0);
        assert_eq!(body.friction(), 0.0);
        assert_eq!(body.gravity_scale(), 0.0);
        assert_eq!(body.linear_damping(), 0.0);

        let body = RigidBody::from_desc(&RigidBodyDesc {
            body_type: BodyType::Static,
            can_sleep: Some(true),
            ..Default::default()
        });
        assert!(!body.can_sleep());
    }

    #[test]
    fn test_desc_partial_json() {
        let desc: RigidBodyDesc =
            serde_json::from_str(r#"{"body_type": "kinematic", "friction": 0.7}"#).unwrap();
        assert_eq!(desc.body_type, BodyType::Kinematic);
        assert_eq!(desc.friction, 0.7);
        assert_eq!(desc.mass, 1.0);
    }

    #[test]
    fn test_non_dynamic_ignores_forces_and_impulses() {
        for mut body in [RigidBody::kinematic(), RigidBody::new_static()] {
            assert_eq!(body.inv_mass(), 0.0);
            body.add_force(DVec2::new(10.0, 0.0));
            body.apply_impulse(DVec2::new(0.0, 10.0));
            assert_eq!(body.pending_forces(), DVec2::ZERO);
            assert_eq!(body.velocity(), DVec2::ZERO);
            body.set_can_sleep(true);
            assert!(!body.can_sleep());
        }
    }

    #[test]
    fn test_forces_accumulate_and_consume() {
        let mut body = RigidBody::dynamic(2.0);
        body.add_force(DVec2::new(1.0, 2.0));
        body.add_force(DVec2::new(3.0, 4.0));
        assert_eq!(body.consume_forces(), DVec2::new(4.0, 6.0));
        assert_eq!(body.consume_forces(), DVec2::ZERO);
    }

    #[test]
    fn test_impulse_scales_by_inverse_mass() {
        let mut body = RigidBody::dynamic(4.0);
        body.apply_impulse(DVec2::new(8.0, -4.0));
        assert_eq!(body.velocity(), DVec2::new(2.0, -1.0));
    }

    #[test]
    fn test_sleep_and_wake() {
        let mut body = RigidBody::dynamic(1.0);
        body.set_velocity(DVec2::new(1.0, 1.0));
        body.add_force(DVec2::new(5.0, 0.0));
        body.accumulate_sleep_time(0.5);
        body.sleep();
        assert!(body.is_sleeping());
        assert_eq!(body.velocity(), DVec2::ZERO);
        assert_eq!(body.pending_forces(), DVec2::ZERO);

        body.apply_impulse(DVec2::new(0.0, 3.0));
        assert!(!body.is_sleeping());
        assert_eq!(body.sleep_time(), 0.0);
        assert!(body.velocity().y > 0.0);

        body.sleep();
        body.set_velocity(DVec2::new(-2.0, 0.0));
        assert!(!body.is_sleeping());
        assert_eq!(body.velocity(), DVec2::new(-2.0, 0.0));

        // zero-magnitude velocity leaves a sleeping body asleep
        body.sleep();
        body.set_velocity(DVec2::ZERO);
        assert!(body.is_sleeping());
    }

    #[test]
    fn test_sleep_disabled() {
        let mut body = RigidBody::dynamic(1.0);
        body.sleep();
        body.set_can_sleep(false);
        assert!(!body.is_sleeping());
        body.sleep();
        assert!(!body.is_sleeping());
    }

    #[test]
    fn test_set_body_type_clears_dynamic_state() {
        let mut body = RigidBody::dynamic(1.0);
        body.add_force(DVec2::new(1.0, 0.0));
        body.accumulate_sleep_time(0.2);
        body.sleep();
        body.set_body_type(BodyType::Kinematic);
        assert!(!body.is_sleeping());
        assert!(!body.can_sleep());
        assert_eq!(body.sleep_time(), 0.0);
        assert_eq!(body.pending_forces(), DVec2::ZERO);
        assert_eq!(body.inv_mass(), 0.0);

        body.set_body_type(BodyType::Dynamic);
        assert_eq!(body.inv_mass(), 1.0);
    }

    #[test]
    fn test_setters_clamp() {
        let mut body = RigidBody::default();
        body.set_mass(-3.0);
        body.set_restitution(1.5);
        body.set_friction(0.5);
        body.set_gravity_scale(-1.0);
        body.set_linear_damping(2.0);
        assert_eq!(body.mass(), MIN_MASS);
        assert_eq!(body.restitution(), 1.0);
        assert_eq!(body.friction(), 0.5);
        assert_eq!(body.gravity_scale(), 0.0);
        assert_eq!(body.linear_damping(), 2.0);
    }
}
