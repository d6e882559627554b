//! # Planar Physics
//!
//! 2D rigid-body physics for the Planar engine.
//!
//! ## Features
//! - Rectangle, circle and height-field curve colliders
//! - Spatial hash broadphase with layer/mask filtering
//! - Sequential impulse solver with friction and positional correction
//! - Sleep and wake for settled bodies
//! - Deterministic contact ordering for reproducible runs
//!
//! The step reads bodies through [`BodyRegistry`], which [`planar_core::World`]
//! implements.

pub mod body;
pub mod broadphase;
pub mod collider;
pub mod config;
pub mod error;
pub mod narrowphase;
pub mod profile;
pub mod registry;
pub mod shape;
pub mod solver;

pub use body::{BodyType, RigidBody, RigidBodyDesc};
pub use broadphase::{Proxy, SpatialHash};
pub use collider::{Collider, LayerMask};
pub use config::{PhysicsConfig, StepStats};
pub use error::{PhysicsError, PhysicsResult, ShapeError};
pub use profile::{Profiled, StepTiming, Stepper};
pub use registry::BodyRegistry;
pub use shape::{Anchor, Circle, Curve, HeightFn, Rectangle, Shape};
pub use solver::{Contact, PairKey, PhysicsStep};
