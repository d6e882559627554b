//! # Planar Core
//!
//! Core runtime library for the Planar 2D engine.
//!
//! This crate provides the foundational types the simulation crates build on:
//! - **ECS**: Generational entity store with per-type component storage
//! - **Math**: Double-precision 2D vectors and axis-aligned bounding boxes
//! - **Transform**: Position, rotation and uniform scale for entities
//! - **Time**: Fixed-step accumulation for deterministic simulation

pub mod ecs;
pub mod math;
pub mod time;
pub mod transform;

pub use ecs::{Component, Entity, World};
pub use math::{Aabb, DVec2};
pub use time::{FixedStepClock, FixedTimeStep};
pub use transform::Transform2D;
