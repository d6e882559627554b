//! Solver configuration and per-step statistics.

use planar_core::math::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, PhysicsResult};

/// Physics step configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Units/s², y grows downward
    pub gravity: DVec2,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    pub max_penetration_correction: f64,
    pub penetration_slop: f64,
    pub sleep_linear_threshold: f64,
    pub sleep_time_threshold: f64,
    pub broadphase_cell_size: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: DVec2::new(0.0, 980.0),
            velocity_iterations: 4,
            position_iterations: 2,
            max_penetration_correction: 8.0,
            penetration_slop: 0.01,
            sleep_linear_threshold: 8.0,
            sleep_time_threshold: 0.35,
            broadphase_cell_size: 64.0,
        }
    }
}

impl PhysicsConfig {
    pub fn with_gravity(mut self, gravity: DVec2) -> Self {
        self.gravity = gravity;
        self
    }

    /// Normalized copy: iterations floored at 1, tolerances clamped at >= 0.
    pub fn validated(&self) -> PhysicsResult<Self> {
        let cell = self.broadphase_cell_size;
        if !cell.is_finite() || cell <= 0.0 {
            return Err(PhysicsError::InvalidCellSize(cell));
        }
        Ok(Self {
            gravity: self.gravity,
            velocity_iterations: self.velocity_iterations.max(1),
            position_iterations: self.position_iterations.max(1),
            max_penetration_correction: self.max_penetration_correction.max(0.0),
            penetration_slop: self.penetration_slop.max(0.0),
            sleep_linear_threshold: self.sleep_linear_threshold.max(0.0),
            sleep_time_threshold: self.sleep_time_threshold.max(0.0),
            broadphase_cell_size: cell,
        })
    }
}

/// Diagnostics from the most recent step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepStats {
    pub colliders: usize,
    pub broadphase_pairs: usize,
    pub contacts: usize,
    pub sleeping_bodies: usize,
}
