//! Time Management
//!
//! Fixed-step bookkeeping for drivers that run the simulation at a constant
//! rate while frames arrive at a variable one.

/// Fixed time step configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTimeStep {
    /// Fixed timestep in seconds
    pub step: f64,
    /// Maximum number of fixed updates per frame (to prevent spiral of death)
    pub max_updates: u32,
}

impl Default for FixedTimeStep {
    fn default() -> Self {
        Self {
            step: 1.0 / 60.0, // 60 Hz
            max_updates: 8,
        }
    }
}

impl FixedTimeStep {
    /// Create a new fixed time step with the given frequency
    pub fn from_hz(hz: f64) -> Self {
        Self::from_step(1.0 / hz)
    }

    /// Create a new fixed time step with the given step size
    pub fn from_step(step: f64) -> Self {
        Self {
            step,
            ..Self::default()
        }
    }

    /// Set the maximum number of updates per frame
    pub fn with_max_updates(mut self, max: u32) -> Self {
        self.max_updates = max.max(1);
        self
    }
}

/// Accumulator that turns variable frame time into whole fixed steps
#[derive(Debug, Clone)]
pub struct FixedStepClock {
    config: FixedTimeStep,
    accumulator: f64,
    steps_run: u64,
    dropped_time: f64,
}

impl FixedStepClock {
    pub fn new(config: FixedTimeStep) -> Self {
        Self {
            config,
            accumulator: 0.0,
            steps_run: 0,
            dropped_time: 0.0,
        }
    }

    pub fn config(&self) -> &FixedTimeStep {
        &self.config
    }

    /// Feed one frame's elapsed time and get the number of fixed steps due.
    ///
    /// At most `max_updates` steps are returned; whatever backlog remains past
    /// the cap beyond one partial step is discarded and added to `dropped_time`.
    pub fn advance(&mut self, frame_delta: f64) -> u32 {
        if frame_delta.is_finite() && frame_delta > 0.0 {
            self.accumulator += frame_delta;
        }

        let step = self.config.step;
        let mut due = 0;
        while self.accumulator >= step && due < self.config.max_updates {
            self.accumulator -= step;
            due += 1;
        }

        if self.accumulator >= step {
            let kept = self.accumulator % step;
            self.dropped_time += self.accumulator - kept;
            self.accumulator = kept;
        }

        self.steps_run += u64::from(due);
        due
    }

    /// Fraction of a step left in the accumulator, for render interpolation
    pub fn interpolation_alpha(&self) -> f64 {
        (self.accumulator / self.config.step).clamp(0.0, 1.0)
    }

    /// Total fixed steps handed out so far
    pub fn steps_run(&self) -> u64 {
        self.steps_run
    }

    pub fn accumulated(&self) -> f64 {
        self.accumulator
    }

    /// Simulation time thrown away by the spiral-of-death guard
    pub fn dropped_time(&self) -> f64 {
        self.dropped_time
    }
}

impl Default for FixedStepClock {
    fn default() -> Self {
        Self::new(FixedTimeStep::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_time_step() {
        let fts = FixedTimeStep::from_hz(60.0);
        assert!((fts.step - 1.0 / 60.0).abs() < 0.0001);
        assert_eq!(fts.max_updates, 8);
        assert_eq!(fts.with_max_updates(0).max_updates, 1);
    }

    #[test]
    fn test_clock_accumulates_partial_frames() {
        let mut clock = FixedStepClock::new(FixedTimeStep::from_step(0.01));

        assert_eq!(clock.advance(0.004), 0);
        assert_eq!(clock.advance(0.004), 0);
        assert_eq!(clock.advance(0.004), 1);
        assert!((clock.accumulated() - 0.002).abs() < 1e-9);
        assert!((clock.interpolation_alpha() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_clock_runs_multiple_steps_per_frame() {
        let mut clock = FixedStepClock::new(FixedTimeStep::from_step(0.25));
        assert_eq!(clock.advance(0.75), 3);
        assert_eq!(clock.steps_run(), 3);
    }

    #[test]
    fn test_clock_caps_substeps_and_drops_backlog() {
        let config = FixedTimeStep::from_step(0.25).with_max_updates(2);
        let mut clock = FixedStepClock::new(config);

        assert_eq!(clock.advance(1.6), 2);
        assert!((clock.dropped_time() - 1.0).abs() < 1e-9);
        assert!(clock.accumulated() < 0.25);

        // Backlog is gone, so the next small frame does not trigger a burst
        assert_eq!(clock.advance(0.1), 0);
    }

    #[test]
    fn test_clock_ignores_invalid_deltas() {
        let mut clock = FixedStepClock::default();
        assert_eq!(clock.advance(-1.0), 0);
        assert_eq!(clock.advance(f64::NAN), 0);
        assert_eq!(clock.accumulated(), 0.0);
    }
}
