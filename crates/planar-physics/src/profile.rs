//! Opt-in step profiling.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::StepStats;
use crate::error::PhysicsResult;
use crate::registry::BodyRegistry;
use crate::solver::PhysicsStep;

/// Anything that advances a registry by one fixed tick
pub trait Stepper {
    fn update(&mut self, dt: f64, registry: &mut dyn BodyRegistry) -> PhysicsResult<()>;

    fn last_step_stats(&self) -> StepStats;
}

impl Stepper for PhysicsStep {
    fn update(&mut self, dt: f64, registry: &mut dyn BodyRegistry) -> PhysicsResult<()> {
        PhysicsStep::update(self, dt, registry)
    }

    fn last_step_stats(&self) -> StepStats {
        PhysicsStep::last_step_stats(self)
    }
}

/// Accumulated wall-clock timing of wrapped steps
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StepTiming {
    pub steps: u64,
    pub last: Duration,
    pub total: Duration,
    pub max: Duration,
}

impl StepTiming {
    pub fn mean(&self) -> Duration {
        if self.steps == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos((self.total.as_nanos() / u128::from(self.steps)) as u64)
    }

    fn record(&mut self, elapsed: Duration) {
        self.steps += 1;
        self.last = elapsed;
        self.total += elapsed;
        self.max = self.max.max(elapsed);
    }
}

/// Times every step of the wrapped stepper inside a `physics_step` span
pub struct Profiled<S> {
    inner: S,
    timing: StepTiming,
}

impl<S: Stepper> Profiled<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            timing: StepTiming::default(),
        }
    }

    pub fn timing(&self) -> StepTiming {
        self.timing
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Stepper> Stepper for Profiled<S> {
    fn update(&mut self, dt: f64, registry: &mut dyn BodyRegistry) -> PhysicsResult<()> {
        let span = tracing::debug_span!("physics_step", step = self.timing.steps, dt);
        let _enter = span.enter();

        let start = Instant::now();
        let result = self.inner.update(dt, registry);
        self.timing.record(start.elapsed());

        if result.is_ok() {
            tracing::trace!(stats = ?self.inner.last_step_stats(), "step finished");
        }
        result
    }

    fn last_step_stats(&self) -> StepStats {
        self.inner.last_step_stats()
    }
}
