//! # Planar CLI
//!
//! Command-line scenario runner for the Planar physics engine.
//!
//! ## Commands
//! - `run` - Simulate a scenario file and report the final state
//! - `demo` - Simulate a built-in scenario

pub mod scenario;

use std::fs;
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use planar_core::{DVec2, FixedStepClock, FixedTimeStep, Transform2D};
use planar_physics::{PhysicsStep, Profiled, RigidBody, StepStats, Stepper};
use serde::Serialize;

use crate::scenario::{Demo, Scenario};

/// Planar physics CLI
#[derive(Parser)]
#[command(name = "planar")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Simulate a scenario file
    Run {
        /// Scenario JSON file
        scenario: PathBuf,

        #[command(flatten)]
        options: StepOptions,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Simulate a built-in scenario
    Demo {
        /// Scenario to run
        #[arg(value_enum)]
        name: Demo,

        #[command(flatten)]
        options: StepOptions,
    },
}

/// Stepping parameters shared by every command
#[derive(clap::Args, Debug, Clone, Copy, PartialEq)]
pub struct StepOptions {
    /// Fixed steps to simulate
    #[arg(short = 'n', long, default_value_t = 240)]
    pub steps: u64,

    /// Fixed step size in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    pub dt: f64,

    /// Simulated frame time fed to the clock, defaults to `dt`
    #[arg(long)]
    pub frame_time: Option<f64>,

    /// Most fixed steps run per frame
    #[arg(long, default_value_t = 4)]
    pub max_substeps: u32,
}

/// Final state of one body
#[derive(Debug, Serialize)]
pub struct BodyReport {
    pub name: String,
    pub entity: String,
    pub position: DVec2,
    pub velocity: DVec2,
    pub sleeping: bool,
}

/// Wall-clock cost of the simulated steps
#[derive(Debug, Serialize)]
pub struct TimingReport {
    pub mean_us: f64,
    pub max_us: f64,
    pub total_ms: f64,
}

/// Outcome of a simulation run
#[derive(Debug, Serialize)]
pub struct Report {
    pub steps: u64,
    pub frames: u64,
    pub simulated_seconds: f64,
    pub dropped_seconds: f64,
    pub last_step: StepStats,
    pub timing: TimingReport,
    pub bodies: Vec<BodyReport>,
}

/// Step `scenario` through a fixed-step clock until `options.steps` steps ran
pub fn simulate(scenario: &Scenario, options: StepOptions) -> Result<Report> {
    ensure!(
        options.dt.is_finite() && options.dt > 0.0,
        "dt must be finite and > 0 (got {})",
        options.dt
    );
    let frame_time = options.frame_time.unwrap_or(options.dt);
    ensure!(
        frame_time.is_finite() && frame_time > 0.0,
        "frame time must be finite and > 0 (got {frame_time})"
    );

    let mut spawned = scenario.spawn()?;
    let step = PhysicsStep::new(scenario.config.clone()).context("invalid physics config")?;
    let mut stepper = Profiled::new(step);
    let mut clock = FixedStepClock::new(
        FixedTimeStep::from_step(options.dt).with_max_updates(options.max_substeps),
    );

    let mut steps = 0;
    let mut frames = 0;
    while steps < options.steps {
        let due = u64::from(clock.advance(frame_time));
        frames += 1;
        for _ in 0..due.min(options.steps - steps) {
            stepper
                .update(options.dt, &mut spawned.world)
                .with_context(|| format!("physics step {steps} failed"))?;
            steps += 1;
        }
    }
    log::info!(
        "simulated {steps} steps over {frames} frames ({} bodies)",
        spawned.bodies.len()
    );
    if clock.dropped_time() > 0.0 {
        log::warn!(
            "clock dropped {:.4}s of backlog; raise --max-substeps or lower --frame-time",
            clock.dropped_time()
        );
    }

    let bodies = spawned
        .bodies
        .iter()
        .map(|(name, entity)| {
            let position = spawned
                .world
                .get_component::<Transform2D>(*entity)
                .map(|t| t.position)
                .unwrap_or_default();
            let body = spawned.world.get_component::<RigidBody>(*entity);
            BodyReport {
                name: name.clone(),
                entity: entity.to_string(),
                position,
                velocity: body.map(RigidBody::velocity).unwrap_or_default(),
                sleeping: body.is_some_and(RigidBody::is_sleeping),
            }
        })
        .collect();

    let timing = stepper.timing();
    Ok(Report {
        steps,
        frames,
        simulated_seconds: steps as f64 * options.dt,
        dropped_seconds: clock.dropped_time(),
        last_step: stepper.last_step_stats(),
        timing: TimingReport {
            mean_us: timing.mean().as_secs_f64() * 1e6,
            max_us: timing.max.as_secs_f64() * 1e6,
            total_ms: timing.total.as_secs_f64() * 1e3,
        },
        bodies,
    })
}

fn emit(report: &Report, output: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    match output {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match cli.command {
        Commands::Run {
            scenario,
            options,
            output,
        } => {
            log::info!("Loading scenario {}...", scenario.display());
            let text = fs::read_to_string(&scenario)
                .with_context(|| format!("failed to read {}", scenario.display()))?;
            let scenario = Scenario::from_json(&text)?;
            let report = simulate(&scenario, options)?;
            emit(&report, output)?;
        }

        Commands::Demo { name, options } => {
            log::info!("Running demo {:?}...", name);
            let report = simulate(&name.scenario(), options)?;
            emit(&report, None)?;
        }
    }

    Ok(())
}
