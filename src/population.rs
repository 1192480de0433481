//! The population table: one record per citizen, allocated once per run.

use crate::config::Config;
use anyhow::Result;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Normal, Uniform};
use serde::{Deserialize, Serialize};

/// Epidemic state of a citizen.
///
/// `Healthy` is the only starting state; `Immune` and `Dead` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpidemicState {
    Healthy,
    Sick,
    Immune,
    Dead,
}

/// One simulated individual. Mutated in place every tick; never removed
/// (death is a state flag, not a row deletion).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citizen {
    /// Unique, assigned sequentially at creation, immutable afterwards.
    pub id: usize,

    pub x: f64,
    pub y: f64,

    /// Signed direction multiplier, not necessarily unit length; combined
    /// with `speed` it forms the per-tick velocity.
    pub heading_x: f64,
    pub heading_y: f64,
    pub speed: f64,

    pub state: EpidemicState,
    /// Tick at which the citizen became sick; `None` while never infected.
    pub infected_since: Option<u64>,
    /// Countdown in ticks; only meaningful while sick.
    pub recovery_duration: u32,

    /// Index into the destination table; `None` means wandering.
    pub destination: Option<usize>,
    pub arrived: bool,
}

/// A fixed travel target with a small wander box around it.
///
/// The box half-extents are `wander_range / 2` on each side of the target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Destination {
    pub x: f64,
    pub y: f64,
    pub wander_range_x: f64,
    pub wander_range_y: f64,
}

impl Destination {
    /// Inclusive box bounds on the x axis.
    pub fn x_box(&self) -> (f64, f64) {
        let half = self.wander_range_x / 2.0;
        (self.x - half, self.x + half)
    }

    /// Inclusive box bounds on the y axis.
    pub fn y_box(&self) -> (f64, f64) {
        let half = self.wander_range_y / 2.0;
        (self.y - half, self.y + half)
    }
}

/// Per-state population counts for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub healthy: usize,
    pub sick: usize,
    pub immune: usize,
    pub dead: usize,
}

impl StateCounts {
    pub fn total(&self) -> usize {
        self.healthy + self.sick + self.immune + self.dead
    }
}

/// The canonical per-agent state store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Population {
    pub citizens: Vec<Citizen>,
}

impl Population {
    /// Create the initial population table.
    ///
    /// Positions are uniform within the padded world, headings are zero-mean
    /// Gaussian per axis, and a single speed sample and a single recovery
    /// duration sample are drawn once and broadcast to every citizen.
    pub fn initialize(cfg: &Config, rng: &mut ChaCha12Rng) -> Result<Self> {
        let size = cfg.simulation.population_size;
        log::info!("initializing population, size={size}");

        let (x_min, x_max) = cfg.world.x_bounds();
        let (y_min, y_max) = cfg.world.y_bounds();
        let padding = cfg.world.padding;

        let x_dist = Uniform::new(x_min + padding, x_max - padding)?;
        let y_dist = Uniform::new(y_min + padding, y_max - padding)?;
        let heading_dist = Normal::new(0.0, 1.0 / 3.0)?;

        let avg_speed = cfg.simulation.init_avg_speed;
        // One shared draw, broadcast to the whole population.
        let speed = Normal::new(avg_speed, avg_speed / 3.0)?.sample(rng);
        let recovery_duration = sample_recovery_duration(
            cfg.infection.recovery_duration_from,
            cfg.infection.recovery_duration_to,
            rng,
        )?;

        let mut citizens = Vec::with_capacity(size);
        for id in 0..size {
            citizens.push(Citizen {
                id,
                x: x_dist.sample(rng),
                y: y_dist.sample(rng),
                heading_x: heading_dist.sample(rng),
                heading_y: heading_dist.sample(rng),
                speed,
                state: EpidemicState::Healthy,
                infected_since: None,
                recovery_duration,
                destination: None,
                arrived: false,
            });
        }

        Ok(Self { citizens })
    }

    pub fn len(&self) -> usize {
        self.citizens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.citizens.is_empty()
    }

    /// Count citizens per epidemic state.
    pub fn state_counts(&self) -> StateCounts {
        let mut counts = StateCounts {
            healthy: 0,
            sick: 0,
            immune: 0,
            dead: 0,
        };
        for citizen in &self.citizens {
            match citizen.state {
                EpidemicState::Healthy => counts.healthy += 1,
                EpidemicState::Sick => counts.sick += 1,
                EpidemicState::Immune => counts.immune += 1,
                EpidemicState::Dead => counts.dead += 1,
            }
        }
        counts
    }

    /// Whether any citizen currently has an assigned destination.
    pub fn any_traveling(&self) -> bool {
        self.citizens.iter().any(|c| c.destination.is_some())
    }
}

/// Draw a recovery countdown uniformly from `from..to` (floor of a uniform
/// float draw, so `to` itself is excluded). A degenerate range yields `from`.
pub fn sample_recovery_duration(from: u32, to: u32, rng: &mut ChaCha12Rng) -> Result<u32> {
    if from == to {
        return Ok(from);
    }
    let dist = Uniform::new(from as f64, to as f64)?;
    Ok(dist.sample(rng) as u32)
}
