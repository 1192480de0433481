//! The simulation driver: owns all state and advances it one tick at a time.

use crate::config::Config;
use crate::destination;
use crate::infection;
use crate::movement;
use crate::population::{Citizen, Destination, EpidemicState, Population};
use crate::stats::StatTracker;
use anyhow::{Context, Result, bail};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use serde::Serialize;

/// Inset applied to the world bounds during the containment step, so agents
/// turn around just inside the edges.
const BOUNDS_INSET: f64 = 0.02;

/// A read-only snapshot of the population at one tick, for the rendering
/// collaborator (serialized into the trajectory stream).
#[derive(Serialize)]
pub struct Frame<'a> {
    pub tick: u64,
    pub citizens: &'a [Citizen],
}

/// Simulation driver.
///
/// Holds the configuration, population table, destination table, statistics
/// tracker and random number generator, and advances them through the fixed
/// per-tick pipeline. Construct with [`Simulation::new`].
pub struct Simulation {
    cfg: Config,
    population: Population,
    destinations: Vec<Destination>,
    tracker: StatTracker,
    rng: ChaCha12Rng,
    tick: u64,
}

impl Simulation {
    /// Create a new `Simulation` with a freshly initialized population.
    ///
    /// The RNG is seeded from the configuration when a seed is given, which
    /// makes the whole run deterministic, and from OS entropy otherwise.
    pub fn new(cfg: Config) -> Result<Self> {
        let mut rng = match cfg.simulation.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng()?,
        };

        let population =
            Population::initialize(&cfg, &mut rng).context("failed to initialize population")?;

        let destinations = cfg
            .destinations
            .iter()
            .map(|d| Destination {
                x: d.x,
                y: d.y,
                wander_range_x: d.wander_range_x,
                wander_range_y: d.wander_range_y,
            })
            .collect();

        Ok(Self {
            cfg,
            population,
            destinations,
            tracker: StatTracker::new(),
            rng,
            tick: 0,
        })
    }

    /// Advance the simulation by exactly one tick.
    ///
    /// Pipeline order matters: each step commits before the next begins, and
    /// later steps read fields written by earlier ones in the same tick.
    pub fn advance_one_tick(&mut self) -> Result<()> {
        log::debug!("performing tick {}", self.tick);

        // Destination phase, only while at least one citizen travels.
        // Arrival detection must precede steering and box holding.
        if self.population.any_traveling() {
            destination::detect_arrivals(&mut self.population.citizens, &self.destinations);
            destination::steer_toward(&mut self.population.citizens, &self.destinations);
            destination::hold_in_box(
                &mut self.population.citizens,
                &self.destinations,
                &mut self.rng,
            )
            .context("failed to hold citizens in wander boxes")?;
        }

        let (x_min, x_max) = self.cfg.world.x_bounds();
        let (y_min, y_max) = self.cfg.world.y_bounds();
        movement::enforce_bounds(
            &mut self.population.citizens,
            (x_min + BOUNDS_INSET, x_max - BOUNDS_INSET),
            (y_min + BOUNDS_INSET, y_max - BOUNDS_INSET),
            &mut self.rng,
        )
        .context("failed to enforce world bounds")?;

        movement::refresh_headings(
            &self.cfg.movement,
            self.cfg.simulation.init_avg_speed,
            &mut self.population.citizens,
            &mut self.rng,
        )
        .context("failed to refresh headings")?;

        movement::integrate_positions(&mut self.population.citizens);

        let seeded = infection::seed(
            &self.cfg.infection,
            &mut self.population,
            self.tick,
            &mut self.rng,
        )
        .context("failed to seed infection")?;
        if !seeded {
            infection::spread(
                &self.cfg.infection,
                &mut self.population,
                self.tick,
                &mut self.rng,
            )
            .context("failed to spread infection")?;
        }
        infection::resolve(
            &self.cfg.infection,
            &mut self.population,
            self.tick,
            &mut self.rng,
        );

        // The dead stop moving for good.
        for citizen in &mut self.population.citizens {
            if citizen.state == EpidemicState::Dead {
                citizen.heading_x = 0.0;
                citizen.heading_y = 0.0;
            }
        }

        let counts = self.population.state_counts();
        assert_eq!(
            counts.total(),
            self.population.len(),
            "state counts must sum to the population size"
        );
        self.tracker.record(counts, self.tick);

        self.tick += 1;

        Ok(())
    }

    /// Route a citizen toward a destination.
    pub fn send_to_destination(
        &mut self,
        citizen_id: usize,
        destination_index: usize,
    ) -> Result<()> {
        if destination_index >= self.destinations.len() {
            bail!(
                "destination index {destination_index} out of range (have {})",
                self.destinations.len()
            );
        }
        let citizen = self
            .population
            .citizens
            .get_mut(citizen_id)
            .with_context(|| format!("no citizen with id {citizen_id}"))?;
        destination::assign(citizen, destination_index);
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    pub fn tracker(&self) -> &StatTracker {
        &self.tracker
    }

    /// Current tick counter (number of completed ticks).
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Snapshot of the current population for the trajectory stream.
    ///
    /// The frame carries the tick of the last completed pipeline pass.
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            tick: self.tick.saturating_sub(1),
            citizens: &self.population.citizens,
        }
    }
}
