use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub movement: MovementConfig,
    pub infection: InfectionConfig,
    pub world: WorldConfig,
    pub output: OutputConfig,

    /// Fixed travel targets; empty means no agent is ever routed anywhere.
    #[serde(default)]
    pub destinations: Vec<DestinationConfig>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of citizens; sizes the population table for the whole run.
    pub population_size: usize,
    /// Mean of the speed distribution used at init and on refresh.
    pub init_avg_speed: f64,
    /// Number of ticks to simulate per run.
    pub ticks: u64,
    /// RNG seed; absent means seeding from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MovementConfig {
    /// Per-tick probability of resampling each of heading-x, heading-y and
    /// speed (three independent trials per agent).
    pub heading_update_probability: f64,
    pub heading_multiplicator: f64,
    pub speed_multiplicator: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct InfectionConfig {
    /// Half-width of the square infection zone around a sick agent.
    pub infection_range: f64,
    /// Per-candidate transmission probability inside the zone.
    pub infection_probability: f64,
    /// Recovery countdown is drawn uniformly from `from..to` (ticks).
    pub recovery_duration_from: u32,
    pub recovery_duration_to: u32,
    /// Tick at which the single seed infection fires.
    pub first_infection_tick: u64,
    /// Probability that a resolving agent dies instead of turning immune.
    #[serde(default = "default_mortality_probability")]
    pub mortality_probability: f64,
    /// Reproduce the upstream model's quirk of using `infection_range` as
    /// the transmission probability. Off by default.
    #[serde(default)]
    pub use_range_as_probability: bool,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
    /// Inward shrink applied to both axes when placing agents at init.
    pub padding: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// A trajectory frame is written every this many ticks.
    pub ticks_per_frame: u64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub x: f64,
    pub y: f64,
    pub wander_range_x: f64,
    pub wander_range_y: f64,
}

fn default_mortality_probability() -> f64 {
    0.2
}

impl WorldConfig {
    pub fn x_bounds(&self) -> (f64, f64) {
        (self.x_min as f64, self.x_max as f64)
    }

    pub fn y_bounds(&self) -> (f64, f64) {
        (self.y_min as f64, self.y_max as f64)
    }
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_num(self.simulation.population_size, 1..100_000)
            .context("invalid population size")?;
        check_pos(self.simulation.init_avg_speed).context("invalid initial average speed")?;
        check_num(self.simulation.ticks, 1..).context("invalid number of ticks")?;

        check_num(self.movement.heading_update_probability, 0.0..=1.0)
            .context("invalid heading update probability")?;
        check_pos(self.movement.heading_multiplicator).context("invalid heading multiplicator")?;
        check_pos(self.movement.speed_multiplicator).context("invalid speed multiplicator")?;

        check_num(self.infection.infection_range, 0.0..).context("invalid infection range")?;
        check_num(self.infection.infection_probability, 0.0..=1.0)
            .context("invalid infection probability")?;
        check_num(self.infection.mortality_probability, 0.0..=1.0)
            .context("invalid mortality probability")?;
        check_num(self.infection.recovery_duration_from, 1..)
            .context("invalid lower recovery duration")?;
        check_num(
            self.infection.recovery_duration_to,
            self.infection.recovery_duration_from..,
        )
        .context("invalid upper recovery duration")?;

        self.validate_world().context("invalid world")?;

        check_num(self.output.ticks_per_frame, 1..).context("invalid ticks per frame")?;

        for (idx, dest) in self.destinations.iter().enumerate() {
            check_pos(dest.wander_range_x)
                .with_context(|| format!("invalid x wander range of destination {idx}"))?;
            check_pos(dest.wander_range_y)
                .with_context(|| format!("invalid y wander range of destination {idx}"))?;
        }

        Ok(())
    }

    fn validate_world(&self) -> Result<()> {
        let world = &self.world;
        if world.x_min >= world.x_max {
            bail!("x bounds must satisfy min < max, but are {world:?}");
        }
        if world.y_min >= world.y_max {
            bail!("y bounds must satisfy min < max, but are {world:?}");
        }
        check_num(world.padding, 0.0..).context("invalid padding")?;

        // The padded placement interval must stay non-empty on both axes.
        let x_extent = (world.x_max - world.x_min) as f64;
        let y_extent = (world.y_max - world.y_min) as f64;
        if 2.0 * world.padding >= x_extent || 2.0 * world.padding >= y_extent {
            bail!(
                "padding {} leaves no room inside the world bounds",
                world.padding
            );
        }

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_pos(num: f64) -> Result<()> {
    if !(num > 0.0 && num.is_finite()) {
        bail!("number must be positive and finite, but is {num:?}");
    }
    Ok(())
}
