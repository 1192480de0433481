//! Movement engine: boundary containment, stochastic heading/speed refresh
//! and position integration.

use crate::config::MovementConfig;
use crate::population::{Citizen, EpidemicState};
use anyhow::Result;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Bernoulli, Normal};

/// Resample an axis heading so the agent bounces back inside `(lower, upper)`.
///
/// The new heading magnitude is a fresh `Normal(0.5, 0.5/3)` draw clamped to
/// `[0.05, 1.0]`, not a mirror of the old value. Agents moving away from an
/// exceeded bound, or still inside, are left untouched.
pub fn bounce_axis(
    pos: f64,
    heading: &mut f64,
    bounds: (f64, f64),
    bounce_dist: &Normal<f64>,
    rng: &mut ChaCha12Rng,
) {
    let (lower, upper) = bounds;
    if pos <= lower && *heading < 0.0 {
        *heading = bounce_dist.sample(rng).clamp(0.05, 1.0);
    } else if pos >= upper && *heading > 0.0 {
        *heading = (-bounce_dist.sample(rng)).clamp(-1.0, -0.05);
    }
}

/// Bounce every citizen off the given rectangle, both axes independently.
pub fn enforce_bounds(
    citizens: &mut [Citizen],
    x_bounds: (f64, f64),
    y_bounds: (f64, f64),
    rng: &mut ChaCha12Rng,
) -> Result<()> {
    let bounce_dist = Normal::new(0.5, 0.5 / 3.0)?;

    for citizen in citizens.iter_mut() {
        bounce_axis(citizen.x, &mut citizen.heading_x, x_bounds, &bounce_dist, rng);
        bounce_axis(citizen.y, &mut citizen.heading_y, y_bounds, &bounce_dist, rng);
    }

    Ok(())
}

/// Stochastically resample headings and speeds.
///
/// Each citizen undergoes three independent Bernoulli trials per tick, one
/// per heading axis and one for speed. Dead citizens are never touched.
pub fn refresh_headings(
    movement: &MovementConfig,
    init_avg_speed: f64,
    citizens: &mut [Citizen],
    rng: &mut ChaCha12Rng,
) -> Result<()> {
    let update_dist = Bernoulli::new(movement.heading_update_probability)?;
    let heading_dist = Normal::new(0.0, 1.0 / 3.0)?;
    let speed_dist = Normal::new(init_avg_speed, init_avg_speed / 3.0)?;

    for citizen in citizens.iter_mut() {
        if citizen.state == EpidemicState::Dead {
            continue;
        }
        if update_dist.sample(rng) {
            citizen.heading_x = heading_dist.sample(rng) * movement.heading_multiplicator;
        }
        if update_dist.sample(rng) {
            citizen.heading_y = heading_dist.sample(rng) * movement.heading_multiplicator;
        }
        if update_dist.sample(rng) {
            citizen.speed = speed_dist.sample(rng) * movement.speed_multiplicator;
        }
    }

    Ok(())
}

/// Advance every position by `heading * speed`.
///
/// Applied uniformly, dead citizens included; their heading is zeroed at the
/// end of the tick they die, which neutralizes this step from then on.
pub fn integrate_positions(citizens: &mut [Citizen]) {
    for citizen in citizens.iter_mut() {
        citizen.x += citizen.heading_x * citizen.speed;
        citizen.y += citizen.heading_y * citizen.speed;
    }
}
