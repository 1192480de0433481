//! Epidemic engine: seeding, spread and recovery/death resolution.

use crate::config::InfectionConfig;
use crate::population::{EpidemicState, Population, sample_recovery_duration};
use anyhow::Result;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;

/// Infect one uniformly-chosen citizen when the first-infection tick is
/// reached. Returns `true` on the tick the seed fires; the caller must skip
/// the spread pass for that tick.
pub fn seed(
    infection: &InfectionConfig,
    population: &mut Population,
    tick: u64,
    rng: &mut ChaCha12Rng,
) -> Result<bool> {
    if tick != infection.first_infection_tick {
        return Ok(false);
    }

    let id = rng.random_range(0..population.len());
    log::info!("seeding infection at tick {tick}, citizen id {id}");
    make_sick(infection, population, id, tick, rng)?;

    Ok(true)
}

/// One spread pass: every sick citizen exposes the healthy citizens strictly
/// inside its square infection zone, each with an independent draw.
pub fn spread(
    infection: &InfectionConfig,
    population: &mut Population,
    tick: u64,
    rng: &mut ChaCha12Rng,
) -> Result<()> {
    // Snapshot the infectious set first so citizens infected during this
    // pass do not themselves transmit until the next tick.
    let sick: Vec<usize> = population
        .citizens
        .iter()
        .enumerate()
        .filter(|(_, c)| c.state == EpidemicState::Sick)
        .map(|(idx, _)| idx)
        .collect();

    let probability = if infection.use_range_as_probability {
        infection.infection_range
    } else {
        infection.infection_probability
    };

    for idx in sick {
        let zone = {
            let patient = &population.citizens[idx];
            (
                patient.x - infection.infection_range,
                patient.y - infection.infection_range,
                patient.x + infection.infection_range,
                patient.y + infection.infection_range,
            )
        };

        for candidate in 0..population.len() {
            let citizen = &population.citizens[candidate];
            if citizen.state != EpidemicState::Healthy {
                continue;
            }
            if citizen.x > zone.0 && citizen.y > zone.1 && citizen.x < zone.2 && citizen.y < zone.3
            {
                if rng.random::<f64>() < probability {
                    make_sick(infection, population, candidate, tick, rng)?;
                }
            }
        }
    }

    Ok(())
}

/// Age every sick citizen's countdown and resolve the ones that reach zero
/// to immune or dead. Citizens infected this very tick are left alone; their
/// countdown was just set.
pub fn resolve(
    infection: &InfectionConfig,
    population: &mut Population,
    tick: u64,
    rng: &mut ChaCha12Rng,
) {
    for citizen in population.citizens.iter_mut() {
        if citizen.state != EpidemicState::Sick {
            continue;
        }
        if citizen.infected_since == Some(tick) {
            continue;
        }

        citizen.recovery_duration -= 1;
        if citizen.recovery_duration == 0 {
            citizen.state = if rng.random::<f64>() <= infection.mortality_probability {
                EpidemicState::Dead
            } else {
                EpidemicState::Immune
            };
        }
    }
}

fn make_sick(
    infection: &InfectionConfig,
    population: &mut Population,
    index: usize,
    tick: u64,
    rng: &mut ChaCha12Rng,
) -> Result<()> {
    let duration = sample_recovery_duration(
        infection.recovery_duration_from,
        infection.recovery_duration_to,
        rng,
    )?;

    let citizen = &mut population.citizens[index];
    citizen.state = EpidemicState::Sick;
    citizen.recovery_duration = duration;
    citizen.infected_since = Some(tick);

    Ok(())
}
