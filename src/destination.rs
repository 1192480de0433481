//! Destination engine: travel targets, arrival detection and wander-box
//! containment for citizens that have reached their target.
//!
//! Within one tick, arrival detection must run before steering (so a citizen
//! that just arrived does not get its heading overwritten that tick) and
//! before box holding (so holding only applies to citizens already classified
//! as arrived).

use crate::movement::bounce_axis;
use crate::population::{Citizen, Destination};
use anyhow::Result;
use rand_chacha::ChaCha12Rng;
use rand_distr::Normal;

/// Route a citizen to a destination. Resets the arrival flag, so the citizen
/// starts traveling even if it was loitering somewhere else.
pub fn assign(citizen: &mut Citizen, destination_index: usize) {
    citizen.destination = Some(destination_index);
    citizen.arrived = false;
}

/// Mark traveling citizens whose position lies within their destination's
/// wander box (inclusive bounds on all four edges) as arrived.
pub fn detect_arrivals(citizens: &mut [Citizen], destinations: &[Destination]) {
    for citizen in citizens.iter_mut() {
        let Some(index) = citizen.destination else {
            continue;
        };
        if citizen.arrived {
            continue;
        }
        let dest = &destinations[index];
        let (x_lo, x_hi) = dest.x_box();
        let (y_lo, y_hi) = dest.y_box();
        if citizen.x >= x_lo && citizen.x <= x_hi && citizen.y >= y_lo && citizen.y <= y_hi {
            citizen.arrived = true;
        }
    }
}

/// Point every traveling, not-yet-arrived citizen straight at its target.
///
/// The heading is the raw difference vector, so its magnitude equals the
/// distance: citizens move faster the farther they are from the target.
pub fn steer_toward(citizens: &mut [Citizen], destinations: &[Destination]) {
    for citizen in citizens.iter_mut() {
        let Some(index) = citizen.destination else {
            continue;
        };
        if citizen.arrived {
            continue;
        }
        let dest = &destinations[index];
        citizen.heading_x = dest.x - citizen.x;
        citizen.heading_y = dest.y - citizen.y;
    }
}

/// Keep arrived citizens inside their wander box by bouncing them off the
/// box edges exactly like the world-boundary containment does.
pub fn hold_in_box(
    citizens: &mut [Citizen],
    destinations: &[Destination],
    rng: &mut ChaCha12Rng,
) -> Result<()> {
    let bounce_dist = Normal::new(0.5, 0.5 / 3.0)?;

    for citizen in citizens.iter_mut() {
        let Some(index) = citizen.destination else {
            continue;
        };
        if !citizen.arrived {
            continue;
        }
        let dest = &destinations[index];
        bounce_axis(citizen.x, &mut citizen.heading_x, dest.x_box(), &bounce_dist, rng);
        bounce_axis(citizen.y, &mut citizen.heading_y, dest.y_box(), &bounce_dist, rng);
    }

    Ok(())
}
