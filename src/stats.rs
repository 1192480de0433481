//! Per-tick epidemic statistics and the doubling-time estimate.

use crate::population::StateCounts;
use serde::{Deserialize, Serialize};

/// One doubling-time sample, taken at a tick with a nonzero growth rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoublingTimeSample {
    pub tick: u64,
    pub doubling_time: f64,
}

/// Accumulates four append-only count series (one value per tick) and the
/// doubling-time series derived from the sick-count series.
pub struct StatTracker {
    healthy: Vec<usize>,
    sick: Vec<usize>,
    immune: Vec<usize>,
    dead: Vec<usize>,

    /// `(t0, X0)`: first tick with a nonzero sick count and that count.
    first_infection: Option<(u64, usize)>,
    doubling_time: Vec<DoublingTimeSample>,
}

impl StatTracker {
    pub fn new() -> Self {
        Self {
            healthy: Vec::new(),
            sick: Vec::new(),
            immune: Vec::new(),
            dead: Vec::new(),
            first_infection: None,
            doubling_time: Vec::new(),
        }
    }

    /// Append this tick's counts and extend the doubling-time series.
    ///
    /// On the first tick with sick citizens, `(t0, X0)` is recorded and no
    /// sample is produced. Afterwards, every tick with sick citizens yields
    /// `ln(2) / mu` with `mu = (ln(sick) - ln(X0)) / (tick - t0)`, except
    /// when `mu` is zero (that tick simply contributes no sample).
    pub fn record(&mut self, counts: StateCounts, tick: u64) {
        self.healthy.push(counts.healthy);
        self.sick.push(counts.sick);
        self.immune.push(counts.immune);
        self.dead.push(counts.dead);

        if counts.sick == 0 {
            return;
        }

        let Some((t0, x0)) = self.first_infection else {
            self.first_infection = Some((tick, counts.sick));
            return;
        };

        let mu = ((counts.sick as f64).ln() - (x0 as f64).ln()) / (tick - t0) as f64;
        if mu != 0.0 {
            self.doubling_time.push(DoublingTimeSample {
                tick,
                doubling_time: std::f64::consts::LN_2 / mu,
            });
        }
    }

    pub fn healthy(&self) -> &[usize] {
        &self.healthy
    }

    pub fn sick(&self) -> &[usize] {
        &self.sick
    }

    pub fn immune(&self) -> &[usize] {
        &self.immune
    }

    pub fn dead(&self) -> &[usize] {
        &self.dead
    }

    pub fn doubling_time(&self) -> &[DoublingTimeSample] {
        &self.doubling_time
    }

    /// Tick of the first recorded infection, if any yet.
    pub fn first_infection_tick(&self) -> Option<u64> {
        self.first_infection.map(|(t0, _)| t0)
    }

    /// All series as a JSON value, ready to be written out for plotting.
    pub fn report(&self) -> serde_json::Value {
        serde_json::json!({
            "healthy": &self.healthy,
            "sick": &self.sick,
            "immune": &self.immune,
            "dead": &self.dead,
            "doubling_time": &self.doubling_time,
            "first_infection_tick": self.first_infection_tick(),
        })
    }
}

impl Default for StatTracker {
    fn default() -> Self {
        Self::new()
    }
}
