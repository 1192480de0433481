//! Run-directory lifecycle: creating runs, streaming output, cleaning up.

use crate::config::Config;
use crate::simulation::Simulation;
use anyhow::{Context, Result};
use glob::glob;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Manages a simulation directory.
///
/// The directory must contain a `config.toml`; each run gets its own
/// numbered `run-NNNN` subdirectory holding the trajectory and the report.
pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    /// Execute one complete run in a fresh run directory.
    pub fn run_simulation(&self) -> Result<()> {
        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;

        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let mut simulation =
            Simulation::new(self.cfg.clone()).context("failed to construct simulation")?;

        let trajectory_file = self.trajectory_file(run_idx);
        let file = File::create(&trajectory_file)
            .with_context(|| format!("failed to create {trajectory_file:?}"))?;
        let mut writer = BufWriter::new(file);

        let ticks = self.cfg.simulation.ticks;
        let ticks_per_frame = self.cfg.output.ticks_per_frame;
        let progress_every = (ticks / 10).max(1);

        for tick in 0..ticks {
            simulation
                .advance_one_tick()
                .context("failed to advance simulation")?;

            if tick % ticks_per_frame == 0 {
                rmp_serde::encode::write(&mut writer, &simulation.frame())
                    .context("failed to serialize frame")?;
            }

            if (tick + 1) % progress_every == 0 {
                let progress = 100.0 * (tick + 1) as f64 / ticks as f64;
                log::info!("completed {progress:06.2}%");
            }
        }

        writer.flush().context("failed to flush writer stream")?;

        self.write_report(run_idx, &simulation)
            .context("failed to write report")?;

        let counts = simulation.population().state_counts();
        log::info!(
            "run {run_idx} finished: healthy={} sick={} immune={} dead={}",
            counts.healthy,
            counts.sick,
            counts.immune,
            counts.dead
        );

        Ok(())
    }

    /// Delete all run directories under the simulation directory.
    pub fn clean_sim(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            let run_dir = self.run_dir(run_idx);
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }
        Ok(())
    }

    fn write_report(&self, run_idx: usize, simulation: &Simulation) -> Result<()> {
        let report_file = self.report_file(run_idx);
        let file = File::create(&report_file)
            .with_context(|| format!("failed to create {report_file:?}"))?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, &simulation.tracker().report())
            .context("failed to serialize report")?;

        Ok(())
    }

    fn count_run_dirs(&self) -> Result<usize> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let count = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .count();
        Ok(count)
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn trajectory_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("trajectory.msgpack")
    }

    fn report_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("report.json")
    }
}
