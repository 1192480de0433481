//! Agent-based SIR epidemic simulator.
//!
//! A fixed population of point agents wanders a bounded 2-D world, optionally
//! travels to assigned destinations, and transmits an infection to nearby
//! susceptible agents. The [`simulation::Simulation`] driver advances the
//! world one tick at a time; [`manager::Manager`] wraps whole runs with file
//! output for rendering and analysis.

pub mod config;
pub mod destination;
pub mod infection;
pub mod manager;
pub mod movement;
pub mod population;
pub mod simulation;
pub mod stats;
