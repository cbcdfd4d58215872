//! Scenario files
//!
//! A scenario is a YAML description of a recorded job run. The runner
//! replays it through the harness so recorded results can be checked
//! without the job itself.

mod config;
mod runner;

pub use config::*;
pub use runner::{print_result, run_scenario, Overrides, ScenarioResult};
