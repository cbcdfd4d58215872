//! CLI command handling
//!
//! Runs scenarios through the harness and formats the results.

use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{paths, Error, Result};
use crate::testing::{print_result, run_scenario, Overrides, ScenarioResult};

/// Dispatch a CLI command
///
/// Returns `Ok(false)` when the command ran but something it checked failed.
pub async fn dispatch(command: Commands) -> Result<bool> {
    match command {
        Commands::Check {
            scenarios,
            unordered,
            ordered,
            strict_counters,
            json,
            verbose,
        } => {
            let config = Config::load()?;
            if !config.output.color {
                colored::control::set_override(false);
            }
            let overrides = Overrides {
                order_matters: order_override(ordered, unordered),
                strict_counters: strict_counters.then_some(true),
            };
            check(&scenarios, &config, overrides, json || config.output.json, verbose).await
        }

        Commands::Config => {
            show_config()?;
            Ok(true)
        }
    }
}

/// `--ordered` / `--unordered`; neither leaves the choice to scenario and config
fn order_override(ordered: bool, unordered: bool) -> Option<bool> {
    match (ordered, unordered) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// A scenario that could not be run at all
#[derive(Debug, Serialize)]
struct ScenarioError {
    path: PathBuf,
    error: String,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    passed: bool,
    scenarios: Vec<ScenarioResult>,
    errors: Vec<ScenarioError>,
}

async fn check(
    scenarios: &[PathBuf],
    config: &Config,
    overrides: Overrides,
    json: bool,
    verbose: bool,
) -> Result<bool> {
    let mut results = Vec::new();
    let mut errors = Vec::new();

    for path in scenarios {
        match run_scenario(path, config, overrides).await {
            Ok(result) => {
                if !json {
                    print_result(&result, verbose);
                }
                results.push(result);
            }
            Err(e) => {
                tracing::error!("Scenario {} could not be run: {}", path.display(), e);
                if !json {
                    println!("\n{} {}: {}", "✗".red().bold(), path.display(), e);
                }
                errors.push(ScenarioError {
                    path: path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let failed = results.iter().filter(|r| !r.passed).count() + errors.len();
    let passed = failed == 0;

    if json {
        let report = CheckReport {
            passed,
            scenarios: results,
            errors,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let summary = format!("{} passed, {} failed", scenarios.len() - failed, failed);
        if passed {
            println!("\n{}", summary.green().bold());
        } else {
            println!("\n{}", summary.red().bold());
        }
    }

    Ok(passed)
}

fn show_config() -> Result<()> {
    match paths::config_path() {
        Some(path) if path.exists() => println!("Config file: {}", path.display()),
        Some(path) => println!("Config file: {} (not found, using defaults)", path.display()),
        None => println!("Config file: none (no home directory)"),
    }
    let config = Config::load()?;
    let rendered = toml::to_string_pretty(&config).map_err(|e| Error::Config(e.to_string()))?;
    println!();
    print!("{}", rendered);
    Ok(())
}
