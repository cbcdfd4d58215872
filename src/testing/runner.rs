//! Scenario runner
//!
//! Loads a scenario and its referenced files, replays the recorded run
//! through a [`TestDriver`] and prints the outcome.

use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Serialize;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::harness::{JobOutput, RecordedJob, TestDriver};
use crate::validate::{Phase, ValidationReport, Value};

use super::config::{resolve, Scenario};

/// Command-line settings that win over both scenario and config
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub order_matters: Option<bool>,
    pub strict_counters: Option<bool>,
}

/// Result of one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub path: PathBuf,
    pub passed: bool,
    pub order_matters: bool,
    pub strict_counters: bool,
    pub report: ValidationReport,
}

/// Run a scenario from a YAML file
pub async fn run_scenario(
    path: &Path,
    config: &Config,
    overrides: Overrides,
) -> Result<ScenarioResult> {
    let content = read(path).await?;
    let scenario = Scenario::parse(&content, path)?;
    let base = path.parent().unwrap_or(Path::new("."));

    let order_matters = overrides
        .order_matters
        .or(scenario.order_matters)
        .unwrap_or(config.defaults.order_matters);
    let strict_counters = overrides
        .strict_counters
        .or(scenario.strict_counters)
        .unwrap_or(config.defaults.strict_counters);

    tracing::debug!(
        scenario = %scenario.name,
        order_matters,
        strict_counters,
        "Loading scenario"
    );

    let expected_file = read_optional(scenario.expected.file(base)).await?;
    let expected = scenario.expected.pairs(expected_file.as_deref())?;
    let actual_file = read_optional(scenario.actual.file(base)).await?;
    let actual = scenario.actual.pairs(actual_file.as_deref())?;

    let counter_log = read_optional(
        scenario
            .counters
            .actual_file
            .as_ref()
            .map(|f| resolve(base, f)),
    )
    .await?;
    let counters = scenario.counters.actual_counters(counter_log.as_deref())?;

    let mut driver = TestDriver::<Value, Value>::from_config(config).with_all_output(expected);
    if strict_counters {
        driver = driver.with_strict_counter_checking();
    }
    for expectation in scenario.counters.expectations() {
        driver.add_counter(expectation);
    }
    for file in &scenario.cache.files {
        driver.add_cache_file(resolve(base, file));
    }
    for archive in &scenario.cache.archives {
        driver.add_cache_archive(resolve(base, archive));
    }

    let mut job = RecordedJob::new(JobOutput::new(actual, counters));
    let report = driver.run_with_report(&mut job, order_matters)?;

    Ok(ScenarioResult {
        name: scenario.name,
        path: path.to_path_buf(),
        passed: report.passed(),
        order_matters,
        strict_counters,
        report,
    })
}

async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::file_read(path, e))
}

async fn read_optional(path: Option<PathBuf>) -> Result<Option<String>> {
    match path {
        Some(path) => Ok(Some(read(&path).await?)),
        None => Ok(None),
    }
}

/// Print a human-readable summary of one scenario
pub fn print_result(result: &ScenarioResult, verbose: bool) {
    println!(
        "\n{} {}",
        "Scenario:".blue().bold(),
        result.name.white().bold()
    );
    if verbose {
        println!("  {}", result.path.display().to_string().dimmed());
        println!(
            "  {}",
            format!(
                "order_matters={} strict_counters={}",
                result.order_matters, result.strict_counters
            )
            .dimmed()
        );
    }

    for batch in result.report.batches() {
        let label = phase_label(batch.phase);
        if batch.is_empty() {
            println!("  {} {}", "✓".green(), label);
            continue;
        }
        println!("  {} {} ({} error(s))", "✗".red(), label, batch.len());
        for error in &batch.errors {
            println!("      {}", error);
        }
    }

    if result.passed {
        println!("{} {}", "✓".green().bold(), "Passed".green().bold());
    } else {
        println!(
            "{} {}",
            "✗".red().bold(),
            format!("Failed with {} error(s)", result.report.error_count())
                .red()
                .bold()
        );
    }
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Outputs => "Outputs",
        Phase::ExpectedCounters => "Expected counters",
        Phase::UndeclaredCounters => "Undeclared counters",
    }
}
