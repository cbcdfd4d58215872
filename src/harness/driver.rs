//! Test driver: expectation registration, job execution and validation
//!
//! The driver is the only place that logs discrepancies and turns them into
//! a failure. Validation itself happens in [`crate::validate`].

use std::fmt::Display;
use std::hash::Hash;
use std::path::PathBuf;

use super::cache::{CacheEntry, LocalizedCache, ResourceLocalizer, TempDirLocalizer};
use super::job::{Job, JobContext, JobOutput};
use crate::common::config::Config;
use crate::common::Result;
use crate::validate::{
    CounterEnum, CounterExpectation, CounterLookup, CounterValidator, ErrorBatch, OutputValidator,
    Pair, Phase, TypeTag, ValidationReport,
};

/// Drives one job under test and checks it against registered expectations
pub struct TestDriver<K, V> {
    expected_outputs: Vec<Pair<K, V>>,
    expected_counters: Vec<CounterExpectation>,
    strict_counters: bool,
    order_matters: bool,
    cache_entries: Vec<CacheEntry>,
    localizer: Box<dyn ResourceLocalizer>,
}

impl<K, V> Default for TestDriver<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TestDriver<K, V> {
    pub fn new() -> Self {
        Self {
            expected_outputs: Vec::new(),
            expected_counters: Vec::new(),
            strict_counters: false,
            order_matters: true,
            cache_entries: Vec::new(),
            localizer: Box::new(TempDirLocalizer::new()),
        }
    }

    /// Driver using the default modes and cache settings from `config`
    pub fn from_config(config: &Config) -> Self {
        Self {
            strict_counters: config.defaults.strict_counters,
            order_matters: config.defaults.order_matters,
            localizer: Box::new(TempDirLocalizer::from_config(&config.cache)),
            ..Self::new()
        }
    }

    // === Expected outputs ===

    pub fn with_output(mut self, key: impl Into<K>, value: impl Into<V>) -> Self {
        self.add_output(Pair::new(key.into(), value.into()));
        self
    }

    pub fn with_all_output(mut self, outputs: impl IntoIterator<Item = Pair<K, V>>) -> Self {
        self.expected_outputs.extend(outputs);
        self
    }

    pub fn add_output(&mut self, output: Pair<K, V>) {
        self.expected_outputs.push(output);
    }

    pub fn expected_outputs(&self) -> &[Pair<K, V>] {
        &self.expected_outputs
    }

    /// Forget all expected outputs
    pub fn reset_output(&mut self) {
        self.expected_outputs.clear();
    }

    // === Expected counters ===

    /// Expect a counter declared by group and name
    pub fn with_counter(
        mut self,
        group: impl Into<String>,
        name: impl Into<String>,
        expected: i64,
    ) -> Self {
        self.add_counter(CounterExpectation::named(group, name, expected));
        self
    }

    /// Expect a counter declared as an enum constant
    pub fn with_counter_enum<E: CounterEnum>(mut self, counter: &E, expected: i64) -> Self {
        self.add_counter(CounterExpectation::enumerated(counter, expected));
        self
    }

    pub fn add_counter(&mut self, expectation: CounterExpectation) {
        self.expected_counters.push(expectation);
    }

    pub fn expected_counters(&self) -> &[CounterExpectation] {
        &self.expected_counters
    }

    /// Forget all expected counters, of both declaration forms
    pub fn reset_expected_counters(&mut self) {
        self.expected_counters.clear();
    }

    /// Fail when the job touches a counter that has no expectation
    ///
    /// By default only the declared counters are checked.
    pub fn with_strict_counter_checking(mut self) -> Self {
        self.strict_counters = true;
        self
    }

    pub fn strict_counters(&self) -> bool {
        self.strict_counters
    }

    /// Order mode used by [`TestDriver::run_test`]
    pub fn with_order_matters(mut self, order_matters: bool) -> Self {
        self.order_matters = order_matters;
        self
    }

    // === Distributed cache ===

    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.add_cache_file(path);
        self
    }

    pub fn add_cache_file(&mut self, path: impl Into<PathBuf>) {
        self.cache_entries.push(CacheEntry::File(path.into()));
    }

    /// Replace all registered cache files
    pub fn set_cache_files(&mut self, files: impl IntoIterator<Item = PathBuf>) {
        self.cache_entries
            .retain(|e| !matches!(e, CacheEntry::File(_)));
        self.cache_entries
            .extend(files.into_iter().map(CacheEntry::File));
    }

    pub fn with_cache_archive(mut self, path: impl Into<PathBuf>) -> Self {
        self.add_cache_archive(path);
        self
    }

    pub fn add_cache_archive(&mut self, path: impl Into<PathBuf>) {
        self.cache_entries.push(CacheEntry::Archive(path.into()));
    }

    /// Replace all registered cache archives
    pub fn set_cache_archives(&mut self, archives: impl IntoIterator<Item = PathBuf>) {
        self.cache_entries
            .retain(|e| !matches!(e, CacheEntry::Archive(_)));
        self.cache_entries
            .extend(archives.into_iter().map(CacheEntry::Archive));
    }

    pub fn cache_entries(&self) -> &[CacheEntry] {
        &self.cache_entries
    }

    pub fn with_localizer(mut self, localizer: impl ResourceLocalizer + 'static) -> Self {
        self.localizer = Box::new(localizer);
        self
    }

    // === Running ===

    /// Run the job without validating anything
    ///
    /// Cache entries are localized for the duration of the run only.
    pub fn run(&mut self, job: &mut impl Job<K, V>) -> Result<JobOutput<K, V>> {
        let cache = LocalizedCache::acquire(self.localizer.as_mut(), &self.cache_entries)?;
        let output = job.run(&JobContext::new(cache.paths()))?;
        cache.release()?;
        tracing::debug!(
            outputs = output.outputs.len(),
            counters = output.counters.len(),
            "Job finished"
        );
        Ok(output)
    }
}

impl<K, V> TestDriver<K, V>
where
    K: Eq + Hash + Display + TypeTag,
    V: Eq + Hash + Display + TypeTag,
{
    /// Run the job and return its outputs, optionally failing on counters
    pub fn run_validating_counters(
        &mut self,
        job: &mut impl Job<K, V>,
        validate_counters: bool,
    ) -> Result<Vec<Pair<K, V>>> {
        let output = self.run(job)?;
        if validate_counters {
            let mut report = ValidationReport::new();
            for batch in self.validate_counters(&output.counters) {
                report.push(batch);
            }
            log_report(&report);
            report.into_result()?;
        }
        Ok(output.outputs)
    }

    /// Run the job and validate it, using the driver's order mode
    pub fn run_test(&mut self, job: &mut impl Job<K, V>) -> Result<()> {
        self.run_test_with_order(job, self.order_matters)
    }

    /// Run the job and validate outputs and counters
    ///
    /// Every phase is evaluated before failing; the error carries each phase
    /// that found discrepancies.
    pub fn run_test_with_order(
        &mut self,
        job: &mut impl Job<K, V>,
        order_matters: bool,
    ) -> Result<()> {
        self.run_with_report(job, order_matters)?.into_result()?;
        Ok(())
    }

    /// Run the job and return the full report instead of failing
    ///
    /// Only job and cache errors are returned as `Err`.
    pub fn run_with_report(
        &mut self,
        job: &mut impl Job<K, V>,
        order_matters: bool,
    ) -> Result<ValidationReport> {
        self.log_pre_test();
        let output = self.run(job)?;
        let report = self.validate(&output, order_matters);
        log_report(&report);
        Ok(report)
    }

    /// Validate a finished job's output against the expectations
    pub fn validate(&self, output: &JobOutput<K, V>, order_matters: bool) -> ValidationReport {
        let mut report = ValidationReport::new();
        report.push(self.validate_outputs(&output.outputs, order_matters));
        for batch in self.validate_counters(&output.counters) {
            report.push(batch);
        }
        report
    }

    pub fn validate_outputs(&self, actual: &[Pair<K, V>], order_matters: bool) -> ErrorBatch {
        ErrorBatch::new(
            Phase::Outputs,
            OutputValidator::validate(&self.expected_outputs, actual, order_matters),
        )
    }

    pub fn validate_counters<L: CounterLookup + ?Sized>(&self, actual: &L) -> Vec<ErrorBatch> {
        CounterValidator::validate(&self.expected_counters, actual, self.strict_counters)
            .into_batches()
    }

    fn log_pre_test(&self) {
        tracing::debug!(
            expected_outputs = self.expected_outputs.len(),
            expected_counters = self.expected_counters.len(),
            strict_counters = self.strict_counters,
            cache_entries = self.cache_entries.len(),
            "Running test"
        );
        for output in &self.expected_outputs {
            tracing::debug!("Expecting output {}", output);
        }
    }
}

fn log_report(report: &ValidationReport) {
    for batch in report.batches() {
        if batch.is_empty() {
            tracing::debug!("No discrepancies in {}", batch.phase);
            continue;
        }
        for error in &batch.errors {
            tracing::error!(phase = %batch.phase, "{}", error);
        }
    }
}
