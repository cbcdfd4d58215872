//! The unit of work under test, as seen by the driver

use std::path::PathBuf;

use super::cache::LocalPaths;
use crate::common::Result;
use crate::validate::{Counters, Pair};

/// What a job sees while it runs
#[derive(Debug)]
pub struct JobContext<'a> {
    cache: &'a LocalPaths,
}

impl<'a> JobContext<'a> {
    pub fn new(cache: &'a LocalPaths) -> Self {
        Self { cache }
    }

    /// Localized cache files
    pub fn cache_files(&self) -> &[PathBuf] {
        &self.cache.files
    }

    /// Directories the cache archives were extracted into
    pub fn cache_archives(&self) -> &[PathBuf] {
        &self.cache.archives
    }
}

/// Everything a finished job produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutput<K, V> {
    /// Pairs in emission order
    pub outputs: Vec<Pair<K, V>>,
    pub counters: Counters,
}

impl<K, V> JobOutput<K, V> {
    pub fn new(outputs: Vec<Pair<K, V>>, counters: Counters) -> Self {
        Self { outputs, counters }
    }
}

impl<K, V> Default for JobOutput<K, V> {
    fn default() -> Self {
        Self::new(Vec::new(), Counters::new())
    }
}

/// A unit of data-processing logic the driver can run
///
/// Closures taking a [`JobContext`] implement this directly.
pub trait Job<K, V> {
    fn run(&mut self, ctx: &JobContext<'_>) -> Result<JobOutput<K, V>>;
}

impl<K, V, F> Job<K, V> for F
where
    F: FnMut(&JobContext<'_>) -> Result<JobOutput<K, V>>,
{
    fn run(&mut self, ctx: &JobContext<'_>) -> Result<JobOutput<K, V>> {
        self(ctx)
    }
}

/// Replays output captured from an earlier run
#[derive(Debug, Clone)]
pub struct RecordedJob<K, V> {
    output: JobOutput<K, V>,
}

impl<K, V> RecordedJob<K, V> {
    pub fn new(output: JobOutput<K, V>) -> Self {
        Self { output }
    }
}

impl<K: Clone, V: Clone> Job<K, V> for RecordedJob<K, V> {
    fn run(&mut self, _ctx: &JobContext<'_>) -> Result<JobOutput<K, V>> {
        Ok(self.output.clone())
    }
}
