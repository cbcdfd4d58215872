//! Running a job under test and judging its results
//!
//! [`TestDriver`] registers expectations, localizes distributed cache
//! entries around the [`Job`], and reports every discrepancy at once.

pub mod cache;
pub mod driver;
pub mod job;

pub use cache::{CacheEntry, LocalPaths, LocalizedCache, ResourceLocalizer, TempDirLocalizer};
pub use driver::TestDriver;
pub use job::{Job, JobContext, JobOutput, RecordedJob};
