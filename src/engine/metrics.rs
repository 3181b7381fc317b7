//! Stage timings.
//!
//! Collected only by `parse_verbose_with`; the plain `parse` path never reads
//! the clock.

use std::time::Duration;

/// Elapsed time per pipeline stage for a single message.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StageMetrics {
    pub normalize: Duration,
    pub matching: Duration,
    pub split: Duration,
    pub extract: Duration,
}

impl StageMetrics {
    pub fn total(&self) -> Duration {
        self.normalize + self.matching + self.split + self.extract
    }
}
