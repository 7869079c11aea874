//! Run-level counters.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::dashboard::ExtractStats;
use crate::pipeline::worker::ItemOutcome;

/// Counters shared by every worker.
#[derive(Debug, Default)]
pub struct RunStats {
    dequeued: AtomicUsize,
    written: AtomicUsize,
    placeholders: AtomicUsize,
    no_data: AtomicUsize,
    failed: AtomicUsize,
    cancelled: AtomicUsize,
}

impl RunStats {
    pub fn record_dequeued(&self) {
        self.dequeued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record(&self, outcome: &ItemOutcome) {
        let counter = match outcome {
            ItemOutcome::Written(_) => &self.written,
            ItemOutcome::Placeholder => &self.placeholders,
            ItemOutcome::NoData(_) => &self.no_data,
            ItemOutcome::Failed(_) => &self.failed,
            ItemOutcome::Cancelled => &self.cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, extract: ExtractStats) -> RunSummary {
        RunSummary {
            extracted: extract.emitted,
            malformed: extract.malformed,
            dequeued: self.dequeued.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            placeholders: self.placeholders.load(Ordering::Relaxed),
            no_data: self.no_data.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

/// Final tally of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Descriptors pushed onto the queue.
    pub extracted: usize,
    /// Leaves skipped during extraction.
    pub malformed: usize,
    pub dequeued: usize,
    pub written: usize,
    pub placeholders: usize,
    pub no_data: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} extracted ({} malformed skipped), {} written, {} placeholder, {} no data, {} failed, {} cancelled",
            self.extracted,
            self.malformed,
            self.written,
            self.placeholders,
            self.no_data,
            self.failed,
            self.cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_counts_outcomes() {
        let stats = RunStats::default();
        stats.record_dequeued();
        stats.record_dequeued();
        stats.record(&ItemOutcome::Written(PathBuf::from("a.png")));
        stats.record(&ItemOutcome::Placeholder);
        stats.record(&ItemOutcome::Cancelled);

        let summary = stats.snapshot(ExtractStats { emitted: 3, malformed: 1 });
        assert_eq!(
            summary,
            RunSummary {
                extracted: 3,
                malformed: 1,
                dequeued: 2,
                written: 1,
                placeholders: 1,
                cancelled: 1,
                ..RunSummary::default()
            }
        );
        assert_eq!(
            summary.to_string(),
            "3 extracted (1 malformed skipped), 1 written, 1 placeholder, 0 no data, 0 failed, 1 cancelled"
        );
    }
}
