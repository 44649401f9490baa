//! Progress reporting for recreation runs.
//!
//! Reporting is coarse: a callback per phase change, one every
//! [`ENUMERATE_REPORT_INTERVAL`] entries while the source is enumerated,
//! and one per submitted entry. Reporters are purely informational and
//! cannot influence the run.
//!
//! # Example
//!
//! ```rust
//! use zimrecreate::progress::{Phase, ProgressReporter, StatisticsProgress};
//!
//! let mut progress = StatisticsProgress::new();
//! progress.on_phase(Phase::Enumerating);
//! progress.on_enumerate(10_000, 25_000);
//! assert_eq!(progress.phases, vec![Phase::Enumerating]);
//! assert_eq!(progress.enumerated, 10_000);
//! ```

use std::fmt;
use std::time::{Duration, Instant};

/// Enumeration progress is reported every this many entries.
pub const ENUMERATE_REPORT_INTERVAL: u32 = 10_000;

/// IEC byte unit: 1 KiB = 1024 bytes.
pub const BYTES_KIB: u64 = 1024;
/// IEC byte unit: 1 MiB = 1024 KiB.
pub const BYTES_MIB: u64 = 1024 * BYTES_KIB;
/// IEC byte unit: 1 GiB = 1024 MiB.
pub const BYTES_GIB: u64 = 1024 * BYTES_MIB;

/// Stage of a recreation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Reading the cluster of every source entry.
    Enumerating,
    /// Sorting entries by cluster.
    Sorting,
    /// Submitting entries to the target.
    Creating,
    /// Writing the target's directory and checksum.
    Finishing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Enumerating => "Enumerating entries",
            Self::Sorting => "Sorting by cluster",
            Self::Creating => "Creating archive",
            Self::Finishing => "Finishing archive",
        })
    }
}

/// Progress reporting trait for recreation runs.
///
/// Every method has a no-op default.
pub trait ProgressReporter {
    /// Called when the run enters a new phase.
    fn on_phase(&mut self, phase: Phase) {
        let _ = phase;
    }

    /// Called periodically while source entries are enumerated.
    fn on_enumerate(&mut self, done: u32, total: u32) {
        let _ = (done, total);
    }

    /// Called after each entry was handed to the target.
    ///
    /// `done` counts processed plan positions, skipped entries included.
    fn on_entry_submitted(&mut self, done: u32, total: u32) {
        let _ = (done, total);
    }
}

impl<P: ProgressReporter + ?Sized> ProgressReporter for &mut P {
    fn on_phase(&mut self, phase: Phase) {
        (**self).on_phase(phase);
    }

    fn on_enumerate(&mut self, done: u32, total: u32) {
        (**self).on_enumerate(done, total);
    }

    fn on_entry_submitted(&mut self, done: u32, total: u32) {
        (**self).on_entry_submitted(done, total);
    }
}

/// A progress reporter that does nothing (null object pattern).
#[derive(Debug, Default, Clone)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// A progress reporter that records what it was told.
#[derive(Debug, Clone)]
pub struct StatisticsProgress {
    /// Phases entered, in order.
    pub phases: Vec<Phase>,
    /// Last enumeration count reported.
    pub enumerated: u32,
    /// Number of enumeration reports.
    pub enumerate_reports: u32,
    /// Last submission count reported.
    pub submitted: u32,
    /// Start of the run.
    pub start_time: Instant,
}

impl Default for StatisticsProgress {
    fn default() -> Self {
        Self {
            phases: Vec::new(),
            enumerated: 0,
            enumerate_reports: 0,
            submitted: 0,
            start_time: Instant::now(),
        }
    }
}

impl StatisticsProgress {
    /// Creates a new statistics progress reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns elapsed time since creation.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl ProgressReporter for StatisticsProgress {
    fn on_phase(&mut self, phase: Phase) {
        self.phases.push(phase);
    }

    fn on_enumerate(&mut self, done: u32, _total: u32) {
        self.enumerated = done;
        self.enumerate_reports += 1;
    }

    fn on_entry_submitted(&mut self, done: u32, _total: u32) {
        self.submitted = done;
    }
}

/// Formats a duration as a human-readable string.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Formats bytes as a human-readable string using IEC units (KiB, MiB, GiB).
///
/// # Examples
///
/// ```rust
/// use zimrecreate::progress::format_bytes_iec;
///
/// assert_eq!(format_bytes_iec(512), "512 B");
/// assert_eq!(format_bytes_iec(1536), "1.5 KiB");
/// assert_eq!(format_bytes_iec(1048576), "1.0 MiB");
/// ```
pub fn format_bytes_iec(bytes: u64) -> String {
    let value = bytes as f64;
    if bytes < BYTES_KIB {
        format!("{} B", bytes)
    } else if bytes < BYTES_MIB {
        format!("{:.1} KiB", value / BYTES_KIB as f64)
    } else if bytes < BYTES_GIB {
        format!("{:.1} MiB", value / BYTES_MIB as f64)
    } else {
        format!("{:.1} GiB", value / BYTES_GIB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_progress() {
        let mut progress = NoProgress;
        progress.on_phase(Phase::Creating);
        progress.on_enumerate(1, 2);
        progress.on_entry_submitted(1, 2);
    }

    #[test]
    fn test_statistics_progress() {
        let mut progress = StatisticsProgress::new();
        progress.on_phase(Phase::Enumerating);
        progress.on_enumerate(10_000, 20_000);
        progress.on_enumerate(20_000, 20_000);
        progress.on_phase(Phase::Sorting);
        progress.on_entry_submitted(3, 20_000);

        assert_eq!(progress.phases, vec![Phase::Enumerating, Phase::Sorting]);
        assert_eq!(progress.enumerated, 20_000);
        assert_eq!(progress.enumerate_reports, 2);
        assert_eq!(progress.submitted, 3);
    }

    #[test]
    fn test_reporter_through_mut_ref() {
        fn finish<P: ProgressReporter>(mut progress: P) {
            progress.on_phase(Phase::Finishing);
        }
        let mut progress = StatisticsProgress::new();
        finish(&mut progress);
        assert_eq!(progress.phases, vec![Phase::Finishing]);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Sorting.to_string(), "Sorting by cluster");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(45)), "45s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3700)), "1h 1m");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes_iec(500), "500 B");
        assert_eq!(format_bytes_iec(1500), "1.5 KiB");
        assert_eq!(format_bytes_iec(1500 * 1024), "1.5 MiB");
        assert_eq!(format_bytes_iec(1500 * 1024 * 1024), "1.5 GiB");
    }
}
