//! Progress bar for the recreation run.

use indicatif::{ProgressBar, ProgressStyle};
use zimrecreate::progress::{Phase, ProgressReporter};

/// Progress display for a recreation run
pub struct CliProgress {
    bar: ProgressBar,
    quiet: bool,
}

impl CliProgress {
    /// Creates a new progress display for a source of `total_entries`
    pub fn new(total_entries: u64, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(total_entries);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] {msg:20} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        };

        Self { bar, quiet }
    }

    /// Finishes with a custom message
    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.bar.finish_with_message(msg.into());
    }

    /// Leaves the bar where it stopped
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

impl ProgressReporter for CliProgress {
    fn on_phase(&mut self, phase: Phase) {
        if self.quiet {
            return;
        }
        if phase == Phase::Creating {
            self.bar.set_position(0);
        }
        self.bar.set_message(phase.to_string());
    }

    fn on_enumerate(&mut self, done: u32, total: u32) {
        self.bar.set_length(u64::from(total));
        self.bar.set_position(u64::from(done));
    }

    fn on_entry_submitted(&mut self, done: u32, _total: u32) {
        self.bar.set_position(u64::from(done));
    }
}
