//! Progress reporting with TTY detection, mirroring the publish-progress
//! module this CLI's validation progress is modeled on: progress bars when
//! stderr is a terminal, plain status lines otherwise.

use std::time::Instant;

use atty::Stream;
use indicatif::{ProgressBar, ProgressStyle};

pub fn is_tty() -> bool {
    atty::is(Stream::Stderr)
}

/// Indeterminate spinner shown while the driver validates every plugin.
/// The driver itself has no incremental-progress callback (it runs the
/// worker pool to completion and returns one `Report`), so this reports
/// start/finish rather than a per-plugin tick.
pub struct ProgressReporter {
    is_tty: bool,
    bar: Option<ProgressBar>,
    start_time: Instant,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let is_tty = is_tty();
        let bar = if is_tty {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message("validating marketplace plugins...");
            pb.enable_steady_tick(std::time::Duration::from_millis(120));
            Some(pb)
        } else {
            eprintln!("validating marketplace plugins...");
            None
        };

        Self { is_tty, bar, start_time: Instant::now() }
    }

    pub fn silent() -> Self {
        Self { is_tty: false, bar: None, start_time: Instant::now() }
    }

    pub fn finish(self, passed: usize, total: usize) {
        let elapsed = self.start_time.elapsed();
        let msg = format!("{passed}/{total} plugins passed in {elapsed:?}");
        if self.is_tty {
            if let Some(bar) = self.bar {
                bar.finish_with_message(msg);
            }
        } else {
            eprintln!("{msg}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_reporter_never_allocates_a_bar() {
        let reporter = ProgressReporter::silent();
        assert!(!reporter.is_tty);
        assert!(reporter.bar.is_none());
    }

    #[test]
    fn finish_does_not_panic_in_silent_mode() {
        let reporter = ProgressReporter::silent();
        reporter.finish(2, 2);
    }
}
