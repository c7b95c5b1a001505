//! Progress display module
//!
//! Styled diagnostics, the optional byte progress bar and run statistics.
//! Everything here writes to stderr; stdout carries accepted lines only.

use crate::rules::{Classification, RuleKind};
use bytesize::ByteSize;
use colored::*;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Print a section header
pub fn print_header(text: &str) {
    eprintln!("\n{} {}", "▶".green(), text.green().bold());
}

/// Print an info message
pub fn print_info(text: &str) {
    eprintln!("  {} {}", "ℹ".cyan(), text);
}

/// Print an error message
pub fn print_error(text: &str) {
    eprintln!("  {} {}", "✖".red(), text.red());
}

/// Create a bytes-based progress bar drawn on stderr
pub fn create_bytes_progress_bar(total_bytes: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(total_bytes), ProgressDrawTarget::stderr());

    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.green/dim}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }

    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Per-batch counters, merged into [`RunStats`] once per batch
#[derive(Debug, Default, Clone)]
pub struct BatchTally {
    pub lines: u64,
    pub empty: u64,
    pub accepted: u64,
    pub rejected: [u64; RuleKind::ALL.len()],
}

impl BatchTally {
    #[inline]
    pub fn record(&mut self, outcome: Classification) {
        match outcome {
            Classification::Skipped => self.empty += 1,
            Classification::Accepted => {
                self.lines += 1;
                self.accepted += 1;
            }
            Classification::Rejected(kind) => {
                self.lines += 1;
                self.rejected[kind.index()] += 1;
            }
        }
    }
}

/// Processing statistics shared by every task of a run
#[derive(Debug)]
pub struct RunStats {
    bytes_read: AtomicU64,
    chunks: AtomicU64,
    lines: AtomicU64,
    empty_lines: AtomicU64,
    accepted: AtomicU64,
    rejected: [AtomicU64; RuleKind::ALL.len()],
    start_time: Instant,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            bytes_read: AtomicU64::new(0),
            chunks: AtomicU64::new(0),
            lines: AtomicU64::new(0),
            empty_lines: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            rejected: Default::default(),
            start_time: Instant::now(),
        }
    }

    pub fn add_chunk(&self, bytes: u64) {
        self.chunks.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn merge(&self, tally: &BatchTally) {
        self.lines.fetch_add(tally.lines, Ordering::Relaxed);
        self.empty_lines.fetch_add(tally.empty, Ordering::Relaxed);
        self.accepted.fetch_add(tally.accepted, Ordering::Relaxed);
        for (counter, &n) in self.rejected.iter().zip(tally.rejected.iter()) {
            if n > 0 {
                counter.fetch_add(n, Ordering::Relaxed);
            }
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self) -> RunSummary {
        let mut rejected = [0; RuleKind::ALL.len()];
        for (slot, counter) in rejected.iter_mut().zip(self.rejected.iter()) {
            *slot = counter.load(Ordering::Relaxed);
        }

        RunSummary {
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            chunks: self.chunks.load(Ordering::Relaxed),
            lines: self.lines.load(Ordering::Relaxed),
            empty_lines: self.empty_lines.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected,
            bytes_written: 0,
            elapsed: self.elapsed(),
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Final counts of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub bytes_read: u64,
    pub chunks: u64,
    /// Non-empty lines classified
    pub lines: u64,
    pub empty_lines: u64,
    pub accepted: u64,
    /// Rejections indexed by [`RuleKind::index`]
    pub rejected: [u64; RuleKind::ALL.len()],
    /// Bytes of accepted lines written, newlines included
    pub bytes_written: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn rejected_by(&self, kind: RuleKind) -> u64 {
        self.rejected[kind.index()]
    }

    pub fn total_rejected(&self) -> u64 {
        self.rejected.iter().sum()
    }

    pub fn lines_per_second(&self) -> f64 {
        let elapsed = self.elapsed.as_secs_f64();
        if elapsed > 0.0 {
            self.lines as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn bytes_per_second(&self) -> f64 {
        let elapsed = self.elapsed.as_secs_f64();
        if elapsed > 0.0 {
            self.bytes_read as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Print final statistics
    pub fn print_summary(&self) {
        eprintln!();
        eprintln!("{}", "═".repeat(60).green());
        eprintln!("{}", "                    PROCESSING COMPLETE".green().bold());
        eprintln!("{}", "═".repeat(60).green());
        eprintln!();

        eprintln!("  {} {}", "Data processed: ".green(), ByteSize(self.bytes_read));
        eprintln!("  {} {}", "Chunks:         ".green(), format_number(self.chunks));
        eprintln!();

        eprintln!("  {} {}", "Total lines:    ".green(), format_number(self.lines));
        eprintln!("  {} {}", "Empty skipped:  ".green(), format_number(self.empty_lines));
        eprintln!("  {} {}", "Rejected:       ".yellow(), format_number(self.total_rejected()));
        for kind in RuleKind::ALL {
            let n = self.rejected_by(kind);
            if n > 0 {
                eprintln!("      {:<18} {}", kind.name(), format_number(n));
            }
        }
        eprintln!(
            "  {} {}",
            "Accepted:       ".green().bold(),
            format_number(self.accepted).green().bold()
        );
        eprintln!("  {} {}", "Output:         ".green(), ByteSize(self.bytes_written));

        eprintln!();
        eprintln!("  {} {}", "Duration:       ".green(), format_duration(self.elapsed));
        eprintln!("  {} {:.2} lines/sec", "Throughput:     ".green(), self.lines_per_second());
        eprintln!(
            "  {} {}/sec",
            "Speed:          ".green(),
            ByteSize(self.bytes_per_second() as u64)
        );
        eprintln!();
        eprintln!("{}", "═".repeat(60).green());
    }
}

/// Format a number with thousand separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    result
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(123), "123");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30.0s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m");
    }

    #[test]
    fn test_tally_merge() {
        let stats = RunStats::new();
        let mut tally = BatchTally::default();

        tally.record(Classification::Accepted);
        tally.record(Classification::Skipped);
        tally.record(Classification::Rejected(RuleKind::MinDigits));
        tally.record(Classification::Rejected(RuleKind::MinDigits));
        stats.merge(&tally);
        stats.merge(&tally);
        stats.add_chunk(100);

        let summary = stats.snapshot();
        assert_eq!(summary.lines, 6);
        assert_eq!(summary.empty_lines, 2);
        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.rejected_by(RuleKind::MinDigits), 4);
        assert_eq!(summary.total_rejected(), 4);
        assert_eq!(summary.chunks, 1);
        assert_eq!(summary.bytes_read, 100);
    }
}
