//! Chunk worker pool
//!
//! Fans the lines of one chunk out over rayon tasks, one per fixed-size batch.
//! Each task classifies its lines in source order and writes accepted lines
//! straight to the shared output.

use crate::chunk::trim_cr;
use crate::output::SyncOutput;
use crate::progress::{BatchTally, RunStats};
use crate::rules::RuleSet;
use std::io::Write;
use std::ops::Range;

/// Reference number of lines per batch
pub const DEFAULT_BATCH_SIZE: usize = 300;

/// Index ranges `[i*batch, min((i+1)*batch, total))` covering `0..total`
pub fn batch_ranges(total: usize, batch_size: usize) -> impl Iterator<Item = Range<usize>> {
    let batch_size = batch_size.max(1);
    (0..total)
        .step_by(batch_size)
        .map(move |start| start..(start + batch_size).min(total))
}

/// Classifies chunks against a rule set
pub struct ChunkWorker<'a, W: Write> {
    rules: &'a RuleSet,
    output: &'a SyncOutput<W>,
    stats: &'a RunStats,
    batch_size: usize,
    trim_cr: bool,
}

impl<'a, W: Write + Send> ChunkWorker<'a, W> {
    pub fn new(rules: &'a RuleSet, output: &'a SyncOutput<W>, stats: &'a RunStats) -> Self {
        Self {
            rules,
            output,
            stats,
            batch_size: DEFAULT_BATCH_SIZE,
            trim_cr: false,
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Strip a trailing `\r` from each line before classifying it
    pub fn trim_cr(mut self, trim_cr: bool) -> Self {
        self.trim_cr = trim_cr;
        self
    }

    /// Process every line of `chunk` described by `spans`.
    ///
    /// Returns once all batch tasks have finished.
    pub fn process_chunk(&self, chunk: &[u8], spans: &[Range<usize>]) {
        rayon::scope(|s| {
            for range in batch_ranges(spans.len(), self.batch_size) {
                let batch = &spans[range];
                s.spawn(move |_| self.process_batch(chunk, batch));
            }
        });
    }

    /// Classify one batch sequentially
    pub fn process_batch(&self, chunk: &[u8], batch: &[Range<usize>]) {
        let mut tally = BatchTally::default();

        for span in batch {
            let mut line = &chunk[span.clone()];
            if self.trim_cr {
                line = trim_cr(line);
            }

            let outcome = self.rules.classify(line);
            tally.record(outcome);

            if outcome.is_accepted() {
                self.output.write_line(line);
            }
        }

        self.stats.merge(&tally);
    }
}
