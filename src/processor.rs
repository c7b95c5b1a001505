//! Core processing engine
//!
//! The [`Processor`] owns a run: it validates configuration, reads the input
//! chunk by chunk on the calling thread and spawns one rayon task per chunk.
//! It returns only after every chunk task (and each of their batch tasks) has
//! finished.
//!
//! The reader loop blocks while waiting for a free buffer, so a run must be
//! started from outside the rayon pool. Calls from a pool thread fail with
//! [`FilterError::InsideThreadPool`].

use crate::chunk::{split_lines, ChunkReader, DEFAULT_BLOCK_SIZE};
use crate::cli::Args;
use crate::error::{FilterError, Result};
use crate::output::SyncOutput;
use crate::pool::Pool;
use crate::progress::{create_bytes_progress_bar, RunStats, RunSummary};
use crate::rules::{RuleConfig, RuleSet};
use crate::worker::{ChunkWorker, DEFAULT_BATCH_SIZE};

use indicatif::ProgressBar;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{Read, Write};
use std::ops::Range;
use std::path::Path;

/// Processor configuration
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub rules: RuleConfig,
    /// Bytes per raw read before newline extension
    pub block_size: usize,
    /// Lines per batch task
    pub batch_size: usize,
    /// Chunks allowed in memory at once; the reader waits beyond this
    pub max_in_flight: usize,
    /// Strip a trailing `\r` from every line
    pub trim_cr: bool,
    /// Draw a byte progress bar on stderr
    pub progress: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            rules: RuleConfig::default(),
            block_size: DEFAULT_BLOCK_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            max_in_flight: num_cpus::get() * 2,
            trim_cr: false,
            progress: false,
        }
    }
}

impl ProcessorConfig {
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        Ok(Self {
            rules: args.rule_config(),
            block_size: args.parse_block_size()?,
            batch_size: args.batch_size,
            max_in_flight: args
                .max_in_flight
                .unwrap_or_else(|| args.threads.unwrap_or_else(num_cpus::get) * 2),
            trim_cr: args.crlf,
            progress: args.progress && !args.quiet,
        })
    }

    fn validate(&self) -> Result<()> {
        let tunables = [
            ("block size", self.block_size),
            ("batch size", self.batch_size),
            ("max in-flight chunks", self.max_in_flight),
        ];
        for (name, value) in tunables {
            if value == 0 {
                return Err(FilterError::InvalidTunable {
                    name,
                    reason: "must be greater than 0".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Main processor
pub struct Processor {
    config: ProcessorConfig,
    rules: RuleSet,
}

impl Processor {
    /// Validate `config` and prepare the rule set. Nothing is read yet.
    pub fn new(config: ProcessorConfig) -> Result<Self> {
        config.validate()?;
        let rules = RuleSet::new(&config.rules)?;
        Ok(Self { config, rules })
    }

    /// Filter the regular file at `path`, writing accepted lines to `out`
    pub fn process<W: Write + Send>(&self, path: &Path, out: W) -> Result<RunSummary> {
        ensure_outside_pool()?;

        let file = File::open(path).map_err(|source| FilterError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let metadata = file.metadata().map_err(|source| FilterError::Stat {
            path: path.to_path_buf(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(FilterError::NotAFile {
                path: path.to_path_buf(),
            });
        }

        info!("Filtering {:?} ({} bytes)", path, metadata.len());

        let pb = if self.config.progress {
            create_bytes_progress_bar(metadata.len(), "Filtering...")
        } else {
            ProgressBar::hidden()
        };

        let result = self.run_with_progress(file, out, &pb);
        pb.finish_and_clear();
        result
    }

    /// Filter an arbitrary byte stream
    pub fn run<R: Read, W: Write + Send>(&self, input: R, out: W) -> Result<RunSummary> {
        ensure_outside_pool()?;
        self.run_with_progress(input, out, &ProgressBar::hidden())
    }

    fn run_with_progress<R: Read, W: Write + Send>(
        &self,
        input: R,
        out: W,
        pb: &ProgressBar,
    ) -> Result<RunSummary> {
        let block_size = self.config.block_size;
        let stats = RunStats::new();
        let output = SyncOutput::new(out);
        let buffers = Pool::new(self.config.max_in_flight, move || Vec::<u8>::with_capacity(block_size));
        let line_spans = Pool::new(self.config.max_in_flight, Vec::<Range<usize>>::new);
        let mut reader = ChunkReader::new(input, block_size);

        let worker = ChunkWorker::new(&self.rules, &output, &stats)
            .batch_size(self.config.batch_size)
            .trim_cr(self.config.trim_cr);

        debug!(
            "Rules: {:?}, block size {}, batch size {}, max in flight {}",
            self.rules.kinds(),
            block_size,
            self.config.batch_size,
            self.config.max_in_flight
        );

        let read_result: Result<()> = rayon::in_place_scope(|s| {
            let worker = &worker;
            let mut chunk_id: u64 = 0;

            loop {
                if output.has_failed() {
                    break Ok(());
                }

                let mut buf = buffers.acquire();
                match reader.next_chunk(&mut buf) {
                    Ok(true) => {}
                    Ok(false) => break Ok(()),
                    Err(e) => break Err(e),
                }

                let len = buf.len() as u64;
                stats.add_chunk(len);
                pb.inc(len);

                let mut lines = line_spans.acquire();
                let id = chunk_id;
                chunk_id += 1;
                debug!("Dispatching chunk {} ({} bytes)", id, len);

                s.spawn(move |_| {
                    split_lines(&buf, &mut lines);
                    worker.process_chunk(&buf, &lines);
                    debug!("Chunk {} done ({} lines)", id, lines.len());
                    // Releasing to the pools is the last use of either buffer
                    drop(lines);
                    drop(buf);
                });
            }
        });

        if let Err(e) = read_result {
            warn!("Aborting after {} bytes: {}", reader.offset(), e);
            if let Err(flush_err) = output.flush() {
                warn!("Flushing output after read error failed: {}", flush_err);
            }
            return Err(e);
        }

        debug!(
            "Allocated {} of {} chunk buffers",
            buffers.created(),
            self.config.max_in_flight
        );

        let bytes_written = output.bytes_written();
        output.finish().map_err(FilterError::Write)?;

        let mut summary = stats.snapshot();
        summary.bytes_written = bytes_written;
        info!(
            "Done: {} of {} lines accepted in {:?}",
            summary.accepted, summary.lines, summary.elapsed
        );
        Ok(summary)
    }
}

fn ensure_outside_pool() -> Result<()> {
    if rayon::current_thread_index().is_some() {
        return Err(FilterError::InsideThreadPool);
    }
    Ok(())
}
