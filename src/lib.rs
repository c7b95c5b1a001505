//! # passfilter
//!
//! High-performance password list filtering.
//!
//! ## Features
//!
//! - **Length rules**: minimum and maximum length in bytes
//! - **Character classes**: minimum lower case, upper case, digit and special characters
//! - **Regex pattern**: optional extra pattern every line must match
//! - **Streaming**: the input is read in newline-aligned chunks, never loaded whole
//! - **Parallel processing**: one task per chunk, one sub-task per batch of lines
//!
//! ## Usage
//!
//! ```bash
//! # At least 8 characters, two digits
//! passfilter -f rockyou.txt --min 8 --num 2
//!
//! # Two special characters
//! passfilter -f rockyou.txt --sp 2 > special.txt
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use passfilter::processor::{Processor, ProcessorConfig};
//! use passfilter::rules::RuleConfig;
//! use std::path::Path;
//!
//! let config = ProcessorConfig {
//!     rules: RuleConfig {
//!         min_length: 8,
//!         min_digits: 2,
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//!
//! let processor = Processor::new(config).unwrap();
//! let summary = processor.process(Path::new("wordlist.txt"), std::io::stdout()).unwrap();
//! eprintln!("{} lines accepted", summary.accepted);
//! ```

pub mod chunk;
pub mod cli;
pub mod error;
pub mod output;
pub mod pool;
pub mod processor;
pub mod progress;
pub mod rules;
pub mod worker;

pub use cli::Args;
pub use error::{FilterError, Result};
pub use processor::{Processor, ProcessorConfig};
pub use progress::RunSummary;
pub use rules::{Classification, RuleConfig, RuleKind, RuleSet};
