//! Command-line interface definition for passfilter
//!
//! Provides argument parsing for the password list filter.

use crate::rules::RuleConfig;
use clap::Parser;
use std::path::PathBuf;

/// High-performance password list filter
///
/// Keep only the lines of a (very large) password list that satisfy every
/// requested length and character-class rule.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "passfilter",
    author = "m0h1nd4",
    version,
    about = "High-performance password list filter",
    long_about = r#"
Filter huge password lists down to the entries that satisfy a password
policy. The file is streamed in newline-aligned chunks and filtered in
parallel; accepted lines are written to stdout in no particular order.

EXAMPLES:
    # At least 8 characters
    passfilter -f rockyou.txt --min 8

    # 8-16 characters, one upper case, two digits
    passfilter -f rockyou.txt --min 8 --max 16 --ucase 1 --num 2

    # Two special characters (anything but A-Z, a-z, 0-9)
    passfilter -f rockyou.txt --sp 2 > special.txt

    # Also require a pattern, CRLF input
    passfilter -f list.txt --min 6 -p "^[A-Z]" --crlf
"#
)]
pub struct Args {
    /// Password list file
    #[arg(short = 'f', long = "file", required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Minimum length in bytes (0 = off)
    #[arg(long = "min", visible_alias = "min-length", value_name = "N", default_value_t = 0)]
    pub min_length: usize,

    /// Maximum length in bytes (0 = off)
    #[arg(long = "max", visible_alias = "max-length", value_name = "N", default_value_t = 0)]
    pub max_length: usize,

    /// Minimum lower case characters (a-z)
    #[arg(long = "lcase", visible_alias = "min-lowercase", value_name = "N", default_value_t = 0)]
    pub min_lowercase: usize,

    /// Minimum upper case characters (A-Z)
    #[arg(long = "ucase", visible_alias = "min-uppercase", value_name = "N", default_value_t = 0)]
    pub min_uppercase: usize,

    /// Minimum digits (0-9)
    #[arg(long = "num", visible_alias = "min-digits", value_name = "N", default_value_t = 0)]
    pub min_digits: usize,

    /// Minimum special characters (anything but A-Z, a-z, 0-9)
    #[arg(long = "sp", visible_alias = "min-special", value_name = "N", default_value_t = 0)]
    pub min_special: usize,

    /// Lines must also match this regex pattern
    #[arg(short, long, value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// Strip a trailing carriage return from each line
    #[arg(long, default_value_t = false)]
    pub crlf: bool,

    /// Number of threads (default: auto-detect)
    #[arg(short = 't', long, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Raw read size per chunk (e.g. "250KB", "4MB")
    #[arg(long, value_name = "SIZE", default_value = "250KB")]
    pub block_size: String,

    /// Lines per worker batch
    #[arg(long, value_name = "LINES", default_value_t = 300)]
    pub batch_size: usize,

    /// Maximum chunks in memory at once (default: 2 x threads)
    #[arg(long, value_name = "NUM")]
    pub max_in_flight: Option<usize>,

    /// Show a progress bar on stderr
    #[arg(long, default_value_t = false)]
    pub progress: bool,

    /// Print statistics on stderr when done
    #[arg(long, default_value_t = false)]
    pub stats: bool,

    /// Quiet mode - errors only
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Verbose mode - detailed logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Rule thresholds from the command line
    pub fn rule_config(&self) -> RuleConfig {
        RuleConfig {
            min_length: self.min_length,
            max_length: self.max_length,
            min_lowercase: self.min_lowercase,
            min_uppercase: self.min_uppercase,
            min_digits: self.min_digits,
            min_special: self.min_special,
            pattern: self.pattern.clone(),
        }
    }

    /// Parse block size string to bytes
    pub fn parse_block_size(&self) -> anyhow::Result<usize> {
        parse_size(&self.block_size)
    }
}

/// Parse human-readable size string to bytes
pub fn parse_size(size_str: &str) -> anyhow::Result<usize> {
    let size_str = size_str.trim().to_uppercase();

    let (num_str, multiplier) = if let Some(n) = size_str.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = size_str.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = size_str.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = size_str.strip_suffix('B') {
        (n, 1)
    } else {
        (size_str.as_str(), 1)
    };

    let num: usize = num_str
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid size format: '{}'", size_str))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("Size too large: '{}'", size_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_original_flags() {
        let args = Args::try_parse_from([
            "passfilter", "-f", "list.txt", "--min", "8", "--max", "16", "--lcase", "1", "--ucase", "2",
            "--num", "3", "--sp", "4",
        ])
        .unwrap();

        assert_eq!(
            args.rule_config(),
            RuleConfig {
                min_length: 8,
                max_length: 16,
                min_lowercase: 1,
                min_uppercase: 2,
                min_digits: 3,
                min_special: 4,
                pattern: None,
            }
        );
        assert_eq!(args.input, PathBuf::from("list.txt"));
    }

    #[test]
    fn test_descriptive_aliases() {
        let args = Args::try_parse_from(["passfilter", "-f", "x", "--min-length", "6", "--min-special", "1"]).unwrap();

        assert_eq!(args.min_length, 6);
        assert_eq!(args.min_special, 1);
        assert_eq!(args.max_length, 0);
    }

    #[test]
    fn test_file_is_required() {
        assert!(Args::try_parse_from(["passfilter", "--min", "8"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["passfilter", "-f", "x"]).unwrap();

        assert_eq!(args.parse_block_size().unwrap(), 250 * 1024);
        assert_eq!(args.batch_size, 300);
        assert_eq!(args.rule_config(), RuleConfig::default());
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("64MB").unwrap(), 64 * 1024 * 1024);
        assert_eq!(parse_size("8GB").unwrap(), 8 * 1024 * 1024 * 1024);
        assert_eq!(parse_size("250kb").unwrap(), 250 * 1024);
        assert_eq!(parse_size("512").unwrap(), 512);
        assert!(parse_size("lots").is_err());
    }
}
