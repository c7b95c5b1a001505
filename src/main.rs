//! passfilter - High-performance password list filter
//!
//! Main entry point for the command-line application.

use clap::Parser;
use std::io;
use std::process;

use passfilter::cli::Args;
use passfilter::error::FilterError;
use passfilter::processor::{Processor, ProcessorConfig};
use passfilter::progress::{print_error, print_header, print_info};

fn main() {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up logging; stdout is reserved for accepted lines
    if args.verbose {
        std::env::set_var("RUST_LOG", "debug");
    } else if !args.quiet && std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    // Configure thread pool
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }

    // Run the application
    if let Err(e) = run(args) {
        print_error(&format!("{}", e));

        // Print chain of errors
        let mut source = e.source();
        while let Some(err) = source {
            print_error(&format!("  Caused by: {}", err));
            source = err.source();
        }

        if e.downcast_ref::<FilterError>().is_some_and(FilterError::is_config) {
            print_info("Run with --help for usage");
        }

        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = ProcessorConfig::from_args(&args)?;

    if args.verbose && !args.quiet {
        print_config(&args, &config);
    }

    // Rule and tunable validation happens here, before the file is opened
    let processor = Processor::new(config)?;
    let summary = processor.process(&args.input, io::stdout())?;

    if args.stats && !args.quiet {
        summary.print_summary();
    }

    Ok(())
}

/// Print configuration summary
fn print_config(args: &Args, config: &ProcessorConfig) {
    print_header("Configuration");

    print_info(&format!("Input:          {:?}", args.input));
    print_info(&format!("Min length:     {}", config.rules.min_length));
    print_info(&format!("Max length:     {}", config.rules.max_length));
    print_info(&format!("Min lowercase:  {}", config.rules.min_lowercase));
    print_info(&format!("Min uppercase:  {}", config.rules.min_uppercase));
    print_info(&format!("Min digits:     {}", config.rules.min_digits));
    print_info(&format!("Min special:    {}", config.rules.min_special));

    if let Some(ref pattern) = config.rules.pattern {
        print_info(&format!("Pattern:        {}", pattern));
    }

    print_info(&format!("Block size:     {} KB", config.block_size / 1024));
    print_info(&format!("Batch size:     {} lines", config.batch_size));
    print_info(&format!("Max in flight:  {} chunks", config.max_in_flight));
    print_info(&format!("Threads:        {}", args.threads.unwrap_or_else(num_cpus::get)));
}
