//! Command-line interface for workgate
//!
//! Each subcommand drives one component with a synthetic workload and reports
//! what it observed, which makes the concurrency bounds easy to see from a shell.

use crate::config::WorkgateConfig;
use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

mod commands;
mod output;

pub use output::{Output, OutputFormat};

/// workgate - worker pools, bounded parallel runs and rate limiting
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Use custom configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit sleeping tasks to a worker pool and wait for them
    Pool(commands::pool::PoolArgs),
    /// Run a batch of tasks with bounded concurrency
    Run(commands::run::RunArgs),
    /// Process a range of numbers in parallel chunks
    Batch(commands::batch::BatchArgs),
    /// Perform rate-limited operations
    Limit(commands::limit::LimitArgs),
    /// Show the resolved configuration
    Config,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);

        let output = Output::new(self.verbose > 0, self.quiet, self.format);
        let config = WorkgateConfig::load_with_custom_config(self.config.as_deref())?;

        match self.command {
            Some(Commands::Pool(args)) => commands::pool::execute(args, &config, &output),
            Some(Commands::Run(args)) => commands::run::execute(args, &config, &output),
            Some(Commands::Batch(args)) => commands::batch::execute(args, &config, &output),
            Some(Commands::Limit(args)) => commands::limit::execute(args, &config, &output),
            Some(Commands::Config) => commands::config::execute(&config, &output),
            None => {
                let mut cmd = Cli::command();
                cmd.print_help()?;
                Ok(())
            }
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    // Logs go to stderr so JSON reports on stdout stay parseable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
