//! Arbor command line.
//!
//! Loads simulation documents, checks their wiring and runs them.
//!
//! # Quick Start
//!
//! ```bash
//! # List the runs a document produces
//! arbor list wheat.arbor
//!
//! # Check that every dependency can be bound
//! arbor check wheat.arbor
//!
//! # Run one simulation (or experiment) on the calling thread
//! arbor run wheat.arbor --simulation Base --sequential
//! ```

mod commands;
mod style;

use anyhow::{Context, Result};
use arbor_config::ArborConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Arbor - composition host for trees of simulation components.
#[derive(Parser)]
#[command(name = "arbor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// List the runs a document would produce.
    List {
        /// Path to the document.
        file: String,
    },

    /// Execute the runs of a document.
    Run {
        /// Path to the document.
        file: String,

        /// Only run this simulation or experiment.
        #[arg(short, long)]
        simulation: Option<String>,

        /// Run everything on the calling thread.
        #[arg(long)]
        sequential: bool,
    },

    /// Read a value or node by address.
    Get {
        /// Path to the document.
        file: String,

        /// Address, e.g. `.Simulations.Base.Clock.Start` or `[Clock].Start`.
        address: String,

        /// Resolve inside a bound copy of this simulation instead of the document.
        #[arg(short, long)]
        simulation: Option<String>,
    },

    /// Write a value by address and save the document.
    Set {
        /// Path to the document.
        file: String,

        /// Address of the value to change.
        address: String,

        /// New value as JSON, e.g. `"2001-01-01"`, `42` or `[1, 2]`.
        value: String,
    },

    /// Bind every run and report dependency errors.
    Check {
        /// Path to the document.
        file: String,
    },

    /// Rewrite a document in the current format version.
    Upgrade {
        /// Path to the document.
        file: String,
    },

    /// Show the effective configuration.
    Config {
        /// Output format (toml, json).
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    style::set_no_color(cli.no_color);

    let config = ArborConfig::load().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::List { file } => commands::list::run(&config, &file),
        Commands::Run {
            file,
            simulation,
            sequential,
        } => commands::run::run(&config, &file, simulation.as_deref(), sequential),
        Commands::Get {
            file,
            address,
            simulation,
        } => commands::get::run(&config, &file, &address, simulation.as_deref()),
        Commands::Set {
            file,
            address,
            value,
        } => commands::set::run(&config, &file, &address, &value),
        Commands::Check { file } => commands::check::run(&config, &file),
        Commands::Upgrade { file } => commands::upgrade::run(&config, &file),
        Commands::Config { format } => commands::config::show(&config, &format),
    }
}
