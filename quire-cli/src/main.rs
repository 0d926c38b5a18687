//! Quire CLI - batch EPUB to PDF conversion

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::ConvertOptions;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file; command-line flags take precedence
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every EPUB under the source directory, skipping up-to-date outputs
    All {
        #[command(flatten)]
        options: ConvertOptions,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a single EPUB file
    Convert {
        /// Input file path
        input: PathBuf,

        #[command(flatten)]
        options: ConvertOptions,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display information about an EPUB file
    Info {
        /// Input file path
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that an EPUB file can be converted, without rendering it
    Validate {
        /// Input file path
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "quire_cli=debug,quire_core=debug"
    } else {
        "quire_cli=info,quire_core=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_file = cli.config.as_deref();

    match cli.command {
        Commands::All { options, json } => commands::all(&options, config_file, json),

        Commands::Convert {
            input,
            options,
            json,
        } => commands::convert(&input, &options, config_file, json),

        Commands::Info { input, json } => commands::info(&input, config_file, json),

        Commands::Validate { input } => commands::validate(&input, config_file),
    }
}
