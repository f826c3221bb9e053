//! llbdump CLI - Inspect BuildKit LLB definitions
//!
//! Dumps a definition as raw bytes, JSON or YAML records, or a Graphviz
//! graph. Without an input file, the built-in compose pipeline is
//! constructed from the environment and dumped.

use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use llbdump_core::{ColorMode, Format};

mod commands;
mod config;
mod pipeline;

use commands::*;
use config::LlbdumpConfig;

/// Inspect BuildKit LLB definitions.
///
/// llbdump decodes an LLB definition, joins per-op metadata and renders
/// the build graph in the format of your choice.
#[derive(Parser)]
#[command(name = "llbdump")]
#[command(author, version)]
#[command(about = "Inspect BuildKit LLB definitions")]
#[command(propagate_version = true)]
#[command(next_help_heading = "Options")]
#[command(after_help = "Examples:
  llbdump dump                      Dump the compose pipeline as raw LLB
  llbdump dump -f graph | dot -Tsvg Render the pipeline graph
  llbdump dump -f yaml -i build.llb Show a saved definition as YAML
  buildctl ... | llbdump dump -f json -i -")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show detailed version information
    #[arg(long = "version-verbose")]
    version_verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump an LLB definition
    Dump {
        /// Output format: raw, records-json, records-yaml, graph
        /// (aliases: llb, json, yaml, dot) [default: raw]
        #[arg(short, long, value_name = "FORMAT")]
        format: Option<String>,

        /// Highlight YAML output: on, off or auto
        #[arg(long, value_name = "WHEN")]
        color: Option<ColorMode>,

        /// Read a serialized definition from PATH ("-" for stdin) instead
        /// of building the compose pipeline
        #[arg(short, long, value_name = "PATH")]
        input: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: completions::Shell,

        /// Show installation instructions instead of generating completions
        #[arg(long)]
        instructions: bool,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

/// Print verbose version information
fn print_verbose_version() {
    use colored::Colorize;

    let cli_version = env!("CARGO_PKG_VERSION");
    let platform = format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS);

    println!("llbdump {}", cli_version);
    println!("  {:<14} {}", "llbdump-cli:".cyan(), cli_version);
    println!("  {:<14} {}", "llbdump-core:".cyan(), cli_version);
    println!("  {:<14} {}", "Formats:".cyan(), format_names());
    println!("  {:<14} {}", "Platform:".cyan(), platform);
}

fn format_names() -> String {
    Format::ALL
        .iter()
        .map(Format::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Handle verbose version flag
    if cli.version_verbose {
        print_verbose_version();
        return Ok(());
    }

    setup_logging(cli.verbose, cli.quiet);

    // Load configuration from .llbdump.toml
    let config = LlbdumpConfig::load(std::path::Path::new("."));

    // Handle case where no command is provided
    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            // Print help if no command provided
            let _ = Cli::command().print_help();
            println!();
            return Ok(());
        }
    };

    match command {
        Commands::Dump {
            format,
            color,
            input,
        } => {
            // Resolve format: CLI flag > config default > raw
            let format: Format = match format.as_deref().or(config.default_format()) {
                Some(name) => name.parse()?,
                None => Format::default(),
            };
            // Resolve color: CLI flag > config > auto
            let color = color.or_else(|| config.color()).unwrap_or_default();

            dump::run(format, color, input.as_deref(), &config)
                .with_context(|| format!("Failed to dump definition as {}", format))
        }
        Commands::Completions {
            shell,
            instructions,
        } => {
            let mut cmd = Cli::command();
            completions::run(shell, instructions, &mut cmd)
        }
    }
}
