//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Packhorse -- SBOM generation and format conversion.
///
/// Use `packhorse <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "packhorse", version, about, long_about = None)]
pub struct Cli {
    /// Path to the packhorse.toml configuration file.
    #[arg(short, long, default_value = "packhorse.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a directory tree and emit an SBOM.
    Scan(ScanArgs),

    /// Convert an SBOM document to another format.
    Convert(ConvertArgs),

    /// List supported SBOM formats and their aliases.
    Formats,

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- scan ----

/// Scan a directory tree for packages.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Path to scan (default: current directory).
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format name or alias (overrides [output].format).
    #[arg(short = 'o', long = "output-format")]
    pub output_format: Option<String>,

    /// Write the document to this file instead of stdout.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Override maximum nested-archive recursion depth.
    #[arg(long)]
    pub max_depth: Option<u32>,
}

// ---- convert ----

/// Convert an SBOM document between formats.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input document path.
    pub input: PathBuf,

    /// Target format name or alias.
    #[arg(short = 'o', long = "to", value_name = "FORMAT")]
    pub to: String,

    /// Source format name (default: identify by content).
    #[arg(long)]
    pub from: Option<String>,

    /// Write the result to this file instead of stdout.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

// ---- config ----

/// Manage packhorse configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, archive, output).
        #[arg(long)]
        section: Option<String>,
    },
}
