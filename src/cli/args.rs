//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// flowgraph - Validate, order and fingerprint workflow graphs.
#[derive(Debug, Parser)]
#[command(name = "flowgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check that a flow definition builds into a valid graph
    Validate(ValidateArgs),

    /// Print tasks in dependency order
    Order(OrderArgs),

    /// Show roots, terminals, parameters and ids of a flow
    Inspect(InspectArgs),

    /// Print the serialized flow as JSON
    Serialize(SerializeArgs),
}

/// Arguments for the `validate` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ValidateArgs {
    /// Flow definition file (YAML or JSON)
    pub file: PathBuf,
}

/// Arguments for the `order` command.
#[derive(Debug, Clone, clap::Args)]
pub struct OrderArgs {
    /// Flow definition file (YAML or JSON)
    pub file: PathBuf,

    /// Only order this task and everything downstream of it (repeatable)
    #[arg(long = "root", value_name = "NAME")]
    pub roots: Vec<String>,
}

/// Arguments for the `inspect` command.
#[derive(Debug, Clone, clap::Args)]
pub struct InspectArgs {
    /// Flow definition file (YAML or JSON)
    pub file: PathBuf,
}

/// Arguments for the `serialize` command.
#[derive(Debug, Clone, clap::Args)]
pub struct SerializeArgs {
    /// Flow definition file (YAML or JSON)
    pub file: PathBuf,

    /// Derive the flow id from this seed instead of name and version
    #[arg(long, env = "FLOWGRAPH_SEED")]
    pub seed: Option<String>,

    /// Print JSON on a single line
    #[arg(long)]
    pub compact: bool,
}
