//! Serialize command implementation.
//!
//! The `flowgraph serialize` command prints the serialized form of a flow,
//! ids included, as JSON.

use std::io::Write;

use crate::cli::args::SerializeArgs;
use crate::config::load_flow_file;
use crate::error::Result;

use super::dispatcher::{Command, CommandResult};

/// The serialize command implementation.
pub struct SerializeCommand {
    args: SerializeArgs,
}

impl SerializeCommand {
    /// Create a new serialize command.
    pub fn new(args: SerializeArgs) -> Self {
        Self { args }
    }
}

impl Command for SerializeCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let flow = load_flow_file(&self.args.file)?;
        let serialized = flow.serialize(self.args.seed.as_deref())?;

        let json = if self.args.compact {
            serde_json::to_string(&serialized)
        } else {
            serde_json::to_string_pretty(&serialized)
        }
        .map_err(anyhow::Error::from)?;

        writeln!(out, "{}", json)?;
        Ok(CommandResult::success())
    }
}
