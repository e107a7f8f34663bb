//! Validate command implementation.
//!
//! The `flowgraph validate` command builds a flow definition and checks the
//! resulting graph.

use std::io::Write;

use crate::cli::args::ValidateArgs;
use crate::config::load_flow_file;
use crate::error::Result;

use super::dispatcher::{Command, CommandResult};

/// The validate command implementation.
pub struct ValidateCommand {
    args: ValidateArgs,
}

impl ValidateCommand {
    /// Create a new validate command.
    pub fn new(args: ValidateArgs) -> Self {
        Self { args }
    }
}

impl Command for ValidateCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let flow = load_flow_file(&self.args.file)?;
        flow.validate()?;

        writeln!(
            out,
            "{} is valid: {} tasks, {} edges",
            flow,
            flow.tasks().len(),
            flow.edges().len()
        )?;

        Ok(CommandResult::success())
    }
}
