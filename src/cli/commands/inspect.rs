//! Inspect command implementation.
//!
//! The `flowgraph inspect` command prints a summary of a flow: its ids,
//! entry and exit tasks, and parameters.

use std::io::Write;

use serde_json::Value;

use crate::cli::args::InspectArgs;
use crate::config::load_flow_file;
use crate::error::Result;
use crate::fingerprint::graph_digest;
use crate::task::Task;

use super::dispatcher::{Command, CommandResult};

/// The inspect command implementation.
pub struct InspectCommand {
    args: InspectArgs,
}

impl InspectCommand {
    /// Create a new inspect command.
    pub fn new(args: InspectArgs) -> Self {
        Self { args }
    }
}

fn names(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "(none)".to_string();
    }
    tasks.iter().map(Task::name).collect::<Vec<_>>().join(", ")
}

impl Command for InspectCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let flow = load_flow_file(&self.args.file)?;
        let fingerprint = flow.fingerprint(None)?;

        writeln!(out, "Flow:         {}", flow.name())?;
        if let Some(version) = flow.version() {
            writeln!(out, "Version:      {}", version)?;
        }
        if let Some(description) = flow.description() {
            writeln!(out, "Description:  {}", description)?;
        }
        writeln!(out, "Flow id:      {}", fingerprint.flow_id())?;
        writeln!(out, "Graph digest: {}", graph_digest(&flow)?)?;
        writeln!(out, "Tasks:        {}", flow.tasks().len())?;
        writeln!(out, "Edges:        {}", flow.edges().len())?;
        writeln!(out, "Roots:        {}", names(&flow.root_tasks()))?;
        writeln!(out, "Terminals:    {}", names(&flow.terminal_tasks()))?;

        let parameters = flow.parameters(false);
        if !parameters.is_empty() {
            writeln!(out, "Parameters:")?;
            for (name, details) in &parameters {
                if details.required {
                    writeln!(out, "  {} (required)", name)?;
                } else if details.default == Value::Null {
                    writeln!(out, "  {}", name)?;
                } else {
                    writeln!(out, "  {} (default: {})", name, details.default)?;
                }
            }
        }

        Ok(CommandResult::success())
    }
}
