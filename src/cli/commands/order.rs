//! Order command implementation.
//!
//! The `flowgraph order` command prints task names in dependency order, one
//! per line.

use std::io::Write;

use crate::cli::args::OrderArgs;
use crate::config::load_flow_file;
use crate::error::{FlowError, Result};
use crate::task::Task;

use super::dispatcher::{Command, CommandResult};

/// The order command implementation.
pub struct OrderCommand {
    args: OrderArgs,
}

impl OrderCommand {
    /// Create a new order command.
    pub fn new(args: OrderArgs) -> Self {
        Self { args }
    }
}

impl Command for OrderCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let flow = load_flow_file(&self.args.file)?;

        let roots = self
            .args
            .roots
            .iter()
            .map(|name| {
                flow.task_by_name(name)
                    .cloned()
                    .ok_or_else(|| FlowError::TypeValidation {
                        found: format!("'{}', which does not name a task", name),
                    })
            })
            .collect::<Result<Vec<Task>>>()?;

        let root_filter = if roots.is_empty() {
            None
        } else {
            Some(roots.as_slice())
        };

        for task in flow.sorted_tasks(root_filter)? {
            writeln!(out, "{}", task.name())?;
        }

        Ok(CommandResult::success())
    }
}
