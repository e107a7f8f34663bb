//! Flow definition loading and building.
//!
//! A definition is read from disk, checked by the validator, and then built
//! into a [`Flow`] through the regular graph-building API, so every graph
//! invariant applies to declarative flows as well.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::config::schema::FlowConfig;
use crate::config::validator::validate;
use crate::error::{FlowError, Result};
use crate::graph::{Dependencies, Flow};
use crate::task::{ResolveTask, Task};

/// Load a single flow definition file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<FlowConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            FlowError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            FlowError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML (or JSON) content into a FlowConfig.
///
/// # Arguments
///
/// * `content` - The document to parse
/// * `source_path` - Path for error reporting
pub fn parse_config(content: &str, source_path: &Path) -> Result<FlowConfig> {
    serde_yaml::from_str(content).map_err(|e| FlowError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a flow definition file and build the flow it describes.
pub fn load_flow_file(path: &Path) -> Result<Flow> {
    let config = load_config_file(path)?;
    tracing::debug!(path = %path.display(), tasks = config.tasks.len(), "Loaded flow definition");
    build_flow(&config)
}

/// Build a flow from a definition.
///
/// Tasks are added in definition order, then each task's dependencies are
/// wired in place. The finished graph is checked for cycles once.
///
/// # Errors
///
/// `ConfigValidationError` for an inconsistent definition, `TypeValidation`
/// when a dependency does not name a task, and any graph-building error.
pub fn build_flow(config: &FlowConfig) -> Result<Flow> {
    validate(config)?;

    let mut flow = Flow::new(config.name.as_deref().unwrap_or("Flow"))
        .with_schedule(config.schedule.clone());
    if let Some(version) = &config.version {
        flow = flow.with_version(version);
    }
    if let Some(description) = &config.description {
        flow = flow.with_description(description);
    }
    if let Some(environment) = &config.environment {
        flow = flow.with_environment(environment.clone());
    }

    let tasks: HashMap<&str, Task> = config
        .tasks
        .iter()
        .map(|t| (t.name.as_str(), t.to_task()))
        .collect();

    for entry in &config.tasks {
        let task = lookup(&tasks, &entry.name)?;
        flow.add_task(task)?;
    }

    for entry in &config.tasks {
        let task = lookup(&tasks, &entry.name)?;

        let mut dependencies = Dependencies::new();
        for name in &entry.upstream {
            dependencies = dependencies.upstream(lookup(&tasks, name)? as &dyn ResolveTask);
        }
        for name in &entry.downstream {
            dependencies = dependencies.downstream(lookup(&tasks, name)? as &dyn ResolveTask);
        }
        for (key, name) in &entry.keywords {
            dependencies = dependencies.keyword(key, lookup(&tasks, name)? as &dyn ResolveTask);
        }

        flow.wire_dependencies(task, dependencies, false)?;
    }

    flow.validate()?;

    tracing::debug!(flow = %flow, tasks = flow.tasks().len(), edges = flow.edges().len(), "Built flow");
    Ok(flow)
}

fn lookup<'t>(tasks: &'t HashMap<&str, Task>, name: &str) -> Result<&'t Task> {
    tasks.get(name).ok_or_else(|| FlowError::TypeValidation {
        found: format!("'{}', which does not name a task", name),
    })
}

impl FlowConfig {
    /// Build the flow this definition describes.
    pub fn build(&self) -> Result<Flow> {
        build_flow(self)
    }
}
