//! Flow definition validation rules.
//!
//! These checks cover what the graph builder cannot see:
//! - Task names must be non-empty
//! - Task names must be unique, since references use them
//! - Declared parameter names must be non-empty
//!
//! Graph invariants (slugs, keys, cycles, signatures) are enforced when the
//! flow is built.

use std::collections::HashSet;

use crate::config::schema::{FlowConfig, ParamConfig};
use crate::error::{FlowError, Result};

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Task name if the error is task-specific
    pub task: Option<String>,
}

/// Validate a flow definition and return all errors.
///
/// All errors are collected rather than stopping at the first one.
pub fn validate_config(config: &FlowConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (position, task) in config.tasks.iter().enumerate() {
        if task.name.trim().is_empty() {
            errors.push(ValidationError {
                rule: "empty-name".to_string(),
                message: format!("Task #{} has no name", position + 1),
                task: None,
            });
            continue;
        }

        if !seen.insert(task.name.as_str()) {
            errors.push(ValidationError {
                rule: "duplicate-task".to_string(),
                message: format!("Task '{}' is defined more than once", task.name),
                task: Some(task.name.clone()),
            });
        }

        let unnamed = task.params.iter().any(|p| match p {
            ParamConfig::Name(name) => name.is_empty(),
            ParamConfig::Full(param) => param.name.is_empty(),
        });
        if unnamed {
            errors.push(ValidationError {
                rule: "empty-param".to_string(),
                message: format!("Task '{}' declares a parameter without a name", task.name),
                task: Some(task.name.clone()),
            });
        }
    }

    errors
}

/// Validate a flow definition and return a Result.
///
/// # Errors
///
/// Returns `ConfigValidationError` if any validation rules fail.
pub fn validate(config: &FlowConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(FlowError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TaskConfig;

    fn task(name: &str) -> TaskConfig {
        TaskConfig {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_config_returns_no_errors() {
        let config = FlowConfig {
            tasks: vec![task("a"), task("b")],
            ..Default::default()
        };
        assert!(validate_config(&config).is_empty());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn detects_duplicate_names() {
        let config = FlowConfig {
            tasks: vec![task("a"), task("a")],
            ..Default::default()
        };
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "duplicate-task");
        assert_eq!(errors[0].task.as_deref(), Some("a"));
    }

    #[test]
    fn detects_empty_names() {
        let config = FlowConfig {
            tasks: vec![task(" ")],
            ..Default::default()
        };
        assert!(validate_config(&config).iter().any(|e| e.rule == "empty-name"));
    }

    #[test]
    fn detects_unnamed_params() {
        let mut t = task("t");
        t.params.push(ParamConfig::Name(String::new()));
        let config = FlowConfig {
            tasks: vec![t],
            ..Default::default()
        };
        assert!(validate_config(&config).iter().any(|e| e.rule == "empty-param"));
    }

    #[test]
    fn validate_joins_messages() {
        let config = FlowConfig {
            tasks: vec![task("a"), task("a"), task("")],
            ..Default::default()
        };
        let err = validate(&config).unwrap_err();
        match err {
            FlowError::ConfigValidationError { message } => {
                assert!(message.contains("'a'"));
                assert!(message.contains("#3"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
