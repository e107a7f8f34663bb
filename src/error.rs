//! Error types for flowgraph operations.
//!
//! This module defines [`FlowError`], the error type used throughout the
//! crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Graph-definition errors (slugs, keys, cycles, signatures) have their own
//!   variants so callers can match on them
//! - Every graph-definition error is returned from the mutation that detects
//!   it, after the flow has been restored to its prior state
//! - Use `anyhow::Error` (via `FlowError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for flowgraph operations.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A value that is not a task was supplied where a task is required.
    #[error("Expected a task, got {found}")]
    TypeValidation { found: String },

    /// Two tasks in the same flow share a slug.
    #[error("A task with the slug \"{slug}\" already exists in this flow")]
    DuplicateSlug { slug: String },

    /// An edge would give a parameter an upstream dependency.
    #[error("Parameter '{task}' can not have upstream dependencies")]
    InvalidDependency { task: String },

    /// A keyword argument of a task is already bound by another edge.
    #[error(
        "Argument \"{key}\" for task '{task}' has already been assigned in this flow; \
         copy the task before binding it again"
    )]
    DuplicateKey { key: String, task: String },

    /// Keyword edges do not fit the downstream task's declared signature.
    #[error("Cannot bind argument \"{key}\" to task '{task}': {reason}")]
    SignatureBind {
        key: String,
        task: String,
        reason: String,
    },

    /// A task declares a variable-positional parameter.
    #[error(
        "Task '{task}' declares variable positional parameter '*{param}', \
         which is not supported because all task arguments are bound by keyword"
    )]
    VarArgsUnsupported { task: String, param: String },

    /// The edge set contains a cycle.
    #[error("Flows must be acyclic; cycle among: {tasks}")]
    CyclicGraph { tasks: String },

    /// An identity payload could not be canonically serialized for hashing.
    #[error("Cannot fingerprint {subject}: {message}")]
    Fingerprint { subject: String, message: String },

    /// Flow definition file not found.
    #[error("Flow definition not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse a flow definition file.
    #[error("Failed to parse flow definition at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// A flow definition parsed but is not consistent.
    #[error("Invalid flow definition: {message}")]
    ConfigValidationError { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for flowgraph operations.
pub type Result<T> = std::result::Result<T, FlowError>;
