//! Declarative flow definitions.
//!
//! This module handles:
//! - Schema definitions in [`schema`]
//! - Loading and building in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use flowgraph::config::load_flow_file;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join("flow.yml");
//! fs::write(&path, "name: etl\ntasks:\n  - name: extract\n  - name: load\n    upstream: [extract]\n").unwrap();
//!
//! let flow = load_flow_file(&path).unwrap();
//! assert_eq!(flow.name(), "etl");
//! assert_eq!(flow.edges().len(), 1);
//! ```

pub mod loader;
pub mod schema;
pub mod validator;

// Schema re-exports
pub use schema::{FlowConfig, ParamConfig, ParameterConfig, TaskConfig};

// Loader re-exports
pub use loader::{build_flow, load_config_file, load_flow_file, parse_config};

// Validator re-exports
pub use validator::{validate, validate_config, ValidationError};
