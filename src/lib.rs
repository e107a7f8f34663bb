//! flowgraph - The dependency-graph core of a workflow orchestrator.
//!
//! Tasks are assembled into a directed graph of dependencies (a flow). The
//! crate keeps that graph valid under every mutation and derives stable ids
//! for the flow and each of its tasks, so the same pipeline gets the same ids
//! every time it is defined.
//!
//! # Modules
//!
//! - [`task`] - Tasks, their declared signatures and identity
//! - [`graph`] - Flows, edges, graph mutation and topological queries
//! - [`fingerprint`] - Stable flow and task ids
//! - [`config`] - Declarative flow definitions (YAML or JSON)
//! - [`cli`] - Command-line interface and argument parsing
//! - [`error`] - Error types and result aliases
//!
//! # Example
//!
//! ```
//! use flowgraph::graph::{Dependencies, Flow};
//! use flowgraph::task::{Signature, Task};
//!
//! let extract = Task::new("extract");
//! let transform = Task::builder("transform")
//!     .signature(Signature::keywords(["data"]))
//!     .build();
//! let load = Task::new("load");
//!
//! let mut flow = Flow::new("etl").with_version("1");
//! flow.set_dependencies(&transform, Dependencies::new().keyword("data", &extract), true)
//!     .unwrap();
//! flow.set_dependencies(&load, Dependencies::new().upstream(&transform), true)
//!     .unwrap();
//!
//! assert_eq!(flow.sorted_tasks(None).unwrap(), vec![extract.clone(), transform, load]);
//!
//! let ids = flow.task_ids().unwrap();
//! assert_eq!(ids.len(), 3);
//! assert_eq!(flow.task_ids().unwrap()[&extract], ids[&extract]);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod graph;
pub mod task;

pub use error::{FlowError, Result};
pub use fingerprint::FlowFingerprint;
pub use graph::{Dependencies, Edge, Flow, SerializedFlow, TaskResult};
pub use task::{ResolveTask, Signature, Task};
