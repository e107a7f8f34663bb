//! Flow graphs: tasks connected by dependency edges.
//!
//! This module provides:
//! - [`Flow`] and its mutation API with all-or-nothing semantics
//! - [`Edge`] for directed, optionally keyed dependencies
//! - Topological queries (sorting, cycle detection, neighbors)
//! - The serialized representation of a flow
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
//!
//! let mut flow = Flow::new("etl");
//! flow.set_dependencies(&transform, Dependencies::new().keyword("data", &extract), true)
//!     .unwrap();
//!
//! let order = flow.sorted_tasks(None).unwrap();
//! assert_eq!(order, vec![extract, transform]);
//! ```

pub mod edge;
pub mod flow;
pub mod index;
pub mod result;
pub mod serialize;
pub mod topology;

pub use edge::Edge;
pub use flow::{Dependencies, Flow, ParameterDetails};
pub use index::GraphIndex;
pub use result::TaskResult;
pub use serialize::{SerializedEdge, SerializedFlow, SerializedTask};
