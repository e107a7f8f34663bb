//! Tasks: the identity-bearing units a flow is built from.
//!
//! A [`Task`] is a cheap handle (an identity key plus shared, immutable
//! [`TaskInfo`]). Cloning a handle refers to the same task; [`Task::copy`]
//! creates a new task with the same definition.
//!
//! # Example
//!
//! ```
//! use flowgraph::task::{Signature, Task};
//!
//! let extract = Task::new("extract");
//! let transform = Task::builder("transform")
//!     .signature(Signature::keywords(["data"]))
//!     .build();
//!
//! assert_ne!(extract, transform);
//! assert_eq!(transform.clone(), transform);
//! assert_ne!(transform.copy(), transform);
//! ```

pub mod signature;

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FlowError, Result};
use crate::graph::Flow;

pub use signature::{BindError, Param, ParamKind, Signature};

static NEXT_TASK_KEY: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskKey(u64);

impl TaskKey {
    fn next() -> Self {
        Self(NEXT_TASK_KEY.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw key value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Whether a task is ordinary work or a flow input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
    /// An ordinary task.
    #[default]
    Task,
    /// A flow input. Parameters never have upstream dependencies.
    Parameter {
        /// Whether a value must be supplied when the flow runs.
        required: bool,
        /// Value used when none is supplied.
        #[serde(default)]
        default: Value,
    },
}

/// The identity-relevant definition of a task.
///
/// This is the payload hashed by the fingerprint engine and the body of a
/// serialized task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    /// Task name.
    pub name: String,

    /// Optional slug, unique within a flow.
    #[serde(default)]
    pub slug: Option<String>,

    /// Task or parameter.
    #[serde(default)]
    pub kind: TaskKind,

    /// Declared call signature.
    #[serde(default)]
    pub signature: Signature,

    /// Opaque identity attributes (code or config signatures).
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

/// Handle to a task.
///
/// Equality and hashing use the task's identity, not its definition.
#[derive(Debug, Clone)]
pub struct Task {
    key: TaskKey,
    info: Arc<TaskInfo>,
}

impl Task {
    /// Create a task with no parameters and no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder(name).build()
    }

    /// Start building a task.
    pub fn builder(name: impl Into<String>) -> TaskBuilder {
        TaskBuilder::new(name)
    }

    /// Create a parameter task.
    pub fn parameter(name: impl Into<String>, required: bool, default: Value) -> Self {
        Self::builder(name).parameter(required, default).build()
    }

    /// Create a task from a complete definition.
    pub fn from_info(info: TaskInfo) -> Self {
        Self {
            key: TaskKey::next(),
            info: Arc::new(info),
        }
    }

    /// A new task with the same definition but its own identity.
    pub fn copy(&self) -> Self {
        Self {
            key: TaskKey::next(),
            info: Arc::clone(&self.info),
        }
    }

    /// The task's identity key.
    pub fn key(&self) -> TaskKey {
        self.key
    }

    /// The task's definition.
    pub fn info(&self) -> &TaskInfo {
        &self.info
    }

    /// Task name.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Task slug, if one was assigned.
    pub fn slug(&self) -> Option<&str> {
        self.info.slug.as_deref().filter(|s| !s.is_empty())
    }

    /// Task kind.
    pub fn kind(&self) -> &TaskKind {
        &self.info.kind
    }

    /// Whether this task is a flow parameter.
    pub fn is_parameter(&self) -> bool {
        matches!(self.info.kind, TaskKind::Parameter { .. })
    }

    /// Declared call signature.
    pub fn signature(&self) -> &Signature {
        &self.info.signature
    }

    /// Identity attributes.
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.info.attributes
    }

    /// Fail if the task declares a variable-positional parameter.
    pub fn ensure_no_var_positional(&self) -> Result<()> {
        match self.signature().var_positional() {
            Some(param) => Err(FlowError::VarArgsUnsupported {
                task: self.name().to_string(),
                param: param.name.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Task: {}>", self.name())
    }
}

/// Builder for [`Task`].
#[derive(Debug, Clone, Default)]
pub struct TaskBuilder {
    info: TaskInfo,
}

impl TaskBuilder {
    /// Start a builder for a task with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: TaskInfo {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    /// Set the slug.
    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.info.slug = Some(slug.into());
        self
    }

    /// Replace the declared signature.
    pub fn signature(mut self, signature: Signature) -> Self {
        self.info.signature = signature;
        self
    }

    /// Append a positional-or-keyword parameter.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.info
            .signature
            .push(Param::new(name, ParamKind::PositionalOrKeyword));
        self
    }

    /// Mark the task as a flow parameter.
    pub fn parameter(mut self, required: bool, default: Value) -> Self {
        self.info.kind = TaskKind::Parameter { required, default };
        self
    }

    /// Set an identity attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.info.attributes.insert(key.into(), value);
        self
    }

    /// Set an identity attribute from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::Fingerprint` if the value has no canonical JSON
    /// form (for example a map with non-string keys).
    pub fn try_attribute<T: Serialize + ?Sized>(
        self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<Self> {
        let key = key.into();
        let value = serde_json::to_value(value).map_err(|e| FlowError::Fingerprint {
            subject: format!("attribute '{}' of task '{}'", key, self.info.name),
            message: e.to_string(),
        })?;
        Ok(self.attribute(key, value))
    }

    /// Finish the task.
    pub fn build(self) -> Task {
        Task::from_info(self.info)
    }
}

/// Anything that stands for a task when wiring a flow.
///
/// Plain tasks resolve to themselves. A [`TaskResult`](crate::graph::TaskResult)
/// resolves to its task and also carries the flow it came from, which is
/// merged when the result is used as a dependency.
pub trait ResolveTask {
    /// The underlying task.
    fn resolve_task(&self) -> &Task;

    /// The flow this value was produced in, if any.
    fn origin_flow(&self) -> Option<&Flow> {
        None
    }
}

impl ResolveTask for Task {
    fn resolve_task(&self) -> &Task {
        self
    }
}
