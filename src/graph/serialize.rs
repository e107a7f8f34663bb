//! The plain nested-record form of a flow.
//!
//! Ids are computed by the fingerprint engine at serialization time; tasks
//! and edges never store them.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{FlowError, Result};
use crate::graph::{Edge, Flow, ParameterDetails};
use crate::task::{Task, TaskInfo};

/// A serialized flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedFlow {
    pub ref_id: Uuid,
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub parameters: BTreeMap<String, ParameterDetails>,
    pub schedule: Value,
    pub tasks: Vec<SerializedTask>,
    pub edges: Vec<SerializedEdge>,
}

/// A serialized task: its id followed by its definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedTask {
    pub ref_id: Uuid,
    #[serde(flatten)]
    pub info: TaskInfo,
}

/// A serialized edge, referring to tasks by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedEdge {
    pub upstream_ref_id: Uuid,
    pub downstream_ref_id: Uuid,
    pub key: Option<String>,
}

impl Flow {
    /// Serialize the flow, computing ids for the flow and every task.
    ///
    /// # Errors
    ///
    /// Any error from [`fingerprint`](crate::fingerprint::fingerprint).
    pub fn serialize(&self, seed: Option<&str>) -> Result<SerializedFlow> {
        let fingerprint = self.fingerprint(seed)?;
        let id_of = |task: &Task| {
            fingerprint.task_id(task).ok_or_else(|| FlowError::Fingerprint {
                subject: format!("task '{}'", task.name()),
                message: "task has no id".to_string(),
            })
        };

        let tasks = self
            .tasks()
            .iter()
            .map(|t| {
                Ok(SerializedTask {
                    ref_id: id_of(t)?,
                    info: t.info().clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let edges = self
            .edges()
            .iter()
            .map(|e| {
                Ok(SerializedEdge {
                    upstream_ref_id: id_of(&e.upstream)?,
                    downstream_ref_id: id_of(&e.downstream)?,
                    key: e.key.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(flow = %self.name(), tasks = tasks.len(), edges = edges.len(), "Serialized flow");

        Ok(SerializedFlow {
            ref_id: fingerprint.flow_id(),
            name: self.name().to_string(),
            version: self.version().map(str::to_string),
            description: self.description().map(str::to_string),
            parameters: self.parameters(false),
            schedule: self.schedule().clone(),
            tasks,
            edges,
        })
    }
}

impl SerializedFlow {
    /// Rebuild a flow from its serialized form.
    ///
    /// Tasks get fresh identities; the rebuilt flow fingerprints to the same
    /// ids as the flow it was serialized from.
    ///
    /// # Errors
    ///
    /// `TypeValidation` if an edge refers to an id that is not a task of this
    /// flow, and any error from adding the tasks and edges.
    pub fn into_flow(self) -> Result<Flow> {
        let mut by_id: HashMap<Uuid, Task> = HashMap::with_capacity(self.tasks.len());
        let mut tasks = Vec::with_capacity(self.tasks.len());
        for serialized in self.tasks {
            let task = Task::from_info(serialized.info);
            by_id.insert(serialized.ref_id, task.clone());
            tasks.push(task);
        }

        let lookup = |id: &Uuid| {
            by_id.get(id).cloned().ok_or_else(|| FlowError::TypeValidation {
                found: format!("unknown task reference {}", id),
            })
        };

        let edges = self
            .edges
            .iter()
            .map(|e| {
                Ok(Edge::new(
                    lookup(&e.upstream_ref_id)?,
                    lookup(&e.downstream_ref_id)?,
                    e.key.clone(),
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut flow = Flow::with_graph(self.name, tasks, edges)?.with_schedule(self.schedule);
        if let Some(version) = self.version {
            flow = flow.with_version(version);
        }
        if let Some(description) = self.description {
            flow = flow.with_description(description);
        }
        Ok(flow)
    }
}
