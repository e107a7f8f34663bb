//! Stable identifiers for flows and their tasks.
//!
//! A flow is identified by its name and version. Each task is identified by
//! its own definition, refined by its position in the graph until every task
//! in the flow has a distinct hash:
//!
//! 1. Every task is hashed from its definition alone.
//! 2. In topological order, tasks whose hash is not unique are rehashed
//!    together with the hashes of their upstream tasks.
//! 3. In reverse order, the same with downstream tasks.
//! 4. A second forward pass; tasks that still collide are true duplicates
//!    and are rehashed until unique, in flow order.
//!
//! A task is finalized as soon as its hash is unique, so only tasks that
//! collide with another task's definition depend on their neighbors. A task
//! with a unique definition keeps its id however it is wired.
//!
//! The final hashes are XORed with the flow id, so the same graph under a
//! different name or version gets disjoint task ids.

pub mod hash;

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::{FlowError, Result};
use crate::graph::{Flow, GraphIndex};
use crate::task::Task;

pub use hash::Digest;

/// Flow and task identifiers computed for one graph.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowFingerprint {
    flow_id: Uuid,
    task_ids: HashMap<Task, Uuid>,
}

impl FlowFingerprint {
    pub fn flow_id(&self) -> Uuid {
        self.flow_id
    }

    /// The id of `task`, if it is part of the fingerprinted flow.
    pub fn task_id(&self, task: &Task) -> Option<Uuid> {
        self.task_ids.get(task).copied()
    }

    pub fn into_task_ids(self) -> HashMap<Task, Uuid> {
        self.task_ids
    }
}

/// The id of a flow with this name and version.
pub fn flow_id(name: &str, version: Option<&str>) -> Uuid {
    Uuid::from_bytes(hash::hash_str(&format!("{}:{}", name, version.unwrap_or(""))))
}

/// A flow id derived from a caller-supplied seed instead of name and version.
pub fn seeded_flow_id(seed: &str) -> Uuid {
    Uuid::from_bytes(hash::hash_str(seed))
}

/// Compute the flow id and every task id of `flow`.
///
/// With `seed`, the flow id is derived from the seed and task ids follow.
///
/// # Errors
///
/// `CyclicGraph` if the flow contains a cycle and `Fingerprint` if a task
/// definition cannot be hashed.
pub fn fingerprint(flow: &Flow, seed: Option<&str>) -> Result<FlowFingerprint> {
    let flow_id = match seed {
        Some(seed) => seeded_flow_id(seed),
        None => flow_id(flow.name(), flow.version()),
    };

    let order = flow.sorted_tasks(None)?;
    let index = flow.graph_index();

    let mut refinement = Refinement::new(&order)?;
    refinement.pass("forward", order.iter(), &index, Direction::Upstream, false)?;
    refinement.pass("backward", order.iter().rev(), &index, Direction::Downstream, false)?;
    refinement.pass("forward #2", order.iter(), &index, Direction::Upstream, true)?;

    let mut task_ids = HashMap::with_capacity(order.len());
    for (task, digest) in refinement.finalized {
        let bytes = hash::xor(flow_id.as_bytes(), &digest);
        let id = Uuid::from_slice(&bytes).map_err(|e| FlowError::Fingerprint {
            subject: format!("task '{}'", task.name()),
            message: e.to_string(),
        })?;
        task_ids.insert(task, id);
    }

    Ok(FlowFingerprint { flow_id, task_ids })
}

/// Order-independent digest of every task and edge definition, as hex.
///
/// Two flows with the same digest have the same task definitions wired the
/// same way, whatever their names or insertion order.
pub fn graph_digest(flow: &Flow) -> Result<String> {
    let mut parts = Vec::with_capacity(flow.tasks().len() + flow.edges().len());
    for task in flow.tasks() {
        parts.push(hex::encode(hash::hash_task(task)?));
    }
    for edge in flow.edges() {
        parts.push(hex::encode(hash::hash_edge(edge)?));
    }
    parts.sort();
    Ok(hex::encode(hash::hash_str(&parts.join(","))))
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Upstream,
    Downstream,
}

/// Running state of the task hash refinement.
struct Refinement {
    hashes: HashMap<Task, Digest>,
    counts: HashMap<Digest, usize>,
    finalized: HashMap<Task, Digest>,
}

impl Refinement {
    fn new(tasks: &[Task]) -> Result<Self> {
        let mut hashes = HashMap::with_capacity(tasks.len());
        let mut counts: HashMap<Digest, usize> = HashMap::new();

        for task in tasks {
            let digest = hash::hash_task(task)?;
            tracing::trace!(task = task.name(), hash = %hex::encode(digest), "Base hash");
            *counts.entry(digest).or_default() += 1;
            hashes.insert(task.clone(), digest);
        }

        Ok(Self {
            hashes,
            counts,
            finalized: HashMap::with_capacity(tasks.len()),
        })
    }

    fn hash_of(&self, task: &Task) -> Digest {
        self.hashes.get(task).copied().unwrap_or_default()
    }

    fn count(&self, digest: &Digest) -> usize {
        self.counts.get(digest).copied().unwrap_or_default()
    }

    fn record(&mut self, digest: Digest) {
        *self.counts.entry(digest).or_default() += 1;
    }

    fn pass<'a, I>(
        &mut self,
        label: &str,
        order: I,
        index: &GraphIndex,
        direction: Direction,
        force: bool,
    ) -> Result<()>
    where
        I: Iterator<Item = &'a Task>,
    {
        let mut rehashed = 0usize;

        for task in order {
            if self.finalized.contains_key(task) {
                continue;
            }

            let current = self.hash_of(task);
            if self.count(&current) == 1 {
                self.finalized.insert(task.clone(), current);
                continue;
            }

            let neighbors: Vec<(Option<&str>, Digest)> = match direction {
                Direction::Upstream => index
                    .edges_to(task)
                    .iter()
                    .map(|e| (e.key.as_deref(), self.hash_of(&e.upstream)))
                    .collect(),
                Direction::Downstream => index
                    .edges_from(task)
                    .iter()
                    .map(|e| (e.key.as_deref(), self.hash_of(&e.downstream)))
                    .collect(),
            };

            let mut next = hash::fold(&current, neighbors)?;
            self.record(next);
            rehashed += 1;

            if force {
                while self.count(&next) > 1 {
                    next = hash::rehash(&next);
                    self.record(next);
                }
                self.finalized.insert(task.clone(), next);
            }

            tracing::trace!(task = task.name(), hash = %hex::encode(next), pass = label, "Rehashed");
            self.hashes.insert(task.clone(), next);
        }

        tracing::debug!(
            pass = label,
            rehashed,
            finalized = self.finalized.len(),
            "Fingerprint pass complete"
        );
        Ok(())
    }
}

impl Flow {
    /// This flow's id, derived from its name and version.
    pub fn flow_id(&self) -> Uuid {
        flow_id(self.name(), self.version())
    }

    /// Stable ids for every task in this flow.
    pub fn task_ids(&self) -> Result<HashMap<Task, Uuid>> {
        fingerprint(self, None).map(FlowFingerprint::into_task_ids)
    }

    /// Flow and task ids, optionally derived from `seed`.
    pub fn fingerprint(&self, seed: Option<&str>) -> Result<FlowFingerprint> {
        fingerprint(self, seed)
    }
}
