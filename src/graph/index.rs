//! Derived adjacency data for a flow, cached by graph content.
//!
//! A [`GraphIndex`] is a pure function of a flow's `(tasks, edges)`. The
//! flow keeps the last index in an [`IndexCache`] next to the structural
//! fingerprint it was built from and rebuilds it only when the fingerprint
//! no longer matches.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, OnceLock};

use indexmap::IndexSet;

use crate::graph::Edge;
use crate::task::Task;

/// Cache key derived from the current task and edge sets.
pub fn structural_fingerprint(tasks: &IndexSet<Task>, edges: &IndexSet<Edge>) -> u64 {
    let mut hasher = DefaultHasher::new();
    tasks.len().hash(&mut hasher);
    for task in tasks {
        task.hash(&mut hasher);
    }
    edges.len().hash(&mut hasher);
    for edge in edges {
        edge.hash(&mut hasher);
    }
    hasher.finish()
}

/// Incoming/outgoing edges per task plus root and terminal sets.
#[derive(Debug)]
pub struct GraphIndex {
    fingerprint: u64,
    edges_to: HashMap<Task, Vec<Edge>>,
    edges_from: HashMap<Task, Vec<Edge>>,
    roots: Vec<Task>,
    terminals: Vec<Task>,
    sorted: OnceLock<Vec<Task>>,
}

impl GraphIndex {
    /// Build the index for a task and edge set.
    pub fn build(tasks: &IndexSet<Task>, edges: &IndexSet<Edge>) -> Self {
        let mut edges_to: HashMap<Task, Vec<Edge>> = HashMap::with_capacity(tasks.len());
        let mut edges_from: HashMap<Task, Vec<Edge>> = HashMap::with_capacity(tasks.len());

        for task in tasks {
            edges_to.insert(task.clone(), Vec::new());
            edges_from.insert(task.clone(), Vec::new());
        }

        for edge in edges {
            edges_to
                .entry(edge.downstream.clone())
                .or_default()
                .push(edge.clone());
            edges_from
                .entry(edge.upstream.clone())
                .or_default()
                .push(edge.clone());
        }

        let roots = tasks
            .iter()
            .filter(|t| edges_to.get(*t).map_or(true, Vec::is_empty))
            .cloned()
            .collect();
        let terminals = tasks
            .iter()
            .filter(|t| edges_from.get(*t).map_or(true, Vec::is_empty))
            .cloned()
            .collect();

        Self {
            fingerprint: structural_fingerprint(tasks, edges),
            edges_to,
            edges_from,
            roots,
            terminals,
            sorted: OnceLock::new(),
        }
    }

    /// The structural fingerprint this index was built from.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Edges whose downstream task is `task`.
    pub fn edges_to(&self, task: &Task) -> &[Edge] {
        self.edges_to.get(task).map_or(&[][..], Vec::as_slice)
    }

    /// Edges whose upstream task is `task`.
    pub fn edges_from(&self, task: &Task) -> &[Edge] {
        self.edges_from.get(task).map_or(&[][..], Vec::as_slice)
    }

    /// Tasks without incoming edges, in flow order.
    pub fn roots(&self) -> &[Task] {
        &self.roots
    }

    /// Tasks without outgoing edges, in flow order.
    pub fn terminals(&self) -> &[Task] {
        &self.terminals
    }

    /// The full topological order, if it has been computed.
    pub(crate) fn sorted(&self) -> Option<&[Task]> {
        self.sorted.get().map(Vec::as_slice)
    }

    /// Remember the full topological order.
    pub(crate) fn remember_sorted(&self, sorted: Vec<Task>) {
        // A concurrent reader may have stored the same order first.
        let _ = self.sorted.set(sorted);
    }
}

/// Holder for the last [`GraphIndex`] a flow computed.
#[derive(Default)]
pub struct IndexCache {
    slot: Mutex<Option<Arc<GraphIndex>>>,
}

impl IndexCache {
    /// Return the cached index if it matches the graph, otherwise rebuild it.
    pub fn get_or_build(&self, tasks: &IndexSet<Task>, edges: &IndexSet<Edge>) -> Arc<GraphIndex> {
        let fingerprint = structural_fingerprint(tasks, edges);
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(index) = slot.as_ref() {
            if index.fingerprint == fingerprint {
                return Arc::clone(index);
            }
        }

        tracing::trace!(
            tasks = tasks.len(),
            edges = edges.len(),
            "Rebuilding graph index"
        );
        let index = Arc::new(GraphIndex::build(tasks, edges));
        *slot = Some(Arc::clone(&index));
        index
    }

    fn current(&self) -> Option<Arc<GraphIndex>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Clone for IndexCache {
    fn clone(&self) -> Self {
        Self {
            slot: Mutex::new(self.current()),
        }
    }
}

impl fmt::Debug for IndexCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexCache")
            .field("fingerprint", &self.current().map(|i| i.fingerprint))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> (IndexSet<Task>, IndexSet<Edge>, Task, Task, Task) {
        let a = Task::new("a");
        let b = Task::new("b");
        let c = Task::new("c");
        let tasks: IndexSet<Task> = [a.clone(), b.clone(), c.clone()].into_iter().collect();
        let edges: IndexSet<Edge> = [
            Edge::new(a.clone(), b.clone(), None),
            Edge::keyed(b.clone(), c.clone(), "x"),
        ]
        .into_iter()
        .collect();
        (tasks, edges, a, b, c)
    }

    #[test]
    fn index_tracks_both_directions() {
        let (tasks, edges, a, b, c) = chain();
        let index = GraphIndex::build(&tasks, &edges);

        assert_eq!(index.edges_to(&b).len(), 1);
        assert_eq!(index.edges_to(&b)[0].upstream, a);
        assert_eq!(index.edges_from(&b)[0].downstream, c);
        assert!(index.edges_to(&a).is_empty());
    }

    #[test]
    fn roots_and_terminals() {
        let (tasks, edges, a, _, c) = chain();
        let index = GraphIndex::build(&tasks, &edges);
        assert_eq!(index.roots(), &[a]);
        assert_eq!(index.terminals(), &[c]);
    }

    #[test]
    fn unknown_task_has_no_edges() {
        let (tasks, edges, ..) = chain();
        let index = GraphIndex::build(&tasks, &edges);
        assert!(index.edges_to(&Task::new("z")).is_empty());
    }

    #[test]
    fn fingerprint_changes_with_edges() {
        let (tasks, mut edges, a, _, c) = chain();
        let before = structural_fingerprint(&tasks, &edges);
        edges.insert(Edge::new(a, c, None));
        assert_ne!(before, structural_fingerprint(&tasks, &edges));
    }

    #[test]
    fn cache_reuses_index_for_unchanged_graph() {
        let (tasks, mut edges, a, _, c) = chain();
        let cache = IndexCache::default();

        let first = cache.get_or_build(&tasks, &edges);
        let second = cache.get_or_build(&tasks, &edges);
        assert!(Arc::ptr_eq(&first, &second));

        edges.insert(Edge::new(a, c, None));
        let third = cache.get_or_build(&tasks, &edges);
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn cloned_cache_shares_current_index() {
        let (tasks, edges, ..) = chain();
        let cache = IndexCache::default();
        let first = cache.get_or_build(&tasks, &edges);
        let cloned = cache.clone();
        assert!(Arc::ptr_eq(&first, &cloned.get_or_build(&tasks, &edges)));
    }
}
