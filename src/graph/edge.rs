//! Directed, optionally keyed dependencies between tasks.

use std::fmt;

use crate::task::Task;

/// A dependency of `downstream` on `upstream`.
///
/// When `key` is set, the upstream task's result is bound to the keyword
/// argument `key` of the downstream task. Edges compare by value: two edges
/// with the same endpoints and key are the same edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    /// The task that runs first.
    pub upstream: Task,
    /// The task that depends on it.
    pub downstream: Task,
    /// Keyword argument of `downstream` receiving the upstream result.
    pub key: Option<String>,
}

impl Edge {
    /// Create an edge.
    pub fn new(upstream: Task, downstream: Task, key: Option<String>) -> Self {
        Self {
            upstream,
            downstream,
            key,
        }
    }

    /// Create an edge that binds the upstream result to `key`.
    pub fn keyed(upstream: Task, downstream: Task, key: impl Into<String>) -> Self {
        Self::new(upstream, downstream, Some(key.into()))
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(
                f,
                "{} -> {} ({})",
                self.upstream.name(),
                self.downstream.name(),
                key
            ),
            None => write!(f, "{} -> {}", self.upstream.name(), self.downstream.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn edges_are_value_equal() {
        let a = Task::new("a");
        let b = Task::new("b");
        let mut set = HashSet::new();
        set.insert(Edge::new(a.clone(), b.clone(), None));
        set.insert(Edge::new(a.clone(), b.clone(), None));
        assert_eq!(set.len(), 1);

        set.insert(Edge::keyed(a, b, "x"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display_includes_key() {
        let edge = Edge::keyed(Task::new("extract"), Task::new("transform"), "data");
        assert_eq!(edge.to_string(), "extract -> transform (data)");
    }
}
