//! Topological queries over a flow: ordering, cycle detection, and
//! neighborhood lookups.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexSet;

use crate::error::{FlowError, Result};
use crate::graph::index::GraphIndex;
use crate::graph::{Edge, Flow};
use crate::task::Task;

impl Flow {
    /// Edges whose downstream task is `task`.
    pub fn edges_to(&self, task: &Task) -> Vec<Edge> {
        self.graph_index().edges_to(task).to_vec()
    }

    /// Edges whose upstream task is `task`.
    pub fn edges_from(&self, task: &Task) -> Vec<Edge> {
        self.graph_index().edges_from(task).to_vec()
    }

    /// Tasks that `task` directly depends on.
    pub fn upstream_tasks(&self, task: &Task) -> IndexSet<Task> {
        self.graph_index()
            .edges_to(task)
            .iter()
            .map(|e| e.upstream.clone())
            .collect()
    }

    /// Tasks that directly depend on `task`.
    pub fn downstream_tasks(&self, task: &Task) -> IndexSet<Task> {
        self.graph_index()
            .edges_from(task)
            .iter()
            .map(|e| e.downstream.clone())
            .collect()
    }

    /// Tasks with no upstream dependencies.
    pub fn root_tasks(&self) -> Vec<Task> {
        self.graph_index().roots().to_vec()
    }

    /// Tasks with no downstream dependencies.
    pub fn terminal_tasks(&self) -> Vec<Task> {
        self.graph_index().terminals().to_vec()
    }

    /// Every task `task` depends on, directly or indirectly.
    pub fn upstream_closure(&self, task: &Task) -> HashSet<Task> {
        let index = self.graph_index();
        closure(task, |t| index.edges_to(t).iter().map(|e| &e.upstream))
    }

    /// Every task that depends on `task`, directly or indirectly.
    pub fn downstream_closure(&self, task: &Task) -> HashSet<Task> {
        let index = self.graph_index();
        closure(task, |t| index.edges_from(t).iter().map(|e| &e.downstream))
    }

    /// Tasks in dependency order: every task comes after all its upstream
    /// tasks.
    ///
    /// With `root_tasks`, only those tasks and everything downstream of them
    /// are sorted. Among tasks that do not depend on each other the order
    /// follows flow insertion order.
    ///
    /// # Errors
    ///
    /// Returns `CyclicGraph` if the tasks under consideration contain a
    /// cycle.
    pub fn sorted_tasks(&self, root_tasks: Option<&[Task]>) -> Result<Vec<Task>> {
        let index = self.graph_index();

        let working: Vec<Task> = match root_tasks {
            Some(roots) if !roots.is_empty() => {
                let reachable = reachable_from(&index, roots);
                self.tasks()
                    .iter()
                    .filter(|t| reachable.contains(*t))
                    .cloned()
                    .collect()
            }
            _ => {
                if let Some(sorted) = index.sorted() {
                    return Ok(sorted.to_vec());
                }
                let sorted = sort(&index, self.tasks().iter().cloned().collect())?;
                index.remember_sorted(sorted.clone());
                return Ok(sorted);
            }
        };

        sort(&index, working)
    }

    /// Check the flow for cycles.
    pub fn validate(&self) -> Result<()> {
        self.sorted_tasks(None).map(|_| ())
    }
}

/// Breadth-first forward closure of `roots`, including the roots.
fn reachable_from(index: &GraphIndex, roots: &[Task]) -> HashSet<Task> {
    let mut seen: HashSet<Task> = HashSet::new();
    let mut queue: VecDeque<Task> = roots.iter().cloned().collect();

    while let Some(task) = queue.pop_front() {
        if !seen.insert(task.clone()) {
            continue;
        }
        for edge in index.edges_from(&task) {
            if !seen.contains(&edge.downstream) {
                queue.push_back(edge.downstream.clone());
            }
        }
    }

    seen
}

/// Transitive neighbors of `start` following `next`, excluding `start`
/// unless it lies on a cycle.
fn closure<'a, F, I>(start: &Task, next: F) -> HashSet<Task>
where
    F: Fn(&Task) -> I,
    I: Iterator<Item = &'a Task>,
{
    let mut result = HashSet::new();
    let mut to_visit = vec![start.clone()];

    while let Some(current) = to_visit.pop() {
        for neighbor in next(&current) {
            if result.insert(neighbor.clone()) {
                to_visit.push(neighbor.clone());
            }
        }
    }

    result
}

/// Repeated-scan topological sort.
///
/// Each pass emits, in order, every remaining task none of whose upstream
/// tasks is still remaining. A pass that emits nothing means the remaining
/// tasks contain a cycle.
fn sort(index: &GraphIndex, tasks: Vec<Task>) -> Result<Vec<Task>> {
    let mut remaining: IndexSet<Task> = tasks.into_iter().collect();
    let mut sorted = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let mut cyclic = true;
        let candidates: Vec<Task> = remaining.iter().cloned().collect();

        for task in candidates {
            let blocked = index
                .edges_to(&task)
                .iter()
                .any(|e| remaining.contains(&e.upstream));

            if !blocked {
                cyclic = false;
                remaining.shift_remove(&task);
                sorted.push(task);
            }
        }

        if cyclic {
            let tasks = match find_cycle(index, &remaining) {
                Some(cycle) => cycle
                    .iter()
                    .map(|t| t.name())
                    .collect::<Vec<_>>()
                    .join(" -> "),
                None => remaining
                    .iter()
                    .map(|t| t.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            };
            return Err(FlowError::CyclicGraph { tasks });
        }
    }

    Ok(sorted)
}

/// Find one cycle among `tasks`, returned as a closed path.
///
/// Depth-first search over an explicit stack of `(task, next edge)` frames.
fn find_cycle(index: &GraphIndex, tasks: &IndexSet<Task>) -> Option<Vec<Task>> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Visiting,
        Visited,
    }

    let mut state: HashMap<&Task, State> = HashMap::with_capacity(tasks.len());

    for start in tasks {
        if state.contains_key(start) {
            continue;
        }

        state.insert(start, State::Visiting);
        let mut stack: Vec<(&Task, usize)> = vec![(start, 0)];

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let edge = index.edges_from(node).get(frame.1);
            frame.1 += 1;

            let Some(edge) = edge else {
                state.insert(node, State::Visited);
                stack.pop();
                continue;
            };

            let next = &edge.downstream;
            if !tasks.contains(next) {
                continue;
            }

            match state.get(next) {
                Some(State::Visiting) => {
                    let from = stack.iter().position(|(t, _)| *t == next)?;
                    let mut cycle: Vec<Task> =
                        stack[from..].iter().map(|(t, _)| (*t).clone()).collect();
                    cycle.push(next.clone());
                    return Some(cycle);
                }
                Some(State::Visited) => {}
                None => {
                    state.insert(next, State::Visiting);
                    stack.push((next, 0));
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(order: &[Task], task: &Task) -> usize {
        order.iter().position(|t| t == task).unwrap()
    }

    fn diamond() -> (Flow, Task, Task, Task, Task) {
        let a = Task::new("a");
        let b = Task::new("b");
        let c = Task::new("c");
        let d = Task::new("d");
        let mut flow = Flow::new("diamond");
        flow.add_edge(&a, &b, None, true).unwrap();
        flow.add_edge(&a, &c, None, true).unwrap();
        flow.add_edge(&b, &d, None, true).unwrap();
        flow.add_edge(&c, &d, None, true).unwrap();
        (flow, a, b, c, d)
    }

    #[test]
    fn sort_empty_flow() {
        let flow = Flow::new("empty");
        assert!(flow.sorted_tasks(None).unwrap().is_empty());
    }

    #[test]
    fn sort_linear_chain() {
        let a = Task::new("a");
        let b = Task::new("b");
        let c = Task::new("c");
        let mut flow = Flow::new("chain");
        // Insert out of order so the sort has to reorder.
        flow.add_task(&c).unwrap();
        flow.add_edge(&b, &c, None, true).unwrap();
        flow.add_edge(&a, &b, None, true).unwrap();

        assert_eq!(flow.sorted_tasks(None).unwrap(), vec![a, b, c]);
    }

    #[test]
    fn sort_diamond() {
        let (flow, a, b, c, d) = diamond();
        let order = flow.sorted_tasks(None).unwrap();

        assert!(position(&order, &a) < position(&order, &b));
        assert!(position(&order, &a) < position(&order, &c));
        assert!(position(&order, &b) < position(&order, &d));
        assert!(position(&order, &c) < position(&order, &d));
    }

    #[test]
    fn sort_respects_every_edge() {
        let (flow, ..) = diamond();
        let order = flow.sorted_tasks(None).unwrap();
        for edge in flow.edges() {
            assert!(position(&order, &edge.upstream) < position(&order, &edge.downstream));
        }
    }

    #[test]
    fn sort_is_cached_and_stable() {
        let (flow, ..) = diamond();
        let first = flow.sorted_tasks(None).unwrap();
        assert!(flow.graph_index().sorted().is_some());
        assert_eq!(first, flow.sorted_tasks(None).unwrap());
    }

    #[test]
    fn sort_from_roots_restricts_to_reachable() {
        let (mut flow, a, b, _, d) = diamond();
        let lonely = Task::new("lonely");
        flow.add_task(&lonely).unwrap();

        let order = flow.sorted_tasks(Some(&[b.clone()])).unwrap();
        assert_eq!(order, vec![b, d]);
        assert!(!order.contains(&a));
        assert!(!order.contains(&lonely));
    }

    #[test]
    fn cycle_is_reported_with_path() {
        let a = Task::new("a");
        let b = Task::new("b");
        let c = Task::new("c");
        let mut flow = Flow::new("cyclic");
        flow.add_edge(&a, &b, None, false).unwrap();
        flow.add_edge(&b, &c, None, false).unwrap();
        flow.add_edge(&c, &a, None, false).unwrap();

        match flow.sorted_tasks(None) {
            Err(FlowError::CyclicGraph { tasks }) => {
                assert!(tasks.contains('a'));
                assert!(tasks.contains('b'));
                assert!(tasks.contains('c'));
                assert!(tasks.contains("->"));
            }
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn self_cycle_detected() {
        let a = Task::new("a");
        let mut flow = Flow::new("self");
        flow.add_edge(&a, &a, None, false).unwrap();
        assert!(flow.validate().is_err());
    }

    #[test]
    fn long_cycle_is_reported_without_recursion() {
        let tasks: IndexSet<Task> = (0..50_000).map(|i| Task::new(format!("t{}", i))).collect();
        let mut edges: IndexSet<Edge> = IndexSet::with_capacity(tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            let next = &tasks[(i + 1) % tasks.len()];
            edges.insert(Edge::new(task.clone(), next.clone(), None));
        }
        let index = GraphIndex::build(&tasks, &edges);

        let cycle = find_cycle(&index, &tasks).unwrap();
        assert_eq!(cycle.len(), tasks.len() + 1);
        assert_eq!(cycle.first(), cycle.last());

        let err = sort(&index, tasks.iter().cloned().collect()).unwrap_err();
        assert!(matches!(err, FlowError::CyclicGraph { .. }));
    }

    #[test]
    fn cycle_path_skips_tasks_outside_it() {
        let a = Task::new("a");
        let b = Task::new("b");
        let c = Task::new("c");
        let d = Task::new("d");
        let mut flow = Flow::new("tail");
        flow.add_edge(&a, &b, None, false).unwrap();
        flow.add_edge(&b, &d, None, false).unwrap();
        flow.add_edge(&b, &c, None, false).unwrap();
        flow.add_edge(&c, &b, None, false).unwrap();

        let remaining: IndexSet<Task> = flow.tasks().clone();
        let cycle = find_cycle(&flow.graph_index(), &remaining).unwrap();
        assert_eq!(cycle, vec![b.clone(), c, b]);
    }

    #[test]
    fn roots_and_terminals() {
        let (flow, a, _, _, d) = diamond();
        assert_eq!(flow.root_tasks(), vec![a]);
        assert_eq!(flow.terminal_tasks(), vec![d]);
    }

    #[test]
    fn neighbors() {
        let (flow, a, b, c, d) = diamond();
        let up: Vec<Task> = flow.upstream_tasks(&d).into_iter().collect();
        assert_eq!(up, vec![b.clone(), c.clone()]);
        let down: Vec<Task> = flow.downstream_tasks(&a).into_iter().collect();
        assert_eq!(down, vec![b, c]);
        assert_eq!(flow.edges_to(&a).len(), 0);
        assert_eq!(flow.edges_from(&a).len(), 2);
    }

    #[test]
    fn closures() {
        let (flow, a, b, c, d) = diamond();
        let downstream = flow.downstream_closure(&a);
        assert_eq!(downstream.len(), 3);
        assert!(downstream.contains(&b) && downstream.contains(&c) && downstream.contains(&d));

        let upstream = flow.upstream_closure(&d);
        assert_eq!(upstream.len(), 3);
        assert!(upstream.contains(&a));

        assert!(flow.upstream_closure(&a).is_empty());
    }

    #[test]
    fn cache_follows_mutation() {
        let (mut flow, _, _, _, d) = diamond();
        let before = flow.graph_index();
        let e = Task::new("e");
        flow.add_edge(&d, &e, None, true).unwrap();
        let after = flow.graph_index();

        assert_ne!(before.fingerprint(), after.fingerprint());
        assert_eq!(flow.terminal_tasks(), vec![e]);
    }
}
