//! A task bound to the flow it was wired in.

use std::fmt;

use crate::graph::Flow;
use crate::task::{ResolveTask, Task};

/// The value returned by [`Flow::set_dependencies`].
///
/// Using a `TaskResult` as a dependency of another task merges the carried
/// flow into the flow being built, so partial graphs compose.
#[derive(Debug, Clone)]
pub struct TaskResult {
    task: Task,
    flow: Flow,
}

impl TaskResult {
    pub fn new(task: Task, flow: Flow) -> Self {
        Self { task, flow }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    /// The flow the task was wired in, as it was at that point.
    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    pub fn into_parts(self) -> (Task, Flow) {
        (self.task, self.flow)
    }
}

impl ResolveTask for TaskResult {
    fn resolve_task(&self) -> &Task {
        &self.task
    }

    fn origin_flow(&self) -> Option<&Flow> {
        Some(&self.flow)
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<TaskResult: {}>", self.task.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Dependencies;

    #[test]
    fn result_resolves_to_its_task() {
        let a = Task::new("a");
        let b = Task::new("b");
        let mut flow = Flow::new("f");
        let result = flow
            .set_dependencies(&b, Dependencies::new().upstream(&a), true)
            .unwrap();

        assert_eq!(result.resolve_task(), &b);
        assert_eq!(result.origin_flow(), Some(&flow));
        assert_eq!(result.to_string(), "<TaskResult: b>");
    }

    #[test]
    fn plain_task_has_no_origin() {
        assert!(Task::new("a").origin_flow().is_none());
    }

    #[test]
    fn results_can_be_added_directly() {
        let a = Task::new("a");
        let b = Task::new("b");
        let mut partial = Flow::new("partial");
        let result = partial
            .set_dependencies(&b, Dependencies::new().upstream(&a), true)
            .unwrap();

        let mut flow = Flow::new("f");
        flow.add_task_results(&[&result], true).unwrap();
        assert_eq!(flow.tasks().len(), 2);
        assert_eq!(flow.edges().len(), 1);

        let (task, origin) = result.into_parts();
        assert_eq!(task, b);
        assert_eq!(origin.name(), "partial");
    }
}
