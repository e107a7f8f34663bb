//! The flow: an owned set of tasks and edges, and the operations that
//! mutate it.
//!
//! Every mutation keeps the flow's invariants (slug uniqueness, keyword
//! uniqueness, parameters have no upstream edges, no var-positional tasks,
//! and, for validating calls, no cycles). A mutation that fails leaves the
//! flow exactly as it was before the call.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FlowError, Result};
use crate::graph::index::{GraphIndex, IndexCache};
use crate::graph::{Edge, TaskResult};
use crate::task::{ResolveTask, Task, TaskKind};

const DEFAULT_FLOW_NAME: &str = "Flow";

/// Details of a flow parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDetails {
    /// Whether a value must be supplied.
    pub required: bool,
    /// Value used when none is supplied.
    pub default: Value,
}

/// The dependencies to wire with [`Flow::set_dependencies`].
#[derive(Default)]
pub struct Dependencies<'a> {
    upstream: Vec<&'a dyn ResolveTask>,
    downstream: Vec<&'a dyn ResolveTask>,
    keyword: Vec<(String, &'a dyn ResolveTask)>,
}

impl<'a> Dependencies<'a> {
    /// No dependencies.
    pub fn new() -> Self {
        Self::default()
    }

    /// A task that must run before the target.
    pub fn upstream(mut self, task: &'a dyn ResolveTask) -> Self {
        self.upstream.push(task);
        self
    }

    /// A task that must run after the target.
    pub fn downstream(mut self, task: &'a dyn ResolveTask) -> Self {
        self.downstream.push(task);
        self
    }

    /// A task whose result is passed to the target as keyword `key`.
    pub fn keyword(mut self, key: impl Into<String>, task: &'a dyn ResolveTask) -> Self {
        self.keyword.push((key.into(), task));
        self
    }

    fn all(&self) -> impl Iterator<Item = &'a dyn ResolveTask> + '_ {
        self.upstream
            .iter()
            .chain(self.downstream.iter())
            .copied()
            .chain(self.keyword.iter().map(|(_, t)| *t))
    }
}

impl fmt::Debug for Dependencies<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn names(deps: &[&dyn ResolveTask]) -> Vec<String> {
            deps.iter()
                .map(|d| d.resolve_task().name().to_string())
                .collect()
        }

        f.debug_struct("Dependencies")
            .field("upstream", &names(&self.upstream))
            .field("downstream", &names(&self.downstream))
            .field(
                "keyword",
                &self
                    .keyword
                    .iter()
                    .map(|(k, t)| (k.as_str(), t.resolve_task().name()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A named, versioned graph of tasks and dependency edges.
#[derive(Debug, Clone)]
pub struct Flow {
    name: String,
    version: Option<String>,
    description: Option<String>,
    schedule: Value,
    environment: Option<Value>,
    tasks: IndexSet<Task>,
    edges: IndexSet<Edge>,
    index: IndexCache,
}

impl Default for Flow {
    fn default() -> Self {
        Self::new(DEFAULT_FLOW_NAME)
    }
}

impl Flow {
    /// Create an empty flow.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            description: None,
            schedule: Value::Null,
            environment: None,
            tasks: IndexSet::new(),
            edges: IndexSet::new(),
            index: IndexCache::default(),
        }
    }

    /// Create a flow pre-populated with tasks and edges.
    ///
    /// Tasks are added first, then each edge is added with validation.
    pub fn with_graph<T, E>(name: impl Into<String>, tasks: T, edges: E) -> Result<Self>
    where
        T: IntoIterator<Item = Task>,
        E: IntoIterator<Item = Edge>,
    {
        let mut flow = Self::new(name);
        for task in tasks {
            flow.add_task(&task)?;
        }
        for edge in edges {
            flow.add_edge(&edge.upstream, &edge.downstream, edge.key.as_deref(), true)?;
        }
        Ok(flow)
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach an opaque schedule.
    pub fn with_schedule(mut self, schedule: Value) -> Self {
        self.schedule = schedule;
        self
    }

    /// Attach an opaque environment.
    pub fn with_environment(mut self, environment: Value) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The schedule, `null` when the flow has none.
    pub fn schedule(&self) -> &Value {
        &self.schedule
    }

    pub fn environment(&self) -> Option<&Value> {
        self.environment.as_ref()
    }

    /// All tasks, in insertion order.
    pub fn tasks(&self) -> &IndexSet<Task> {
        &self.tasks
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> &IndexSet<Edge> {
        &self.edges
    }

    /// Check if the task is part of this flow.
    pub fn contains(&self, task: &Task) -> bool {
        self.tasks.contains(task)
    }

    /// Find a task by name. Returns the first match in insertion order.
    pub fn task_by_name(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name() == name)
    }

    /// Find a task by slug.
    pub fn task_by_slug(&self, slug: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.slug() == Some(slug))
    }

    /// The adjacency index for the current graph.
    ///
    /// The index is cached and rebuilt only after the task or edge set
    /// changes.
    pub fn graph_index(&self) -> Arc<GraphIndex> {
        self.index.get_or_build(&self.tasks, &self.edges)
    }

    /// Details of every parameter task, keyed by parameter name.
    pub fn parameters(&self, only_required: bool) -> BTreeMap<String, ParameterDetails> {
        self.tasks
            .iter()
            .filter_map(|t| match t.kind() {
                TaskKind::Parameter { required, default } if *required || !only_required => {
                    Some((
                        t.name().to_string(),
                        ParameterDetails {
                            required: *required,
                            default: default.clone(),
                        },
                    ))
                }
                _ => None,
            })
            .collect()
    }

    // Graph mutation ---------------------------------------------------------

    /// Run `mutate` against the graph, restoring the task and edge sets if it
    /// fails.
    ///
    /// When `validate` is set the graph is checked for cycles after a
    /// successful mutation; a cycle also restores the previous graph.
    pub fn restore_graph_on_error<T, F>(&mut self, validate: bool, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let tasks = self.tasks.clone();
        let edges = self.edges.clone();

        let outcome = mutate(self);
        let outcome = outcome.and_then(|value| {
            if validate {
                self.validate()?;
            }
            Ok(value)
        });

        if let Err(e) = &outcome {
            tracing::debug!(flow = %self.name, error = %e, "Restoring graph after failed mutation");
            self.tasks = tasks;
            self.edges = edges;
        }

        outcome
    }

    /// Add a task to the flow.
    ///
    /// Adding a task that is already present is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateSlug` if another task already uses this task's slug
    /// and `VarArgsUnsupported` if the task declares a var-positional
    /// parameter.
    pub fn add_task(&mut self, task: &Task) -> Result<()> {
        if self.tasks.contains(task) {
            return Ok(());
        }

        if let Some(slug) = task.slug() {
            if self.tasks.iter().any(|t| t.slug() == Some(slug)) {
                return Err(FlowError::DuplicateSlug {
                    slug: slug.to_string(),
                });
            }
        }

        task.ensure_no_var_positional()?;

        tracing::debug!(flow = %self.name, task = task.name(), "Adding task");
        self.tasks.insert(task.clone());
        Ok(())
    }

    /// Add a dependency of `downstream` on `upstream`.
    ///
    /// Missing endpoints are added to the flow. With `key`, the upstream
    /// result is bound to that keyword argument of `downstream`, which must
    /// accept it. When `validate` is set the flow is checked for cycles.
    ///
    /// # Errors
    ///
    /// `InvalidDependency`, `DuplicateKey`, `SignatureBind`, any error from
    /// [`add_task`](Self::add_task), and `CyclicGraph` when validating. The
    /// flow is unchanged after an error.
    pub fn add_edge<U, D>(
        &mut self,
        upstream: &U,
        downstream: &D,
        key: Option<&str>,
        validate: bool,
    ) -> Result<()>
    where
        U: ResolveTask + ?Sized,
        D: ResolveTask + ?Sized,
    {
        let upstream = upstream.resolve_task().clone();
        let downstream = downstream.resolve_task().clone();

        self.restore_graph_on_error(validate, |flow| flow.connect(&upstream, &downstream, key))
    }

    /// Merge another flow's tasks and edges into this one.
    ///
    /// Edges are added without individual validation; the merged graph is
    /// validated once at the end when `validate` is set.
    pub fn update(&mut self, other: &Flow, validate: bool) -> Result<()> {
        self.restore_graph_on_error(validate, |flow| flow.merge(other))
    }

    /// Add the tasks behind `results`, merging the flows they came from.
    pub fn add_task_results(&mut self, results: &[&dyn ResolveTask], validate: bool) -> Result<()> {
        self.restore_graph_on_error(validate, |flow| {
            for result in results {
                flow.absorb(*result)?;
            }
            Ok(())
        })
    }

    /// Wire `task` to its dependencies in one all-or-nothing step.
    ///
    /// Adds an edge from every upstream dependency to `task`, from `task` to
    /// every downstream dependency, and from every keyword dependency to
    /// `task` bound to its key. Dependencies that carry their own flow have
    /// that flow merged first.
    ///
    /// Returns a [`TaskResult`] binding `task` to a snapshot of this flow.
    pub fn set_dependencies<T>(
        &mut self,
        task: &T,
        dependencies: Dependencies<'_>,
        validate: bool,
    ) -> Result<TaskResult>
    where
        T: ResolveTask + ?Sized,
    {
        let target = self.wire_dependencies(task, dependencies, validate)?;
        Ok(TaskResult::new(target, self.clone()))
    }

    /// [`set_dependencies`](Self::set_dependencies) without the snapshot.
    ///
    /// Returns the wired task.
    pub(crate) fn wire_dependencies<T>(
        &mut self,
        task: &T,
        dependencies: Dependencies<'_>,
        validate: bool,
    ) -> Result<Task>
    where
        T: ResolveTask + ?Sized,
    {
        let target = task.resolve_task().clone();

        self.restore_graph_on_error(validate, |flow| {
            target.ensure_no_var_positional()?;
            for dep in dependencies.all() {
                dep.resolve_task().ensure_no_var_positional()?;
            }

            flow.absorb(task)?;

            for dep in &dependencies.upstream {
                flow.absorb(*dep)?;
                flow.connect(dep.resolve_task(), &target, None)?;
            }

            for dep in &dependencies.downstream {
                flow.absorb(*dep)?;
                flow.connect(&target, dep.resolve_task(), None)?;
            }

            for (key, dep) in &dependencies.keyword {
                flow.absorb(*dep)?;
                flow.connect(dep.resolve_task(), &target, Some(key.as_str()))?;
            }

            Ok(())
        })?;

        Ok(target)
    }

    /// Add a task and merge the flow it came from, without a snapshot.
    fn absorb<R: ResolveTask + ?Sized>(&mut self, item: &R) -> Result<()> {
        self.add_task(item.resolve_task())?;
        if let Some(origin) = item.origin_flow() {
            self.merge(origin)?;
        }
        Ok(())
    }

    /// Union another flow into this one, without a snapshot.
    fn merge(&mut self, other: &Flow) -> Result<()> {
        for task in &other.tasks {
            self.add_task(task)?;
        }
        for edge in &other.edges {
            if !self.edges.contains(edge) {
                self.connect(&edge.upstream, &edge.downstream, edge.key.as_deref())?;
            }
        }
        Ok(())
    }

    /// Insert one edge after checking every per-edge invariant.
    fn connect(&mut self, upstream: &Task, downstream: &Task, key: Option<&str>) -> Result<()> {
        if downstream.is_parameter() {
            return Err(FlowError::InvalidDependency {
                task: downstream.name().to_string(),
            });
        }

        if let Some(key) = key {
            if self.bound_keys(downstream).any(|k| k == key) {
                return Err(FlowError::DuplicateKey {
                    key: key.to_string(),
                    task: downstream.name().to_string(),
                });
            }
        }

        self.add_task(upstream)?;
        self.add_task(downstream)?;

        let edge = Edge::new(upstream.clone(), downstream.clone(), key.map(str::to_string));
        tracing::debug!(flow = %self.name, edge = %edge, "Adding edge");
        self.edges.insert(edge);

        if key.is_some() {
            downstream
                .signature()
                .bind_keywords(self.bound_keys(downstream))
                .map_err(|e| FlowError::SignatureBind {
                    key: e.key,
                    task: downstream.name().to_string(),
                    reason: e.reason,
                })?;
        }

        Ok(())
    }

    /// Keys already bound on `task` by incoming edges.
    fn bound_keys<'a>(&'a self, task: &'a Task) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |e| &e.downstream == task)
            .filter_map(|e| e.key.as_deref())
    }
}

impl PartialEq for Flow {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.tasks == other.tasks
            && self.edges == other.edges
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "<Flow: {} version={}>", self.name, version),
            None => write!(f, "<Flow: {}>", self.name),
        }
    }
}
