//! Immutable task graph with precedence edges.
//!
//! The topological order is computed once with Kahn's algorithm when the
//! graph is built, so a cyclic input is rejected up front and both schedulers
//! can borrow the same order.

use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use thiserror::Error;

use crate::interner::TaskNames;
use crate::models::{Task, TaskId, Time, MAX_COST, MAX_PE};

/// Structural problems in the task graph input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Duplicate task name: {0}")]
    DuplicateTask(String),
    #[error("Task {task} has {count} cost entries, at most {} PEs are supported", MAX_PE)]
    TooManyCosts { task: String, count: usize },
    #[error("Task {task} has a negative cost {cost}")]
    NegativeCost { task: String, cost: Time },
    #[error("Task {task} cost {cost} exceeds the limit of {}", MAX_COST)]
    CostTooLarge { task: String, cost: Time },
    #[error("Unknown task: {0}")]
    UnknownTask(String),
    #[error("Dependency matrix has {rows} rows for {tasks} tasks")]
    MatrixRows { rows: usize, tasks: usize },
    #[error("Dependency matrix row {row} has {len} entries, expected {tasks}")]
    MatrixColumns { row: usize, len: usize, tasks: usize },
    #[error("Circular dependency detected among tasks: {0:?}")]
    CircularDependency(Vec<String>),
}

/// A DAG of tasks; an edge `u -> v` means `u` must finish before `v` starts.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    names: TaskNames,
    predecessors: Vec<Vec<TaskId>>,
    successors: Vec<Vec<TaskId>>,
    order: Vec<TaskId>,
}

impl TaskGraph {
    /// Build a graph from tasks and `(before, after)` index pairs.
    ///
    /// Duplicate edges are collapsed. Fails on duplicate names, unknown
    /// indices and cycles.
    pub fn new(tasks: Vec<Task>, edges: &[(TaskId, TaskId)]) -> Result<Self, GraphError> {
        let names = intern(&tasks)?;
        Self::with_names(tasks, names, edges)
    }

    /// Build a graph from tasks and `(before, after)` name pairs.
    pub fn from_named_edges(tasks: Vec<Task>, edges: &[(&str, &str)]) -> Result<Self, GraphError> {
        let names = intern(&tasks)?;
        let lookup = |name: &str| {
            names
                .get(name)
                .ok_or_else(|| GraphError::UnknownTask(name.to_string()))
        };
        let indexed = edges
            .iter()
            .map(|&(from, to)| Ok((lookup(from)?, lookup(to)?)))
            .collect::<Result<Vec<_>, GraphError>>()?;
        Self::with_names(tasks, names, &indexed)
    }

    fn with_names(
        tasks: Vec<Task>,
        names: TaskNames,
        edges: &[(TaskId, TaskId)],
    ) -> Result<Self, GraphError> {
        let n = tasks.len();
        let mut seen: FxHashSet<(TaskId, TaskId)> = FxHashSet::default();
        let mut predecessors = vec![Vec::new(); n];
        let mut successors = vec![Vec::new(); n];
        for &(from, to) in edges {
            for id in [from, to] {
                if id >= n {
                    return Err(GraphError::UnknownTask(format!("#{}", id)));
                }
            }
            if seen.insert((from, to)) {
                successors[from].push(to);
                predecessors[to].push(from);
            }
        }
        for list in predecessors.iter_mut().chain(successors.iter_mut()) {
            list.sort_unstable();
        }

        let order = topological_sort(&successors, &predecessors)
            .map_err(|stuck| {
                GraphError::CircularDependency(
                    stuck.into_iter().map(|id| tasks[id].name.clone()).collect(),
                )
            })?;

        Ok(Self {
            tasks,
            names,
            predecessors,
            successors,
            order,
        })
    }

    /// Build a graph from an `N x N` matrix where `deps[i][j]` means `i` before `j`.
    pub fn from_matrix(tasks: Vec<Task>, deps: &[Vec<bool>]) -> Result<Self, GraphError> {
        let n = tasks.len();
        if deps.len() != n {
            return Err(GraphError::MatrixRows {
                rows: deps.len(),
                tasks: n,
            });
        }
        let mut edges = Vec::new();
        for (from, row) in deps.iter().enumerate() {
            if row.len() != n {
                return Err(GraphError::MatrixColumns {
                    row: from,
                    len: row.len(),
                    tasks: n,
                });
            }
            edges.extend(
                row.iter()
                    .enumerate()
                    .filter(|&(_, &dep)| dep)
                    .map(|(to, _)| (from, to)),
            );
        }
        Self::new(tasks, &edges)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[inline]
    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id]
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn id_of(&self, name: &str) -> Option<TaskId> {
        self.names.get(name)
    }

    /// Direct predecessors of `id`, ascending.
    #[inline]
    pub fn predecessors(&self, id: TaskId) -> &[TaskId] {
        &self.predecessors[id]
    }

    /// Direct successors of `id`, ascending.
    #[inline]
    pub fn successors(&self, id: TaskId) -> &[TaskId] {
        &self.successors[id]
    }

    /// Every `(before, after)` edge, grouped by source.
    pub fn edges(&self) -> impl Iterator<Item = (TaskId, TaskId)> + '_ {
        self.successors
            .iter()
            .enumerate()
            .flat_map(|(from, succ)| succ.iter().map(move |&to| (from, to)))
    }

    /// Tasks in a fixed topological order.
    pub fn topological_order(&self) -> &[TaskId] {
        &self.order
    }
}

/// Intern task names in index order, rejecting duplicates.
fn intern(tasks: &[Task]) -> Result<TaskNames, GraphError> {
    let mut names = TaskNames::with_capacity(tasks.len());
    for task in tasks {
        if names.insert(&task.name).is_none() {
            return Err(GraphError::DuplicateTask(task.name.clone()));
        }
    }
    Ok(names)
}

/// Kahn's algorithm. Ready tasks are released in index order so the result is
/// deterministic. On a cycle, returns the tasks that never became ready.
fn topological_sort(
    successors: &[Vec<TaskId>],
    predecessors: &[Vec<TaskId>],
) -> Result<Vec<TaskId>, Vec<TaskId>> {
    let mut in_degree: Vec<usize> = predecessors.iter().map(Vec::len).collect();
    let mut queue: VecDeque<TaskId> = (0..in_degree.len())
        .filter(|&id| in_degree[id] == 0)
        .collect();
    let mut order = Vec::with_capacity(in_degree.len());

    while let Some(id) = queue.pop_front() {
        order.push(id);
        for &succ in &successors[id] {
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                queue.push_back(succ);
            }
        }
    }

    if order.len() != in_degree.len() {
        return Err((0..in_degree.len())
            .filter(|&id| in_degree[id] > 0)
            .collect());
    }
    Ok(order)
}
