//! Static scheduling of task graphs onto reconfigurable processing elements.
//!
//! Two heuristics share one cost model and one [`Schedule`]:
//! list scheduling with lookahead ([`lsl`]) and cluster merging ([`cluster`]).
//! The Python module exposes problem import, both algorithms and their results.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

mod config;
mod cost;
pub mod graph;
pub mod import;
pub mod interner;
pub mod logging;
pub mod models;
pub mod report;
pub mod scheduler;
pub mod validation;

pub use config::{SchedulerConfig, DEFAULT_LOOKAHEAD, DEFAULT_RHO};
pub use graph::{GraphError, TaskGraph};
pub use import::{ImportError, Problem};
pub use models::{ConfigId, Configuration, Cost, Pe, Task, TaskId, Time, MAX_PE};
pub use report::{run, Algorithm, Run, RunSummary, Timeline};
pub use scheduler::{
    cluster, lsl, Cluster, Clustering, ContractViolation, Infeasibility, LslScheduler, Schedule,
    ScheduledTask, SchedulerError,
};
pub use validation::{validate_schedule, ValidationResult, Violation, ViolationKind};

fn value_error(e: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Imported problem: task graph plus configuration catalog (PyO3 wrapper).
#[pyclass(name = "Problem")]
#[derive(Clone, Debug)]
pub struct PyProblem {
    inner: Problem,
}

#[pymethods]
impl PyProblem {
    /// Build a problem directly.
    ///
    /// # Arguments
    /// * `tasks` - `(name, costs)` pairs, one cost slot per PE, `None` where infeasible
    /// * `edges` - `(before, after)` task name pairs
    /// * `configurations` - `(name, pe_indices)` pairs in catalog order
    #[new]
    fn new(
        tasks: Vec<(String, Vec<Option<Time>>)>,
        edges: Vec<(String, String)>,
        configurations: Vec<(String, Vec<usize>)>,
    ) -> PyResult<Self> {
        let list = tasks
            .into_iter()
            .map(|(name, costs)| Task::new(name, &costs))
            .collect::<Result<Vec<_>, _>>()
            .map_err(value_error)?;
        let edges: Vec<(&str, &str)> = edges
            .iter()
            .map(|(from, to)| (from.as_str(), to.as_str()))
            .collect();
        let graph = TaskGraph::from_named_edges(list, &edges).map_err(value_error)?;
        let configurations = configurations
            .into_iter()
            .map(|(name, pes)| Configuration::new(name, pes.into_iter().map(Pe).collect()))
            .collect();
        Ok(Self {
            inner: Problem::new(graph, configurations),
        })
    }

    #[getter]
    fn task_names(&self) -> Vec<String> {
        self.inner.graph.tasks().iter().map(|t| t.name.clone()).collect()
    }

    #[getter]
    fn configuration_names(&self) -> Vec<String> {
        self.inner
            .configurations
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    /// Task names in the topological order both schedulers walk.
    fn topological_order(&self) -> Vec<String> {
        let graph = &self.inner.graph;
        graph
            .topological_order()
            .iter()
            .map(|&id| graph.task(id).name.clone())
            .collect()
    }

    fn __len__(&self) -> usize {
        self.inner.graph.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "Problem(tasks={}, configurations={})",
            self.inner.graph.len(),
            self.inner.configurations.len()
        )
    }
}

/// A placed task (PyO3 wrapper).
#[pyclass(name = "ScheduledTask")]
#[derive(Clone, Debug)]
pub struct PyScheduledTask {
    #[pyo3(get)]
    pub name: String,
    #[pyo3(get)]
    pub pe: usize,
    #[pyo3(get)]
    pub start: Time,
    #[pyo3(get)]
    pub finish: Time,
}

#[pymethods]
impl PyScheduledTask {
    fn __repr__(&self) -> String {
        format!(
            "ScheduledTask(name={:?}, pe={}, start={}, finish={})",
            self.name, self.pe, self.start, self.finish
        )
    }
}

impl From<&ScheduledTask> for PyScheduledTask {
    fn from(t: &ScheduledTask) -> Self {
        Self {
            name: t.name.clone(),
            pe: t.pe.0,
            start: t.start,
            finish: t.finish(),
        }
    }
}

/// Result of one algorithm run.
#[pyclass]
#[derive(Clone, Debug)]
pub struct ScheduleResult {
    #[pyo3(get)]
    pub scheduled_tasks: Vec<PyScheduledTask>,
    #[pyo3(get)]
    pub makespan: Time,
    /// Reconfiguration timestamps in insertion order
    #[pyo3(get)]
    pub reconfigs: Vec<Time>,
    /// One-line CSV summary of the run
    #[pyo3(get)]
    pub summary: String,
    /// Per-PE text timeline
    #[pyo3(get)]
    pub timeline: String,
    #[pyo3(get)]
    pub elapsed_us: u64,
}

#[pymethods]
impl ScheduleResult {
    fn __repr__(&self) -> String {
        format!(
            "ScheduleResult(tasks={}, makespan={}, reconfigs={})",
            self.scheduled_tasks.len(),
            self.makespan,
            self.reconfigs.len()
        )
    }
}

impl From<Run> for ScheduleResult {
    fn from(run: Run) -> Self {
        Self {
            scheduled_tasks: run.schedule.tasks().iter().map(Into::into).collect(),
            makespan: run.schedule.makespan(),
            reconfigs: run.schedule.reconfigs().to_vec(),
            summary: run.summary().to_string(),
            timeline: run.timeline().to_string(),
            elapsed_us: u64::try_from(run.elapsed.as_micros()).unwrap_or(u64::MAX),
        }
    }
}

fn run_algorithm(
    algorithm: Algorithm,
    problem: &PyProblem,
    config: Option<SchedulerConfig>,
) -> PyResult<ScheduleResult> {
    let config = config.unwrap_or_default();
    run(algorithm, &problem.inner, &config)
        .map(ScheduleResult::from)
        .map_err(value_error)
}

/// Parse a problem from its JSON description.
///
/// # Raises
/// * ValueError on malformed JSON, inconsistent dimensions or a dependency cycle
#[pyfunction]
fn import_problem(json: &str) -> PyResult<PyProblem> {
    Problem::from_json_str(json)
        .map(|inner| PyProblem { inner })
        .map_err(value_error)
}

/// Read a problem from a JSON file.
#[pyfunction]
fn load_problem(path: &str) -> PyResult<PyProblem> {
    Problem::from_path(path)
        .map(|inner| PyProblem { inner })
        .map_err(value_error)
}

/// Schedule `problem` with list scheduling and lookahead.
///
/// # Raises
/// * ValueError if the problem has no valid schedule or the config is invalid
#[pyfunction]
#[pyo3(signature = (problem, config=None))]
fn run_lsl(problem: &PyProblem, config: Option<SchedulerConfig>) -> PyResult<ScheduleResult> {
    run_algorithm(Algorithm::Lsl, problem, config)
}

/// Schedule `problem` by merging clusters of consecutive tasks.
///
/// # Raises
/// * ValueError if the problem has no valid schedule or the config is invalid
#[pyfunction]
#[pyo3(signature = (problem, config=None))]
fn run_cluster(problem: &PyProblem, config: Option<SchedulerConfig>) -> PyResult<ScheduleResult> {
    run_algorithm(Algorithm::Cluster, problem, config)
}

/// Run an algorithm chosen by name (`"lsl"` or `"cluster"`).
#[pyfunction]
#[pyo3(signature = (algorithm, problem, config=None))]
fn run_by_name(
    algorithm: &str,
    problem: &PyProblem,
    config: Option<SchedulerConfig>,
) -> PyResult<ScheduleResult> {
    let algorithm: Algorithm = algorithm.parse().map_err(value_error)?;
    run_algorithm(algorithm, problem, config)
}

/// The reconf_sched Python module.
#[pymodule]
fn reconf_sched(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Data types
    m.add_class::<PyProblem>()?;
    m.add_class::<PyScheduledTask>()?;
    m.add_class::<ScheduleResult>()?;

    // Config types
    m.add_class::<SchedulerConfig>()?;

    // Import
    m.add_function(wrap_pyfunction!(import_problem, m)?)?;
    m.add_function(wrap_pyfunction!(load_problem, m)?)?;

    // Algorithms
    m.add_function(wrap_pyfunction!(run_lsl, m)?)?;
    m.add_function(wrap_pyfunction!(run_cluster, m)?)?;
    m.add_function(wrap_pyfunction!(run_by_name, m)?)?;

    Ok(())
}
