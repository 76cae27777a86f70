//! Problem import from the JSON benchmark format.
//!
//! ```json
//! {
//!   "tasklabels": ["load", "fft"],
//!   "cost": [[3, false, 5], [false, 2, 2]],
//!   "deps": [[false, true], [false, false]],
//!   "C": { "set": [{ "e": "config1" }, { "e": "config2" }] },
//!   "P_config": ["config1", "config2", "config2"]
//! }
//! ```
//!
//! `cost[i][p]` is the cost of task `i` on PE `p`, or `false` if it cannot
//! run there. `P_config[p]` names the configuration that owns PE `p`.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::graph::{GraphError, TaskGraph};
use crate::models::{Configuration, Pe, Task, Time, MAX_PE};

/// Errors raised while importing a problem description.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid problem JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Expected {expected} cost rows, found {found}")]
    CostRows { expected: usize, found: usize },
    #[error("Task {task}: only `false` may mark an infeasible PE")]
    InvalidMarker { task: String },
    #[error("PE {pe} is assigned to unknown configuration {name}")]
    UnknownConfiguration { pe: usize, name: String },
    #[error("{0} PEs declared, at most {} supported", MAX_PE)]
    TooManyPes(usize),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CostEntry {
    Cost(Time),
    Marker(bool),
}

#[derive(Debug, Deserialize)]
struct ConfigName {
    e: String,
}

#[derive(Debug, Deserialize)]
struct ConfigSet {
    set: Vec<ConfigName>,
}

#[derive(Debug, Deserialize)]
struct ProblemJson {
    tasklabels: Vec<String>,
    cost: Vec<Vec<CostEntry>>,
    deps: Vec<Vec<bool>>,
    #[serde(rename = "C")]
    configurations: ConfigSet,
    #[serde(rename = "P_config")]
    pe_config: Vec<String>,
}

/// A task graph together with its configuration catalog.
#[derive(Debug, Clone)]
pub struct Problem {
    pub graph: TaskGraph,
    pub configurations: Vec<Configuration>,
}

impl Problem {
    pub fn new(graph: TaskGraph, configurations: Vec<Configuration>) -> Self {
        Self {
            graph,
            configurations,
        }
    }

    /// Parse a problem from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ImportError> {
        let raw: ProblemJson = serde_json::from_str(json)?;
        raw.into_problem()
    }

    /// Read and parse a problem from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

impl ProblemJson {
    fn into_problem(self) -> Result<Problem, ImportError> {
        if self.cost.len() != self.tasklabels.len() {
            return Err(ImportError::CostRows {
                expected: self.tasklabels.len(),
                found: self.cost.len(),
            });
        }
        if self.pe_config.len() > MAX_PE {
            return Err(ImportError::TooManyPes(self.pe_config.len()));
        }

        let mut tasks = Vec::with_capacity(self.tasklabels.len());
        for (name, row) in self.tasklabels.into_iter().zip(self.cost) {
            let mut costs = Vec::with_capacity(row.len());
            for entry in row {
                costs.push(match entry {
                    CostEntry::Cost(cost) => Some(cost),
                    CostEntry::Marker(false) => None,
                    CostEntry::Marker(true) => {
                        return Err(ImportError::InvalidMarker { task: name })
                    }
                });
            }
            tasks.push(Task::new(name, &costs)?);
        }

        let mut configurations: Vec<Configuration> = self
            .configurations
            .set
            .into_iter()
            .map(|c| Configuration::new(c.e, Vec::new()))
            .collect();
        for (slot, owner) in self.pe_config.into_iter().enumerate() {
            let config = configurations
                .iter_mut()
                .find(|c| c.name == owner)
                .ok_or_else(|| ImportError::UnknownConfiguration {
                    pe: slot,
                    name: owner.clone(),
                })?;
            config.add_pe(Pe(slot));
        }

        let graph = TaskGraph::from_matrix(tasks, &self.deps)?;
        Ok(Problem::new(graph, configurations))
    }
}
