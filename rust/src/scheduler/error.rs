//! Scheduler error taxonomy.
//!
//! Two classes are kept apart: [`Infeasibility`] is a property of the input
//! and means no valid schedule exists; [`ContractViolation`] means a scheduler
//! broke one of the [`super::Schedule`] preconditions.

use thiserror::Error;

use crate::models::{Pe, TaskId};

/// The input admits no schedule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Infeasibility {
    #[error("No configurations available for {0} tasks")]
    NoConfigurations(usize),
    #[error("No configuration can run the lookahead window starting at task {task}")]
    NoConfigurationForWindow { task: String },
    #[error("Task {task} has no feasible PE in configuration {config}")]
    NoFeasiblePe { task: String, config: String },
    #[error("No configuration covers every task of cluster {first}..={last}")]
    UncoveredCluster { first: String, last: String },
}

/// A scheduler called into the schedule with arguments that break its contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("Task {task} has no cost on {pe}")]
    UndefinedCost { task: String, pe: Pe },
    #[error("{0} is not part of any configuration")]
    UnknownPe(Pe),
    #[error("Task #{0} was never scheduled")]
    NotScheduled(TaskId),
    #[error("Task {0} is already scheduled")]
    AlreadyScheduled(String),
}

/// Errors that can occur during scheduling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("No valid schedule: {0}")]
    Infeasible(#[from] Infeasibility),
    #[error("Scheduler contract violated: {0}")]
    Contract(#[from] ContractViolation),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SchedulerError {
    /// True when the input itself has no valid schedule.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, SchedulerError::Infeasible(_))
    }
}
