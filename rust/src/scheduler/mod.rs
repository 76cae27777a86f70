//! Reconfiguration-aware schedulers.
//!
//! Both algorithms take a borrowed [`TaskGraph`] and configuration catalog,
//! own a fresh [`Schedule`] for the duration of the run and hand it back once
//! every task is placed.

mod clustering;
mod error;
mod lsl;
mod schedule;

pub use clustering::{cluster, Cluster, Clustering};
pub use error::{ContractViolation, Infeasibility, SchedulerError};
pub use lsl::{lsl, LslScheduler};
pub use schedule::{Schedule, ScheduledTask};

use crate::graph::TaskGraph;
use crate::models::{TaskId, Time};

/// Latest finish among the direct predecessors of `id`, 0 if it has none.
pub(crate) fn predecessor_floor(
    graph: &TaskGraph,
    schedule: &Schedule,
    id: TaskId,
) -> Result<Time, SchedulerError> {
    let mut floor = 0;
    for &pred in graph.predecessors(id) {
        floor = floor.max(schedule.finish_time(pred)?);
    }
    Ok(floor)
}
