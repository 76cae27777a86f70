//! Schedule validation.
//!
//! Checks a finished [`Schedule`] against its task graph, independently of
//! the algorithm that produced it. Detects:
//! - placements on a PE without a defined cost, or a recorded cost that differs
//! - tasks that are missing or placed twice
//! - overlapping or out-of-order intervals on one PE
//! - precedence edges that are not strictly respected
//! - tasks on the wrong side of a reconfiguration window
//! - a makespan that disagrees with the placed tasks

use rustc_hash::FxHashMap;

use crate::graph::TaskGraph;
use crate::models::{Cost, Pe, Time};
use crate::scheduler::{Schedule, ScheduledTask};

/// Validation result.
pub type ValidationResult = Result<(), Vec<Violation>>;

/// A broken schedule invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Cost undefined on the chosen PE, or recorded cost differs from the task's.
    Cost,
    /// A graph task was never placed.
    Missing,
    /// A task was placed more than once.
    Duplicate,
    /// Two tasks on one PE overlap or were placed out of start order.
    Overlap,
    /// A successor does not start strictly after its predecessor finishes.
    Precedence,
    /// A task placed before a reconfiguration at `T` finishes after `T`, or one
    /// placed after it starts before `T + rho`.
    Reconfiguration,
    /// Reported makespan differs from the latest finish.
    Makespan,
}

impl Violation {
    fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validate `schedule` for `graph` with reconfiguration latency `rho`.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(violations)` with every detected issue.
pub fn validate_schedule(graph: &TaskGraph, schedule: &Schedule, rho: Time) -> ValidationResult {
    let mut violations = Vec::new();

    let mut placed: FxHashMap<usize, &ScheduledTask> = FxHashMap::default();
    for entry in schedule.tasks() {
        if entry.task >= graph.len() {
            violations.push(Violation::new(
                ViolationKind::Missing,
                format!("Placed task #{} is not in the graph", entry.task),
            ));
            continue;
        }
        if placed.insert(entry.task, entry).is_some() {
            violations.push(Violation::new(
                ViolationKind::Duplicate,
                format!("Task {} placed more than once", entry.name),
            ));
        }
        match graph.task(entry.task).cost(entry.pe) {
            Cost::Feasible(cost) if cost == entry.cost => {}
            Cost::Feasible(cost) => violations.push(Violation::new(
                ViolationKind::Cost,
                format!(
                    "Task {} on {} recorded cost {}, expected {}",
                    entry.name, entry.pe, entry.cost, cost
                ),
            )),
            Cost::Infeasible => violations.push(Violation::new(
                ViolationKind::Cost,
                format!("Task {} placed on {} where it has no cost", entry.name, entry.pe),
            )),
        }
    }

    for (id, task) in graph.tasks().iter().enumerate() {
        if !placed.contains_key(&id) {
            violations.push(Violation::new(
                ViolationKind::Missing,
                format!("Task {} was not scheduled", task.name),
            ));
        }
    }

    let mut by_pe: FxHashMap<Pe, Vec<&ScheduledTask>> = FxHashMap::default();
    for entry in schedule.tasks() {
        by_pe.entry(entry.pe).or_default().push(entry);
    }
    for (pe, entries) in &by_pe {
        for pair in entries.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if next.start < prev.finish() {
                violations.push(Violation::new(
                    ViolationKind::Overlap,
                    format!(
                        "Tasks {} [{}-{}] and {} [{}-{}] overlap on {}",
                        prev.name,
                        prev.start,
                        prev.finish(),
                        next.name,
                        next.start,
                        next.finish(),
                        pe
                    ),
                ));
            }
        }
    }

    for (from, to) in graph.edges() {
        if let (Some(before), Some(after)) = (placed.get(&from), placed.get(&to)) {
            if before.finish() >= after.start {
                violations.push(Violation::new(
                    ViolationKind::Precedence,
                    format!(
                        "Task {} finishes at {} but successor {} starts at {}",
                        before.name,
                        before.finish(),
                        after.name,
                        after.start
                    ),
                ));
            }
        }
    }

    for (reconfig, mark) in schedule.reconfig_points() {
        let ready = reconfig + rho;
        for (index, entry) in schedule.tasks().iter().enumerate() {
            let (ok, side) = if index < mark {
                (entry.finish() <= reconfig, "before")
            } else {
                (entry.start >= ready, "after")
            };
            if !ok {
                violations.push(Violation::new(
                    ViolationKind::Reconfiguration,
                    format!(
                        "Task {} [{}-{}] placed {} reconfiguration [{}-{}] crosses it",
                        entry.name,
                        entry.start,
                        entry.finish(),
                        side,
                        reconfig,
                        ready
                    ),
                ));
            }
        }
    }

    let latest = schedule
        .tasks()
        .iter()
        .map(ScheduledTask::finish)
        .max()
        .unwrap_or(0);
    if schedule.makespan() != latest {
        violations.push(Violation::new(
            ViolationKind::Makespan,
            format!(
                "Makespan {} differs from latest finish {}",
                schedule.makespan(),
                latest
            ),
        ));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
