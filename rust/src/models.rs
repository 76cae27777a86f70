//! Core data types for the reconfiguration-aware scheduler.

use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use crate::graph::GraphError;

/// Upper bound on processing-element slots per task.
pub const MAX_PE: usize = 7;

/// Discrete time unit used for costs, start and finish times.
pub type Time = i64;

/// Largest cost a task may declare. Keeps every sum over tasks, windows and
/// reconfigurations far inside `Time`.
pub const MAX_COST: Time = u32::MAX as Time;

/// Index of a task inside its [`crate::graph::TaskGraph`].
pub type TaskId = usize;

/// Index of a configuration inside the configuration catalog.
pub type ConfigId = usize;

/// A processing element, identified by its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pe(pub usize);

impl fmt::Display for Pe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PE{}", self.0)
    }
}

/// Execution cost of a task on a PE, or a marker that it cannot run there.
///
/// The variant order matters: `Feasible` always sorts before `Infeasible`,
/// so `min` never prefers a missing cost over a real one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cost {
    Feasible(Time),
    Infeasible,
}

impl Cost {
    pub fn is_feasible(self) -> bool {
        matches!(self, Cost::Feasible(_))
    }

    pub fn value(self) -> Option<Time> {
        match self {
            Cost::Feasible(v) => Some(v),
            Cost::Infeasible => None,
        }
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Cost::Feasible(a), Cost::Feasible(b)) => a.cmp(b),
            (Cost::Feasible(_), Cost::Infeasible) => Ordering::Less,
            (Cost::Infeasible, Cost::Feasible(_)) => Ordering::Greater,
            (Cost::Infeasible, Cost::Infeasible) => Ordering::Equal,
        }
    }
}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Option<Time>> for Cost {
    fn from(value: Option<Time>) -> Self {
        value.map_or(Cost::Infeasible, Cost::Feasible)
    }
}

/// Infeasible absorbs: a sum with any missing term is itself missing.
impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        match (self, rhs) {
            (Cost::Feasible(a), Cost::Feasible(b)) => Cost::Feasible(a + b),
            _ => Cost::Infeasible,
        }
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::Feasible(0), Add::add)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cost::Feasible(v) => write!(f, "{}", v),
            Cost::Infeasible => write!(f, "-"),
        }
    }
}

/// A task to be scheduled, with one cost slot per PE.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub name: String,
    costs: [Cost; MAX_PE],
}

impl Task {
    /// Build a task from per-PE costs; slots beyond `costs.len()` are infeasible.
    ///
    /// Fails on more than [`MAX_PE`] entries and on costs outside `0..=MAX_COST`.
    pub fn new(name: impl Into<String>, costs: &[Option<Time>]) -> Result<Self, GraphError> {
        let name = name.into();
        if costs.len() > MAX_PE {
            return Err(GraphError::TooManyCosts {
                task: name,
                count: costs.len(),
            });
        }
        let mut slots = [Cost::Infeasible; MAX_PE];
        for (slot, &cost) in slots.iter_mut().zip(costs) {
            match cost {
                Some(c) if c < 0 => {
                    return Err(GraphError::NegativeCost { task: name, cost: c })
                }
                Some(c) if c > MAX_COST => {
                    return Err(GraphError::CostTooLarge { task: name, cost: c })
                }
                _ => *slot = Cost::from(cost),
            }
        }
        Ok(Self { name, costs: slots })
    }

    /// Cost of running this task on `pe`; out-of-range PEs are infeasible.
    #[inline]
    pub fn cost(&self, pe: Pe) -> Cost {
        self.costs.get(pe.0).copied().unwrap_or(Cost::Infeasible)
    }
}

/// A named subset of PEs that the platform can activate at once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Configuration {
    pub name: String,
    /// Activated PEs in declared order; order decides cost ties.
    pub pes: Vec<Pe>,
}

impl Configuration {
    pub fn new(name: impl Into<String>, pes: Vec<Pe>) -> Self {
        Self {
            name: name.into(),
            pes,
        }
    }

    pub fn add_pe(&mut self, pe: Pe) {
        self.pes.push(pe);
    }
}
