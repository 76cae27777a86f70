//! Configuration types for the scheduling algorithms.

use pyo3::prelude::*;

use crate::models::{Time, MAX_COST};
use crate::scheduler::SchedulerError;

/// Default reconfiguration latency.
pub const DEFAULT_RHO: Time = 2;
/// Default LSL lookahead width.
pub const DEFAULT_LOOKAHEAD: usize = 3;

/// Parameters shared by both schedulers.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Reconfiguration latency: time the platform is paused while switching
    #[pyo3(get, set)]
    pub rho: Time,
    /// Number of upcoming tasks LSL scores each configuration against
    #[pyo3(get, set)]
    pub lookahead: usize,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            rho: DEFAULT_RHO,
            lookahead: DEFAULT_LOOKAHEAD,
            verbosity: 0,
        }
    }
}

impl SchedulerConfig {
    /// Reject parameter values no algorithm can work with.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if !(0..=MAX_COST).contains(&self.rho) {
            return Err(SchedulerError::InvalidConfig(format!(
                "rho must be between 0 and {}, got {}",
                MAX_COST, self.rho
            )));
        }
        if self.lookahead == 0 {
            return Err(SchedulerError::InvalidConfig(
                "lookahead must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[pymethods]
impl SchedulerConfig {
    #[new]
    #[pyo3(signature = (rho=None, lookahead=None, verbosity=None))]
    fn new(rho: Option<Time>, lookahead: Option<usize>, verbosity: Option<u8>) -> Self {
        let defaults = Self::default();
        Self {
            rho: rho.unwrap_or(defaults.rho),
            lookahead: lookahead.unwrap_or(defaults.lookahead),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SchedulerConfig(rho={}, lookahead={}, verbosity={})",
            self.rho, self.lookahead, self.verbosity
        )
    }
}
