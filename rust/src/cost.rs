//! Per-configuration cost metrics.
//!
//! All lookups rank an infeasible PE below every feasible one and break ties
//! by the configuration's declared PE order.

use crate::models::{Configuration, Cost, Pe, Task, Time};

impl Configuration {
    /// PE with the lowest cost for `task`, first declared on ties.
    ///
    /// Returns `None` only for a configuration without PEs. If no PE can run
    /// the task the first PE is returned; callers check [`Self::min_cost`].
    pub fn optimal_pe(&self, task: &Task) -> Option<Pe> {
        let mut best: Option<(Pe, Cost)> = None;
        for &pe in &self.pes {
            let cost = task.cost(pe);
            match best {
                Some((_, best_cost)) if cost >= best_cost => {}
                _ => best = Some((pe, cost)),
            }
        }
        best.map(|(pe, _)| pe)
    }

    /// Lowest cost of `task` on any PE of this configuration.
    pub fn min_cost(&self, task: &Task) -> Cost {
        self.optimal_pe(task)
            .map_or(Cost::Infeasible, |pe| task.cost(pe))
    }

    /// Whether at least one PE of this configuration can run `task`.
    pub fn can_run(&self, task: &Task) -> bool {
        self.min_cost(task).is_feasible()
    }

    /// Cost of `task` spread over the feasible PEs: `sum / n / n`.
    pub fn divided_cost(&self, task: &Task) -> Cost {
        let (sum, count) = self
            .pes
            .iter()
            .filter_map(|&pe| task.cost(pe).value())
            .fold((0 as Time, 0 as Time), |(sum, count), c| (sum + c, count + 1));

        if count == 0 {
            Cost::Infeasible
        } else {
            Cost::Feasible(sum / count / count)
        }
    }
}
