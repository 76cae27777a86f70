//! Schedule bookkeeping: placements, per-PE finish times and reconfigurations.

use rustc_hash::FxHashMap;

use crate::models::{Configuration, Cost, Pe, Task, TaskId, Time};

use super::error::ContractViolation;

/// A task placed on a PE.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledTask {
    pub task: TaskId,
    pub name: String,
    pub pe: Pe,
    pub start: Time,
    /// Cost of the task on `pe`, fixed when it was placed.
    pub cost: Time,
}

impl ScheduledTask {
    #[inline]
    pub fn finish(&self) -> Time {
        self.start + self.cost
    }
}

/// Mutable schedule owned by a single algorithm run.
///
/// Invariants maintained by the schedulers and checked by
/// [`crate::validation::validate_schedule`]:
/// - tasks on one PE never overlap and are appended in start order
/// - every reconfiguration timestamp is at or after all earlier finishes
#[derive(Clone, Debug)]
pub struct Schedule {
    tasks: Vec<ScheduledTask>,
    /// Every PE of every configuration, ascending
    platform: Vec<Pe>,
    /// Finish time of the last task on each platform PE (0 if idle so far)
    pe_finish: FxHashMap<Pe, Time>,
    reconfigs: Vec<Time>,
    /// Number of tasks placed when each reconfiguration was logged
    reconfig_marks: Vec<usize>,
    /// Time the most recent reconfiguration completes
    reconfig_end: Option<Time>,
    by_task: FxHashMap<TaskId, usize>,
}

impl Schedule {
    /// Create an empty schedule for the platform spanned by `configurations`.
    pub fn new(configurations: &[Configuration]) -> Self {
        let mut platform: Vec<Pe> = configurations
            .iter()
            .flat_map(|c| c.pes.iter().copied())
            .collect();
        platform.sort_unstable();
        platform.dedup();
        let pe_finish = platform.iter().map(|&pe| (pe, 0)).collect();

        Self {
            tasks: Vec::new(),
            platform,
            pe_finish,
            reconfigs: Vec::new(),
            reconfig_marks: Vec::new(),
            reconfig_end: None,
            by_task: FxHashMap::default(),
        }
    }

    /// Current finish time of `pe`, 0 if nothing ran on it yet.
    #[inline]
    pub fn max_finish(&self, pe: Pe) -> Time {
        self.pe_finish.get(&pe).copied().unwrap_or(0)
    }

    /// PE of `config` minimizing `max_finish(pe) + cost(task, pe)`, with the
    /// PE's current finish time. `None` if no PE of `config` can run `task`.
    pub fn earliest_finish(&self, task: &Task, config: &Configuration) -> Option<(Pe, Time)> {
        let mut best: Option<(Pe, Cost)> = None;
        for &pe in &config.pes {
            let finish = task
                .cost(pe)
                .value()
                .map(|cost| self.max_finish(pe) + cost);
            let finish = Cost::from(finish);
            match best {
                Some((_, best_finish)) if finish >= best_finish => {}
                _ => best = Some((pe, finish)),
            }
        }
        match best {
            Some((pe, Cost::Feasible(_))) => Some((pe, self.max_finish(pe))),
            _ => None,
        }
    }

    /// Earliest legal placement of `task` under `config`.
    ///
    /// Picks the same PE as [`Self::earliest_finish`]; the start is one unit
    /// after that PE frees up and no earlier than the end of the last
    /// reconfiguration.
    pub fn asap(&self, config: &Configuration, task: &Task) -> Option<(Pe, Time)> {
        let (pe, pe_finish) = self.earliest_finish(task, config)?;
        let start = (pe_finish + 1).max(self.reconfig_end.unwrap_or(0));
        Some((pe, start))
    }

    /// Place `task` on `pe` at `start`.
    pub fn schedule_task(
        &mut self,
        id: TaskId,
        task: &Task,
        pe: Pe,
        start: Time,
    ) -> Result<&ScheduledTask, ContractViolation> {
        let cost = task
            .cost(pe)
            .value()
            .ok_or_else(|| ContractViolation::UndefinedCost {
                task: task.name.clone(),
                pe,
            })?;
        if self.by_task.contains_key(&id) {
            return Err(ContractViolation::AlreadyScheduled(task.name.clone()));
        }
        let Some(finish_slot) = self.pe_finish.get_mut(&pe) else {
            return Err(ContractViolation::UnknownPe(pe));
        };
        *finish_slot = start + cost;

        self.by_task.insert(id, self.tasks.len());
        self.tasks.push(ScheduledTask {
            task: id,
            name: task.name.clone(),
            pe,
            start,
            cost,
        });
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Log a reconfiguration once the whole platform is idle.
    ///
    /// Returns the time the new configuration is ready (`idle + rho`).
    pub fn insert_reconfiguration(&mut self, rho: Time) -> Time {
        let limit = self
            .platform
            .iter()
            .map(|&pe| self.max_finish(pe))
            .max()
            .unwrap_or(0);
        self.reconfigs.push(limit);
        self.reconfig_marks.push(self.tasks.len());
        self.reconfig_end = Some(limit + rho);
        limit + rho
    }

    /// Finish time of a previously scheduled task.
    pub fn finish_time(&self, id: TaskId) -> Result<Time, ContractViolation> {
        self.by_task
            .get(&id)
            .map(|&idx| self.tasks[idx].finish())
            .ok_or(ContractViolation::NotScheduled(id))
    }

    /// Latest finish over all PEs, 0 for an empty schedule.
    pub fn makespan(&self) -> Time {
        self.pe_finish.values().copied().max().unwrap_or(0)
    }

    /// Scheduled tasks in placement order.
    pub fn tasks(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    /// Tasks placed on `pe`, in start order.
    pub fn tasks_on_pe(&self, pe: Pe) -> impl Iterator<Item = &ScheduledTask> + '_ {
        self.tasks.iter().filter(move |t| t.pe == pe)
    }

    pub fn get(&self, id: TaskId) -> Option<&ScheduledTask> {
        self.by_task.get(&id).map(|&idx| &self.tasks[idx])
    }

    /// Reconfiguration timestamps, in insertion order.
    pub fn reconfigs(&self) -> &[Time] {
        &self.reconfigs
    }

    /// Each reconfiguration timestamp with the number of tasks placed before it.
    ///
    /// Tasks `tasks()[..mark]` precede the reconfiguration, the rest follow it.
    pub fn reconfig_points(&self) -> impl Iterator<Item = (Time, usize)> + '_ {
        self.reconfigs
            .iter()
            .copied()
            .zip(self.reconfig_marks.iter().copied())
    }

    /// Platform PEs, ascending.
    pub fn pes(&self) -> &[Pe] {
        &self.platform
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configs() -> Vec<Configuration> {
        vec![
            Configuration::new("left", vec![Pe(0), Pe(1)]),
            Configuration::new("right", vec![Pe(2)]),
        ]
    }

    fn task(name: &str, costs: &[Option<Time>]) -> Task {
        Task::new(name, costs).unwrap()
    }

    #[test]
    fn test_empty_schedule() {
        let schedule = Schedule::new(&configs());
        assert_eq!(schedule.makespan(), 0);
        assert_eq!(schedule.max_finish(Pe(0)), 0);
        assert_eq!(schedule.max_finish(Pe(6)), 0);
        assert_eq!(schedule.pes(), &[Pe(0), Pe(1), Pe(2)]);
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_schedule_task_updates_finish() {
        let mut schedule = Schedule::new(&configs());
        let t = task("a", &[Some(4), Some(2)]);

        let placed = schedule.schedule_task(0, &t, Pe(0), 3).unwrap();
        assert_eq!(placed.finish(), 7);
        assert_eq!(schedule.max_finish(Pe(0)), 7);
        assert_eq!(schedule.finish_time(0), Ok(7));
        assert_eq!(schedule.makespan(), 7);
    }

    #[test]
    fn test_schedule_task_contract_violations() {
        let mut schedule = Schedule::new(&configs());
        let t = task("a", &[Some(4), None]);

        assert_eq!(
            schedule.schedule_task(0, &t, Pe(1), 1).unwrap_err(),
            ContractViolation::UndefinedCost {
                task: "a".to_string(),
                pe: Pe(1)
            }
        );
        assert!(schedule.is_empty());

        let wide = task("w", &[None, None, None, None, Some(1)]);
        assert_eq!(
            schedule.schedule_task(1, &wide, Pe(4), 1).unwrap_err(),
            ContractViolation::UnknownPe(Pe(4))
        );

        schedule.schedule_task(0, &t, Pe(0), 1).unwrap();
        assert_eq!(
            schedule.schedule_task(0, &t, Pe(0), 10).unwrap_err(),
            ContractViolation::AlreadyScheduled("a".to_string())
        );
    }

    #[test]
    fn test_finish_time_of_unscheduled_task() {
        let schedule = Schedule::new(&configs());
        assert_eq!(
            schedule.finish_time(5),
            Err(ContractViolation::NotScheduled(5))
        );
    }

    #[test]
    fn test_earliest_finish_accounts_for_load() {
        let c = configs();
        let mut schedule = Schedule::new(&c);
        let busy = task("busy", &[Some(10)]);
        schedule.schedule_task(0, &busy, Pe(0), 1).unwrap();

        // PE0: 11 + 3 = 14, PE1: 0 + 5 = 5
        let t = task("t", &[Some(3), Some(5)]);
        assert_eq!(schedule.earliest_finish(&t, &c[0]), Some((Pe(1), 0)));

        // Only PE0 can run it: returns PE0 with its current finish
        let only_first = task("f", &[Some(3), None]);
        assert_eq!(schedule.earliest_finish(&only_first, &c[0]), Some((Pe(0), 11)));

        // Nothing in "right" can run it
        assert_eq!(schedule.earliest_finish(&t, &c[1]), None);
    }

    #[test]
    fn test_earliest_finish_tie_prefers_declared_order() {
        let c = Configuration::new("rev", vec![Pe(1), Pe(0)]);
        let schedule = Schedule::new(std::slice::from_ref(&c));
        let t = task("t", &[Some(2), Some(2)]);
        assert_eq!(schedule.earliest_finish(&t, &c), Some((Pe(1), 0)));
    }

    #[test]
    fn test_asap_applies_gap_and_reconfiguration_floor() {
        let c = configs();
        let mut schedule = Schedule::new(&c);
        let t = task("t", &[Some(3), Some(5)]);
        assert_eq!(schedule.asap(&c[0], &t), Some((Pe(0), 1)));

        schedule.schedule_task(0, &task("a", &[Some(4)]), Pe(0), 1).unwrap();
        // PE0: 5 + 3 = 8 vs PE1: 0 + 5 = 5
        assert_eq!(schedule.asap(&c[0], &t), Some((Pe(1), 1)));

        let ready = schedule.insert_reconfiguration(2);
        assert_eq!(ready, 7);
        assert_eq!(schedule.asap(&c[0], &t), Some((Pe(1), 7)));
    }

    #[test]
    fn test_insert_reconfiguration_waits_for_whole_platform() {
        let c = configs();
        let mut schedule = Schedule::new(&c);
        schedule.schedule_task(0, &task("a", &[Some(4)]), Pe(0), 1).unwrap();
        schedule
            .schedule_task(1, &task("b", &[None, None, Some(9)]), Pe(2), 1)
            .unwrap();

        assert_eq!(schedule.insert_reconfiguration(3), 13);
        assert_eq!(schedule.reconfigs(), &[10]);
        assert_eq!(schedule.reconfig_points().collect::<Vec<_>>(), vec![(10, 2)]);
    }

    #[test]
    fn test_tasks_on_pe_in_start_order() {
        let c = configs();
        let mut schedule = Schedule::new(&c);
        let t = task("x", &[Some(1), Some(1)]);
        let u = task("y", &[Some(1), Some(1)]);
        let v = task("z", &[Some(1), Some(1)]);
        schedule.schedule_task(0, &t, Pe(0), 1).unwrap();
        schedule.schedule_task(1, &u, Pe(1), 1).unwrap();
        schedule.schedule_task(2, &v, Pe(0), 3).unwrap();

        let names: Vec<&str> = schedule
            .tasks_on_pe(Pe(0))
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["x", "z"]);
        assert_eq!(schedule.get(1).map(|t| t.pe), Some(Pe(1)));
    }
}
