//! List scheduling with lookahead (LSL).
//!
//! Walks the tasks once in topological order while tracking a current
//! configuration. Before each placement every configuration is scored over a
//! window of the next `lookahead` tasks; switching away from the current
//! configuration starts out `rho` behind, which keeps the scheduler from
//! thrashing between configurations that are only marginally better.

use crate::config::SchedulerConfig;
use crate::graph::TaskGraph;
use crate::models::{ConfigId, Configuration, Cost, TaskId, Time};
use crate::{log_changes, log_checks, log_debug};

use super::error::{Infeasibility, SchedulerError};
use super::predecessor_floor;
use super::schedule::Schedule;

/// LSL scheduler over a borrowed graph and configuration catalog.
pub struct LslScheduler<'a> {
    graph: &'a TaskGraph,
    configurations: &'a [Configuration],
    config: &'a SchedulerConfig,
}

impl<'a> LslScheduler<'a> {
    pub fn new(
        graph: &'a TaskGraph,
        configurations: &'a [Configuration],
        config: &'a SchedulerConfig,
    ) -> Self {
        Self {
            graph,
            configurations,
            config,
        }
    }

    /// Run the algorithm and return the finished schedule.
    ///
    /// The platform starts out in the first configuration of the catalog, so
    /// no reconfiguration is logged until the scheduler leaves it.
    pub fn schedule(&self) -> Result<Schedule, SchedulerError> {
        self.config.validate()?;

        let mut schedule = Schedule::new(self.configurations);
        let order = self.graph.topological_order();
        if order.is_empty() {
            return Ok(schedule);
        }
        if self.configurations.is_empty() {
            return Err(Infeasibility::NoConfigurations(order.len()).into());
        }

        let verbosity = self.config.verbosity;
        let rho = self.config.rho;
        let mut current: ConfigId = 0;
        let mut last_scheduled: ConfigId = current;
        let mut last_reconfig: Time = 0;

        for (i, &id) in order.iter().enumerate() {
            let task = self.graph.task(id);
            let window = &order[i..i.saturating_add(self.config.lookahead).min(order.len())];

            log_debug!(
                verbosity,
                "Task {} window: {:?}",
                task.name,
                window
                    .iter()
                    .map(|&u| self.graph.task(u).name.as_str())
                    .collect::<Vec<_>>()
            );

            let selected = self.select_configuration(current, window).ok_or_else(|| {
                Infeasibility::NoConfigurationForWindow {
                    task: task.name.clone(),
                }
            })?;

            // A configuration that wins the window but cannot run this task is ignored
            if selected != current && self.configurations[selected].can_run(task) {
                log_changes!(
                    verbosity,
                    "  Switch {} -> {} before task {}",
                    self.configurations[current].name,
                    self.configurations[selected].name,
                    task.name
                );
                current = selected;
            }

            let active = &self.configurations[current];
            let (pe, candidate_start) =
                schedule
                    .asap(active, task)
                    .ok_or_else(|| Infeasibility::NoFeasiblePe {
                        task: task.name.clone(),
                        config: active.name.clone(),
                    })?;
            let pred_floor = predecessor_floor(self.graph, &schedule, id)?;

            if current != last_scheduled {
                last_reconfig = schedule.insert_reconfiguration(rho);
                last_scheduled = current;
                log_changes!(
                    verbosity,
                    "  Reconfigure to {} (ready at {})",
                    active.name,
                    last_reconfig
                );
            }

            let start = candidate_start.max(pred_floor + 1).max(last_reconfig + 1);
            let placed = schedule.schedule_task(id, task, pe, start)?;
            log_changes!(
                verbosity,
                "  Scheduled task {} on {} from {} to {}",
                placed.name,
                placed.pe,
                placed.start,
                placed.finish()
            );
        }

        Ok(schedule)
    }

    /// Score of `candidate` over `window` while `current` is active.
    ///
    /// Each task contributes the cheaper of its best cost under the two
    /// configurations; a task neither can run makes the candidate infeasible.
    fn lookahead_score(&self, current: ConfigId, candidate: ConfigId, window: &[TaskId]) -> Cost {
        let mut total = if candidate == current {
            0
        } else {
            self.config.rho
        };
        for &u in window {
            let task = self.graph.task(u);
            let stay = self.configurations[current].min_cost(task);
            let switch = self.configurations[candidate].min_cost(task);
            match stay.min(switch) {
                Cost::Feasible(cost) => total += cost,
                Cost::Infeasible => return Cost::Infeasible,
            }
        }
        Cost::Feasible(total)
    }

    /// Lowest-scoring configuration, earliest in catalog order on ties.
    fn select_configuration(&self, current: ConfigId, window: &[TaskId]) -> Option<ConfigId> {
        let mut best: Option<(ConfigId, Time)> = None;
        for candidate in 0..self.configurations.len() {
            let score = self.lookahead_score(current, candidate, window);
            log_checks!(
                self.config.verbosity,
                "    {} scores {}",
                self.configurations[candidate].name,
                score
            );
            let Cost::Feasible(score) = score else {
                continue;
            };
            match best {
                Some((_, best_score)) if score >= best_score => {}
                _ => best = Some((candidate, score)),
            }
        }
        best.map(|(candidate, _)| candidate)
    }
}

/// Run LSL with the parameters in `config`.
pub fn lsl(
    graph: &TaskGraph,
    configurations: &[Configuration],
    config: &SchedulerConfig,
) -> Result<Schedule, SchedulerError> {
    LslScheduler::new(graph, configurations, config).schedule()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Pe, Task};
    use crate::validation::validate_schedule;

    fn task(name: &str, costs: &[Option<Time>]) -> Task {
        Task::new(name, costs).unwrap()
    }

    fn config(rho: Time, lookahead: usize) -> SchedulerConfig {
        SchedulerConfig {
            rho,
            lookahead,
            verbosity: 0,
        }
    }

    /// Two single-PE configurations: "c0" owns PE0, "c1" owns PE1.
    fn split_platform() -> Vec<Configuration> {
        vec![
            Configuration::new("c0", vec![Pe(0)]),
            Configuration::new("c1", vec![Pe(1)]),
        ]
    }

    fn start_of(schedule: &Schedule, graph: &TaskGraph, name: &str) -> Time {
        schedule.get(graph.id_of(name).unwrap()).unwrap().start
    }

    #[test]
    fn test_single_configuration_chain() {
        let graph = TaskGraph::from_named_edges(
            vec![
                task("A", &[Some(2)]),
                task("B", &[Some(3)]),
                task("C", &[Some(1)]),
            ],
            &[("A", "B"), ("B", "C")],
        )
        .unwrap();
        let configs = vec![Configuration::new("only", vec![Pe(0)])];

        let schedule = lsl(&graph, &configs, &config(2, 3)).unwrap();

        assert!(schedule.reconfigs().is_empty());
        let placed: Vec<(&str, Time, Time)> = schedule
            .tasks()
            .iter()
            .map(|t| (t.name.as_str(), t.start, t.finish()))
            .collect();
        assert_eq!(placed, vec![("A", 1, 3), ("B", 4, 7), ("C", 8, 9)]);
        assert_eq!(schedule.makespan(), 9);
        assert_eq!(validate_schedule(&graph, &schedule, 2), Ok(()));
    }

    #[test]
    fn test_switches_when_window_favors_other_configuration() {
        let graph = TaskGraph::from_named_edges(
            vec![
                task("a", &[Some(1), None]),
                task("b", &[None, Some(1)]),
                task("c", &[None, Some(1)]),
                task("d", &[None, Some(1)]),
            ],
            &[("a", "b"), ("b", "c"), ("c", "d")],
        )
        .unwrap();

        let schedule = lsl(&graph, &split_platform(), &config(2, 3)).unwrap();

        // a runs 1..2 on PE0, then one reconfiguration at 2 ready at 4
        assert_eq!(schedule.reconfigs(), &[2]);
        assert_eq!(schedule.get(0).unwrap().pe, Pe(0));
        for name in ["b", "c", "d"] {
            let id = graph.id_of(name).unwrap();
            assert_eq!(schedule.get(id).unwrap().pe, Pe(1));
        }
        assert_eq!(start_of(&schedule, &graph, "b"), 5);
        assert_eq!(start_of(&schedule, &graph, "c"), 7);
        assert_eq!(start_of(&schedule, &graph, "d"), 9);
        assert_eq!(schedule.makespan(), 10);
        assert_eq!(validate_schedule(&graph, &schedule, 2), Ok(()));
    }

    #[test]
    fn test_rho_penalty_prevents_marginal_switch() {
        let graph = TaskGraph::new(vec![task("x", &[Some(5), Some(4)])], &[]).unwrap();

        // c0: 5, c1: 2 + min(5, 4) = 6
        let sticky = lsl(&graph, &split_platform(), &config(2, 3)).unwrap();
        assert_eq!(sticky.get(0).unwrap().pe, Pe(0));
        assert!(sticky.reconfigs().is_empty());

        // c1: 0 + 4 = 4 beats 5
        let free = lsl(&graph, &split_platform(), &config(0, 3)).unwrap();
        assert_eq!(free.get(0).unwrap().pe, Pe(1));
        assert_eq!(free.reconfigs(), &[0]);
        assert_eq!(free.get(0).unwrap().start, 1);
    }

    #[test]
    fn test_selected_configuration_must_run_current_task() {
        // "x" only runs on c0; "y" and "z" are much cheaper on c1. The window
        // favors c1, but x must still be placed under c0.
        let graph = TaskGraph::from_named_edges(
            vec![
                task("x", &[Some(1), None]),
                task("y", &[Some(50), Some(1)]),
                task("z", &[Some(50), Some(1)]),
            ],
            &[("x", "y"), ("y", "z")],
        )
        .unwrap();

        let schedule = lsl(&graph, &split_platform(), &config(2, 3)).unwrap();
        assert_eq!(schedule.get(0).unwrap().pe, Pe(0));
        assert_eq!(schedule.get(1).unwrap().pe, Pe(1));
        assert_eq!(schedule.reconfigs().len(), 1);
        assert_eq!(validate_schedule(&graph, &schedule, 2), Ok(()));
    }

    #[test]
    fn test_ties_pick_first_configuration() {
        let graph = TaskGraph::new(vec![task("t", &[Some(3), Some(3)])], &[]).unwrap();
        let configs = vec![
            Configuration::new("first", vec![Pe(0)]),
            Configuration::new("second", vec![Pe(1)]),
        ];
        let schedule = lsl(&graph, &configs, &config(0, 1)).unwrap();
        assert_eq!(schedule.get(0).unwrap().pe, Pe(0));
        assert!(schedule.reconfigs().is_empty());
    }

    #[test]
    fn test_infeasible_task_is_reported() {
        let graph = TaskGraph::from_named_edges(
            vec![task("a", &[Some(1), Some(1)]), task("ghost", &[None, None])],
            &[("a", "ghost")],
        )
        .unwrap();

        let err = lsl(&graph, &split_platform(), &config(2, 3)).unwrap_err();
        assert!(err.is_infeasible());
        assert_eq!(
            err,
            SchedulerError::Infeasible(Infeasibility::NoConfigurationForWindow {
                task: "a".to_string()
            })
        );
    }

    #[test]
    fn test_infeasible_task_with_narrow_window() {
        let graph = TaskGraph::from_named_edges(
            vec![task("a", &[Some(1), Some(1)]), task("ghost", &[None, None])],
            &[("a", "ghost")],
        )
        .unwrap();

        let err = lsl(&graph, &split_platform(), &config(2, 1)).unwrap_err();
        assert_eq!(
            err,
            SchedulerError::Infeasible(Infeasibility::NoConfigurationForWindow {
                task: "ghost".to_string()
            })
        );
    }

    #[test]
    fn test_empty_inputs() {
        let empty = TaskGraph::new(vec![], &[]).unwrap();
        let schedule = lsl(&empty, &split_platform(), &config(2, 3)).unwrap();
        assert!(schedule.is_empty());
        assert_eq!(schedule.makespan(), 0);

        let graph = TaskGraph::new(vec![task("a", &[Some(1)])], &[]).unwrap();
        let err = lsl(&graph, &[], &config(2, 3)).unwrap_err();
        assert_eq!(
            err,
            SchedulerError::Infeasible(Infeasibility::NoConfigurations(1))
        );
    }

    #[test]
    fn test_invalid_lookahead_rejected() {
        let graph = TaskGraph::new(vec![task("a", &[Some(1)])], &[]).unwrap();
        let err = lsl(&graph, &split_platform(), &config(2, 0)).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidConfig(_)));
    }

    #[test]
    fn test_unbounded_lookahead_covers_rest_of_order() {
        let graph = TaskGraph::from_named_edges(
            vec![task("a", &[Some(2)]), task("b", &[Some(3)])],
            &[("a", "b")],
        )
        .unwrap();
        let configs = vec![Configuration::new("only", vec![Pe(0)])];

        let schedule = lsl(&graph, &configs, &config(2, usize::MAX)).unwrap();
        assert_eq!(start_of(&schedule, &graph, "a"), 1);
        assert_eq!(start_of(&schedule, &graph, "b"), 4);
        assert_eq!(schedule.makespan(), 7);
    }

    #[test]
    fn test_parallel_tasks_share_configuration() {
        let graph = TaskGraph::new(
            vec![
                task("p", &[Some(4), Some(4)]),
                task("q", &[Some(4), Some(4)]),
            ],
            &[],
        )
        .unwrap();
        let configs = vec![Configuration::new("both", vec![Pe(0), Pe(1)])];

        let schedule = lsl(&graph, &configs, &config(2, 3)).unwrap();
        assert_eq!(schedule.get(0).unwrap().pe, Pe(0));
        assert_eq!(schedule.get(1).unwrap().pe, Pe(1));
        assert_eq!(schedule.get(1).unwrap().start, 1);
        assert_eq!(schedule.makespan(), 5);
    }

    #[test]
    fn test_generated_graph_is_valid_and_deterministic() {
        let (graph, configs) = crate::validation::tests::generated_problem(40, 7);
        let cfg = config(3, 3);

        let first = lsl(&graph, &configs, &cfg).unwrap();
        let second = lsl(&graph, &configs, &cfg).unwrap();

        assert_eq!(first.len(), graph.len());
        assert_eq!(first.tasks(), second.tasks());
        assert_eq!(first.reconfigs(), second.reconfigs());
        assert_eq!(validate_schedule(&graph, &first, 3), Ok(()));
    }
}
