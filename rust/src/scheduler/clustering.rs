//! Greedy bottom-up clustering scheduler.
//!
//! The topological order is cut into contiguous clusters, each bound to one
//! configuration. Every task starts in its own cluster; adjacent clusters are
//! merged while running them under a shared configuration is cheaper than
//! keeping them apart and paying `rho` for the switch in between. The
//! converged clusters are then emitted one by one, each preceded by a
//! reconfiguration.

use std::ops::Range;

use crate::config::SchedulerConfig;
use crate::graph::TaskGraph;
use crate::models::{ConfigId, Configuration, Cost, TaskId, Time};
use crate::{log_changes, log_checks, log_debug};

use super::error::{Infeasibility, SchedulerError};
use super::predecessor_floor;
use super::schedule::Schedule;

/// A contiguous run of the topological order sharing one configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cluster {
    /// Positions in the topological order.
    pub range: Range<usize>,
    /// Summed divided cost under `config`; infeasible when nothing covers the range.
    pub cost: Cost,
    pub config: Option<ConfigId>,
}

impl Cluster {
    /// Tombstoned clusters are empty and keep their slot in the sequence.
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    fn tombstone(&mut self) {
        self.range = self.range.start..self.range.start;
        self.cost = Cost::Feasible(0);
        self.config = None;
    }
}

/// Cluster state over a borrowed graph and configuration catalog.
pub struct Clustering<'a> {
    graph: &'a TaskGraph,
    configurations: &'a [Configuration],
    clusters: Vec<Cluster>,
    rho: Time,
    verbosity: u8,
}

impl<'a> Clustering<'a> {
    /// One singleton cluster per task, each bound to its cheapest configuration.
    pub fn new(
        graph: &'a TaskGraph,
        configurations: &'a [Configuration],
        config: &SchedulerConfig,
    ) -> Self {
        let mut clustering = Self {
            graph,
            configurations,
            clusters: Vec::with_capacity(graph.len()),
            rho: config.rho,
            verbosity: config.verbosity,
        };
        for pos in 0..graph.len() {
            let range = pos..pos + 1;
            let cluster = match clustering.opt_cluster_cost(range.clone()) {
                Some((config, cost)) => Cluster {
                    range,
                    cost: Cost::Feasible(cost),
                    config: Some(config),
                },
                None => Cluster {
                    range,
                    cost: Cost::Infeasible,
                    config: None,
                },
            };
            clustering.clusters.push(cluster);
        }
        clustering
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    fn order(&self) -> &'a [TaskId] {
        self.graph.topological_order()
    }

    /// Summed divided cost of `range` under one configuration.
    pub fn cluster_cost(&self, config: ConfigId, range: Range<usize>) -> Cost {
        let configuration = &self.configurations[config];
        self.order()[range]
            .iter()
            .map(|&id| configuration.divided_cost(self.graph.task(id)))
            .sum()
    }

    /// Cheapest configuration covering every task in `range`, first in
    /// catalog order on ties. `None` if no configuration covers the range.
    pub fn opt_cluster_cost(&self, range: Range<usize>) -> Option<(ConfigId, Time)> {
        let mut best: Option<(ConfigId, Time)> = None;
        for config in 0..self.configurations.len() {
            let Cost::Feasible(cost) = self.cluster_cost(config, range.clone()) else {
                continue;
            };
            match best {
                Some((_, best_cost)) if cost >= best_cost => {}
                _ => best = Some((config, cost)),
            }
        }
        best
    }

    /// One left-to-right pass over adjacent non-empty clusters.
    ///
    /// Returns the number of merges committed.
    pub fn merge_pass(&mut self) -> usize {
        let mut merges = 0;
        for lhs in 0..self.clusters.len() {
            if self.clusters[lhs].is_empty() {
                continue;
            }
            let Some(rhs) = (lhs + 1..self.clusters.len()).find(|&i| !self.clusters[i].is_empty())
            else {
                break;
            };

            debug_assert_eq!(self.clusters[lhs].range.end, self.clusters[rhs].range.start);
            let combined = self.clusters[lhs].range.start..self.clusters[rhs].range.end;
            let separate =
                self.clusters[lhs].cost + self.clusters[rhs].cost + Cost::Feasible(self.rho);

            let Some((config, merged)) = self.opt_cluster_cost(combined.clone()) else {
                log_checks!(
                    self.verbosity,
                    "  Clusters {:?} and {:?} share no configuration",
                    self.clusters[lhs].range,
                    self.clusters[rhs].range
                );
                continue;
            };
            log_checks!(
                self.verbosity,
                "  Merge {:?} + {:?}: combined {} vs separate {}",
                self.clusters[lhs].range,
                self.clusters[rhs].range,
                merged,
                separate
            );

            if Cost::Feasible(merged) < separate {
                log_changes!(
                    self.verbosity,
                    "  Merged {:?} under {} (cost {})",
                    combined,
                    self.configurations[config].name,
                    merged
                );
                self.clusters[rhs] = Cluster {
                    range: combined,
                    cost: Cost::Feasible(merged),
                    config: Some(config),
                };
                self.clusters[lhs].tombstone();
                merges += 1;
            }
        }
        merges
    }

    /// Run merge passes until one commits nothing. Returns the pass count.
    pub fn converge(&mut self) -> usize {
        let mut passes = 0;
        loop {
            passes += 1;
            let merges = self.merge_pass();
            log_debug!(
                self.verbosity,
                "Pass {}: {} merges, clusters {:?}",
                passes,
                merges,
                self.clusters
                    .iter()
                    .filter(|c| !c.is_empty())
                    .map(|c| c.range.clone())
                    .collect::<Vec<_>>()
            );
            if merges == 0 {
                return passes;
            }
        }
    }

    /// Place every cluster in sequence order, reconfiguring before each one.
    pub fn emit(&self) -> Result<Schedule, SchedulerError> {
        let order = self.order();
        let mut schedule = Schedule::new(self.configurations);

        for cluster in self.clusters.iter().filter(|c| !c.is_empty()) {
            let Some(config_id) = cluster.config else {
                return Err(Infeasibility::UncoveredCluster {
                    first: self.graph.task(order[cluster.range.start]).name.clone(),
                    last: self.graph.task(order[cluster.range.end - 1]).name.clone(),
                }
                .into());
            };
            let config = &self.configurations[config_id];
            let ready = schedule.insert_reconfiguration(self.rho);
            log_changes!(
                self.verbosity,
                "Reconfigure to {} for {:?} (ready at {})",
                config.name,
                cluster.range,
                ready
            );

            for &id in &order[cluster.range.clone()] {
                let task = self.graph.task(id);
                let (pe, candidate_start) =
                    schedule
                        .asap(config, task)
                        .ok_or_else(|| Infeasibility::NoFeasiblePe {
                            task: task.name.clone(),
                            config: config.name.clone(),
                        })?;
                let pred_floor = predecessor_floor(self.graph, &schedule, id)?;
                let start = candidate_start.max(pred_floor + 1).max(ready + 1);
                let placed = schedule.schedule_task(id, task, pe, start)?;
                log_changes!(
                    self.verbosity,
                    "  Scheduled task {} on {} from {} to {}",
                    placed.name,
                    placed.pe,
                    placed.start,
                    placed.finish()
                );
            }
        }

        Ok(schedule)
    }
}

/// Run the clustering heuristic with the parameters in `config`.
pub fn cluster(
    graph: &TaskGraph,
    configurations: &[Configuration],
    config: &SchedulerConfig,
) -> Result<Schedule, SchedulerError> {
    config.validate()?;
    if configurations.is_empty() && !graph.is_empty() {
        return Err(Infeasibility::NoConfigurations(graph.len()).into());
    }

    let mut clustering = Clustering::new(graph, configurations, config);
    clustering.converge();
    clustering.emit()
}
