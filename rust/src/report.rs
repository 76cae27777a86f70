//! Running an algorithm on a problem and rendering the outcome.

use std::fmt;
use std::time::{Duration, Instant};

use crate::config::SchedulerConfig;
use crate::import::Problem;
use crate::models::Time;
use crate::scheduler::{cluster, lsl, Schedule, SchedulerError};

/// Scheduling heuristic to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Lsl,
    Cluster,
}

impl Algorithm {
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Lsl => "lsl",
            Algorithm::Cluster => "cluster",
        }
    }
}

impl std::str::FromStr for Algorithm {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lsl" => Ok(Algorithm::Lsl),
            "cluster" | "clustering" => Ok(Algorithm::Cluster),
            other => Err(SchedulerError::InvalidConfig(format!(
                "Unknown algorithm: {}. Use 'lsl' or 'cluster'",
                other
            ))),
        }
    }
}

/// A finished run: the schedule plus what produced it.
#[derive(Clone, Debug)]
pub struct Run {
    pub algorithm: Algorithm,
    pub config: SchedulerConfig,
    pub schedule: Schedule,
    pub elapsed: Duration,
}

/// Run `algorithm` on `problem`, timing the call.
pub fn run(
    algorithm: Algorithm,
    problem: &Problem,
    config: &SchedulerConfig,
) -> Result<Run, SchedulerError> {
    let started = Instant::now();
    let schedule = match algorithm {
        Algorithm::Lsl => lsl(&problem.graph, &problem.configurations, config)?,
        Algorithm::Cluster => cluster(&problem.graph, &problem.configurations, config)?,
    };
    Ok(Run {
        algorithm,
        config: config.clone(),
        schedule,
        elapsed: started.elapsed(),
    })
}

impl Run {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            algorithm: self.algorithm,
            rho: self.config.rho,
            tasks: self.schedule.len(),
            makespan: self.schedule.makespan(),
            elapsed_us: self.elapsed.as_micros(),
            reconfigs: self.schedule.reconfigs().len(),
            lookahead: self.config.lookahead,
        }
    }

    pub fn timeline(&self) -> Timeline<'_> {
        Timeline {
            schedule: &self.schedule,
            rho: self.config.rho,
        }
    }
}

/// One CSV line per run.
///
/// `lsl,<rho>,<tasks>,<makespan>,<elapsed_us>,<reconfigs>,<lookahead>` for LSL,
/// `cluster,<rho>,<tasks>,<makespan>,<elapsed_us>,<reconfigs>` for clustering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub algorithm: Algorithm,
    pub rho: Time,
    pub tasks: usize,
    pub makespan: Time,
    pub elapsed_us: u128,
    pub reconfigs: usize,
    pub lookahead: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{}",
            self.algorithm.name(),
            self.rho,
            self.tasks,
            self.makespan,
            self.elapsed_us,
            self.reconfigs
        )?;
        if self.algorithm == Algorithm::Lsl {
            write!(f, ",{}", self.lookahead)?;
        }
        Ok(())
    }
}

/// Plain-text timeline: one block per PE, then the reconfiguration windows.
pub struct Timeline<'a> {
    schedule: &'a Schedule,
    rho: Time,
}

impl fmt::Display for Timeline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &pe in self.schedule.pes() {
            writeln!(f, "{}:", pe)?;
            for entry in self.schedule.tasks_on_pe(pe) {
                writeln!(f, "  [{}-{}] {}", entry.start, entry.finish(), entry.name)?;
            }
        }
        if !self.schedule.reconfigs().is_empty() {
            writeln!(f, "reconfigurations:")?;
            for &at in self.schedule.reconfigs() {
                writeln!(f, "  [{}-{}] reconfiguration", at, at + self.rho)?;
            }
        }
        writeln!(f, "makespan: {}", self.schedule.makespan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TaskGraph;
    use crate::models::{Configuration, Pe, Task};

    fn problem() -> Problem {
        let graph = TaskGraph::from_named_edges(
            vec![
                Task::new("A", &[Some(2), None]).unwrap(),
                Task::new("B", &[None, Some(3)]).unwrap(),
            ],
            &[("A", "B")],
        )
        .unwrap();
        Problem::new(
            graph,
            vec![
                Configuration::new("left", vec![Pe(0)]),
                Configuration::new("right", vec![Pe(1)]),
            ],
        )
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("LSL".parse::<Algorithm>().unwrap(), Algorithm::Lsl);
        assert_eq!("cluster".parse::<Algorithm>().unwrap(), Algorithm::Cluster);
        assert!("genetic".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_summary_line_shapes() {
        let config = SchedulerConfig::default();
        let problem = problem();

        let lsl_run = run(Algorithm::Lsl, &problem, &config).unwrap();
        let summary = lsl_run.summary();
        assert_eq!(summary.tasks, 2);
        assert_eq!(summary.makespan, lsl_run.schedule.makespan());
        let line = summary.to_string();
        assert!(line.starts_with("lsl,2,2,"));
        assert_eq!(line.split(',').count(), 7);
        assert!(line.ends_with(",3"));

        let cluster_run = run(Algorithm::Cluster, &problem, &config).unwrap();
        let line = cluster_run.summary().to_string();
        assert!(line.starts_with("cluster,2,2,"));
        assert_eq!(line.split(',').count(), 6);
    }

    #[test]
    fn test_timeline_lists_pes_and_reconfigurations() {
        let mut schedule = Schedule::new(&problem().configurations);
        let graph = problem().graph;
        schedule.schedule_task(0, graph.task(0), Pe(0), 1).unwrap();
        let ready = schedule.insert_reconfiguration(2);
        schedule.schedule_task(1, graph.task(1), Pe(1), ready + 1).unwrap();

        let text = Timeline {
            schedule: &schedule,
            rho: 2,
        }
        .to_string();
        assert_eq!(
            text,
            "PE0:\n  [1-3] A\nPE1:\n  [6-9] B\nreconfigurations:\n  [3-5] reconfiguration\nmakespan: 9\n"
        );
    }

    #[test]
    fn test_run_propagates_infeasibility() {
        let problem = Problem::new(problem().graph, vec![]);
        let err = run(Algorithm::Lsl, &problem, &SchedulerConfig::default()).unwrap_err();
        assert!(err.is_infeasible());
    }
}
