use std::thread;

use itertools::Itertools;
use log::info;
use serde::Serialize;

use crate::datastructures::{BoundReport, TransportationProblem};
use crate::error::BoundResult;
use crate::solver::{SolverSettings, SubgradientOptimizer};
use crate::step_size::StepSize;

/// Result of running the optimizer with one step size schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRun {
    /// Schedule this run used.
    pub schedule: StepSize,
    /// Outcome of the run.
    pub report: BoundReport,
}

/// Runs the optimizer once per schedule, all other settings shared.
///
/// Every schedule is validated before the first run starts. With `parallel`
/// each run gets its own scoped thread; runs share nothing but the problem,
/// so the results equal the sequential ones.
pub fn explore(
    problem: &TransportationProblem,
    settings: &SolverSettings,
    schedules: &[StepSize],
    parallel: bool,
) -> BoundResult<Vec<ScheduleRun>> {
    let optimizers = schedules
        .iter()
        .map(|schedule| {
            SubgradientOptimizer::new(
                problem,
                SolverSettings {
                    step_size: schedule.clone(),
                    ..settings.clone()
                },
            )
        })
        .collect::<BoundResult<Vec<_>>>()?;
    info!(
        "Exploring {} step size schedules ({})",
        optimizers.len(),
        if parallel { "parallel" } else { "sequential" }
    );
    let reports = if parallel {
        thread::scope(|s| {
            let handles = optimizers
                .iter()
                .map(|optimizer| s.spawn(move || optimizer.solve()))
                .collect_vec();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(report) => report,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect_vec()
        })
    } else {
        optimizers.iter().map(|optimizer| optimizer.solve()).collect_vec()
    };
    Ok(schedules
        .iter()
        .cloned()
        .zip(reports)
        .map(|(schedule, report)| ScheduleRun { schedule, report })
        .collect())
}

/// Run with the highest bound, the earliest one on ties. Runs without a
/// finite bound only win if no run has one.
pub fn best_run(runs: &[ScheduleRun]) -> Option<&ScheduleRun> {
    let bound = |run: &ScheduleRun| run.report.best_bound.unwrap_or(f64::NEG_INFINITY);
    runs.iter().fold(None, |best: Option<&ScheduleRun>, run| match best {
        Some(best) if bound(best) >= bound(run) => Some(best),
        _ => Some(run),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_invalid_schedule_fails_before_running() {
        let problem = reference_problem();
        let schedules = [
            StepSize::Harmonic { initial: 1.0 },
            StepSize::Constant { value: -0.5 },
        ];
        assert!(explore(&problem, &default_settings(), &schedules, true).is_err());
    }

    #[test]
    fn test_best_run() {
        let problem = reference_problem();
        let schedules = [
            StepSize::Constant { value: 0.01 },
            StepSize::Harmonic { initial: 1.0 },
        ];
        let runs =
            explore(&problem, &default_settings(), &schedules, false).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(
            best_run(&runs).unwrap().schedule,
            StepSize::Harmonic { initial: 1.0 }
        );
        assert!(best_run(&[]).is_none());
    }
}
