use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::datastructures::{
    BoundReport, RelaxedSolution, Termination, TransportationProblem,
};
use crate::error::{BoundError, BoundResult};
use crate::step_size::StepSize;

/// Parameters of one optimizer run. Missing json fields take their default.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SolverSettings {
    /// Maximum number of multiplier updates. Zero evaluates the initial
    /// multipliers only.
    pub iteration_budget: usize,
    /// Step size schedule, `1/k` by default.
    pub step_size: StepSize,
    /// Converged once the subgradient norm drops below this value.
    pub tolerance: f64,
    /// Starting multipliers, zero if absent.
    pub initial_multipliers: Option<Vec<f64>>,
    /// Log progress every `log_interval` iterations, 0 disables.
    pub log_interval: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            iteration_budget: 1000,
            step_size: StepSize::default(),
            tolerance: 1e-5,
            initial_multipliers: None,
            log_interval: 100,
        }
    }
}

/// Lagrangian bound for a transportation problem whose demand equalities are
/// moved into the objective.
///
/// The optimizer borrows the problem and keeps no state between runs, so a
/// single instance can be solved from several threads at once.
#[derive(Debug, Clone)]
pub struct SubgradientOptimizer<'a> {
    problem: &'a TransportationProblem,
    settings: SolverSettings,
    initial_multipliers: Array1<f64>,
}

impl<'a> SubgradientOptimizer<'a> {
    /// Validates `settings` against `problem`. No iteration runs if this
    /// fails.
    pub fn new(
        problem: &'a TransportationProblem,
        settings: SolverSettings,
    ) -> BoundResult<Self> {
        settings.step_size.validate(settings.iteration_budget)?;
        if !(settings.tolerance.is_finite() && settings.tolerance >= 0.0) {
            return Err(BoundError::invalid_input(format!(
                "tolerance must be non-negative and finite, got {}",
                settings.tolerance
            )));
        }
        let n = problem.num_destinations();
        let initial_multipliers = match &settings.initial_multipliers {
            Some(multipliers) if multipliers.len() != n => {
                return Err(BoundError::invalid_input(format!(
                    "got {} initial multipliers for {n} destinations",
                    multipliers.len()
                )))
            }
            Some(multipliers) if multipliers.iter().any(|l| !l.is_finite()) => {
                return Err(BoundError::invalid_input(
                    "initial multipliers must be finite",
                ))
            }
            Some(multipliers) => Array1::from_vec(multipliers.clone()),
            None => Array1::zeros(n),
        };
        Ok(Self {
            problem,
            settings,
            initial_multipliers,
        })
    }

    /// The problem this optimizer bounds.
    pub fn problem(&self) -> &TransportationProblem {
        self.problem
    }

    /// Settings of this optimizer.
    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Runs until the budget is used up, the subgradient vanishes or the
    /// numbers stop being finite.
    pub fn solve(&self) -> BoundReport {
        self.solve_until(|| false)
    }

    /// Like [`solve`](Self::solve), but stops with
    /// [`Termination::Cancelled`] once `cancel` is set. The flag is only
    /// read between iterations.
    pub fn solve_with_cancellation(&self, cancel: &AtomicBool) -> BoundReport {
        self.solve_until(|| cancel.load(Ordering::Relaxed))
    }

    fn solve_until<F: Fn() -> bool>(&self, cancelled: F) -> BoundReport {
        let problem = self.problem;
        let SolverSettings {
            iteration_budget,
            step_size,
            tolerance,
            log_interval,
            ..
        } = &self.settings;
        let mut multipliers = self.initial_multipliers.clone();
        let mut trajectory = Vec::with_capacity(iteration_budget.saturating_add(1).min(1 << 16));
        let mut best_bound = f64::NEG_INFINITY;
        let mut best_iteration = None;
        let mut subgradient_norm = None;
        let mut relaxed_plan = RelaxedSolution {
            assignment: vec![None; problem.num_sources()],
            shipped: vec![0.0; problem.num_destinations()],
        };
        let mut iteration = 0;

        let termination = loop {
            let solution = relaxed_subproblem(problem, multipliers.view());
            let bound = lagrangian_value(problem, multipliers.view(), &solution);
            if !bound.is_finite() {
                warn!("Bound at iteration {iteration} is not finite ({bound}), stopping");
                break Termination::NumericInstability;
            }
            trajectory.push(bound);
            if bound > best_bound {
                best_bound = bound;
                best_iteration = Some(iteration);
            }
            let direction = subgradient(problem, &solution);
            let norm = euclidean_norm(direction.view());
            subgradient_norm = Some(norm).filter(|n| n.is_finite());
            relaxed_plan = solution;

            debug!("Iteration {iteration}: bound = {bound}, subgradient norm = {norm}");
            if *log_interval > 0 && iteration % log_interval == 0 {
                info!(
                    "Iteration {iteration}: Lower Bound = {bound:.4}, Subgradient Norm = {norm:.4}"
                );
            }

            if iteration == *iteration_budget {
                break Termination::BudgetExhausted;
            }
            if norm < *tolerance {
                info!("Converged after {iteration} iterations");
                break Termination::Converged;
            }
            if cancelled() {
                info!("Cancelled after {iteration} iterations");
                break Termination::Cancelled;
            }

            let Some(alpha) = step_size.at(iteration + 1) else {
                warn!("Step size schedule has no entry for update {}", iteration + 1);
                break Termination::BudgetExhausted;
            };
            let mut next = multipliers.clone();
            next.scaled_add(alpha, &direction);
            if next.iter().any(|l| !l.is_finite()) {
                warn!("Multiplier update after iteration {iteration} is not finite, stopping");
                break Termination::NumericInstability;
            }
            multipliers = next;
            iteration += 1;
        };

        BoundReport {
            best_bound: best_iteration.map(|_| best_bound),
            best_iteration,
            multipliers: multipliers.to_vec(),
            trajectory,
            iterations: iteration,
            termination,
            subgradient_norm,
            relaxed_plan,
        }
    }
}

/// Solves the relaxed problem for fixed multipliers.
///
/// Each source sends its whole supply to the destination with the lowest
/// effective cost `c[i][j] + λ[j]` (lowest index on ties) if that cost is not
/// positive, and nothing otherwise.
pub fn relaxed_subproblem(
    problem: &TransportationProblem,
    multipliers: ArrayView1<f64>,
) -> RelaxedSolution {
    let mut shipped = vec![0.0; problem.num_destinations()];
    let assignment = problem
        .costs()
        .outer_iter()
        .zip(problem.supply().iter())
        .map(|(row, &supply)| {
            let (destination, effective_cost) = row
                .iter()
                .zip(multipliers.iter())
                .map(|(cost, lambda)| cost + lambda)
                .enumerate()
                .fold((0, f64::INFINITY), |best, (j, effective)| {
                    if effective < best.1 {
                        (j, effective)
                    } else {
                        best
                    }
                });
            if effective_cost <= 0.0 {
                shipped[destination] += supply;
                Some(destination)
            } else {
                None
            }
        })
        .collect();
    RelaxedSolution {
        assignment,
        shipped,
    }
}

/// Value of the Lagrangian `Σ c·x + Σ_j λ[j]·(Σ_i x[i][j] − d[j])`.
pub fn lagrangian_value(
    problem: &TransportationProblem,
    multipliers: ArrayView1<f64>,
    solution: &RelaxedSolution,
) -> f64 {
    let costs = problem.costs();
    let supply = problem.supply();
    let shipping_cost: f64 = solution
        .assignment
        .iter()
        .enumerate()
        .filter_map(|(i, j)| j.map(|j| costs[(i, j)] * supply[i]))
        .sum();
    let penalty: f64 = multipliers
        .iter()
        .zip(subgradient(problem, solution).iter())
        .map(|(lambda, violation)| lambda * violation)
        .sum();
    shipping_cost + penalty
}

/// Euclidean norm, scaled by the largest entry so that squaring cannot
/// overflow.
pub fn euclidean_norm(values: ArrayView1<f64>) -> f64 {
    let scale = values.iter().fold(0.0_f64, |max, v| max.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }
    scale
        * values
            .iter()
            .map(|v| (v / scale) * (v / scale))
            .sum::<f64>()
            .sqrt()
}

/// Demand constraint violation `Σ_i x[i][j] − d[j]` per destination.
pub fn subgradient(
    problem: &TransportationProblem,
    solution: &RelaxedSolution,
) -> Array1<f64> {
    Array1::from_vec(solution.shipped.clone()) - &problem.demand()
}
