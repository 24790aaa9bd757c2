#![allow(dead_code)]

use itertools::Itertools;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use subgradient_bound::{
    datastructures::TransportationProblem, solver::SolverSettings,
    step_size::StepSize,
};

pub fn reference_problem() -> TransportationProblem {
    TransportationProblem::from_rows(
        vec![vec![4.0, 6.0], vec![5.0, 3.0]],
        vec![10.0, 15.0],
        vec![12.0, 13.0],
    )
    .unwrap()
}

pub fn default_settings() -> SolverSettings {
    SolverSettings {
        iteration_budget: 100,
        step_size: StepSize::Harmonic { initial: 1.0 },
        tolerance: 1e-6,
        initial_multipliers: None,
        log_interval: 0,
    }
}

/// Random integral instance with at least as much supply as demand.
pub fn random_problem(
    seed: u64,
    num_sources: usize,
    num_destinations: usize,
) -> TransportationProblem {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let costs: Vec<Vec<f64>> = (0..num_sources)
        .map(|_| {
            (0..num_destinations)
                .map(|_| rng.gen_range(1..=20) as f64)
                .collect()
        })
        .collect();
    let supply: Vec<f64> =
        (0..num_sources).map(|_| rng.gen_range(5..=30) as f64).collect();
    let total_supply: f64 = supply.iter().sum();
    let demand: Vec<f64> = (0..num_destinations)
        .map(|_| (total_supply / num_destinations as f64 * 0.9).floor())
        .collect();
    TransportationProblem::from_rows(costs, supply, demand).unwrap()
}

/// Optimal cost of an integral two-source instance, `None` if it is
/// infeasible.
///
/// Enumerates every integral split of the demand between the two sources.
/// Transportation problems with integral data have an integral optimum, so
/// this is the optimum of the linear program.
pub fn exact_two_source_optimum(problem: &TransportationProblem) -> Option<f64> {
    assert_eq!(problem.num_sources(), 2);
    let (costs, supply, demand) =
        (problem.costs(), problem.supply(), problem.demand());
    demand
        .iter()
        .map(|&d| 0..=d as usize)
        .multi_cartesian_product()
        .filter_map(|first| {
            let first = first.into_iter().map(|x| x as f64).collect_vec();
            let shipped_first: f64 = first.iter().sum();
            let shipped_second: f64 = demand.sum() - shipped_first;
            if shipped_first > supply[0] || shipped_second > supply[1] {
                return None;
            }
            Some(
                first
                    .iter()
                    .zip(demand.iter())
                    .enumerate()
                    .map(|(j, (x, d))| costs[(0, j)] * x + costs[(1, j)] * (d - x))
                    .sum::<f64>(),
            )
        })
        .reduce(f64::min)
}
