use subgradient_bound::{
    datastructures::Termination, primal, solver::SubgradientOptimizer,
};
mod common;
use common::*;

#[test]
fn test_reference_instance() {
    let problem = reference_problem();
    let report = SubgradientOptimizer::new(&problem, default_settings())
        .unwrap()
        .solve();
    let optimum = exact_two_source_optimum(&problem).unwrap();
    assert_eq!(optimum, 89.0);
    assert_eq!(primal::best_feasible_plan(&problem).unwrap().cost, optimum);
    assert!((report.best_bound.unwrap() - optimum).abs() < 1e-2);
    assert!(matches!(
        report.termination,
        Termination::BudgetExhausted | Termination::Converged
    ));
    assert!(report
        .trajectory
        .iter()
        .all(|bound| *bound <= optimum + 1e-9));
}

#[test]
fn test_zero_budget_single_entry() {
    let problem = reference_problem();
    let settings = subgradient_bound::solver::SolverSettings {
        iteration_budget: 0,
        ..default_settings()
    };
    let report = SubgradientOptimizer::new(&problem, settings)
        .unwrap()
        .solve();
    assert_eq!(report.trajectory.len(), 1);
    assert_eq!(report.termination, Termination::BudgetExhausted);
}
