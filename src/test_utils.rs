use crate::datastructures::TransportationProblem;
use crate::solver::SolverSettings;
use crate::step_size::StepSize;

/// Two sources, two destinations, optimal cost 89.
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
