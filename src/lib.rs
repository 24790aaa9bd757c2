#![warn(missing_docs)]
//! Lower bounds for transportation problems by Lagrangian relaxation.
//!
//! The transportation problem ships goods from sources with limited supply to
//! destinations with fixed demand at minimum cost. Moving the demand
//! equalities into the objective with one free multiplier per destination
//! splits the problem into independent per-source subproblems with a
//! closed-form solution: every source sends its whole supply to its cheapest
//! destination if the multiplier-adjusted cost is not positive. The value of
//! this relaxation is a lower bound on the optimal shipping cost, and a
//! subgradient method on the multipliers tightens it iteration by iteration.
//!
//! Besides the optimizer the crate contains helpers to read problems from json
//! or csv files, simple feasible plans that give upper bounds and a way to
//! compare step size schedules on the same instance.
//!
//! This project also contains 3 executables: `bound_solver` runs the optimizer
//! on a single instance, `schedule_explorer` compares step size schedules and
//! `instance_generator` writes random instances.
//!
//! Example
//! ```rust
//! use subgradient_bound::datastructures::{Termination, TransportationProblem};
//! use subgradient_bound::solver::{SolverSettings, SubgradientOptimizer};
//! use subgradient_bound::step_size::StepSize;
//! # use anyhow::Result;
//!
//! fn example() -> Result<()> {
//!     let problem = TransportationProblem::from_rows(
//!         vec![vec![4.0, 6.0], vec![5.0, 3.0]], // cost per unit, source x destination
//!         vec![10.0, 15.0],                     // supply
//!         vec![12.0, 13.0],                     // demand
//!     )?;
//!     let settings = SolverSettings {
//!         iteration_budget: 100,
//!         step_size: StepSize::Harmonic { initial: 1.0 }, // 1/k
//!         ..SolverSettings::default()
//!     };
//!
//!     let report = SubgradientOptimizer::new(&problem, settings)?.solve();
//!     let bound = report.best_bound.expect("the first bound is finite");
//!     assert!((bound - 89.0).abs() < 1e-2);
//!     assert_eq!(report.termination, Termination::BudgetExhausted);
//!
//!     // datastructures::BoundReport implements serde::Serialize
//!     println!("{}", serde_json::to_string(&report)?);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

/// Data structures shared by the optimizer, the parsers and the executables.
pub mod datastructures;

/// Errors raised while validating problems and solver settings.
pub mod error;

/// Helpers to read problems and write reports and trajectories.
pub mod instance_parser;

/// Feasible shipment plans used as upper bounds.
pub mod primal;

/// Independent runs of several step size schedules on one problem.
pub mod schedule_explorer;

/// The subgradient optimizer for the Lagrangian dual.
pub mod solver;

/// Step size schedules for the multiplier update.
pub mod step_size;

#[cfg(test)]
mod test_utils;
