use core::fmt;
use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use itertools::Itertools;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::{BoundError, BoundResult};
use crate::solver::SolverSettings;
use crate::step_size::StepSize;

/// A transportation problem: ship `supply[i]` from source `i` to cover
/// `demand[j]` at destination `j`, paying `costs[(i, j)]` per unit.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportationProblem {
    costs: Array2<f64>,
    supply: Array1<f64>,
    demand: Array1<f64>,
}

impl TransportationProblem {
    /// Validates the dimensions and quantities of a problem.
    ///
    /// Fails with [`BoundError::InvalidInput`] if there is no source or no
    /// destination, if the cost matrix is not `supply.len() x demand.len()`,
    /// if a supply or demand is negative or if any number is not finite.
    pub fn new(
        costs: Array2<f64>,
        supply: Array1<f64>,
        demand: Array1<f64>,
    ) -> BoundResult<Self> {
        let (m, n) = (supply.len(), demand.len());
        if m == 0 || n == 0 {
            return Err(BoundError::invalid_input(format!(
                "need at least one source and one destination, got {m} sources and {n} destinations"
            )));
        }
        if costs.dim() != (m, n) {
            return Err(BoundError::invalid_input(format!(
                "cost matrix has shape {:?}, expected ({m}, {n})",
                costs.dim()
            )));
        }
        check_quantities("supply", supply.view())?;
        check_quantities("demand", demand.view())?;
        if let Some(((i, j), c)) =
            costs.indexed_iter().find(|(_, c)| !c.is_finite())
        {
            return Err(BoundError::invalid_input(format!(
                "cost from source {i} to destination {j} is not finite: {c}"
            )));
        }
        Ok(Self {
            costs,
            supply,
            demand,
        })
    }

    /// Builds a problem from row-major nested vectors.
    pub fn from_rows(
        costs: Vec<Vec<f64>>,
        supply: Vec<f64>,
        demand: Vec<f64>,
    ) -> BoundResult<Self> {
        let n = demand.len();
        if let Some((i, row)) =
            costs.iter().enumerate().find(|(_, row)| row.len() != n)
        {
            return Err(BoundError::invalid_input(format!(
                "cost row {i} has {} entries, expected {n}",
                row.len()
            )));
        }
        let m = costs.len();
        let costs = Array2::from_shape_vec(
            (m, n),
            costs.into_iter().flatten().collect_vec(),
        )
        .map_err(|e| BoundError::invalid_input(e.to_string()))?;
        Self::new(costs, Array1::from_vec(supply), Array1::from_vec(demand))
    }

    /// Number of sources `m`.
    pub fn num_sources(&self) -> usize {
        self.supply.len()
    }

    /// Number of destinations `n`.
    pub fn num_destinations(&self) -> usize {
        self.demand.len()
    }

    /// Unit costs, `m x n`.
    pub fn costs(&self) -> ArrayView2<f64> {
        self.costs.view()
    }

    /// Supply per source.
    pub fn supply(&self) -> ArrayView1<f64> {
        self.supply.view()
    }

    /// Demand per destination.
    pub fn demand(&self) -> ArrayView1<f64> {
        self.demand.view()
    }

    /// Sum of all supplies.
    pub fn total_supply(&self) -> f64 {
        self.supply.sum()
    }

    /// Sum of all demands.
    pub fn total_demand(&self) -> f64 {
        self.demand.sum()
    }

    /// Whether all demand can be covered, i.e. the unrelaxed problem is
    /// feasible and every bound is a lower bound on its optimum.
    pub fn is_balanced_or_surplus(&self) -> bool {
        self.total_supply() >= self.total_demand()
    }
}

fn check_quantities(name: &str, values: ArrayView1<f64>) -> BoundResult<()> {
    match values
        .iter()
        .enumerate()
        .find(|(_, v)| !(v.is_finite() && **v >= 0.0))
    {
        Some((idx, v)) => Err(BoundError::invalid_input(format!(
            "{name}[{idx}] must be non-negative and finite, got {v}"
        ))),
        None => Ok(()),
    }
}

impl fmt::Display for TransportationProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} sources (total supply {}), {} destinations (total demand {})",
            self.num_sources(),
            self.total_supply(),
            self.num_destinations(),
            self.total_demand()
        )
    }
}

/// Closed-form solution of the relaxed subproblem for fixed multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaxedSolution {
    /// Destination receiving the whole supply of each source, `None` if the
    /// source ships nothing.
    pub assignment: Vec<Option<usize>>,
    /// Total amount arriving at each destination.
    pub shipped: Vec<f64>,
}

impl RelaxedSolution {
    /// Dense shipment matrix `x`.
    pub fn plan(&self, problem: &TransportationProblem) -> Array2<f64> {
        let mut plan = Array2::zeros(problem.costs().dim());
        for (i, j) in self
            .assignment
            .iter()
            .enumerate()
            .filter_map(|(i, j)| j.map(|j| (i, j)))
        {
            plan[(i, j)] = problem.supply()[i];
        }
        plan
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    /// The iteration budget was used up.
    BudgetExhausted,
    /// The subgradient norm dropped below the tolerance.
    Converged,
    /// A bound or multiplier stopped being finite.
    NumericInstability,
    /// The cancellation flag was set.
    Cancelled,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Termination::BudgetExhausted => "budget-exhausted",
            Termination::Converged => "converged",
            Termination::NumericInstability => "numeric-instability",
            Termination::Cancelled => "cancelled",
        };
        reason.fmt(f)
    }
}

/// Outcome of one optimizer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundReport {
    /// Largest bound in the trajectory, `None` if no iteration produced a
    /// finite bound.
    pub best_bound: Option<f64>,
    /// Iteration at which `best_bound` was reached.
    pub best_iteration: Option<usize>,
    /// Multipliers after the last finite update.
    pub multipliers: Vec<f64>,
    /// Relaxed objective value of every evaluated iteration, in order.
    pub trajectory: Vec<f64>,
    /// Number of multiplier updates performed.
    pub iterations: usize,
    /// Why the run stopped.
    pub termination: Termination,
    /// Euclidean norm of the subgradient at the last evaluated iteration,
    /// `None` if no iteration was evaluated or the norm is not finite.
    pub subgradient_norm: Option<f64>,
    /// Relaxed subproblem solution of the last evaluated iteration.
    pub relaxed_plan: RelaxedSolution,
}

impl BoundReport {
    /// Running maximum of the trajectory.
    pub fn best_so_far(&self) -> Vec<f64> {
        self.trajectory
            .iter()
            .scan(f64::NEG_INFINITY, |best, &bound| {
                *best = best.max(bound);
                Some(*best)
            })
            .collect()
    }
}

impl fmt::Display for BoundReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.best_bound, self.best_iteration) {
            (Some(bound), Some(iteration)) => {
                writeln!(f, "Best lower bound: {bound:.4}")?;
                writeln!(f, "Found at iteration: {iteration}")?;
            }
            _ => writeln!(f, "Best lower bound: none")?,
        }
        writeln!(
            f,
            "Stopped after {} updates: {}",
            self.iterations, self.termination
        )?;
        if let Some(norm) = self.subgradient_norm {
            writeln!(f, "Subgradient norm: {norm:.4}")?;
        }
        writeln!(
            f,
            "Multipliers: [{}]",
            self.multipliers.iter().map(|l| format!("{l:.4}")).join(", ")
        )
    }
}

/// Resolved configuration of the `bound_solver` executable.
pub static CONFIG: OnceCell<Config> = OnceCell::new();

/// Configuration of the `bound_solver` executable, read from json and
/// overridden from the command line.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Config {
    /// JSON problem file or directory with `costs.csv`, `supply.csv` and
    /// `demand.csv`.
    pub problem: PathBuf,
    /// Optimizer settings, defaults for missing fields.
    #[serde(default)]
    pub settings: SolverSettings,
    /// Directory receiving `report.json` and `trajectory.csv`.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("out")
}

impl Config {
    /// Reads the json config given on the command line, or starts from
    /// defaults if only a problem is given, and applies the overrides.
    pub fn from_cli(args: &Args) -> Result<Config> {
        let mut config = match (&args.config, &args.problem) {
            (Some(config_path), _) => {
                let config_str = fs::read_to_string(config_path)
                    .with_context(|| {
                        format!("Failed to read config {config_path:?}")
                    })?;
                serde_json::from_str(&config_str)?
            }
            (None, Some(problem)) => Config {
                problem: problem.to_path_buf(),
                settings: SolverSettings::default(),
                out_dir: default_out_dir(),
            },
            (None, None) => {
                anyhow::bail!("Neither a config file nor a problem was provided")
            }
        };
        if let Some(problem) = &args.problem {
            config.problem = problem.to_path_buf();
        }
        if let Some(budget) = args.budget {
            config.settings.iteration_budget = budget;
        }
        if let Some(tolerance) = args.tolerance {
            config.settings.tolerance = tolerance;
        }
        if let Some(step_size) = &args.step_size {
            config.settings.step_size = step_size.clone();
        }
        if let Some(log_interval) = args.log_interval {
            config.settings.log_interval = log_interval;
        }
        if let Some(out_dir) = &args.out_dir {
            config.out_dir = out_dir.to_path_buf();
        }
        Ok(config)
    }

    /// The config stored in [`CONFIG`].
    pub fn global() -> &'static Config {
        CONFIG.get().expect("Config is not initialized")
    }
}

/// Command line arguments of the `bound_solver` executable.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Path to the json config
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// JSON problem file or directory with costs.csv, supply.csv and demand.csv
    #[arg(short, long, value_name = "PATH")]
    pub problem: Option<PathBuf>,
    /// Maximum number of multiplier updates
    #[arg(short, long)]
    pub budget: Option<usize>,
    /// Stop once the subgradient norm falls below this value
    #[arg(short, long)]
    pub tolerance: Option<f64>,
    /// Step size schedule, e.g. harmonic:1, inverse-sqrt:2, constant:0.1
    #[arg(short, long, value_parser)]
    pub step_size: Option<StepSize>,
    /// Log progress every n iterations (0 disables)
    #[arg(short, long)]
    pub log_interval: Option<usize>,
    /// Path to the output directory
    #[arg(short, long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
    /// Log level
    #[command(flatten)]
    pub verbosity: Verbosity,
}
