use std::{fs, path::Path};

use anyhow::{Context, Result};
use itertools::Itertools;
use log::debug;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::datastructures::{BoundReport, TransportationProblem};
use crate::schedule_explorer::ScheduleRun;

/// On-disk form of a [`TransportationProblem`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProblemFile {
    /// Unit costs, one row per source.
    pub costs: Vec<Vec<f64>>,
    /// Supply per source.
    pub supply: Vec<f64>,
    /// Demand per destination.
    pub demand: Vec<f64>,
}

impl From<&TransportationProblem> for ProblemFile {
    fn from(problem: &TransportationProblem) -> Self {
        Self {
            costs: problem
                .costs()
                .outer_iter()
                .map(|row| row.to_vec())
                .collect_vec(),
            supply: problem.supply().to_vec(),
            demand: problem.demand().to_vec(),
        }
    }
}

impl TryFrom<ProblemFile> for TransportationProblem {
    type Error = crate::error::BoundError;

    fn try_from(file: ProblemFile) -> Result<Self, Self::Error> {
        TransportationProblem::from_rows(file.costs, file.supply, file.demand)
    }
}

/// Reads a problem from a `.json` file or from a directory holding
/// `costs.csv`, `supply.csv` and `demand.csv`.
pub fn parse_problem(path: &Path) -> Result<TransportationProblem> {
    if path.is_dir() {
        parse_problem_csvs(
            &path.join("costs.csv"),
            &path.join("supply.csv"),
            &path.join("demand.csv"),
        )
    } else {
        parse_problem_json(path)
    }
}

/// Reads a [`ProblemFile`] json.
pub fn parse_problem_json(path: &Path) -> Result<TransportationProblem> {
    let problem_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read problem file {path:?}"))?;
    let file: ProblemFile = serde_json::from_str(&problem_str)
        .with_context(|| format!("Malformed problem file {path:?}"))?;
    Ok(TransportationProblem::try_from(file)?)
}

/// Reads a problem from separate cost matrix, supply and demand csv files.
pub fn parse_problem_csvs(
    costs: &Path,
    supply: &Path,
    demand: &Path,
) -> Result<TransportationProblem> {
    let costs = parse_cost_matrix_csv(costs)?;
    let supply = parse_vector_csv(supply)?;
    let demand = parse_vector_csv(demand)?;
    debug!(
        "Read {}x{} cost matrix, {} supplies, {} demands",
        costs.nrows(),
        costs.ncols(),
        supply.len(),
        demand.len()
    );
    Ok(TransportationProblem::new(costs, supply, demand)?)
}

/// Headerless csv, one row per source and one column per destination.
pub fn parse_cost_matrix_csv(path: &Path) -> Result<Array2<f64>> {
    let df = CsvReader::from_path(path)
        .with_context(|| format!("Failed to open cost matrix {path:?}"))?
        .with_comment_char(Some(b'#'))
        .has_header(false)
        .finish()?;
    let columns = df
        .get_columns()
        .iter()
        .map(|column| column_to_f64_vec(column, path))
        .collect::<Result<Vec<Vec<f64>>>>()?;
    Ok(Array2::from_shape_fn((df.height(), columns.len()), |(i, j)| {
        columns[j][i]
    }))
}

/// Csv with a header and a single numeric column.
pub fn parse_vector_csv(path: &Path) -> Result<Array1<f64>> {
    let df = CsvReader::from_path(path)
        .with_context(|| format!("Failed to open {path:?}"))?
        .with_comment_char(Some(b'#'))
        .has_header(true)
        .finish()?;
    let column = df
        .get_columns()
        .first()
        .with_context(|| format!("{path:?} has no columns"))?;
    Ok(Array1::from_vec(column_to_f64_vec(column, path)?))
}

fn column_to_f64_vec(column: &Series, path: &Path) -> Result<Vec<f64>> {
    column
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.with_context(|| {
                format!(
                    "Missing value in row {row} of column {} in {path:?}",
                    column.name()
                )
            })
        })
        .collect()
}

/// Writes `problem` as a pretty-printed [`ProblemFile`].
pub fn write_problem_json(
    problem: &TransportationProblem,
    path: &Path,
) -> Result<()> {
    serde_json::to_writer_pretty(
        fs::File::create(path)?,
        &ProblemFile::from(problem),
    )?;
    Ok(())
}

/// Writes `report` as pretty-printed json.
pub fn write_report_json(report: &BoundReport, path: &Path) -> Result<()> {
    serde_json::to_writer_pretty(fs::File::create(path)?, report)?;
    Ok(())
}

/// One row per iteration: `iteration`, `bound`, `best_bound`.
pub fn trajectory_dataframe(report: &BoundReport) -> Result<DataFrame> {
    Ok(df! {
        "iteration" => (0..report.trajectory.len() as u64).collect_vec(),
        "bound" => report.trajectory.clone(),
        "best_bound" => report.best_so_far(),
    }?)
}

/// Trajectories of several runs, tagged with their `schedule`.
pub fn explorer_dataframe(runs: &[ScheduleRun]) -> Result<DataFrame> {
    let frames = runs
        .iter()
        .map(|run| -> Result<DataFrame> {
            let mut df = trajectory_dataframe(&run.report)?;
            let schedule = Series::new(
                "schedule",
                vec![run.schedule.to_string(); df.height()],
            );
            df.insert_at_idx(0, schedule)?;
            Ok(df)
        })
        .collect::<Result<Vec<DataFrame>>>()?;
    let mut frames = frames.into_iter();
    let Some(mut combined) = frames.next() else {
        anyhow::bail!("No schedule runs to combine");
    };
    for df in frames {
        combined.vstack_mut(&df)?;
    }
    Ok(combined)
}

/// Writes `df` as csv with a header row.
pub fn write_dataframe_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = fs::File::create(path)?;
    CsvWriter::new(&mut file).finish(df)?;
    Ok(())
}

/// Writes [`trajectory_dataframe`] of `report` to `path`.
pub fn write_trajectory_csv(report: &BoundReport, path: &Path) -> Result<()> {
    write_dataframe_csv(&mut trajectory_dataframe(report)?, path)
}
