use anyhow::Result;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use log::info;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use subgradient_bound::{
    instance_parser, schedule_explorer, solver::SolverSettings,
    step_size::StepSize,
};

#[derive(Serialize, Deserialize)]
struct ExplorerConfig {
    problem: PathBuf,
    #[serde(default)]
    settings: SolverSettings,
    schedules: Vec<StepSize>,
    #[serde(default)]
    parallel: bool,
    out: PathBuf,
}

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to the json config
    #[arg(short, long)]
    pub config: PathBuf,
    /// Run the schedules one after another
    #[arg(short, long)]
    pub sequential: bool,
    #[command(flatten)]
    pub verbosity: Verbosity,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();
    let config: ExplorerConfig =
        serde_json::from_str(&fs::read_to_string(&args.config)?)?;
    let problem = instance_parser::parse_problem(&config.problem)?;
    let runs = schedule_explorer::explore(
        &problem,
        &config.settings,
        &config.schedules,
        config.parallel && !args.sequential,
    )?;
    for run in &runs {
        match run.report.best_bound {
            Some(bound) => info!(
                "{}: best bound {bound:.4} after {} updates ({})",
                run.schedule, run.report.iterations, run.report.termination
            ),
            None => info!(
                "{}: no finite bound ({})",
                run.schedule, run.report.termination
            ),
        }
    }
    if let Some(best) = schedule_explorer::best_run(&runs) {
        info!("Best schedule: {}", best.schedule);
    }
    if let Some(parent) = config.out.parent() {
        fs::create_dir_all(parent)?;
    }
    instance_parser::write_dataframe_csv(
        &mut instance_parser::explorer_dataframe(&runs)?,
        &config.out,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use subgradient_bound::{instance_parser, schedule_explorer, step_size::StepSize};

    use crate::ExplorerConfig;

    #[test]
    fn test_example_config() {
        let config: ExplorerConfig = serde_json::from_str(
            &fs::read_to_string("data/test/explorer_config.json").unwrap(),
        )
        .unwrap();
        assert_eq!(config.settings.iteration_budget, 500);
        assert_eq!(config.settings.log_interval, 0);
        assert_eq!(config.settings.tolerance, 1e-5);
        assert_eq!(
            config.schedules,
            vec![
                StepSize::Harmonic { initial: 1.0 },
                StepSize::InverseSqrt { initial: 0.5 },
                StepSize::Constant { value: 0.01 },
            ]
        );
        assert!(config.parallel);

        let problem = instance_parser::parse_problem(&config.problem).unwrap();
        let runs = schedule_explorer::explore(
            &problem,
            &config.settings,
            &config.schedules,
            config.parallel,
        )
        .unwrap();
        assert_eq!(runs.len(), 3);
        for run in &runs {
            assert!(run.report.best_bound.unwrap() <= 26300.0 + 1e-6);
        }
    }
}
