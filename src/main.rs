use anyhow::Result;
use clap::Parser;
use log::{error, info, warn};
use std::fs;

use subgradient_bound::datastructures::*;
use subgradient_bound::instance_parser;
use subgradient_bound::primal;
use subgradient_bound::solver::SubgradientOptimizer;

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();
    let config = {
        let config = match Config::from_cli(&args) {
            Ok(config) => config,
            Err(err) => {
                error!("{err:#}");
                std::process::exit(exitcode::CONFIG);
            }
        };
        CONFIG.set(config).ok();
        Config::global()
    };
    let problem = match instance_parser::parse_problem(&config.problem) {
        Ok(problem) => problem,
        Err(err) => {
            error!("{err:#}");
            std::process::exit(exitcode::DATAERR);
        }
    };
    info!("{problem}");
    if !problem.is_balanced_or_surplus() {
        warn!("Total supply is below total demand, the problem is infeasible and the bound only reflects the relaxation");
    }
    let optimizer =
        match SubgradientOptimizer::new(&problem, config.settings.clone()) {
            Ok(optimizer) => optimizer,
            Err(err) => {
                error!("{err}");
                std::process::exit(exitcode::DATAERR);
            }
        };
    let report = optimizer.solve();
    info!("Result:\n{report}");
    if let (Some(plan), Some(bound)) =
        (primal::best_feasible_plan(&problem), report.best_bound)
    {
        info!(
            "Best feasible plan ({}): cost {:.4}, gap {:.4}",
            plan.name,
            plan.cost,
            primal::duality_gap(plan.cost, bound)
        );
    }

    let out_dir = &config.out_dir;
    fs::create_dir_all(out_dir)?;
    instance_parser::write_report_json(&report, &out_dir.join("report.json"))?;
    instance_parser::write_trajectory_csv(
        &report,
        &out_dir.join("trajectory.csv"),
    )?;
    info!("Wrote report and trajectory to {out_dir:?}");
    Ok(())
}
