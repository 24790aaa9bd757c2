use clap::Parser;
use clap_verbosity_flag::Verbosity;
use log::info;
use ndarray::{Array1, Array2};
use std::{fs, path::PathBuf};

use anyhow::Result;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Normal, Uniform};
use serde::{Deserialize, Serialize};
use subgradient_bound::{
    datastructures::TransportationProblem, instance_parser,
};

#[derive(Serialize, Deserialize, Debug, Clone)]
struct GeneratorConfig {
    num_sources: usize,
    num_destinations: usize,
    /// Unit costs are drawn uniformly from this range
    cost_range: (f64, f64),
    mean_supply: f64,
    /// Standard deviation of the supply relative to the mean
    supply_std: f64,
    /// Total supply divided by total demand, at least 1
    surplus_ratio: f64,
    seed: u64,
    out_path: PathBuf,
}

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to the json config
    #[arg(short, long)]
    pub config: PathBuf,
    #[command(flatten)]
    pub verbosity: Verbosity,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();
    let config: GeneratorConfig =
        serde_json::from_str(&fs::read_to_string(args.config)?)?;
    let out_path = config.out_path.clone();
    let problem = generate_problem(&config)?;
    info!("Generated {problem}");
    instance_parser::write_problem_json(&problem, &out_path)?;
    Ok(())
}

fn generate_problem(config: &GeneratorConfig) -> Result<TransportationProblem> {
    if config.surplus_ratio < 1.0 {
        anyhow::bail!(
            "surplus_ratio must be at least 1, got {}",
            config.surplus_ratio
        );
    }
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let (low, high) = config.cost_range;
    if !(low < high) {
        anyhow::bail!("Empty cost range [{low}, {high})");
    }
    let cost_distrib = Uniform::new(low, high);
    let costs = Array2::from_shape_simple_fn(
        (config.num_sources, config.num_destinations),
        || cost_distrib.sample(&mut rng).round(),
    );
    let supply_distrib = Normal::new(
        config.mean_supply,
        (config.mean_supply * config.supply_std).abs(),
    )?;
    let supply = Array1::from_iter(
        supply_distrib
            .sample_iter(&mut rng)
            .take(config.num_sources)
            .map(|s: f64| s.max(0.0).round()),
    );
    // split the demand randomly, scaled so that supply / demand = surplus_ratio
    let weights = Array1::from_iter(
        (&mut rng)
            .sample_iter(Uniform::new(0.5, 1.5))
            .take(config.num_destinations),
    );
    let total_demand = supply.sum() / config.surplus_ratio;
    let weight_sum = weights.sum();
    let demand = weights.mapv(|w| (w / weight_sum * total_demand).floor());
    Ok(TransportationProblem::new(costs, supply, demand)?)
}
