use std::error::Error;
use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use rex_core::random_mixture;
use rex_mcmc::{build_ladder, run_suite, ReferenceMoments, SuitePlan};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod scenario;

use scenario::load_scenario;

#[derive(Parser, Debug)]
#[command(name = "rex-sim", about = "Replica-exchange MCMC comparison CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every configured algorithm on the scenario's mixture and print the reports.
    Run(RunArgs),
    /// Print the temperature ladder resolved from a scenario.
    Ladder(LadderArgs),
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
    /// YAML scenario describing the mixture, ladder and algorithms.
    #[arg(long)]
    config: PathBuf,
    /// Override the number of runs per algorithm.
    #[arg(long)]
    runs: Option<usize>,
    /// Override the number of samples per run.
    #[arg(long)]
    samples: Option<usize>,
}

#[derive(ClapArgs, Debug)]
struct LadderArgs {
    /// YAML scenario holding the ladder section.
    #[arg(long)]
    config: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run_scenario(args),
        Command::Ladder(args) => print_ladder(args),
    }
}

fn run_scenario(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let mut scenario = load_scenario(&args.config)?;
    if let Some(runs) = args.runs {
        scenario.runs = runs;
    }
    if let Some(samples) = args.samples {
        scenario.samples_per_run = samples;
    }

    let mixture = random_mixture(scenario.dimension, &scenario.mixture)?;
    let reference = ReferenceMoments::estimate(&mixture, scenario.reference_points)?;
    info!(
        first = reference.first,
        second = reference.second,
        points = reference.points,
        "reference moments estimated"
    );
    let plan = SuitePlan {
        temperatures: build_ladder(&scenario.ladder)?,
        engine: scenario.engine.clone(),
        master_seed: scenario.seed_policy.master_seed,
        runs: scenario.runs,
        samples_per_run: scenario.samples_per_run,
    };
    let reports = run_suite(&mixture, &reference, &scenario.algorithms, &plan)?;

    let output = json!({
        "label": scenario.seed_policy.label,
        "master_seed": plan.master_seed,
        "dimension": scenario.dimension,
        "temperatures": plan.temperatures,
        "reference": reference,
        "algorithms": reports,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_ladder(args: LadderArgs) -> Result<(), Box<dyn Error>> {
    let scenario = load_scenario(&args.config)?;
    let temperatures = build_ladder(&scenario.ladder)?;
    let inverse: Vec<f64> = temperatures.iter().map(|t| 1.0 / t).collect();
    let output = json!({
        "temperatures": temperatures,
        "inverse_temperatures": inverse,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
