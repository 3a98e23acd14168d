//! Queue Simulator - command line runner
//!
//! Runs a JSON scenario and prints the monitored statistics as JSON:
//!
//! ```console
//! $ queue-sim --scenario clinic.json
//! $ queue-sim --scenario clinic.json --until 120 --replications 3 --verbose
//! ```

mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use queue_simulator_core_rs::config::{Scenario, ScenarioConfig};
use queue_simulator_core_rs::{ArrivalRecord, ResourceObservation, SimTime, Simulator};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

/// Command line arguments
#[derive(Debug, Parser)]
#[command(
    name = "queue-sim",
    version,
    about = "Discrete-event queueing simulator",
    long_about = "Runs a queueing scenario described in JSON (resources, generators and \
the trajectories their arrivals follow) and prints per-arrival records and \
per-resource observations as JSON on stdout."
)]
struct CliArgs {
    /// Scenario file (JSON)
    #[arg(short, long)]
    scenario: PathBuf,

    /// Run horizon, overriding the scenario's
    #[arg(short, long)]
    until: Option<SimTime>,

    /// Run the scenario this many times, resetting in between
    /// (seeded distributions rewind, so every rerun replays the first)
    #[arg(short, long, default_value_t = 1)]
    replications: u32,

    /// Validate the scenario and exit
    #[arg(long)]
    dry_run: bool,

    /// Log every dispatched event
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

/// Output of one replication
#[derive(Debug, Serialize)]
struct RunReport {
    replication: u32,
    end_time: SimTime,
    generated: BTreeMap<String, u64>,
    arrivals: Vec<ArrivalRecord>,
    resources: BTreeMap<String, Vec<ResourceObservation>>,
    digest: String,
}

fn collect_report(sim: &Simulator, scenario: &Scenario, replication: u32) -> Result<RunReport> {
    let config = scenario.config();

    let mut generated = BTreeMap::new();
    for generator in &config.generators {
        let count = sim.get_n_generated(&generator.name_prefix)?;
        generated.insert(generator.name_prefix.clone(), count);
    }

    let mut resources = BTreeMap::new();
    for resource in &config.resources {
        let observations = sim.get_mon_resource(&resource.name)?;
        resources.insert(resource.name.clone(), observations.to_vec());
    }

    Ok(RunReport {
        replication,
        end_time: sim.now(),
        generated,
        arrivals: sim.get_mon_arrivals(),
        resources,
        digest: sim.digest()?,
    })
}

fn run(args: CliArgs) -> Result<()> {
    let json = fs::read_to_string(&args.scenario)
        .with_context(|| format!("failed to read scenario {}", args.scenario.display()))?;
    let mut config = ScenarioConfig::from_json(&json)
        .with_context(|| format!("invalid scenario {}", args.scenario.display()))?;
    // --verbose also turns on per-event logging inside the engine
    config.verbose |= args.verbose;
    let scenario = Scenario::new(config)
        .with_context(|| format!("invalid scenario {}", args.scenario.display()))?;

    info!(
        scenario = %scenario.config().name,
        resources = scenario.config().resources.len(),
        generators = scenario.config().generators.len(),
        "scenario loaded"
    );
    if args.dry_run {
        println!("scenario '{}' is valid", scenario.config().name);
        return Ok(());
    }

    let until = args.until.unwrap_or_else(|| scenario.horizon());
    let mut sim = scenario.build().context("failed to build simulator")?;

    let mut reports = Vec::new();
    for replication in 0..args.replications {
        if replication > 0 {
            sim.reset().context("failed to reset simulator")?;
        }
        sim.run(until)
            .with_context(|| format!("replication {} failed at t={}", replication, sim.now()))?;
        reports.push(collect_report(&sim, &scenario, replication)?);
    }

    let output = serde_json::to_string_pretty(&reports).context("failed to serialize report")?;
    println!("{}", output);
    Ok(())
}

fn main() {
    let args = CliArgs::parse();

    if let Err(e) = logging::init(args.verbose, args.json_logs) {
        eprintln!("{:#}", e);
        process::exit(1);
    }

    if let Err(e) = run(args) {
        error!("{:#}", e);
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}
