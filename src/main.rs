use alife_common::SimulationConfig;
use alife_engine::persistence::{write_serialized, SaveFormat};
use alife_engine::{AddAgentRequest, ModifyAgentRequest, Simulation};
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info, trace, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Runs the artificial-life world headless and writes snapshots to disk.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Restore roster and world settings from a save file
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write roster and world settings here when the run ends
    #[arg(long)]
    save: Option<PathBuf>,

    /// Seed for the engine RNG, overriding the config
    #[arg(long)]
    seed: Option<u64>,

    /// Number of cycles to run, overriding the config
    #[arg(long)]
    cycles: Option<u32>,

    /// Add an agent: Species:Name:Energy[:x:y]
    #[arg(long = "add", value_name = "AGENT")]
    add: Vec<AddAgentRequest>,

    /// Remove every agent with this name
    #[arg(long = "remove", value_name = "NAME")]
    remove: Vec<String>,

    /// Rename and re-energise agents: Name:NewName:Energy
    #[arg(long = "modify", value_name = "CHANGE")]
    modify: Vec<ModifyAgentRequest>,
}

fn load_config(path: &Path) -> Result<SimulationConfig> {
    if !path.exists() {
        warn!("Config file '{}' not found. Using default configuration.", path.display());
        return Ok(SimulationConfig::default());
    }
    SimulationConfig::load(path)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("Starting artificial-life engine...");

    // --- Load Configuration ---
    let mut config = load_config(&args.config)?;
    if let Some(seed) = args.seed {
        config.run.seed = Some(seed);
    }
    if let Some(cycles) = args.cycles {
        config.world.simulation_cycles = cycles;
    }

    // --- Build or restore the world ---
    let mut sim = match &args.load {
        Some(path) => {
            let mut sim = Simulation::load_or_default(path, config.clone())?;
            // The save's world settings win, except for an explicit cycle count.
            if let Some(cycles) = args.cycles {
                sim.set_simulation_cycles(cycles);
            }
            sim
        }
        None => Simulation::new(config)?,
    };

    // --- Apply agent requests ---
    for name in &args.remove {
        if let Err(e) = sim.remove_agent(name) {
            warn!("Skipping --remove {}: {}", name, e);
        }
    }
    for change in &args.modify {
        if let Err(e) = sim.modify_agent(change) {
            warn!("Skipping --modify {}: {}", change.name, e);
        }
    }
    for request in args.add {
        let name = request.name.clone();
        if let Err(e) = sim.add_agent(request) {
            warn!("Skipping --add {}: {}", name, e);
        }
    }

    if args.load.is_some() {
        sim.init_world_keeping_agents()?;
    } else {
        sim.init_world()?;
    }
    debug!("Simulation Parameters: {:#?}", sim.params());

    // --- Simulation Loop ---
    let total_cycles = sim.params().simulation_cycles;
    let record_interval = sim.config().output.record_interval_cycles.max(1);
    info!(
        "Running up to {} cycles with {} agents, recording every {} cycle(s).",
        total_cycles,
        sim.live_agent_count(),
        record_interval
    );

    let start_time = Instant::now();
    sim.record_snapshot();

    while !sim.is_finished() {
        let cycle_start = Instant::now();
        let report = match sim.tick() {
            Ok(report) => report,
            Err(e) => {
                error!("Error during cycle {}: {}", sim.current_cycle() + 1, e);
                anyhow::bail!("Simulation cycle failed.");
            }
        };
        let pruned = sim.prune_dead();

        trace!(
            "Cycle [{}/{}] completed in {:.3} ms: {:?}",
            report.cycle,
            total_cycles,
            cycle_start.elapsed().as_secs_f64() * 1000.0,
            report
        );

        let is_record_cycle = report.cycle % record_interval == 0;
        if is_record_cycle || sim.is_finished() {
            sim.record_snapshot();
            if let Some(snapshot) = sim.recorded_snapshots().last() {
                info!(
                    "Cycle [{}/{}] | Agents: {} | Energy: {} | Food: {} | Meals: {} | Deaths: {} | Elapsed: {:.2} s",
                    report.cycle,
                    total_cycles,
                    snapshot.live_agent_count(),
                    snapshot.total_energy(),
                    snapshot.food.len(),
                    report.meals,
                    pruned,
                    start_time.elapsed().as_secs_f64()
                );
            }
        }
    }

    if sim.live_agent_count() == 0 {
        info!("All agents have died after {} cycles.", sim.current_cycle());
    }
    info!(
        "Simulation finished in {:.3} seconds.",
        start_time.elapsed().as_secs_f64()
    );

    // --- Save Recorded Data ---
    let output = sim.config().output.clone();
    if output.save_snapshots {
        let format = SaveFormat::from_name(output.format.as_deref().unwrap_or("json"));
        let filename = PathBuf::from(format!("{}_snapshots.{}", output.base_filename, format.extension()));
        match write_serialized(&filename, format, sim.recorded_snapshots()) {
            Ok(()) => info!(
                "{} snapshots saved to {} ({:?} format)",
                sim.recorded_snapshots().len(),
                filename.display(),
                format
            ),
            Err(e) => error!("Error saving snapshots: {}", e),
        }
    } else {
        info!("Skipping saving snapshots as per config.");
    }

    if output.save_roster {
        let filename = format!("{}_roster.csv", output.base_filename);
        write_roster(&sim, &filename).with_context(|| format!("Failed to write roster to '{}'", filename))?;
        info!("Final roster saved to {}", filename);
    }

    if let Some(path) = &args.save {
        if let Err(e) = sim.save(path) {
            error!("Error saving world: {}", e);
        }
    }

    info!("Simulation Complete.");
    Ok(())
}

fn write_roster(sim: &Simulation, filename: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(filename)?;
    writer.write_record(["id", "name", "species", "energy", "x", "y", "alive"])?;
    for agent in sim.agents() {
        writer.write_record(&[
            agent.id.to_string(),
            agent.name.clone(),
            agent.species.to_string(),
            agent.energy.to_string(),
            agent.position.x.to_string(),
            agent.position.y.to_string(),
            agent.alive.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
