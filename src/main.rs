use anyhow::Result;
use clap::Parser;
use log::info;

use city_traffic::simulation::{CityConfig, SimCity, SimEvent};

#[derive(Parser)]
#[command(name = "city_traffic")]
#[command(about = "Headless grid city traffic simulation")]
struct Cli {
    /// Number of cars kept on the road
    #[arg(long, default_value = "20")]
    cars: usize,

    /// Number of roads, split between rows and columns
    #[arg(long, default_value = "6")]
    roads: usize,

    /// Lanes per direction on every road
    #[arg(long, default_value = "2")]
    lanes: usize,

    /// Number of simulation ticks to run
    #[arg(long, default_value = "1000")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.1")]
    delta: f32,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Start with the traffic signals torn down
    #[arg(long)]
    no_signals: bool,

    /// Toggle the traffic signals once this tick is reached
    #[arg(long)]
    toggle_signals_at: Option<u32>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    run_headless(&cli)
}

/// Run the simulation without a renderer and log the final statistics
fn run_headless(cli: &Cli) -> Result<()> {
    let mut config = CityConfig::new(cli.cars, cli.roads, cli.lanes);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    info!("Running traffic simulation in headless mode...");
    info!("Ticks: {}, Delta: {}s", cli.ticks, cli.delta);

    let mut city = SimCity::new(config)?;
    if cli.no_signals {
        city.toggle_traffic_signals();
    }
    city.log_summary();

    let ticks_per_second = (1.0 / cli.delta).ceil().max(1.0) as u32;
    let mut arrivals = 0usize;
    let mut brakes = 0usize;

    for tick in 1..=cli.ticks {
        if cli.toggle_signals_at == Some(tick) {
            city.toggle_traffic_signals();
        }
        city.tick(cli.delta);

        for event in city.drain_events() {
            match event {
                SimEvent::CarArrived(_) => arrivals += 1,
                SimEvent::CarBraked(_) => brakes += 1,
            }
        }

        if tick % ticks_per_second.saturating_mul(10) == 0 {
            info!(
                "--- After tick {} ({:.1}s simulated time): {} arrivals, {} brakes ---",
                tick,
                tick as f32 * cli.delta,
                arrivals,
                brakes
            );
            city.log_summary();
        }
    }

    let stats = &city.stats;
    info!("=== SIMULATION COMPLETE ===");
    info!("Elapsed time: {:.2}s", stats.elapsed_time);
    info!("Total cars spawned: {}", stats.total_cars_spawned);
    info!("Total cars arrived: {}", stats.total_cars_arrived);
    info!("Total hard brakes: {}", stats.total_brakes);
    info!("Active cars: {}", city.car_count());
    info!("Total junctions: {}", city.network().junction_count());
    info!("Total roads: {}", city.network().road_count());
    info!("Arrival rate: {:.1}%", stats.arrival_rate());

    Ok(())
}
