use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use tileworld::cli::commands;
use tileworld::config::simulation::SimulationConfig;

#[derive(Parser)]
#[command(name = "tileworld")]
#[command(about = "Layered tile-map world with plant growth, lighting and day-advance rules")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Advance a fresh world a number of days and print daily statistics
    Simulate {
        /// Days to advance
        #[arg(short, long, default_value_t = 7)]
        days: u32,

        /// One JSON object per day instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a map's layers, collision, lights and exits
    Inspect {
        /// Map name (defaults to the configured start map)
        #[arg(short, long)]
        map: Option<String>,

        /// Dump the render view as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load all content, precache every map and report problems
    Validate,
}

/// Missing config file means defaults; a present but invalid one is fatal.
fn load_config(path: &str) -> SimulationConfig {
    let path = Path::new(path);
    if !path.exists() {
        return SimulationConfig::default();
    }
    match SimulationConfig::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(config: &SimulationConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if config.log_format == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn main() {
    let cli = Cli::parse();
    let config = load_config(&cli.config);
    init_tracing(&config);

    let result = match cli.command {
        Commands::Simulate { days, json } => commands::simulate(&config, days, json),
        Commands::Inspect { map, json } => commands::inspect(&config, map.as_deref(), json),
        Commands::Validate => commands::validate(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
