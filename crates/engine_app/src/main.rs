//! # engine_app — simulation driver
//!
//! Builds a registry, fills it with moving and expiring entities, and runs a
//! fixed-timestep loop over it.
//!
//! ## Startup Sequence
//!
//! 1. Parse the command line and initialise structured logging.
//! 2. Load the registry configuration (JSON file or `--page-size`).
//! 3. Populate the registry and enter the tick loop.

mod components;
mod tick;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine_component::{Registry, RegistryConfig};
use tick::{TickConfig, TickLoop};

#[derive(Debug, Parser)]
#[command(name = "engine_app", about = "Run a sparse-set ECS simulation")]
struct Args {
    /// Number of entities to spawn before the first tick
    #[arg(short, long, default_value_t = 1_000)]
    entities: usize,

    /// Number of ticks to run (0 = run until interrupted)
    #[arg(short, long, default_value_t = 120)]
    ticks: u64,

    /// Target ticks per second
    #[arg(long, default_value_t = 60.0, value_parser = parse_tick_rate)]
    tick_rate: f64,

    /// Sparse page size for every component pool
    #[arg(short, long)]
    page_size: Option<usize>,

    /// Destroy the oldest entity every N ticks (0 = never)
    #[arg(long, default_value_t = 0)]
    despawn_every: u64,

    /// JSON registry configuration, e.g. `{"page_size": 256}`
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Accepts finite, strictly positive tick rates.
fn parse_tick_rate(text: &str) -> Result<f64, String> {
    let rate: f64 = text.parse().map_err(|err| format!("{err}"))?;
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(format!("tick rate must be a positive number, got {text}"))
    }
}

impl Args {
    /// Resolve the registry config. A file is read first; `--page-size`
    /// overrides whatever it set.
    fn registry_config(&self) -> Result<RegistryConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!(file = %path.display(), "loading registry config");
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                RegistryConfig::from_json(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => RegistryConfig::default(),
        };
        if let Some(page_size) = self.page_size {
            config = config.with_page_size(page_size);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    let args = Args::parse();
    let registry_config = args.registry_config()?;
    let registry = Registry::with_config(registry_config)?;
    info!(page_size = registry_config.page_size, "registry ready");

    let config = TickConfig {
        tick_rate: args.tick_rate,
        max_ticks: args.ticks,
        despawn_every: args.despawn_every,
    };

    let mut tick_loop = TickLoop::new(config, registry);
    tick_loop.populate(args.entities);
    tick_loop.run()?;

    info!(
        ticks = tick_loop.tick_id(),
        living = tick_loop.registry().len(),
        "simulation finished"
    );
    Ok(())
}
