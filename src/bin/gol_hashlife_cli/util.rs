use anyhow::Result;
use clap::{Args, ValueEnum};
use gol_hashlife::{
    EngineConfig, HashLifeEngine, LifeAlgorithm, NaiveEngine, SparseCellSet,
    DEFAULT_EVICTION_WINDOW,
};
use num_format::{CustomFormat, Grouping, ToFormattedString};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(super) enum Engine {
    /// See https://conwaylife.com/wiki/HashLife
    Hashlife,
    /// Count the neighbours of every cell, fine for small chaotic patterns
    Naive,
}

impl Engine {
    pub(super) fn other(self) -> Self {
        match self {
            Engine::Hashlife => Engine::Naive,
            Engine::Naive => Engine::Hashlife,
        }
    }
}

#[derive(Args, Debug)]
pub(super) struct EngineArgs {
    /// The engine to use for the simulation
    #[arg(short, long, value_enum, default_value_t = Engine::Hashlife)]
    pub(super) engine: Engine,

    /// Cache entries unused for this many generations are evicted
    #[arg(short = 'w', long, default_value_t = DEFAULT_EVICTION_WINDOW)]
    pub(super) eviction_window: u64,
}

impl EngineArgs {
    pub(super) fn build(&self, engine: Engine) -> Box<dyn LifeAlgorithm> {
        match engine {
            Engine::Hashlife => Box::new(HashLifeEngine::with_config(
                EngineConfig::default().with_eviction_window(self.eviction_window),
            )),
            Engine::Naive => Box::new(NaiveEngine::new()),
        }
    }
}

/// Logs go to stderr, filtered by `RUST_LOG` (default `info`).
pub(super) fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub(super) fn format_number(x: u64) -> Result<String> {
    let fmt = CustomFormat::builder()
        .grouping(Grouping::Standard)
        .separator("_")
        .build()?;
    Ok(x.to_formatted_string(&fmt))
}

pub(super) fn print_population(cells: &SparseCellSet) -> Result<()> {
    println!(
        "Population: {}",
        format_number(cells.population() as u64)?
    );
    Ok(())
}

pub(super) fn print_bounding_box(cells: &SparseCellSet) {
    match cells.bounding_box() {
        Some(bbox) => println!(
            "Bounding box: ({}, {})..=({}, {}), {}x{}",
            bbox.min.x,
            bbox.min.y,
            bbox.max.x,
            bbox.max.y,
            bbox.width(),
            bbox.height()
        ),
        None => println!("Bounding box: empty"),
    }
}
