use crate::util::{format_number, print_bounding_box, print_population};
use anyhow::Result;
use clap::Args;
use gol_hashlife::{HashLifeEngine, LifeAlgorithm, SparseCellSet};

#[derive(Args, Debug)]
pub(super) struct StatsArgs {
    /// Path to the file containing the pattern; supports .rle, .rle.gz and .cells formats
    pattern: String,
}

pub(super) fn run_stats(args: StatsArgs) -> Result<()> {
    let timer = std::time::Instant::now();
    let cells = SparseCellSet::from_file(&args.pattern)?;
    print_population(&cells)?;
    print_bounding_box(&cells);

    let mut engine = HashLifeEngine::new();
    engine.load_cells(&cells);
    let state = engine.state();
    let (x, y) = state.offset();
    println!(
        "Quadtree: level {}, north-west corner at ({x}, {y})",
        engine.node_level(state.root())
    );
    print!("{}", engine.statistics());
    println!(
        "Memory: {} bytes",
        format_number(engine.bytes_total() as u64)?
    );
    println!(
        "Computed stats in {:.1} secs",
        timer.elapsed().as_secs_f64()
    );
    Ok(())
}
