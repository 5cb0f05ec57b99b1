use crate::util::{format_number, print_population, EngineArgs};
use anyhow::Result;
use clap::Args;
use gol_hashlife::SparseCellSet;

#[derive(Args, Debug)]
pub(super) struct UpdateArgs {
    /// Path to the file containing the pattern; supports .rle, .rle.gz and .cells formats
    pattern: String,

    /// Path to the file where the resulting pattern will be saved
    #[arg(short, long)]
    output: String,

    #[command(flatten)]
    engine: EngineArgs,

    /// The pattern will be updated by this many generations
    #[arg(short, long)]
    generations: u64,

    /// How many generations to update at once, uses `generations` by default
    #[arg(short, long)]
    step: Option<u64>,

    /// Count population of the resulting pattern
    #[arg(short, long)]
    population: bool,
}

pub(super) fn run_update(args: UpdateArgs) -> Result<()> {
    let timer = std::time::Instant::now();
    let cells = SparseCellSet::from_file(&args.pattern)?;
    let mut engine = args.engine.build(args.engine.engine);
    engine.load_cells(&cells);
    println!(
        "Loaded pattern in {:.1} secs",
        timer.elapsed().as_secs_f64()
    );

    let timer = std::time::Instant::now();
    let step = args
        .step
        .unwrap_or(args.generations)
        .clamp(1, args.generations.max(1));
    let mut gens_left = args.generations;
    while gens_left != 0 {
        let chunk = step.min(gens_left);
        engine.update(chunk);
        gens_left -= chunk;
        if gens_left != 0 {
            println!(
                "Updated by {} out of {} generations, {} bytes in use",
                args.generations - gens_left,
                args.generations,
                format_number(engine.bytes_total() as u64)?
            );
        }
    }
    println!(
        "Updated pattern by {} generations in {:.1} secs",
        args.generations,
        timer.elapsed().as_secs_f64()
    );

    let updated = engine.current_cells();
    if args.population {
        print_population(&updated)?;
    }
    updated.to_file(&args.output)
}
