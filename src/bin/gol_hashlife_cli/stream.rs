use crate::util::{format_number, print_bounding_box, EngineArgs};
use anyhow::Result;
use clap::Args;
use gol_hashlife::{AlgorithmSwitch, SparseCellSet};

#[derive(Args, Debug)]
pub(super) struct StreamArgs {
    /// Path to the file containing the pattern; supports .rle, .rle.gz and .cells formats
    pattern: String,

    #[command(flatten)]
    engine: EngineArgs,

    /// Generations between two printed states
    #[arg(short, long, default_value_t = 1)]
    step: u64,

    /// How many states to print
    #[arg(short, long, default_value_t = 10)]
    count: usize,

    /// Continue with the other engine after this many states
    #[arg(long)]
    switch_after: Option<usize>,
}

pub(super) fn run_stream(args: StreamArgs) -> Result<()> {
    let cells = SparseCellSet::from_file(&args.pattern)?;
    let mut stream = AlgorithmSwitch::new(
        args.engine.build(args.engine.engine),
        cells,
        args.step,
    )?;

    let timer = std::time::Instant::now();
    let emitted = print_states(&mut stream, &args)?;
    println!(
        "Streamed {} states in {:.1} secs",
        emitted,
        timer.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Prints up to `args.count` states; returns how many the stream actually produced.
fn print_states(stream: &mut AlgorithmSwitch, args: &StreamArgs) -> Result<usize> {
    let mut emitted = 0;
    for i in 1..=args.count {
        let Some(cells) = stream.next() else {
            break;
        };
        emitted = i;
        println!(
            "Generation {}: population {}",
            i as u64 * args.step,
            format_number(cells.population() as u64)?
        );
        print_bounding_box(&cells);

        if args.switch_after == Some(i) {
            let other = args.engine.engine.other();
            println!("Switching to {other:?}");
            stream.switch_algorithm(args.engine.build(other))?;
        }
    }
    Ok(emitted)
}
