mod stats;
mod stream;
mod update;
mod util;

use anyhow::Result;
use clap::{Parser, Subcommand};
use stats::{run_stats, StatsArgs};
use stream::{run_stream, StreamArgs};
use update::{run_update, UpdateArgs};

#[derive(Parser, Debug)]
#[command(version, about)]
struct CLIParser {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Advance the pattern by a number of generations and save the result
    Update(UpdateArgs),
    /// Print successive generations of the pattern as they are computed
    Stream(StreamArgs),
    /// Compute pattern's population, bounding box and quadtree statistics
    Stats(StatsArgs),
}

fn main() -> Result<()> {
    util::init_logging();
    let args = CLIParser::parse();

    match args.action {
        Action::Update(args) => run_update(args),
        Action::Stream(args) => run_stream(args),
        Action::Stats(args) => run_stats(args),
    }
}
