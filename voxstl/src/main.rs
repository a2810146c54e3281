use std::{path::PathBuf, process};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use voxstl::pipeline::{self, Config};

/// Convert a sequence of binary cross-section images into an ASCII STL
/// surface mesh.
#[derive(Debug, Parser)]
#[command(name = "voxstl", version)]
struct Args {
    /// input path template with exactly one integer conversion, e.g.
    /// slices/layer%04d.png
    #[arg(long)]
    input: String,

    /// output STL path
    #[arg(long)]
    output: PathBuf,

    /// index of the first layer
    #[arg(long)]
    first: u32,

    /// index of the last layer, must be greater than --first
    #[arg(long)]
    last: u32,

    /// worker thread count
    #[arg(long, default_value_t = 1)]
    threads: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        process::exit(1);
    });

    let cfg = Config {
        input: args.input,
        output: args.output,
        first: args.first,
        last: args.last,
        threads: args.threads,
    };
    cfg.validate()?;
    pipeline::run(&cfg)?;

    Ok(())
}
