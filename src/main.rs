use std::process;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use underpass::detection::Detection;
use underpass::settings::{self, CliArgs};

fn main() {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    if let Err(err) = run(&args) {
        eprintln!("error: {:#}", err);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &CliArgs) -> Result<()> {
    let settings = settings::load_config(args)?;
    println!("{}", settings);

    if let Some(threads) = settings.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let mut detection = Detection::from_file(&args.input, settings)?;
    let result = detection.solve()?;

    println!("<City Object IDs with Underpass>");
    for candidate in &result.classification.underpasses {
        println!("{}", candidate.id);
    }
    if !result.classification.roof_only.is_empty() {
        println!("<City Object IDs with roof but no ground surfaces>");
        for id in &result.classification.roof_only {
            println!("{}", id);
        }
    }
    if !result.skipped.is_empty() {
        println!("skipped {} object(s)", result.skipped.len());
        for skipped in &result.skipped {
            println!("  {}: {}", skipped.id, skipped.reason);
        }
    }

    detection.writeup()?;
    Ok(())
}
