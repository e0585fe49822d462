//! sg-sim: Scatter/Gather workload simulator
//!
//! Runs the driver against the in-memory block service: writes a set of
//! files one quadrant at a time, reads everything back, verifies it and
//! prints the service counters and cache statistics.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sg_driver::{
    DriverConfig, InMemoryBlockService, ScatterGatherApi, SgDriver, BLOCK_SIZE, QUADRANT_SIZE,
};
use sg_telemetry::{init_tracing, TelemetryConfig};

/// sg-sim: Scatter/Gather workload simulator
#[derive(Parser, Debug)]
#[command(name = "sg-sim")]
#[command(about = "Drive the Scatter/Gather client against a simulated block service")]
struct Args {
    /// JSON driver configuration (defaults to SG_* environment variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of files to write
    #[arg(short, long, default_value = "4")]
    files: usize,

    /// Blocks written per file
    #[arg(short, long, default_value = "8")]
    blocks: usize,

    /// Storage nodes emulated by the service
    #[arg(short, long, default_value = "4")]
    nodes: usize,

    /// Seed for payloads and service ids
    #[arg(short, long, default_value = "1")]
    seed: u64,

    /// Print the final statistics as JSON
    #[arg(long)]
    json: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<DriverConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            DriverConfig::from_json_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))
        }
        None => {
            let config = DriverConfig::from_env();
            config.validate().context("driver config from environment")?;
            Ok(config)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_tracing(&TelemetryConfig::from_env())?;

    let config = load_config(args.config.as_ref())?;
    let service = InMemoryBlockService::with_nodes(args.nodes, args.seed);
    let mut driver = SgDriver::new(config, service)?;
    let mut rng = StdRng::seed_from_u64(args.seed);

    let file_len = args.blocks * BLOCK_SIZE;
    let mut expected = Vec::with_capacity(args.files);

    for i in 0..args.files {
        let name = format!("sim-{:03}.dat", i);
        let fh = driver.open(&name)?;
        let mut contents = vec![0u8; file_len];
        rng.fill(&mut contents[..]);

        for chunk in contents.chunks(QUADRANT_SIZE) {
            let written = driver.write(fh, chunk)?;
            if written != chunk.len() {
                bail!("short write on {}: {} of {}", name, written, chunk.len());
            }
        }
        expected.push((name, fh, contents));
    }

    for (name, fh, contents) in &expected {
        driver.seek(*fh, 0)?;
        let mut actual = vec![0u8; file_len];
        let mut done = 0;
        while done < file_len {
            done += driver.read(*fh, &mut actual[done..(done + QUADRANT_SIZE).min(file_len)])?;
        }
        if &actual != contents {
            bail!("verification failed for {}", name);
        }
        driver.close(*fh)?;
    }

    let counters = driver.transport().counters();
    let stats = driver.shutdown()?;

    if args.json {
        let report = serde_json::json!({
            "files": args.files,
            "blocks_per_file": args.blocks,
            "service": counters,
            "cache": stats,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("verified {} files x {} blocks", args.files, args.blocks);
        println!(
            "service: {} creates, {} updates, {} obtains, {} rejected",
            counters.create, counters.update, counters.obtain, counters.rejected
        );
        println!(
            "cache: {} lookups, {} hits ({:.2}%), {} evictions",
            stats.lookups, stats.hits, stats.hit_rate, stats.evictions
        );
    }

    Ok(())
}
