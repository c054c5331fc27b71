mod scenario;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::scenario::Scenario;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: timeline-lanes <scenario.json>");
        std::process::exit(1);
    }

    let path = PathBuf::from(&args[1]);
    let data = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let scenario = Scenario::from_slice(&data)
        .with_context(|| format!("parsing {}", path.display()))?;
    info!(
        events = scenario.events.len(),
        steps = scenario.steps.len(),
        "replaying scenario"
    );

    let report = scenario.run()?;

    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &report)?;
    writeln!(out)?;
    Ok(())
}
