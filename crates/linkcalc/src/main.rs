//! Link-Budget Calculation CLI
//!
//! Computes the full metric set for one link definition.
//!
//! Usage:
//!   linkcalc --input data/satellite_downlink.json --detailed
//!   linkcalc --template satellite-uplink --report out/report.json

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use formula_eval::format_value;
use link_budget::{compute_link, detailed_steps, result_rows, LinkReport, LinkType};
use linkcalc::{template_for, LinkInput};

#[derive(Parser, Debug)]
#[command(
    name = "linkcalc",
    about = "Compute an RF link budget from a JSON link definition"
)]
struct Args {
    /// Path to a link definition JSON file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Start from a built-in template instead of a file
    /// (satellite-uplink, satellite-downlink, terrestrial-uplink,
    /// terrestrial-downlink)
    #[arg(short, long, conflicts_with = "input")]
    template: Option<String>,

    /// Show the step-by-step calculation trace
    #[arg(short, long)]
    detailed: bool,

    /// Write a full JSON report to this path
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let input = match (&args.input, &args.template) {
        (Some(path), None) => LinkInput::from_path(path)?,
        (None, Some(tag)) => template_for(LinkType::parse(tag)?),
        _ => bail!("exactly one of --input or --template is required"),
    };

    info!("{}", "=".repeat(60));
    info!("Link budget: {}", input.link_type);
    info!("{}", "=".repeat(60));

    let params = input.resolve()?;
    let result = compute_link(&params)?;

    for row in result_rows(&result) {
        info!("{:>26}: {} {}", row.label, format_value(row.value), row.unit);
    }

    if args.detailed {
        info!("");
        info!("Calculation trace:");
        for step in detailed_steps(&params, &result) {
            if step.detail.is_empty() {
                info!(
                    "  {:>26}: {} {}",
                    step.label,
                    format_value(step.value),
                    step.unit
                );
            } else {
                info!(
                    "  {:>26}: {} {}  [{}]",
                    step.label,
                    format_value(step.value),
                    step.unit,
                    step.detail
                );
            }
        }
    }

    if let Some(path) = &args.report {
        let report = LinkReport::new(params, result);
        info!("Writing report to {:?}", path);
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &report)?;
    }

    Ok(())
}
