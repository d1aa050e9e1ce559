use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

use cpgscope::utils::{get_styles, init_logging, prefixed_path};
use cpgscope::{Region, TrackComparison, plot};

/// Compare model (smoothed) and count (unsmoothed) pileup BigWigs over a region
#[derive(Parser)]
#[command(author, version, about, long_about = None, styles=get_styles())]
struct Cli {
    /// Model mode BigWig file
    #[arg(long)]
    model: PathBuf,

    /// Count mode BigWig file
    #[arg(long)]
    count: PathBuf,

    /// Region to analyze (chr:start-end)
    #[arg(long)]
    region: Region,

    /// Output prefix
    #[arg(long)]
    output: PathBuf,

    /// Verbosity level
    #[arg(short, long, required = false, default_value = "2")]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    println!("Comparing {}", cli.region);

    info!("Extracting intervals...");
    let comparison = TrackComparison::from_files(&cli.model, &cli.count, &cli.region)
        .context("Failed to load tracks")?;

    if !comparison.is_aligned() {
        warn!("No exactly matching positions found; correlation uses all values paired by index");
    }
    println!("{}", comparison);

    let comparison_png = prefixed_path(&cli.output, "_mode_comparison.png");
    let summary_png = prefixed_path(&cli.output, "_data_summary.png");

    plot::render_comparison(&comparison, &comparison_png)
        .context("Failed to render comparison figure")?;
    plot::render_data_summary(&comparison, &summary_png)
        .context("Failed to render data summary figure")?;

    println!("Plots saved:");
    println!("  - {}", comparison_png.display());
    println!("  - {}", summary_png.display());

    Ok(())
}
