use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

use cpgscope::density::DEFAULT_WINDOW_SIZE;
use cpgscope::utils::{ensure_output_dir, get_styles, init_logging, thousands, validate_input_file};
use cpgscope::{CpgScopeError, CpgSites, WindowAnalysis, plot};

const EXAMPLES: &str = "Examples:
  # Basic analysis of chr22
  density_analyzer data.bed.gz --chromosome 22

  # Full genome with custom window size
  density_analyzer data.bed.gz --window-size 50000

  # Quick analysis with plots
  density_analyzer data.bed.gz --chromosome 22 --window-size 10000 --output results/";

/// Analyze CpG density from methylation bed files
#[derive(Parser)]
#[command(author, version, about, long_about = None, styles=get_styles(), after_help = EXAMPLES)]
struct Cli {
    /// Input bed file (can be gzipped)
    input_file: PathBuf,

    /// Analyze specific chromosome (e.g., 22, chr22)
    #[arg(short, long)]
    chromosome: Option<String>,

    /// Window size for density calculation in bp
    #[arg(short, long, default_value_t = DEFAULT_WINDOW_SIZE, value_parser = clap::value_parser!(u64).range(1..))]
    window_size: u64,

    /// Output directory for plots and data
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Skip generating plots
    #[arg(long, action = clap::ArgAction::SetTrue)]
    no_plots: bool,

    /// Save density data to CSV file
    #[arg(long, action = clap::ArgAction::SetTrue)]
    save_data: bool,

    /// Verbosity level
    #[arg(short, long, required = false, default_value = "2")]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Nothing is written before the input is known to exist
    validate_input_file(&cli.input_file)?;
    ensure_output_dir(&cli.output)?;

    println!("CpG Density Analyzer");
    println!("Input file: {}", cli.input_file.display());
    println!(
        "Window size: {} bp ({:.0}kb)",
        thousands(cli.window_size),
        cli.window_size as f64 / 1000.0
    );
    println!("Output directory: {}", cli.output.display());

    let sites = CpgSites::load(&cli.input_file, cli.chromosome.as_deref())?;
    match sites.chromosome_filter() {
        Some(chrom) => println!("Filtered to {}: {} CpG sites", chrom, thousands(sites.len() as u64)),
        None => println!("Total CpG sites: {}", thousands(sites.len() as u64)),
    }

    println!();
    println!("{}", sites.summary()?);

    let counts = sites.chromosome_counts()?;
    if !cli.no_plots && counts.len() > 1 {
        let path = cli.output.join("cpg_per_chromosome.png");
        plot::render_chromosome_counts(&counts, &path)
            .context("Failed to render chromosome distribution")?;
        info!("Saved: {}", path.display());
    }

    match WindowAnalysis::compute(&sites, cli.window_size) {
        Ok(analysis) => {
            println!();
            println!("{}", analysis);

            if analysis.windows.is_empty() {
                warn!("No windows to plot or save for {}.", analysis.chrom);
            } else if !cli.no_plots {
                let path = analysis.plot_path(&cli.output);
                plot::render_density_profile(&analysis, &path)
                    .context("Failed to render density profile")?;
                info!("Saved: {}", path.display());
            }

            if cli.save_data && !analysis.windows.is_empty() {
                let path = analysis.csv_path(&cli.output);
                analysis.write_csv(&path)?;
                info!("Saved density data: {}", path.display());
            }
        }
        Err(CpgScopeError::AmbiguousScope) => {
            println!();
            println!("Skipping window analysis - multiple chromosomes detected.");
            warn!("Use --chromosome option to analyze a specific chromosome.");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
