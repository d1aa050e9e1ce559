//! CpG site density over a BED-like interval file.
//!
//! Sites are read with polars (tab separated, no header, optionally gzip
//! compressed). Columns are positional: `chr`, `start`, `end`, then any extra
//! columns as `col3`, `col4`, ... which are kept by name but unused.

use anyhow::{Context, Result};
use log::{debug, info};
use polars::prelude::*;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::CpgScopeError;
use crate::stats;
use crate::utils::{chrom_file_stem, thousands};

pub const DEFAULT_WINDOW_SIZE: u64 = 100_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpgSite {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

/// Add the conventional `chr` prefix when it is missing (`"22"` -> `"chr22"`).
pub fn normalize_chromosome(name: &str) -> String {
    if name.starts_with("chr") {
        name.to_string()
    } else {
        format!("chr{}", name)
    }
}

/// Parse a headerless tab-separated file and give its columns positional names.
///
/// The chromosome column is always read as text, so Ensembl style names
/// (`1`, `2`, ..., `X`) do not get inferred as integers. Gzip input is
/// detected and decompressed by the reader.
pub fn read_bed_frame(path: &Path) -> Result<DataFrame> {
    let dtypes = Arc::new(vec![DataType::String, DataType::Int64, DataType::Int64]);

    let mut df = CsvReadOptions::default()
        .with_has_header(false)
        .with_dtype_overwrite(Some(dtypes))
        .with_parse_options(CsvParseOptions::default().with_separator(b'\t'))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to open {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to parse {} as tab-delimited", path.display()))?;

    if df.width() < 3 {
        anyhow::bail!(
            "Expected at least 3 columns (chrom, start, end) in {}, found {}",
            path.display(),
            df.width()
        );
    }

    let names = ["chr".to_string(), "start".to_string(), "end".to_string()]
        .into_iter()
        .chain((3..df.width()).map(|i| format!("col{}", i)))
        .collect::<Vec<_>>();
    df.set_column_names(names.iter().map(|s| s.as_str()))?;

    Ok(df)
}

/// Reduce a BED frame to `chr` (String), `start` and `end` (UInt64).
fn coordinate_frame(df: &DataFrame, path: &Path) -> Result<DataFrame> {
    let chr = df.column("chr")?.cast(&DataType::String)?;
    let start = df
        .column("start")?
        .strict_cast(&DataType::UInt64)
        .with_context(|| format!("Negative start coordinate in {}", path.display()))?;
    let end = df
        .column("end")?
        .strict_cast(&DataType::UInt64)
        .with_context(|| format!("Negative end coordinate in {}", path.display()))?;

    if chr.null_count() + start.null_count() + end.null_count() > 0 {
        anyhow::bail!("Missing chrom/start/end value in {}", path.display());
    }

    Ok(DataFrame::new(vec![chr, start, end])?)
}

/// CpG sites loaded from one file, optionally restricted to one chromosome.
///
/// Backed by a frame with `chr`, `start` and `end` columns in file order.
#[derive(Debug, Clone)]
pub struct CpgSites {
    frame: DataFrame,
    column_names: Vec<String>,
    chromosome_filter: Option<String>,
}

impl CpgSites {
    pub fn new(sites: Vec<CpgSite>) -> PolarsResult<Self> {
        let frame = df!(
            "chr" => sites.iter().map(|s| s.chrom.as_str()).collect::<Vec<_>>(),
            "start" => sites.iter().map(|s| s.start).collect::<Vec<_>>(),
            "end" => sites.iter().map(|s| s.end).collect::<Vec<_>>()
        )?;
        Ok(Self {
            frame,
            column_names: vec!["chr".into(), "start".into(), "end".into()],
            chromosome_filter: None,
        })
    }

    /// Load `path` and keep only rows on `chromosome` when given.
    ///
    /// The caller checks that `path` exists. Fails when nothing is left after
    /// filtering.
    pub fn load(path: &Path, chromosome: Option<&str>) -> Result<Self> {
        info!("Loading {}...", path.display());

        let df = read_bed_frame(path)?;
        let column_names = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();
        debug!("Columns: {:?}", column_names);

        let sites = Self {
            frame: coordinate_frame(&df, path)?,
            column_names,
            chromosome_filter: None,
        };

        match chromosome {
            Some(chrom) => sites.filter_chromosome(chrom),
            None if sites.is_empty() => {
                Err(CpgScopeError::EmptyResult("any chromosome".to_string()).into())
            }
            None => Ok(sites),
        }
    }

    /// Keep rows on `chromosome` (prefix-normalised).
    pub fn filter_chromosome(self, chromosome: &str) -> Result<Self> {
        let chrom = normalize_chromosome(chromosome);
        let frame = self
            .frame
            .lazy()
            .filter(col("chr").eq(lit(chrom.as_str())))
            .collect()?;

        if frame.height() == 0 {
            return Err(CpgScopeError::EmptyResult(chrom).into());
        }

        Ok(Self {
            frame,
            column_names: self.column_names,
            chromosome_filter: Some(chrom),
        })
    }

    /// Sites in file order.
    pub fn sites(&self) -> PolarsResult<Vec<CpgSite>> {
        let chr = self.frame.column("chr")?.str()?;
        let start = self.frame.column("start")?.u64()?;
        let end = self.frame.column("end")?.u64()?;

        Ok(chr
            .into_iter()
            .zip(start.into_iter())
            .zip(end.into_iter())
            .filter_map(|((c, s), e)| {
                Some(CpgSite {
                    chrom: c?.to_string(),
                    start: s?,
                    end: e?,
                })
            })
            .collect())
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn chromosome_filter(&self) -> Option<&str> {
        self.chromosome_filter.as_deref()
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Smallest start and largest end over all sites.
    pub fn span(&self) -> PolarsResult<(u64, u64)> {
        let start = self.frame.column("start")?.u64()?.min().unwrap_or(0);
        let end = self.frame.column("end")?.u64()?.max().unwrap_or(0);
        Ok((start, end))
    }

    /// Site counts per chromosome, in order of first appearance.
    pub fn chromosome_counts(&self) -> PolarsResult<Vec<(String, usize)>> {
        let counts = self
            .frame
            .clone()
            .lazy()
            .group_by_stable([col("chr")])
            .agg([len().alias("count")])
            .collect()?;

        let chr = counts.column("chr")?.str()?;
        let n = counts.column("count")?.cast(&DataType::UInt64)?;
        let n = n.u64()?;

        Ok(chr
            .into_iter()
            .zip(n.into_iter())
            .filter_map(|(c, n)| Some((c?.to_string(), n? as usize)))
            .collect())
    }

    pub fn n_chromosomes(&self) -> PolarsResult<usize> {
        Ok(self.chromosome_counts()?.len())
    }

    pub fn summary(&self) -> PolarsResult<SiteSummary> {
        let counts = self.chromosome_counts()?;
        if let [(chrom, n_sites)] = counts.as_slice() {
            let (span_start, span_end) = self.span()?;
            Ok(SiteSummary::SingleChromosome {
                chrom: chrom.clone(),
                n_sites: *n_sites,
                span_start,
                span_end,
            })
        } else {
            Ok(SiteSummary::PerChromosome(counts))
        }
    }
}

/// Headline statistics for the loaded sites.
#[derive(Debug, Clone, PartialEq)]
pub enum SiteSummary {
    SingleChromosome {
        chrom: String,
        n_sites: usize,
        span_start: u64,
        span_end: u64,
    },
    PerChromosome(Vec<(String, usize)>),
}

impl SiteSummary {
    pub fn span_length(&self) -> Option<u64> {
        match self {
            SiteSummary::SingleChromosome {
                span_start,
                span_end,
                ..
            } => Some(span_end.saturating_sub(*span_start)),
            SiteSummary::PerChromosome(_) => None,
        }
    }

    /// Sites per kilobase over the spanned length.
    pub fn overall_density(&self) -> Option<f64> {
        match self {
            SiteSummary::SingleChromosome { n_sites, .. } => self
                .span_length()
                .map(|len| *n_sites as f64 / (len as f64 / 1000.0)),
            SiteSummary::PerChromosome(_) => None,
        }
    }
}

impl Display for SiteSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Basic Statistics ===")?;
        match self {
            SiteSummary::SingleChromosome {
                chrom,
                n_sites,
                span_start,
                span_end,
            } => {
                let span = self.span_length().unwrap_or(0);
                writeln!(f, "Chromosome: {}", chrom)?;
                writeln!(f, "CpG sites: {}", thousands(*n_sites as u64))?;
                writeln!(
                    f,
                    "Genomic span: {} - {}",
                    thousands(*span_start),
                    thousands(*span_end)
                )?;
                writeln!(f, "Total length: {:.2} Mb", span as f64 / 1e6)?;
                write!(
                    f,
                    "Overall density: {:.2} CpGs per kb",
                    self.overall_density().unwrap_or(f64::NAN)
                )?;
            }
            SiteSummary::PerChromosome(counts) => {
                write!(f, "CpGs per chromosome:")?;
                for (chrom, n) in counts {
                    write!(f, "\n  {}: {}", chrom, thousands(*n as u64))?;
                }
            }
        }
        Ok(())
    }
}

/// One fixed-width window `[window_start, window_end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityWindow {
    pub chrom: String,
    pub window_start: u64,
    pub window_end: u64,
    pub window_center: u64,
    pub cpg_count: u64,
    pub density_per_kb: f64,
}

/// Per-window CpG density along a single chromosome.
#[derive(Debug, Clone)]
pub struct WindowAnalysis {
    pub chrom: String,
    pub window_size: u64,
    pub min_position: u64,
    pub max_position: u64,
    pub windows: Vec<DensityWindow>,
}

impl WindowAnalysis {
    /// Tile `[min start, max end)` with windows of `window_size` bp and count
    /// the sites whose start falls in each. The last window may run past the
    /// maximum end.
    ///
    /// Returns [`CpgScopeError::AmbiguousScope`] when the sites span more than
    /// one chromosome.
    pub fn compute(sites: &CpgSites, window_size: u64) -> Result<Self, CpgScopeError> {
        let mut chromosomes = sites.chromosome_counts()?.into_iter();
        let Some((chrom, _)) = chromosomes.next() else {
            return Err(CpgScopeError::EmptyResult(
                sites.chromosome_filter().unwrap_or("any chromosome").to_string(),
            ));
        };
        if chromosomes.next().is_some() {
            return Err(CpgScopeError::AmbiguousScope);
        }
        let window_size = window_size.max(1);

        let (min_position, max_position) = sites.span()?;

        let n_windows = max_position
            .saturating_sub(min_position)
            .div_ceil(window_size) as usize;

        let mut counts = vec![0u64; n_windows];
        for start in sites.frame.column("start")?.u64()?.into_iter().flatten() {
            let idx = ((start - min_position) / window_size) as usize;
            if idx < n_windows {
                counts[idx] += 1;
            }
        }

        let windows = counts
            .into_iter()
            .enumerate()
            .map(|(i, cpg_count)| {
                let window_start = min_position + i as u64 * window_size;
                DensityWindow {
                    chrom: chrom.clone(),
                    window_start,
                    window_end: window_start + window_size,
                    window_center: window_start + window_size / 2,
                    cpg_count,
                    density_per_kb: cpg_count as f64 * 1000.0 / window_size as f64,
                }
            })
            .collect();

        Ok(Self {
            chrom,
            window_size,
            min_position,
            max_position,
            windows,
        })
    }

    pub fn densities(&self) -> Vec<f64> {
        self.windows.iter().map(|w| w.density_per_kb).collect()
    }

    pub fn mean_density(&self) -> f64 {
        stats::mean(&self.densities())
    }

    pub fn std_density(&self) -> f64 {
        stats::std_sample(&self.densities())
    }

    pub fn max_density(&self) -> f64 {
        stats::max(&self.densities())
    }

    pub fn window_kb(&self) -> u64 {
        self.window_size / 1000
    }

    pub fn plot_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!(
            "{}_cpg_density_{}kb.png",
            chrom_file_stem(&self.chrom),
            self.window_kb()
        ))
    }

    pub fn csv_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!(
            "{}_density_{}kb.csv",
            chrom_file_stem(&self.chrom),
            self.window_kb()
        ))
    }

    /// Window table as a frame with the CSV column layout.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let w = &self.windows;
        df!(
            "chr" => w.iter().map(|w| w.chrom.as_str()).collect::<Vec<_>>(),
            "window_start" => w.iter().map(|w| w.window_start as i64).collect::<Vec<_>>(),
            "window_end" => w.iter().map(|w| w.window_end as i64).collect::<Vec<_>>(),
            "window_center" => w.iter().map(|w| w.window_center as i64).collect::<Vec<_>>(),
            "cpg_count" => w.iter().map(|w| w.cpg_count as i64).collect::<Vec<_>>(),
            "density_per_kb" => w.iter().map(|w| w.density_per_kb).collect::<Vec<_>>()
        )
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut df = self.to_frame()?;
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(&mut df)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

impl Display for WindowAnalysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "=== Window Analysis ({:.0}kb windows) ===",
            self.window_size as f64 / 1000.0
        )?;
        writeln!(
            f,
            "Analyzing {}: {} - {}",
            self.chrom,
            thousands(self.min_position),
            thousands(self.max_position)
        )?;
        writeln!(f, "Created {} windows", thousands(self.windows.len() as u64))?;
        writeln!(f, "Mean density: {:.2} CpGs/kb", self.mean_density())?;
        writeln!(f, "Std density: {:.2} CpGs/kb", self.std_density())?;
        write!(f, "Max density: {:.2} CpGs/kb", self.max_density())
    }
}
