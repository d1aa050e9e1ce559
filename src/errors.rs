use std::path::PathBuf;

use thiserror::Error;

/// Failure modes shared by the comparator and the density analyzer.
#[derive(Error, Debug)]
pub enum CpgScopeError {
    /// An input path does not exist.
    #[error("Input file {0} not found")]
    InputNotFound(PathBuf),

    /// A signal track could not be opened or queried.
    #[error("Failed to access track {path}: {reason}")]
    TrackAccess { path: PathBuf, reason: String },

    /// Region string is not `chrom:start-end` or has `start >= end`.
    #[error("Malformed region '{0}': expected chrom:start-end with start < end")]
    MalformedRegion(String),

    /// Filtering left no rows to analyse.
    #[error("No data found for chromosome {0}")]
    EmptyResult(String),

    /// Windowed analysis needs a single chromosome.
    #[error("Multiple chromosomes found. Please specify --chromosome for window analysis.")]
    AmbiguousScope,

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),
}

impl CpgScopeError {
    pub fn track_access(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        CpgScopeError::TrackAccess {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
