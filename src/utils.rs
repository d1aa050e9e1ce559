use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use crate::errors::CpgScopeError;

pub fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .header(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .literal(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .invalid(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .error(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .valid(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .placeholder(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
}

/// Initialise the logger and map the `--verbose` count onto a level filter.
pub fn init_logging(verbose: u8) {
    colog::init();

    let log_level = match verbose {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    log::set_max_level(log_level);
}

pub fn validate_input_file(path: &Path) -> Result<(), CpgScopeError> {
    if !path.exists() {
        return Err(CpgScopeError::InputNotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Create the output directory if needed. Returns true when it was created.
pub fn ensure_output_dir(dir: &Path) -> Result<bool> {
    if dir.exists() {
        return Ok(false);
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    info!("Created output directory: {}", dir.display());
    Ok(true)
}

/// Format an integer with comma thousands separators.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Chromosome name as used in output file names: every `chr` removed.
pub fn chrom_file_stem(chrom: &str) -> String {
    chrom.replace("chr", "")
}

/// `{prefix}{suffix}` keeping any directory part of the prefix intact.
pub fn prefixed_path(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_chrom_file_stem() {
        assert_eq!(chrom_file_stem("chr22"), "22");
        assert_eq!(chrom_file_stem("chrX"), "X");
        assert_eq!(chrom_file_stem("scaffold_1"), "scaffold_1");
    }

    #[test]
    fn test_prefixed_path() {
        let p = prefixed_path(Path::new("out/sample"), "_mode_comparison.png");
        assert_eq!(p, PathBuf::from("out/sample_mode_comparison.png"));
    }

    #[test]
    fn test_ensure_output_dir_is_idempotent() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("nested/out");
        assert!(ensure_output_dir(&target)?);
        assert!(!ensure_output_dir(&target)?);
        assert!(target.is_dir());
        Ok(())
    }

    #[test]
    fn test_validate_input_file_missing() {
        let err = validate_input_file(Path::new("/definitely/not/here.bed")).unwrap_err();
        assert!(matches!(err, CpgScopeError::InputNotFound(_)));
    }
}
