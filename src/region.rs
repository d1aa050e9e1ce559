use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::CpgScopeError;
use crate::utils::thousands;

static REGION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+):(\d+)-(\d+)$").unwrap());

/// A half-open genomic window `[start, end)` on one chromosome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub chrom: String,
    pub start: u32,
    pub end: u32,
}

impl Region {
    pub fn new(chrom: impl Into<String>, start: u32, end: u32) -> Result<Self, CpgScopeError> {
        let chrom = chrom.into();
        if start >= end {
            return Err(CpgScopeError::MalformedRegion(format!(
                "{}:{}-{}",
                chrom, start, end
            )));
        }
        Ok(Self { chrom, start, end })
    }

    pub fn length(&self) -> u32 {
        self.end - self.start
    }
}

impl FromStr for Region {
    type Err = CpgScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = REGION_PATTERN
            .captures(s)
            .ok_or_else(|| CpgScopeError::MalformedRegion(s.to_string()))?;

        // Digits that overflow u32 are as malformed as non-digits
        let start = caps[2]
            .parse::<u32>()
            .map_err(|_| CpgScopeError::MalformedRegion(s.to_string()))?;
        let end = caps[3]
            .parse::<u32>()
            .map_err(|_| CpgScopeError::MalformedRegion(s.to_string()))?;

        if start >= end {
            return Err(CpgScopeError::MalformedRegion(s.to_string()));
        }

        Ok(Region {
            chrom: caps[1].to_string(),
            start,
            end,
        })
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}-{}",
            self.chrom,
            thousands(self.start as u64),
            thousands(self.end as u64)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_region() {
        let region: Region = "chr22:1000-2000".parse().unwrap();
        assert_eq!(region.chrom, "chr22");
        assert_eq!(region.start, 1000);
        assert_eq!(region.end, 2000);
        assert_eq!(region.length(), 1000);
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(matches!(
            "chr22-1000-2000".parse::<Region>(),
            Err(CpgScopeError::MalformedRegion(_))
        ));
        assert!("chr22:1000".parse::<Region>().is_err());
        assert!("chr22:1,000-2,000".parse::<Region>().is_err());
        assert!(" chr22:1-2".parse::<Region>().is_err());
    }

    #[test]
    fn rejects_inverted_or_empty_region() {
        assert!("chr1:500-100".parse::<Region>().is_err());
        assert!("chr1:100-100".parse::<Region>().is_err());
        assert!(Region::new("chr1", 10, 10).is_err());
    }

    #[test]
    fn rejects_overflowing_coordinates() {
        assert!("chr1:0-99999999999".parse::<Region>().is_err());
    }

    #[test]
    fn parses_concurrently() {
        let handles = (0..4u32)
            .map(|i| {
                std::thread::spawn(move || format!("chr{}:{}-{}", i, i, i + 10).parse::<Region>())
            })
            .collect::<Vec<_>>();
        for (i, handle) in handles.into_iter().enumerate() {
            let region = handle.join().unwrap().unwrap();
            assert_eq!(region.chrom, format!("chr{}", i));
            assert_eq!(region.length(), 10);
        }
    }

    #[test]
    fn display_uses_thousands_separators() {
        let region = Region::new("chr1", 1_000, 2_500_000).unwrap();
        assert_eq!(region.to_string(), "chr1:1,000-2,500,000");
    }
}
