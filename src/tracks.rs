use std::collections::BTreeMap;
use std::path::Path;

use log::debug;

use crate::errors::CpgScopeError;
use crate::region::Region;

/// One BigWig record: `[start, end)` carrying a constant value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackInterval {
    pub start: u32,
    pub end: u32,
    pub value: f32,
}

/// Intervals of a track within a region, in the order the reader yields them.
#[derive(Debug, Clone, Default)]
pub struct Track {
    pub intervals: Vec<TrackInterval>,
}

impl Track {
    pub fn new(intervals: Vec<TrackInterval>) -> Self {
        Self { intervals }
    }

    /// Read every interval overlapping `region` from the BigWig at `path`.
    ///
    /// The reader lives only for the duration of this call, so the file is
    /// closed on success and on every error path.
    pub fn load(path: &Path, region: &Region) -> Result<Self, CpgScopeError> {
        let path_str = path.to_string_lossy();
        let mut reader = bigtools::BigWigRead::open_file(&*path_str)
            .map_err(|e| CpgScopeError::track_access(path, e))?;

        if !reader.chroms().iter().any(|c| c.name == region.chrom) {
            return Err(CpgScopeError::track_access(
                path,
                format!("chromosome {} not present in track", region.chrom),
            ));
        }

        let iter = reader
            .get_interval(&region.chrom, region.start, region.end)
            .map_err(|e| CpgScopeError::track_access(path, e))?;

        let mut intervals = Vec::new();
        for r in iter {
            let iv = r.map_err(|e| CpgScopeError::track_access(path, e))?;
            intervals.push(TrackInterval {
                start: iv.start,
                end: iv.end,
                value: iv.value,
            });
        }

        debug!(
            "Loaded {} intervals from {} over {}",
            intervals.len(),
            path.display(),
            region
        );
        Ok(Self { intervals })
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn positions(&self) -> Vec<f64> {
        self.intervals.iter().map(|iv| iv.start as f64).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.intervals.iter().map(|iv| iv.value as f64).collect()
    }

    /// Start coordinate -> value. A repeated start keeps the value of the
    /// record that comes last in file order.
    pub fn position_map(&self) -> BTreeMap<u32, f64> {
        let mut map = BTreeMap::new();
        for iv in &self.intervals {
            map.insert(iv.start, iv.value as f64);
        }
        map
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;

    /// Write a single-chromosome BigWig from `(start, end, value)` records.
    pub(crate) fn create_dummy_bigwig(
        path: &Path,
        chrom: &str,
        chrom_len: u32,
        values: &[(u32, u32, f32)],
    ) -> Result<()> {
        let chromsizes_file = tempfile::NamedTempFile::new()?;
        {
            let mut writer = std::io::BufWriter::new(&chromsizes_file);
            writeln!(writer, "{}\t{}", chrom, chrom_len)?;
        }

        let bedgraph_file = tempfile::NamedTempFile::new()?;
        {
            let mut writer = std::io::BufWriter::new(&bedgraph_file);
            for (start, end, value) in values {
                writeln!(writer, "{}\t{}\t{}\t{}", chrom, start, end, value)?;
            }
        }

        let args = bigtools::utils::cli::bedgraphtobigwig::BedGraphToBigWigArgs {
            bedgraph: bedgraph_file.path().to_string_lossy().to_string(),
            chromsizes: chromsizes_file.path().to_string_lossy().to_string(),
            output: path.to_string_lossy().to_string(),
            parallel: "auto".to_string(),
            single_pass: true,
            write_args: bigtools::utils::cli::BBIWriteArgs {
                nthreads: 1,
                nzooms: 0,
                uncompressed: false,
                sorted: "all".to_string(),
                zooms: None,
                block_size: 256,
                items_per_slot: 64,
                inmemory: false,
            },
        };

        bigtools::utils::cli::bedgraphtobigwig::bedgraphtobigwig(args)
            .map_err(|e| anyhow::anyhow!("Error: {}", e))?;

        Ok(())
    }

    #[test]
    fn test_load_restricts_to_region() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let bw = dir.path().join("model.bw");
        create_dummy_bigwig(
            &bw,
            "chr1",
            10_000,
            &[(10, 11, 1.0), (20, 21, 2.0), (500, 501, 3.0), (5000, 5001, 4.0)],
        )?;

        let region = Region::new("chr1", 0, 1000)?;
        let track = Track::load(&bw, &region)?;
        assert_eq!(track.len(), 3);
        assert_eq!(track.positions(), vec![10.0, 20.0, 500.0]);
        assert_eq!(track.values(), vec![1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_load_empty_region_is_not_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let bw = dir.path().join("model.bw");
        create_dummy_bigwig(&bw, "chr1", 10_000, &[(10, 11, 1.0)])?;

        let region = Region::new("chr1", 2000, 3000)?;
        let track = Track::load(&bw, &region)?;
        assert!(track.is_empty());
        Ok(())
    }

    #[test]
    fn test_load_unknown_chromosome() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let bw = dir.path().join("model.bw");
        create_dummy_bigwig(&bw, "chr1", 10_000, &[(10, 11, 1.0)])?;

        let region = Region::new("chr2", 0, 100)?;
        let err = Track::load(&bw, &region).unwrap_err();
        assert!(matches!(err, CpgScopeError::TrackAccess { .. }));
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let region = Region::new("chr1", 0, 100).unwrap();
        let err = Track::load(Path::new("/no/such/track.bw"), &region).unwrap_err();
        assert!(matches!(err, CpgScopeError::TrackAccess { .. }));
    }

    #[test]
    fn test_position_map_last_value_wins() {
        let track = Track::new(vec![
            TrackInterval { start: 10, end: 11, value: 1.0 },
            TrackInterval { start: 20, end: 21, value: 2.0 },
            TrackInterval { start: 10, end: 11, value: 9.0 },
        ]);
        let map = track.position_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&10], 9.0);
        assert_eq!(map[&20], 2.0);
    }
}
