use std::fmt::Display;
use std::path::Path;

use crate::errors::CpgScopeError;
use crate::region::Region;
use crate::stats;
use crate::tracks::Track;

/// How the two tracks line up at exact start coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Alignment {
    /// Start coordinates shared by both tracks, ascending, with the value of
    /// each track at those coordinates and `model - count`.
    Matched {
        positions: Vec<u32>,
        model: Vec<f64>,
        count: Vec<f64>,
        differences: Vec<f64>,
    },
    /// No coordinate appears in both tracks.
    Unaligned,
}

impl Alignment {
    /// Intersect the tracks' start coordinates.
    pub fn from_tracks(model: &Track, count: &Track) -> Self {
        let model_map = model.position_map();
        let count_map = count.position_map();

        let mut positions = Vec::new();
        let mut model_vals = Vec::new();
        let mut count_vals = Vec::new();

        // BTreeMap iteration is ordered, so positions come out sorted
        for (pos, m) in &model_map {
            if let Some(c) = count_map.get(pos) {
                positions.push(*pos);
                model_vals.push(*m);
                count_vals.push(*c);
            }
        }

        if positions.is_empty() {
            return Alignment::Unaligned;
        }

        let differences = model_vals
            .iter()
            .zip(count_vals.iter())
            .map(|(m, c)| m - c)
            .collect();

        Alignment::Matched {
            positions,
            model: model_vals,
            count: count_vals,
            differences,
        }
    }
}

/// Everything the comparator reports and plots for one region.
#[derive(Debug, Clone)]
pub struct TrackComparison {
    pub region: Region,
    pub model: Track,
    pub count: Track,
    pub alignment: Alignment,
    pub correlation: f64,
}

impl TrackComparison {
    pub fn new(region: Region, model: Track, count: Track) -> Self {
        let alignment = Alignment::from_tracks(&model, &count);
        let correlation = match &alignment {
            Alignment::Matched { model, count, .. } => stats::pearson(model, count),
            Alignment::Unaligned => {
                let (x, y) = unaligned_pairs(&model, &count);
                stats::pearson(&y, &x)
            }
        };

        Self {
            region,
            model,
            count,
            alignment,
            correlation,
        }
    }

    /// Load both tracks over `region` and compare them.
    pub fn from_files(
        model_path: &Path,
        count_path: &Path,
        region: &Region,
    ) -> Result<Self, CpgScopeError> {
        let model = Track::load(model_path, region)?;
        let count = Track::load(count_path, region)?;
        Ok(Self::new(region.clone(), model, count))
    }

    pub fn is_aligned(&self) -> bool {
        matches!(self.alignment, Alignment::Matched { .. })
    }

    pub fn common_positions(&self) -> &[u32] {
        match &self.alignment {
            Alignment::Matched { positions, .. } => positions,
            Alignment::Unaligned => &[],
        }
    }

    pub fn differences(&self) -> Option<&[f64]> {
        match &self.alignment {
            Alignment::Matched { differences, .. } => Some(differences),
            Alignment::Unaligned => None,
        }
    }

    pub fn mean_difference(&self) -> Option<f64> {
        self.differences().map(stats::mean)
    }

    pub fn std_difference(&self) -> Option<f64> {
        self.differences().map(stats::std_population)
    }

    /// Points for the model-versus-count scatter as `(count, model)`.
    ///
    /// Aligned tracks pair values at common positions; otherwise values are
    /// paired by index up to the shorter track.
    pub fn correlation_pairs(&self) -> (Vec<f64>, Vec<f64>) {
        match &self.alignment {
            Alignment::Matched { model, count, .. } => (count.clone(), model.clone()),
            Alignment::Unaligned => unaligned_pairs(&self.model, &self.count),
        }
    }
}

fn unaligned_pairs(model: &Track, count: &Track) -> (Vec<f64>, Vec<f64>) {
    let n = model.len().min(count.len());
    let x = count.values().into_iter().take(n).collect();
    let y = model.values().into_iter().take(n).collect();
    (x, y)
}

impl Display for TrackComparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Model intervals: {}", self.model.len())?;
        writeln!(f, "Count intervals: {}", self.count.len())?;
        writeln!(f, "Common positions: {}", self.common_positions().len())?;
        match self.mean_difference() {
            Some(mean_diff) => {
                writeln!(f, "Correlation: {:.3}", self.correlation)?;
                write!(f, "Mean difference: {:.2}", mean_diff)?;
            }
            None => {
                writeln!(
                    f,
                    "Warning: No exactly matching positions found between model and count data"
                )?;
                write!(f, "Correlation (all data, unaligned): {:.3}", self.correlation)?;
            }
        }
        Ok(())
    }
}
