//! Figure composition for both tools.
//!
//! Every figure owns one bitmap canvas which is split into panels; each panel
//! is drawn by a function that receives its `DrawingArea` explicitly.

use anyhow::{Context, Result};
use itertools::Itertools;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;
use std::path::Path;

use crate::compare::{Alignment, TrackComparison};
use crate::density::WindowAnalysis;
use crate::stats::{self, Histogram};
use crate::utils::thousands;

pub const POSITION_BINS: usize = 200;
pub const VALUE_BINS: usize = 50;
pub const DENSITY_BINS: usize = 50;

const COMPARISON_SIZE: (u32, u32) = (1500, 1200);
const SUMMARY_SIZE: (u32, u32) = (1500, 800);
const CHROMOSOME_SIZE: (u32, u32) = (1200, 600);
const PROFILE_SIZE: (u32, u32) = (1500, 800);

const FONT: &str = "sans-serif";
const ORANGE: RGBColor = RGBColor(255, 165, 0);
const SKYBLUE: RGBColor = RGBColor(135, 206, 235);

/// Axis range covering `values`, padded by 5% on each side. Degenerate or
/// empty input gets a unit-wide range so the chart can still be built.
pub fn padded_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if lo == hi {
        return (lo - 0.5)..(hi + 0.5);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

/// `0..max * 1.1`, never empty.
pub fn zero_based_range(max: f64) -> Range<f64> {
    if max.is_finite() && max > 0.0 {
        0.0..max * 1.1
    } else {
        0.0..1.0
    }
}

fn at_fraction(range: &Range<f64>, f: f64) -> f64 {
    range.start + (range.end - range.start) * f
}

// -----------------------------
// Track comparison figures
// -----------------------------

/// Three stacked panels: raw values, per-position differences, model vs count.
pub fn render_comparison(cmp: &TrackComparison, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, COMPARISON_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((3, 1));
    draw_track_values(&panels[0], cmp)?;
    draw_differences(&panels[1], cmp)?;
    draw_correlation(&panels[2], cmp)?;

    root.present()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Two stacked panels: data density along the region and value distributions.
pub fn render_data_summary(cmp: &TrackComparison, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, SUMMARY_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((2, 1));
    draw_position_density(&panels[0], cmp)?;
    draw_value_distribution(&panels[1], cmp)?;

    root.present()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn draw_track_values<DB>(area: &DrawingArea<DB, Shift>, cmp: &TrackComparison) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let model_x = cmp.model.positions();
    let model_y = cmp.model.values();
    let count_x = cmp.count.positions();
    let count_y = cmp.count.values();

    let x_range = cmp.region.start as f64..cmp.region.end as f64;
    let y_range = padded_range(model_y.iter().chain(count_y.iter()));

    let mut chart = ChartBuilder::on(area)
        .caption(
            format!("Pileup Mode Comparison: {}", cmp.region),
            (FONT, 22),
        )
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .light_line_style(BLACK.mix(0.05))
        .y_desc("Methylation Frequency (%)")
        .draw()?;

    chart
        .draw_series(
            model_x
                .iter()
                .zip(model_y.iter())
                .map(|(&x, &y)| Circle::new((x, y), 1, BLUE.mix(0.7).filled())),
        )?
        .label("Model (Smoothed)")
        .legend(|(x, y)| Circle::new((x, y), 3, BLUE.filled()));

    chart
        .draw_series(
            count_x
                .iter()
                .zip(count_y.iter())
                .map(|(&x, &y)| Circle::new((x, y), 1, ORANGE.mix(0.5).filled())),
        )?
        .label("Count (Unsmoothed)")
        .legend(|(x, y)| Circle::new((x, y), 3, ORANGE.filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

fn draw_differences<DB>(area: &DrawingArea<DB, Shift>, cmp: &TrackComparison) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let Alignment::Matched {
        positions,
        differences,
        ..
    } = &cmp.alignment
    else {
        let (w, h) = area.dim_in_pixel();
        area.draw(&Text::new(
            "No common positions between model and count tracks",
            (w as i32 / 2, h as i32 / 2),
            TextStyle::from((FONT, 20).into_font()).pos(Pos::new(HPos::Center, VPos::Center)),
        ))?;
        return Ok(());
    };

    let x_range = cmp.region.start as f64..cmp.region.end as f64;
    let y_range = padded_range(differences.iter().chain(std::iter::once(&0.0)));

    let mut chart = ChartBuilder::on(area)
        .caption(
            format!(
                "Smoothing Effect at {} Common Positions",
                thousands(positions.len() as u64)
            ),
            (FONT, 22),
        )
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range.clone(), y_range.clone())?;

    chart
        .configure_mesh()
        .light_line_style(BLACK.mix(0.05))
        .y_desc("Difference (Model - Count)")
        .draw()?;

    chart.draw_series(
        positions
            .iter()
            .zip(differences.iter())
            .map(|(&x, &d)| Circle::new((x as f64, d), 1, RED.mix(0.6).filled())),
    )?;

    chart.draw_series(DashedLineSeries::new(
        vec![(x_range.start, 0.0), (x_range.end, 0.0)],
        6,
        4,
        BLACK.mix(0.5).stroke_width(1),
    ))?;

    let text_x = at_fraction(&x_range, 0.02);
    let style = TextStyle::from((FONT, 16).into_font());
    chart.draw_series([
        Text::new(
            format!("Mean diff: {:.2}", stats::mean(differences)),
            (text_x, at_fraction(&y_range, 0.95)),
            style.clone(),
        ),
        Text::new(
            format!("Std diff: {:.2}", stats::std_population(differences)),
            (text_x, at_fraction(&y_range, 0.85)),
            style,
        ),
    ])?;

    Ok(())
}

fn draw_correlation<DB>(area: &DrawingArea<DB, Shift>, cmp: &TrackComparison) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (count_vals, model_vals) = cmp.correlation_pairs();
    let range = padded_range(count_vals.iter().chain(model_vals.iter()));

    let title = if cmp.is_aligned() {
        "Model vs Count Mode Correlation"
    } else {
        "Model vs Count Mode Correlation (All Data)"
    };

    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, 22))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(range.clone(), range.clone())?;

    chart
        .configure_mesh()
        .light_line_style(BLACK.mix(0.05))
        .x_desc("Count Mode (Unsmoothed) %")
        .y_desc("Model Mode (Smoothed) %")
        .draw()?;

    chart.draw_series(
        count_vals
            .iter()
            .zip(model_vals.iter())
            .map(|(&x, &y)| Circle::new((x, y), 1, BLUE.mix(0.5).filled())),
    )?;

    // Diagonal over the joint value range
    let lo = stats::min(&count_vals).min(stats::min(&model_vals));
    let hi = stats::max(&count_vals).max(stats::max(&model_vals));
    if lo.is_finite() && hi.is_finite() {
        chart.draw_series(DashedLineSeries::new(
            vec![(lo, lo), (hi, hi)],
            8,
            4,
            RED.mix(0.7).stroke_width(1),
        ))?;
    }

    chart.draw_series(std::iter::once(Text::new(
        format!("r = {:.3}", cmp.correlation),
        (at_fraction(&range, 0.05), at_fraction(&range, 0.95)),
        (FONT, 16).into_font(),
    )))?;

    Ok(())
}

fn draw_position_density<DB>(area: &DrawingArea<DB, Shift>, cmp: &TrackComparison) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (start, end) = (cmp.region.start as f64, cmp.region.end as f64);
    let model_hist = Histogram::with_range(&cmp.model.positions(), POSITION_BINS, start, end);
    let count_hist = Histogram::with_range(&cmp.count.positions(), POSITION_BINS, start, end);
    let centers = model_hist.centers();

    let y_max = model_hist
        .counts
        .iter()
        .chain(count_hist.counts.iter())
        .copied()
        .max()
        .unwrap_or(0) as f64;

    let mut chart = ChartBuilder::on(area)
        .caption("Data Density Across Region", (FONT, 22))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(70)
        .build_cartesian_2d(start..end, zero_based_range(y_max))?;

    chart
        .configure_mesh()
        .light_line_style(BLACK.mix(0.05))
        .y_desc("Data Points per Bin")
        .draw()?;

    for (hist, color, label) in [
        (&model_hist, BLUE, "Model data density"),
        (&count_hist, ORANGE, "Count data density"),
    ] {
        chart
            .draw_series(LineSeries::new(
                centers
                    .iter()
                    .zip(hist.counts.iter())
                    .map(|(&x, &c)| (x, c as f64)),
                color.mix(0.8).stroke_width(1),
            ))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

fn draw_value_distribution<DB>(area: &DrawingArea<DB, Shift>, cmp: &TrackComparison) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let model_hist = Histogram::auto(&cmp.model.values(), VALUE_BINS);
    let count_hist = Histogram::auto(&cmp.count.values(), VALUE_BINS);
    let model_density = model_hist.density();
    let count_density = count_hist.density();

    let x_range = padded_range(model_hist.edges.iter().chain(count_hist.edges.iter()));
    let y_max = model_density
        .iter()
        .chain(count_density.iter())
        .copied()
        .fold(0.0, f64::max);

    let mut chart = ChartBuilder::on(area)
        .caption("Value Distribution Comparison", (FONT, 22))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, zero_based_range(y_max))?;

    chart
        .configure_mesh()
        .light_line_style(BLACK.mix(0.05))
        .x_desc("Methylation Frequency (%)")
        .y_desc("Density")
        .draw()?;

    for (hist, density, color, label) in [
        (&model_hist, &model_density, BLUE, "Model values"),
        (&count_hist, &count_density, ORANGE, "Count values"),
    ] {
        if hist.total() == 0 {
            continue;
        }
        chart
            .draw_series(hist.edges.iter().tuple_windows().zip(density.iter()).map(
                |((&x0, &x1), &d)| Rectangle::new([(x0, 0.0), (x1, d)], color.mix(0.6).filled()),
            ))?
            .label(label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

// -----------------------------
// CpG density figures
// -----------------------------

/// Bar chart of site counts, chromosomes sorted by name.
pub fn render_chromosome_counts(counts: &[(String, usize)], path: &Path) -> Result<()> {
    let sorted = counts
        .iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .collect::<Vec<_>>();
    let names = sorted.iter().map(|(c, _)| c.as_str()).collect::<Vec<_>>();
    let values = sorted.iter().map(|(_, n)| *n as u64).collect::<Vec<_>>();
    let y_max = values.iter().copied().max().unwrap_or(0);

    let root = BitMapBackend::new(path, CHROMOSOME_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("CpG Sites per Chromosome", (FONT, 26))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .build_cartesian_2d(
            (0..names.len().max(1)).into_segmented(),
            0u64..(y_max + y_max / 10 + 1),
        )?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .light_line_style(BLACK.mix(0.05))
        .x_labels(names.len().max(1))
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => names.get(*i).map(|s| s.to_string()).unwrap_or_default(),
            _ => String::new(),
        })
        .x_desc("Chromosome")
        .y_desc("Number of CpG Sites")
        .draw()?;

    chart.draw_series(
        plotters::series::Histogram::vertical(&chart)
            .style(BLUE.mix(0.7).filled())
            .margin(4)
            .data(values.iter().enumerate().map(|(i, &n)| (i, n))),
    )?;

    let label_style =
        TextStyle::from((FONT, 11).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(values.iter().enumerate().map(|(i, &n)| {
        Text::new(
            thousands(n),
            (SegmentValue::CenterOf(i), n + y_max / 100),
            label_style.clone(),
        )
    }))?;

    root.present()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Density along the chromosome and the distribution of window densities.
pub fn render_density_profile(analysis: &WindowAnalysis, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, PROFILE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((2, 1));
    draw_density_track(&panels[0], analysis)?;
    draw_density_histogram(&panels[1], analysis)?;

    root.present()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn draw_density_track<DB>(area: &DrawingArea<DB, Shift>, analysis: &WindowAnalysis) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let centers_mb = analysis
        .windows
        .iter()
        .map(|w| w.window_center as f64 / 1e6)
        .collect::<Vec<_>>();
    let densities = analysis.densities();
    let mean = analysis.mean_density();

    let x_range = padded_range(centers_mb.iter());
    let y_range = zero_based_range(stats::max(&densities));

    let mut chart = ChartBuilder::on(area)
        .caption(
            format!(
                "CpG Density along {} ({:.0}kb windows)",
                analysis.chrom,
                analysis.window_size as f64 / 1000.0
            ),
            (FONT, 24),
        )
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range.clone(), y_range)?;

    chart
        .configure_mesh()
        .light_line_style(BLACK.mix(0.05))
        .y_desc("CpG Density (per kb)")
        .draw()?;

    chart.draw_series(LineSeries::new(
        centers_mb.iter().copied().zip(densities.iter().copied()),
        BLUE.mix(0.7).stroke_width(1),
    ))?;

    chart
        .draw_series(DashedLineSeries::new(
            vec![(x_range.start, mean), (x_range.end, mean)],
            8,
            4,
            RED.mix(0.7).stroke_width(1),
        ))?
        .label(format!("Mean: {:.2} CpGs/kb", mean))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

fn draw_density_histogram<DB>(
    area: &DrawingArea<DB, Shift>,
    analysis: &WindowAnalysis,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let hist = Histogram::auto(&analysis.densities(), DENSITY_BINS);
    let mean = analysis.mean_density();
    let y_max = hist.counts.iter().copied().max().unwrap_or(0) as f64;
    let y_range = zero_based_range(y_max);

    let mut chart = ChartBuilder::on(area)
        .caption("Distribution of CpG Density Values", (FONT, 22))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(padded_range(hist.edges.iter()), y_range.clone())?;

    chart
        .configure_mesh()
        .light_line_style(BLACK.mix(0.05))
        .x_desc("CpG Density (per kb)")
        .y_desc("Number of Windows")
        .draw()?;

    let bars = hist
        .edges
        .iter()
        .tuple_windows()
        .zip(hist.counts.iter())
        .map(|((&x0, &x1), &c)| [(x0, 0.0), (x1, c as f64)])
        .collect::<Vec<_>>();
    chart.draw_series(
        bars.iter()
            .map(|&corners| Rectangle::new(corners, SKYBLUE.mix(0.7).filled())),
    )?;
    chart.draw_series(
        bars.iter()
            .map(|&corners| Rectangle::new(corners, BLACK.stroke_width(1))),
    )?;

    if mean.is_finite() {
        chart.draw_series(DashedLineSeries::new(
            vec![(mean, y_range.start), (mean, y_range.end)],
            8,
            4,
            RED.mix(0.7).stroke_width(1),
        ))?;
    }

    Ok(())
}
