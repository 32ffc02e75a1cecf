//! Chart selection and rendering for comparison results.
//!
//! Two renderings are supported: line mode plots each variant's reduced
//! series against the shared sweep abscissa; box mode shows the two raw
//! trial distributions side by side. Output is PNG or SVG, chosen by the
//! output path's extension.

use std::error::Error;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::{HarnessError, Result};
use crate::pool::ComparisonResult;

const VARIANT_COLORS: [RGBColor; 2] = [RED, BLUE];

/// Chart rendering chosen from the run shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphMode {
    /// Reduced latency per sweep value, one curve per variant.
    Line,
    /// Raw-trial distributions, no outlier markers.
    Box,
}

impl GraphMode {
    /// Sweep requested -> line, otherwise box. Nothing else takes part in the
    /// decision.
    pub fn select(sweep_requested: bool) -> Self {
        if sweep_requested {
            GraphMode::Line
        } else {
            GraphMode::Box
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GraphMode::Line => "line",
            GraphMode::Box => "box",
        }
    }
}

/// Draw the chart for a finished comparison.
///
/// In line mode `abscissa` must align index-for-index with both series; it is
/// ignored in box mode.
pub fn render(
    mode: GraphMode,
    result: &ComparisonResult,
    labels: [&str; 2],
    abscissa: &[u64],
    out: &Path,
) -> Result<()> {
    for series in &result.series {
        if series.is_empty() {
            return Err(HarnessError::Config(
                "cannot render an empty series".into(),
            ));
        }
    }
    if mode == GraphMode::Line {
        for series in &result.series {
            if series.len() != abscissa.len() {
                return Err(HarnessError::Config(format!(
                    "series length {} does not match abscissa length {}",
                    series.len(),
                    abscissa.len()
                )));
            }
        }
    }

    let svg = out.extension().is_some_and(|ext| ext == "svg");
    let size = (1024u32, 768u32);
    let drawn = if svg {
        let root = SVGBackend::new(out, size).into_drawing_area();
        draw(mode, &root, result, labels, abscissa)
    } else {
        let root = BitMapBackend::new(out, size).into_drawing_area();
        draw(mode, &root, result, labels, abscissa)
    };
    drawn.map_err(|e| HarnessError::Render(e.to_string()))
}

fn draw<DB: DrawingBackend>(
    mode: GraphMode,
    root: &DrawingArea<DB, Shift>,
    result: &ComparisonResult,
    labels: [&str; 2],
    abscissa: &[u64],
) -> std::result::Result<(), Box<dyn Error>>
where
    <DB as DrawingBackend>::ErrorType: 'static,
{
    match mode {
        GraphMode::Line => draw_line(root, result, labels, abscissa),
        GraphMode::Box => draw_box(root, result, labels),
    }
}

fn draw_line<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    result: &ComparisonResult,
    labels: [&str; 2],
    abscissa: &[u64],
) -> std::result::Result<(), Box<dyn Error>>
where
    <DB as DrawingBackend>::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let x_max = abscissa.last().copied().unwrap_or(0).max(1) as f64;
    let y_max = result
        .series
        .iter()
        .flatten()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max)
        .max(1e-9);

    let mut chart = ChartBuilder::on(root)
        .caption(
            format!("{} vs {}", labels[0], labels[1]),
            ("sans-serif", 28),
        )
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("n")
        .y_desc("Time (s)")
        .y_label_formatter(&|v: &f64| format!("{v:.1e}"))
        .draw()?;

    for (index, series) in result.series.iter().enumerate() {
        let color = VARIANT_COLORS[index];
        chart
            .draw_series(LineSeries::new(
                abscissa
                    .iter()
                    .zip(series.iter())
                    .map(|(&x, &y)| (x as f64, y)),
                color.stroke_width(2),
            ))?
            .label(labels[index])
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_box<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    result: &ComparisonResult,
    labels: [&str; 2],
) -> std::result::Result<(), Box<dyn Error>>
where
    <DB as DrawingBackend>::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let quartiles = [
        Quartiles::new(&result.series[0]),
        Quartiles::new(&result.series[1]),
    ];
    let y_max = result
        .series
        .iter()
        .flatten()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max)
        .max(1e-9) as f32;

    let mut chart = ChartBuilder::on(root)
        .caption(
            format!("{} vs {}", labels[0], labels[1]),
            ("sans-serif", 28),
        )
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(labels[..].into_segmented(), 0f32..y_max * 1.1)?;

    // Gridlines on the y axis only, matching the line chart's time axis.
    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc("Time (s)")
        .y_label_formatter(&|v: &f32| format!("{v:.1e}"))
        .draw()?;

    chart.draw_series(
        labels
            .iter()
            .zip(quartiles.iter())
            .map(|(label, quartiles)| Boxplot::new_vertical(SegmentValue::CenterOf(label), quartiles)),
    )?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_series(a: Vec<f64>, b: Vec<f64>) -> ComparisonResult {
        ComparisonResult { series: [a, b] }
    }

    #[test]
    fn sweep_selects_line_mode() {
        assert_eq!(GraphMode::select(true), GraphMode::Line);
    }

    #[test]
    fn no_sweep_selects_box_mode() {
        assert_eq!(GraphMode::select(false), GraphMode::Box);
    }

    #[test]
    fn line_chart_is_written_to_png() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("line.png");
        let result = two_series(vec![1e-3, 2e-3, 3e-3], vec![2e-3, 2e-3, 2e-3]);

        render(
            GraphMode::Line,
            &result,
            ["uthread", "pthread"],
            &[0, 50, 100],
            &out,
        )
        .unwrap();
        assert!(out.exists());
    }

    #[test]
    fn box_chart_is_written_to_svg() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("box.svg");
        let result = two_series(
            vec![1e-3, 2e-3, 3e-3, 4e-3, 5e-3],
            vec![2e-3, 2e-3, 2e-3, 2e-3, 2e-3],
        );

        render(GraphMode::Box, &result, ["uthread", "pthread"], &[], &out).unwrap();
        assert!(out.exists());
    }

    #[test]
    fn misaligned_abscissa_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("bad.png");
        let result = two_series(vec![1e-3, 2e-3], vec![2e-3, 2e-3]);

        let err = render(
            GraphMode::Line,
            &result,
            ["a", "b"],
            &[0, 50, 100],
            &out,
        )
        .unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }

    #[test]
    fn empty_series_is_rejected_before_any_backend_runs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty.png");
        let result = two_series(vec![], vec![]);

        assert!(render(GraphMode::Box, &result, ["a", "b"], &[], &out).is_err());
        assert!(!out.exists());
    }
}
