//! The fit figure: samples with error bars and the fitted curve.
//!
//! Drawing is generic over the Plotters backend so the same figure goes to the
//! bitmap backend (PNG) and to `VectorBackend` (PS/EPS/PDF). Sizes are given in
//! points and converted with the output DPI, so every format has the same
//! proportions.

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::element::DashedPathElement;
use plotters::prelude::*;

use super::font::FONT_FAMILY;
use crate::domain::{ParameterVector, SampleSet};
use crate::models::sample_curve;

pub const X_LABEL: &str = "X [arbitrary unit]";
pub const Y_LABEL: &str = "Y [arbitrary unit]";
pub const DATA_LABEL: &str = "synthetic data for least-squares method";
pub const CURVE_LABEL: &str = "fitted curve by weighted least-squares method";

/// Points at which the fitted curve is evaluated.
pub const CURVE_POINTS: usize = 1000;

/// Axis descriptions and legend entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FigureLabels<'a> {
    pub x_axis: &'a str,
    pub y_axis: &'a str,
    pub data: &'a str,
    pub curve: &'a str,
}

impl Default for FigureLabels<'static> {
    fn default() -> Self {
        Self {
            x_axis: X_LABEL,
            y_axis: Y_LABEL,
            data: DATA_LABEL,
            curve: CURVE_LABEL,
        }
    }
}

/// Draw the figure onto `root` and leave presenting to the caller.
///
/// Text styles are created here, so the font family must already be
/// registered (see [`super::font::register_fonts`]).
pub fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    samples: &SampleSet,
    params: &ParameterVector,
    labels: &FigureLabels<'_>,
    dpi: f64,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let px = |pt: f64| (pt * dpi / 72.0).round().max(1.0);

    let (data_x_min, data_x_max) = samples.x_range().unwrap_or((0.0, 1.0));
    let curve = sample_curve(params, data_x_min, data_x_max, CURVE_POINTS);

    let (x0, x1) = axis_range(data_x_min, data_x_max);
    let (y0, y1) = {
        let (lo, hi) = y_extent(samples, &curve).unwrap_or((0.0, 1.0));
        axis_range(lo, hi)
    };

    root.fill(&WHITE)?;

    let label_font = (FONT_FAMILY, px(10.0)).into_font().color(&BLACK);
    let mut chart = ChartBuilder::on(root)
        .margin(px(8.0) as u32)
        .x_label_area_size(px(32.0) as u32)
        .y_label_area_size(px(48.0) as u32)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc(labels.x_axis)
        .y_desc(labels.y_axis)
        .x_labels(8)
        .y_labels(8)
        .label_style(label_font.clone())
        .axis_desc_style(label_font.clone())
        .axis_style(BLACK.stroke_width(px(0.8) as u32))
        .draw()?;

    // Dotted curve below the data: dashes as long as the line is wide.
    let curve_style = RED.stroke_width(px(3.0) as u32);
    let (dash, gap) = (px(3.0), px(5.0));
    chart
        .draw_series(DashedLineSeries::new(
            curve.iter().copied().filter(|(_, y)| y.is_finite()),
            dash,
            gap,
            curve_style,
        ))?
        .label(labels.curve)
        .legend(move |(x, y)| {
            DashedPathElement::new(vec![(x, y), (x + 20, y)], dash, gap, curve_style)
        });

    let bar_style = BLACK.stroke_width(px(2.0) as u32);
    let cap = px(10.0) as u32;
    chart.draw_series(
        samples
            .iter()
            .map(|s| ErrorBar::new_vertical(s.x, s.y - s.err, s.y, s.y + s.err, bar_style, cap)),
    )?;

    let marker = px(2.5) as u32;
    chart
        .draw_series(
            samples
                .iter()
                .map(|s| Circle::new((s.x, s.y), marker, BLUE.filled())),
        )?
        .label(labels.data)
        .legend(move |(x, y)| Circle::new((x + 10, y), marker, BLUE.filled()));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperMiddle)
        .label_font(label_font)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

/// Smallest and largest `y` over the error bars and the curve.
fn y_extent(samples: &SampleSet, curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for s in samples {
        lo = lo.min(s.y - s.err.abs());
        hi = hi.max(s.y + s.err.abs());
    }
    for &(_, y) in curve {
        if y.is_finite() {
            lo = lo.min(y);
            hi = hi.max(y);
        }
    }
    (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
}

/// Pad a data range by 5% on each side; a zero-width range is widened by 0.5.
fn axis_range(lo: f64, hi: f64) -> (f64, f64) {
    let span = hi - lo;
    if span <= 0.0 {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo - 0.05 * span, hi + 0.05 * span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sample;

    #[test]
    fn ranges_pad_or_widen() {
        let (lo, hi) = axis_range(0.0, 10.0);
        assert!((lo + 0.5).abs() < 1e-12);
        assert!((hi - 10.5).abs() < 1e-12);
        assert_eq!(axis_range(3.0, 3.0), (2.5, 3.5));
    }

    #[test]
    fn y_extent_covers_error_bars_and_curve() {
        let samples: SampleSet = vec![Sample::new(0.0, 1.0, 0.5), Sample::new(1.0, 2.0, 2.0)].into();
        let curve = [(0.0, -3.0), (1.0, 0.0), (0.5, f64::NAN)];
        assert_eq!(y_extent(&samples, &curve), Some((-3.0, 4.0)));
        assert_eq!(y_extent(&SampleSet::default(), &[]), None);
    }

    const SIZE: (u32, u32) = (640, 480);

    fn bitmap(labels: &FigureLabels<'_>) -> Vec<u8> {
        crate::plot::register_fonts().unwrap();
        let samples: SampleSet = vec![
            Sample::new(1.0, 5.0, 1.0),
            Sample::new(2.0, 3.0, 1.0),
            Sample::new(3.0, 5.0, 1.0),
            Sample::new(4.0, 11.0, 1.0),
            Sample::new(5.0, 21.0, 1.0),
        ]
        .into();
        let mut buf = vec![0u8; (SIZE.0 * SIZE.1 * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buf, SIZE).into_drawing_area();
            draw_figure(&root, &samples, &ParameterVector::new(2.0, 2.0, 3.0), labels, 100.0)
                .unwrap();
            root.present().unwrap();
        }
        buf
    }

    fn dark_pixels(buf: &[u8], rows: std::ops::Range<u32>, cols: std::ops::Range<u32>) -> usize {
        rows.flat_map(|r| cols.clone().map(move |c| ((r * SIZE.0 + c) * 3) as usize))
            .filter(|&i| buf[i] < 128 && buf[i + 1] < 128 && buf[i + 2] < 128)
            .count()
    }

    #[test]
    fn bitmap_figure_draws_text() {
        let labelled = bitmap(&FigureLabels::default());
        let blank = bitmap(&FigureLabels {
            x_axis: "",
            y_axis: "",
            data: "",
            curve: "",
        });
        assert_ne!(labelled, blank);

        // The plotting area does not move, so the strip below the x axis
        // differs only by the axis description.
        let strip = (SIZE.1 - 60)..SIZE.1;
        let middle = 200..500;
        assert!(
            dark_pixels(&labelled, strip.clone(), middle.clone())
                > dark_pixels(&blank, strip, middle)
        );
    }
}
