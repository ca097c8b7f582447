//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - samples: `o`
//! - error bars: `|`
//! - fitted curve: `-` line

use crate::domain::{ParameterVector, SampleSet};
use crate::models::sample_curve;

/// Render samples and the fitted curve on a `width x height` character grid.
pub fn render_ascii_plot(
    samples: &SampleSet,
    params: &ParameterVector,
    width: usize,
    height: usize,
) -> String {
    let (x_min, x_max) = samples
        .x_range()
        .filter(|(lo, hi)| lo.is_finite() && hi.is_finite() && hi > lo)
        .unwrap_or((0.0, 1.0));
    let curve = sample_curve(params, x_min, x_max, width.max(10));

    let (y_min, y_max) = y_range(samples, &curve).unwrap_or((0.0, 1.0));
    let pad = ((y_max - y_min) * 0.05).max(1e-12);

    let mut canvas = Canvas::new(width, height, (x_min, x_max), (y_min - pad, y_max + pad));

    // Curve first so samples overlay it; it never overwrites a mark.
    let mut prev: Option<(usize, usize)> = None;
    for &(x, y) in &curve {
        if !y.is_finite() {
            prev = None;
            continue;
        }
        let cell = canvas.cell(x, y);
        match prev {
            Some(from) => canvas.line(from, cell, '-'),
            None => canvas.mark_if_blank(cell, '-'),
        }
        prev = Some(cell);
    }

    for s in samples {
        let (col, lo) = canvas.cell(s.x, s.y - s.err.abs());
        let (_, hi) = canvas.cell(s.x, s.y + s.err.abs());
        for row in hi.min(lo)..=hi.max(lo) {
            canvas.mark((col, row), '|');
        }
    }
    for s in samples {
        let cell = canvas.cell(s.x, s.y);
        canvas.mark(cell, 'o');
    }

    canvas.render()
}

/// Fixed character grid with a linear data-to-cell mapping. Row 0 is the top.
struct Canvas {
    grid: Vec<Vec<char>>,
    x: (f64, f64),
    y: (f64, f64),
}

impl Canvas {
    fn new(width: usize, height: usize, x: (f64, f64), y: (f64, f64)) -> Self {
        Self {
            grid: vec![vec![' '; width.max(10)]; height.max(5)],
            x,
            y,
        }
    }

    fn width(&self) -> usize {
        self.grid[0].len()
    }

    fn height(&self) -> usize {
        self.grid.len()
    }

    /// `(column, row)` of a data point, clamped to the grid.
    fn cell(&self, x: f64, y: f64) -> (usize, usize) {
        let fx = ((x - self.x.0) / (self.x.1 - self.x.0)).clamp(0.0, 1.0);
        let fy = ((y - self.y.0) / (self.y.1 - self.y.0)).clamp(0.0, 1.0);
        let last_col = (self.width() - 1) as f64;
        let last_row = (self.height() - 1) as f64;
        (
            (fx * last_col).round() as usize,
            (last_row - fy * last_row).round() as usize,
        )
    }

    fn mark(&mut self, (col, row): (usize, usize), ch: char) {
        self.grid[row][col] = ch;
    }

    fn mark_if_blank(&mut self, (col, row): (usize, usize), ch: char) {
        let slot = &mut self.grid[row][col];
        if *slot == ' ' {
            *slot = ch;
        }
    }

    /// Connect two cells by stepping along the longer axis.
    fn line(&mut self, from: (usize, usize), to: (usize, usize), ch: char) {
        let (c0, r0) = (from.0 as f64, from.1 as f64);
        let (dc, dr) = (to.0 as f64 - c0, to.1 as f64 - r0);
        let steps = dc.abs().max(dr.abs()) as usize;
        if steps == 0 {
            self.mark_if_blank(to, ch);
            return;
        }
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let cell = ((c0 + t * dc).round() as usize, (r0 + t * dr).round() as usize);
            self.mark_if_blank(cell, ch);
        }
    }

    fn render(&self) -> String {
        let mut out = format!(
            "Plot: x=[{:.3}, {:.3}] | y=[{:.2}, {:.2}]\n",
            self.x.0, self.x.1, self.y.0, self.y.1
        );
        for row in &self.grid {
            out.extend(row.iter());
            out.push('\n');
        }
        out
    }
}

/// Vertical extent of the error bars and the curve.
fn y_range(samples: &SampleSet, curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let bars = samples
        .iter()
        .flat_map(|s| [s.y - s.err.abs(), s.y + s.err.abs()]);
    let (lo, hi) = bars
        .chain(curve.iter().map(|&(_, y)| y))
        .filter(|y| y.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| (lo.min(y), hi.max(y)));
    (hi > lo).then_some((lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sample;

    #[test]
    fn plot_golden_snapshot_small() {
        let samples: SampleSet = vec![
            Sample::new(1.0, 100.0, 1.0),
            Sample::new(10.0, 110.0, 1.0),
        ]
        .into();
        // Flat curve at y = 100.
        let params = ParameterVector::new(0.0, 0.0, 100.0);

        let txt = render_ascii_plot(&samples, &params, 10, 5);
        let expected = concat!(
            "Plot: x=[1.000, 10.000] | y=[98.40, 111.60]\n",
            "         o\n",
            "         |\n",
            "          \n",
            "|         \n",
            "o---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn parabola_spans_the_grid() {
        let p = ParameterVector::new(1.0, 0.0, 0.0);
        let samples: SampleSet = (-5..=5)
            .map(|i| {
                let x = i as f64;
                Sample::new(x, x * x, 0.1)
            })
            .collect::<Vec<_>>()
            .into();

        let txt = render_ascii_plot(&samples, &p, 41, 12);
        let rows: Vec<Vec<char>> = txt.lines().skip(1).map(|r| r.chars().collect()).collect();
        assert_eq!(rows.len(), 12);
        assert!(rows.iter().all(|r| r.len() == 41));

        let sample_row = |col: usize| rows.iter().position(|r| r[col] == 'o').unwrap();
        // Vertex near the bottom in the middle column, ends near the top.
        assert!(sample_row(20) >= 10);
        assert!(sample_row(0) <= 1);
        assert!(sample_row(40) <= 1);
    }

    #[test]
    fn empty_set_still_renders_a_grid() {
        let txt = render_ascii_plot(&SampleSet::default(), &ParameterVector::default(), 10, 5);
        assert_eq!(txt.lines().count(), 6);
    }
}
