//! Plot rendering.
//!
//! - `chart`: the fit figure, drawn with Plotters onto any backend
//! - `font`: the embedded font used for bitmap text
//! - `vector`: PS/EPS/PDF backend for Plotters
//! - `ascii`: terminal preview
//!
//! PNG goes straight to Plotters' `BitMapBackend`.

pub mod ascii;
pub mod chart;
pub mod font;
pub mod vector;

use std::path::Path;

use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use tracing::info;

use crate::domain::{OutputFormat, ParameterVector, SampleSet};
use crate::error::AppError;

pub use ascii::render_ascii_plot;
pub use chart::{FigureLabels, draw_figure};
pub use font::register_fonts;
pub use vector::{VectorBackend, VectorFormat};

/// Figure size in inches.
pub const FIGURE_INCHES: (f64, f64) = (6.4, 4.8);

/// Figure size in device pixels at `dpi`.
pub fn figure_size(dpi: f64) -> (u32, u32) {
    (
        (FIGURE_INCHES.0 * dpi).round() as u32,
        (FIGURE_INCHES.1 * dpi).round() as u32,
    )
}

/// Render the fit figure to `path` in `format`.
pub fn render_plot(
    path: &Path,
    format: OutputFormat,
    dpi: f64,
    samples: &SampleSet,
    params: &ParameterVector,
) -> Result<(), AppError> {
    if !(dpi.is_finite() && dpi > 0.0) {
        return Err(AppError::Config(format!("resolution must be positive, got {dpi}")));
    }
    let size = figure_size(dpi);
    if size.0 == 0 || size.1 == 0 {
        return Err(AppError::Config(format!("resolution {dpi} DPI is too small")));
    }

    register_fonts()?;
    let labels = FigureLabels::default();

    match VectorFormat::from_output(format) {
        Some(vector) => {
            let root = VectorBackend::new(path, vector, size, dpi).into_drawing_area();
            draw_figure(&root, samples, params, &labels, dpi).map_err(render_error)?;
            root.present().map_err(render_error)?;
        }
        None => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_figure(&root, samples, params, &labels, dpi).map_err(render_error)?;
            root.present().map_err(render_error)?;
        }
    }

    info!(
        path = %path.display(),
        format = format.extension(),
        width = size.0,
        height = size.1,
        "rendered plot"
    );
    Ok(())
}

fn render_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> AppError {
    AppError::Render(err.to_string())
}
