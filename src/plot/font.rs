//! Embedded text font for bitmap output.
//!
//! Plotters is built with `ab_glyph`, which never looks up system fonts: the
//! family used by the figure has to be registered before any text style is
//! created. DejaVu Sans ships in `assets/fonts` (Bitstream Vera license).

use std::sync::OnceLock;

use plotters::style::{FontStyle, register_font};

use crate::error::AppError;

/// Family name the figure asks for.
pub const FONT_FAMILY: &str = "sans-serif";

static DEJAVU_SANS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

static REGISTERED: OnceLock<bool> = OnceLock::new();

/// Register the embedded font under [`FONT_FAMILY`]. Idempotent.
pub fn register_fonts() -> Result<(), AppError> {
    let ok = *REGISTERED
        .get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, DEJAVU_SANS).is_ok());
    if ok {
        Ok(())
    } else {
        Err(AppError::Render(
            "embedded font is not a valid TrueType file".to_string(),
        ))
    }
}
