//! Vector output for Plotters: PostScript, EPS and PDF.
//!
//! `VectorBackend` records drawing primitives in device space (pixels, y down)
//! and serializes them when Plotters calls `present()`. Device units are scaled
//! to PostScript points by `72 / dpi`, so a figure keeps its physical size
//! whatever resolution it was laid out at.
//!
//! Text is set in Helvetica. Widths are estimated from the font size because no
//! font metrics are loaded; this only affects label placement.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use plotters_backend::text_anchor::{HPos, VPos};
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
    FontTransform,
};

use crate::domain::OutputFormat;

/// Average Helvetica advance width as a fraction of the font size.
const CHAR_WIDTH_EM: f64 = 0.55;

/// Segments used to approximate circles.
const CIRCLE_SEGMENTS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFormat {
    Ps,
    Eps,
    Pdf,
}

impl VectorFormat {
    pub fn from_output(format: OutputFormat) -> Option<Self> {
        match format {
            OutputFormat::Ps => Some(Self::Ps),
            OutputFormat::Eps => Some(Self::Eps),
            OutputFormat::Pdf => Some(Self::Pdf),
            OutputFormat::Png => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rgb(f64, f64, f64);

impl Rgb {
    fn from_backend(color: BackendColor) -> Self {
        let (r, g, b) = color.rgb;
        Self(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Stroke {
        points: Vec<(f64, f64)>,
        color: Rgb,
        width: f64,
        closed: bool,
    },
    Fill {
        points: Vec<(f64, f64)>,
        color: Rgb,
    },
    Text {
        text: String,
        at: (f64, f64),
        offset: (f64, f64),
        size: f64,
        angle: f64,
        color: Rgb,
    },
}

pub struct VectorBackend {
    path: PathBuf,
    format: VectorFormat,
    size: (u32, u32),
    /// Points per device pixel.
    scale: f64,
    ops: Vec<Op>,
}

impl VectorBackend {
    pub fn new(path: &Path, format: VectorFormat, size: (u32, u32), dpi: f64) -> Self {
        Self {
            path: path.to_path_buf(),
            format,
            size,
            scale: 72.0 / dpi,
            ops: Vec::new(),
        }
    }

    /// Page size in points.
    pub fn page_size(&self) -> (f64, f64) {
        (self.size.0 as f64 * self.scale, self.size.1 as f64 * self.scale)
    }

    /// Serialize everything drawn so far.
    pub fn render(&self) -> Vec<u8> {
        match self.format {
            VectorFormat::Ps | VectorFormat::Eps => self.render_postscript().into_bytes(),
            VectorFormat::Pdf => self.render_pdf(),
        }
    }

    /// Device pixel to page point; the page origin is bottom left.
    fn to_page(&self, (x, y): BackendCoord) -> (f64, f64) {
        (
            x as f64 * self.scale,
            (self.size.1 as f64 - y as f64) * self.scale,
        )
    }

    fn push_stroke<S: BackendStyle>(&mut self, coords: &[BackendCoord], style: &S, closed: bool) {
        let color = style.color();
        if color.alpha == 0.0 || coords.len() < 2 {
            return;
        }
        let points = coords.iter().map(|&c| self.to_page(c)).collect();
        self.ops.push(Op::Stroke {
            points,
            color: Rgb::from_backend(color),
            width: style.stroke_width() as f64 * self.scale,
            closed,
        });
    }

    fn push_fill<S: BackendStyle>(&mut self, coords: &[BackendCoord], style: &S) {
        let color = style.color();
        if color.alpha == 0.0 || coords.len() < 3 {
            return;
        }
        let points = coords.iter().map(|&c| self.to_page(c)).collect();
        self.ops.push(Op::Fill {
            points,
            color: Rgb::from_backend(color),
        });
    }

    fn render_postscript(&self) -> String {
        let (w, h) = self.page_size();
        let mut out = String::new();
        match self.format {
            VectorFormat::Eps => out.push_str("%!PS-Adobe-3.0 EPSF-3.0\n"),
            _ => out.push_str("%!PS-Adobe-3.0\n"),
        }
        out.push_str("%%Creator: wls\n");
        out.push_str(&format!("%%BoundingBox: 0 0 {} {}\n", w.ceil(), h.ceil()));
        out.push_str(&format!("%%HiResBoundingBox: 0 0 {w:.3} {h:.3}\n"));
        if self.format == VectorFormat::Ps {
            out.push_str("%%Pages: 1\n");
        }
        out.push_str("%%EndComments\n");
        if self.format == VectorFormat::Ps {
            out.push_str(&format!("%%Page: 1 1\n<< /PageSize [{w:.3} {h:.3}] >> setpagedevice\n"));
        }
        out.push_str("1 setlinejoin 1 setlinecap\n");

        for op in &self.ops {
            match op {
                Op::Stroke {
                    points,
                    color,
                    width,
                    closed,
                } => {
                    out.push_str(&format!("{} setrgbcolor {width:.3} setlinewidth\n", ps_rgb(*color)));
                    out.push_str(&path_commands(points, "moveto", "lineto"));
                    if *closed {
                        out.push_str("closepath ");
                    }
                    out.push_str("stroke\n");
                }
                Op::Fill { points, color } => {
                    out.push_str(&format!("{} setrgbcolor\n", ps_rgb(*color)));
                    out.push_str(&path_commands(points, "moveto", "lineto"));
                    out.push_str("closepath fill\n");
                }
                Op::Text {
                    text,
                    at,
                    offset,
                    size,
                    angle,
                    color,
                } => {
                    out.push_str(&format!(
                        "gsave {} setrgbcolor /Helvetica findfont {size:.3} scalefont setfont \
                         {:.3} {:.3} translate {angle:.1} rotate {:.3} {:.3} moveto ({}) show grestore\n",
                        ps_rgb(*color),
                        at.0,
                        at.1,
                        offset.0,
                        offset.1,
                        escape_string(text)
                    ));
                }
            }
        }

        out.push_str("showpage\n%%EOF\n");
        out
    }

    fn render_pdf(&self) -> Vec<u8> {
        let (w, h) = self.page_size();

        let mut content = String::new();
        content.push_str("1 j 1 J\n");
        for op in &self.ops {
            match op {
                Op::Stroke {
                    points,
                    color,
                    width,
                    closed,
                } => {
                    content.push_str(&format!("{} RG {width:.3} w\n", ps_rgb(*color)));
                    content.push_str(&path_commands(points, "m", "l"));
                    content.push_str(if *closed { "s\n" } else { "S\n" });
                }
                Op::Fill { points, color } => {
                    content.push_str(&format!("{} rg\n", ps_rgb(*color)));
                    content.push_str(&path_commands(points, "m", "l"));
                    content.push_str("h f\n");
                }
                Op::Text {
                    text,
                    at,
                    offset,
                    size,
                    angle,
                    color,
                } => {
                    let (sin, cos) = angle.to_radians().sin_cos();
                    content.push_str(&format!(
                        "BT {} rg /F1 {size:.3} Tf {cos:.4} {sin:.4} {:.4} {cos:.4} {:.3} {:.3} Tm \
                         {:.3} {:.3} Td ({}) Tj ET\n",
                        ps_rgb(*color),
                        -sin,
                        at.0,
                        at.1,
                        offset.0,
                        offset.1,
                        escape_string(text)
                    ));
                }
            }
        }

        // The EOL before `endstream` is not part of the stream data.
        let content = content.trim_end_matches('\n');
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {w:.3} {h:.3}] \
                 /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            ),
            format!(
                "<< /Length {} >>\nstream\n{content}\nendstream",
                content.len()
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];

        let mut out: Vec<u8> = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }

        let xref_at = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for off in offsets {
            xref.push_str(&format!("{off:010} 00000 n \n"));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        ));
        out.extend_from_slice(xref.as_bytes());
        out
    }
}

impl DrawingBackend for VectorBackend {
    type ErrorType = io::Error;

    fn get_size(&self) -> (u32, u32) {
        self.size
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<io::Error>> {
        Ok(())
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<io::Error>> {
        fs::write(&self.path, self.render()).map_err(DrawingErrorKind::DrawingError)
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<io::Error>> {
        let (x, y) = point;
        self.push_fill(&[(x, y), (x + 1, y), (x + 1, y + 1), (x, y + 1)], &color);
        Ok(())
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<io::Error>> {
        self.push_stroke(&[from, to], style, false);
        Ok(())
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<io::Error>> {
        let (x0, y0) = upper_left;
        let (x1, y1) = bottom_right;
        let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)];
        if fill {
            self.push_fill(&corners, style);
        } else {
            self.push_stroke(&corners, style, true);
        }
        Ok(())
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<io::Error>> {
        let coords: Vec<BackendCoord> = path.into_iter().collect();
        self.push_stroke(&coords, style, false);
        Ok(())
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<io::Error>> {
        let (cx, cy) = center;
        let r = radius as f64;
        let coords: Vec<BackendCoord> = (0..CIRCLE_SEGMENTS)
            .map(|i| {
                let t = i as f64 / CIRCLE_SEGMENTS as f64 * std::f64::consts::TAU;
                (
                    cx + (r * t.cos()).round() as i32,
                    cy + (r * t.sin()).round() as i32,
                )
            })
            .collect();
        if fill {
            self.push_fill(&coords, style);
        } else {
            self.push_stroke(&coords, style, true);
        }
        Ok(())
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<io::Error>> {
        let coords: Vec<BackendCoord> = vert.into_iter().collect();
        self.push_fill(&coords, style);
        Ok(())
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<io::Error>> {
        let color = style.color();
        if color.alpha == 0.0 || text.is_empty() {
            return Ok(());
        }

        let size = style.size() * self.scale;
        let width = text_width(text, size);
        let anchor = style.anchor();
        let dx = match anchor.h_pos {
            HPos::Left => 0.0,
            HPos::Center => -width / 2.0,
            HPos::Right => -width,
        };
        // Baseline offset below the anchor point, in text space (y up).
        let dy = match anchor.v_pos {
            VPos::Top => -0.75 * size,
            VPos::Center => -0.35 * size,
            VPos::Bottom => 0.0,
        };
        // Device rotations are clockwise with y down, page rotations are
        // counter-clockwise with y up.
        let angle = match style.transform() {
            FontTransform::None => 0.0,
            FontTransform::Rotate90 => -90.0,
            FontTransform::Rotate180 => 180.0,
            FontTransform::Rotate270 => 90.0,
        };

        self.ops.push(Op::Text {
            text: text.to_string(),
            at: self.to_page(pos),
            offset: (dx, dy),
            size,
            angle,
            color: Rgb::from_backend(color),
        });
        Ok(())
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<io::Error>> {
        Ok(estimate_text_box(text, style))
    }
}

/// Text extent in device pixels, from the font size alone.
fn estimate_text_box<TStyle: BackendTextStyle>(text: &str, style: &TStyle) -> (u32, u32) {
    let size = style.size();
    let (w, h) = (text_width(text, size).ceil() as u32, size.ceil() as u32);
    match style.transform() {
        FontTransform::Rotate90 | FontTransform::Rotate270 => (h, w),
        _ => (w, h),
    }
}

fn text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * CHAR_WIDTH_EM
}

fn ps_rgb(Rgb(r, g, b): Rgb) -> String {
    format!("{r:.3} {g:.3} {b:.3}")
}

fn path_commands(points: &[(f64, f64)], move_op: &str, line_op: &str) -> String {
    let mut out = String::new();
    for (i, (x, y)) in points.iter().enumerate() {
        let op = if i == 0 { move_op } else { line_op };
        out.push_str(&format!("{x:.3} {y:.3} {op} "));
    }
    out
}

/// Escape a string literal; characters outside printable ASCII become `?`.
fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            ' '..='~' => out.push(ch),
            _ => out.push('?'),
        }
    }
    out
}
