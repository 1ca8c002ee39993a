//! TrueType font loading and text rasterization.
//!
//! Renders text to an anti-aliased coverage buffer using ab_glyph. The raster
//! surface composites that buffer (and a blurred copy for shadows) onto the
//! story canvas.
//!
//! Fonts are loaded at startup from explicit paths or, failing that, from a
//! short list of common system locations. The story text is Cyrillic, so the
//! chosen face must cover it; DejaVu Sans and Noto Sans both do.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::{Font, FontArc, ScaleFont};
use tracing::{debug, warn};

use super::FontSpec;
use crate::error::StoryError;

/// System locations tried when no font path is configured: (regular, bold).
const SYSTEM_CANDIDATES: &[(&str, &str)] = &[
    (
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/noto/NotoSans-Bold.ttf",
    ),
    (
        "/Library/Fonts/Arial Unicode.ttf",
        "/Library/Fonts/Arial Unicode.ttf",
    ),
];

/// Regular and bold faces used for all story text.
#[derive(Clone)]
pub struct FontSet {
    regular: FontArc,
    bold: FontArc,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet").finish_non_exhaustive()
    }
}

/// Rendered text as an anti-aliased coverage buffer.
pub struct TextMask {
    pub width: usize,
    pub height: usize,
    /// Distance from the top of the buffer to the baseline.
    pub baseline: f32,
    /// Coverage values: 0.0 = empty, 1.0 = fully inked.
    pub data: Vec<f32>,
}

impl FontSet {
    /// Build from in-memory font files.
    pub fn from_bytes(regular: Vec<u8>, bold: Vec<u8>) -> Result<Self, StoryError> {
        let regular = FontArc::try_from_vec(regular)
            .map_err(|e| StoryError::Font(format!("Invalid regular font: {}", e)))?;
        let bold = FontArc::try_from_vec(bold)
            .map_err(|e| StoryError::Font(format!("Invalid bold font: {}", e)))?;
        Ok(Self { regular, bold })
    }

    /// Load both faces from disk.
    pub fn from_files(regular: &Path, bold: &Path) -> Result<Self, StoryError> {
        let read = |path: &Path| {
            std::fs::read(path).map_err(|e| {
                StoryError::Font(format!("Failed to read {}: {}", path.display(), e))
            })
        };
        Self::from_bytes(read(regular)?, read(bold)?)
    }

    /// Load configured fonts, falling back to well-known system fonts.
    ///
    /// A configured regular face without a bold face is used for both.
    /// Returns `None` (with a warning) when nothing usable is found; text is
    /// then measured approximately and not drawn.
    pub fn discover(regular: Option<&Path>, bold: Option<&Path>) -> Option<Arc<Self>> {
        if let Some(regular) = regular {
            let bold = bold.unwrap_or(regular);
            match Self::from_files(regular, bold) {
                Ok(fonts) => return Some(Arc::new(fonts)),
                Err(e) => warn!(error = %e, "configured fonts unusable, trying system fonts"),
            }
        }

        for (regular, bold) in SYSTEM_CANDIDATES {
            let (regular, bold) = (PathBuf::from(regular), PathBuf::from(bold));
            if !regular.exists() || !bold.exists() {
                continue;
            }
            if let Ok(fonts) = Self::from_files(&regular, &bold) {
                debug!(path = %regular.display(), "using system font");
                return Some(Arc::new(fonts));
            }
        }

        warn!("no TrueType font found; story text will not be drawn");
        None
    }

    fn face(&self, bold: bool) -> &FontArc {
        if bold { &self.bold } else { &self.regular }
    }

    /// Advance width of `text` including kerning.
    pub fn measure(&self, text: &str, spec: FontSpec) -> f32 {
        let font = self.face(spec.bold);
        let scaled = font.as_scaled(spec.size);
        let mut width = 0.0;
        let mut previous = None;
        for ch in text.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }

    /// Rasterize `text` into a coverage buffer.
    pub fn render(&self, text: &str, spec: FontSpec) -> TextMask {
        let font = self.face(spec.bold);
        let scaled = font.as_scaled(spec.size);

        // Layout: compute glyph positions
        let mut glyphs = Vec::new();
        let mut caret_x = 0.0f32;
        let mut previous = None;
        for ch in text.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = previous {
                caret_x += scaled.kern(prev, id);
            }
            glyphs.push((id, caret_x));
            caret_x += scaled.h_advance(id);
            previous = Some(id);
        }

        let width = (caret_x.ceil() as usize).max(1);
        let ascent = scaled.ascent();
        let height = ((ascent - scaled.descent()).ceil() as usize).max(1);
        let mut data = vec![0.0f32; width * height];

        for (id, glyph_x) in glyphs {
            let glyph = id.with_scale_and_position(spec.size, ab_glyph::point(glyph_x, ascent));
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    let x = px as i32 + bounds.min.x as i32;
                    let y = py as i32 + bounds.min.y as i32;
                    if x >= 0 && x < width as i32 && y >= 0 && y < height as i32 {
                        let idx = y as usize * width + x as usize;
                        data[idx] = (data[idx] + coverage).min(1.0);
                    }
                });
            }
        }

        TextMask {
            width,
            height,
            baseline: ascent,
            data,
        }
    }
}

/// Width estimate used when no font is available.
///
/// Roughly the average advance of a sans-serif face; bold runs a bit wider.
pub fn approximate_width(text: &str, spec: FontSpec) -> f32 {
    let per_char = if spec.bold { 0.6 } else { 0.55 };
    text.chars().count() as f32 * spec.size * per_char
}
