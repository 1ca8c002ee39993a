//! # Drawing Surfaces
//!
//! The compositor never touches pixels directly. It paints through the
//! [`Surface`] trait, a small canvas-like API:
//!
//! | Operation | Purpose |
//! |-----------|---------|
//! | `fill_rect` | Solid and linear-gradient fills |
//! | `fill_circle` / `fill_polygon` | Geometric pattern motifs |
//! | `stroke_rect` / `stroke_line` | Editing borders and handle glyphs |
//! | `draw_image` | Scaled image blit, optional drop shadow |
//! | `fill_text` / `measure_text` | Labels with alignment and shadow |
//!
//! Two implementations ship with the crate:
//!
//! - [`RasterSurface`]: paints into an `image::RgbaImage`, text via `ab_glyph`
//! - [`DisplayList`]: records every call as a [`DrawOp`] for inspection
//!
//! ```text
//! Scene ──► compositor::render ──► &mut dyn Surface
//!                                     ├─ RasterSurface ──► PNG
//!                                     └─ DisplayList   ──► Vec<DrawOp>
//! ```

pub mod color;
pub mod display_list;
pub mod fonts;
pub mod raster;

pub use color::Color;
pub use display_list::{DisplayList, DrawOp};
pub use fonts::FontSet;
pub use raster::RasterSurface;

use image::RgbaImage;

use crate::geometry::{Point, Rect};

/// Two-stop linear gradient between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearGradient {
    pub from: Point,
    pub to: Point,
    pub start: Color,
    pub end: Color,
}

impl LinearGradient {
    /// Color at the projection of `p` onto the gradient axis.
    pub fn color_at(&self, p: Point) -> Color {
        let dx = self.to.x - self.from.x;
        let dy = self.to.y - self.from.y;
        let len_sq = dx * dx + dy * dy;
        let t = if len_sq > 0.0 {
            (((p.x - self.from.x) * dx + (p.y - self.from.y) * dy) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color {
            r: lerp(self.start.r, self.end.r),
            g: lerp(self.start.g, self.end.g),
            b: lerp(self.start.b, self.end.b),
            a: self.start.a + (self.end.a - self.start.a) * t,
        }
    }
}

/// How a filled area is colored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Solid(Color),
    Linear(LinearGradient),
}

/// Line style for strokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
    /// `(on, off)` dash lengths; `None` draws a solid line.
    pub dash: Option<(f32, f32)>,
}

impl Stroke {
    pub const fn solid(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }

    pub const fn dashed(color: Color, width: f32, on: f32, off: f32) -> Self {
        Self {
            color,
            width,
            dash: Some((on, off)),
        }
    }
}

/// Drop shadow painted beneath an image or text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: Color,
    /// Blur radius in pixels (Gaussian sigma is half of this).
    pub blur: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Shadow {
    pub const fn soft(color: Color, blur: f32) -> Self {
        Self {
            color,
            blur,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    pub const fn offset(color: Color, blur: f32, offset_x: f32, offset_y: f32) -> Self {
        Self {
            color,
            blur,
            offset_x,
            offset_y,
        }
    }
}

/// Font weight and pixel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub size: f32,
    pub bold: bool,
}

impl FontSpec {
    pub const fn regular(size: f32) -> Self {
        Self { size, bold: false }
    }

    pub const fn bold(size: f32) -> Self {
        Self { size, bold: true }
    }
}

/// Horizontal anchoring of a text run relative to its x coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// Left edge of a run of `width` anchored at `x`.
    pub fn left_edge(self, x: f32, width: f32) -> f32 {
        match self {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::Right => x - width,
        }
    }
}

/// Everything needed to place a text run; `y` is the alphabetic baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: FontSpec,
    pub color: Color,
    pub align: TextAlign,
    pub shadow: Option<Shadow>,
}

impl TextStyle {
    pub const fn new(font: FontSpec, color: Color) -> Self {
        Self {
            font,
            color,
            align: TextAlign::Left,
            shadow: None,
        }
    }

    pub const fn align(self, align: TextAlign) -> Self {
        Self { align, ..self }
    }

    pub const fn shadow(self, shadow: Shadow) -> Self {
        Self {
            shadow: Some(shadow),
            ..self
        }
    }
}

/// A mutable 2D drawing target.
pub trait Surface {
    /// Pixel dimensions (width, height).
    fn size(&self) -> (u32, u32);

    fn fill_rect(&mut self, rect: Rect, paint: Paint);

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color);

    /// Fill a closed polygon (nonzero winding).
    fn fill_polygon(&mut self, points: &[Point], color: Color);

    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke);

    fn stroke_line(&mut self, from: Point, to: Point, stroke: Stroke);

    /// Draw `image` scaled into `dest`.
    fn draw_image(&mut self, image: &RgbaImage, dest: Rect, shadow: Option<Shadow>);

    /// Draw a text run with its baseline at `at.y`.
    fn fill_text(&mut self, text: &str, at: Point, style: TextStyle);

    /// Advance width of `text` in pixels.
    fn measure_text(&self, text: &str, font: FontSpec) -> f32;
}
