//! # Display List
//!
//! A [`Surface`] that paints nothing and records every call as a [`DrawOp`].
//!
//! ```text
//! compositor::render ──► DisplayList ──► [FillRect, DrawImage, FillText, ...]
//! ```
//!
//! The list is what the story looks like structurally: which layers were
//! drawn, in what order, where, and with which text. Tests assert against it
//! directly instead of sampling pixels.

use image::RgbaImage;

use super::fonts::approximate_width;
use super::{Color, FontSpec, Paint, Shadow, Stroke, Surface, TextStyle};
use crate::geometry::{CANVAS_HEIGHT, CANVAS_WIDTH, Point, Rect};

/// A single recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect {
        rect: Rect,
        paint: Paint,
    },
    FillCircle {
        center: Point,
        radius: f32,
        color: Color,
    },
    FillPolygon {
        points: Vec<Point>,
        color: Color,
    },
    StrokeRect {
        rect: Rect,
        stroke: Stroke,
    },
    StrokeLine {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    /// Image pixels are not kept; only the source size.
    DrawImage {
        source_size: (u32, u32),
        dest: Rect,
        shadow: Option<Shadow>,
    },
    FillText {
        text: String,
        at: Point,
        style: TextStyle,
    },
}

/// Recording surface.
#[derive(Debug, Clone)]
pub struct DisplayList {
    width: u32,
    height: u32,
    ops: Vec<DrawOp>,
}

impl Default for DisplayList {
    fn default() -> Self {
        Self::new(CANVAS_WIDTH as u32, CANVAS_HEIGHT as u32)
    }
}

impl DisplayList {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// All text runs, in paint order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The first text op whose content equals `text`.
    pub fn find_text(&self, text: &str) -> Option<&DrawOp> {
        self.ops
            .iter()
            .find(|op| matches!(op, DrawOp::FillText { text: t, .. } if t == text))
    }

    /// Destination rects of all image blits, in paint order.
    pub fn image_dests(&self) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::DrawImage { dest, .. } => Some(*dest),
                _ => None,
            })
            .collect()
    }
}

impl Surface for DisplayList {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, rect: Rect, paint: Paint) {
        self.ops.push(DrawOp::FillRect { rect, paint });
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        self.ops.push(DrawOp::FillCircle {
            center,
            radius,
            color,
        });
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color) {
        self.ops.push(DrawOp::FillPolygon {
            points: points.to_vec(),
            color,
        });
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke) {
        self.ops.push(DrawOp::StrokeRect { rect, stroke });
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.ops.push(DrawOp::StrokeLine { from, to, stroke });
    }

    fn draw_image(&mut self, image: &RgbaImage, dest: Rect, shadow: Option<Shadow>) {
        self.ops.push(DrawOp::DrawImage {
            source_size: image.dimensions(),
            dest,
            shadow,
        });
    }

    fn fill_text(&mut self, text: &str, at: Point, style: TextStyle) {
        self.ops.push(DrawOp::FillText {
            text: text.to_string(),
            at,
            style,
        });
    }

    fn measure_text(&self, text: &str, font: FontSpec) -> f32 {
        approximate_width(text, font)
    }
}
