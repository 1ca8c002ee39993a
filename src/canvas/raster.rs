//! Raster surface over an RGBA pixel buffer.
//!
//! All painting is source-over compositing with straight alpha. Shapes get
//! cheap anti-aliasing: rects use exact pixel-overlap coverage, circles a
//! one-pixel distance ramp, polygons 2×2 supersampling.
//!
//! Shadows are rendered by blurring an alpha mask of the shape (Gaussian,
//! sigma = blur / 2, matching the HTML canvas definition) and compositing the
//! shadow color through it before the shape itself is painted.

use std::io::Cursor;
use std::sync::Arc;

use image::{GrayImage, ImageFormat, Luma, RgbaImage, imageops};
use rayon::prelude::*;
use tracing::debug;

use super::fonts::{FontSet, approximate_width};
use super::{Color, FontSpec, Paint, Shadow, Stroke, Surface, TextStyle};
use crate::error::StoryError;
use crate::geometry::{CANVAS_HEIGHT, CANVAS_WIDTH, Point, Rect};

/// Sub-pixel sample offsets for polygon coverage.
/// Image blits whose destination exceeds this many surface areas are
/// sampled per visible pixel instead of resized up front.
const MAX_RESAMPLE_FACTOR: f32 = 4.0;

const POLYGON_SAMPLES: [(f32, f32); 4] = [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)];

/// A drawing surface backed by an `RgbaImage`.
pub struct RasterSurface {
    image: RgbaImage,
    fonts: Option<Arc<FontSet>>,
}

impl RasterSurface {
    /// A transparent surface of the given size.
    pub fn new(width: u32, height: u32, fonts: Option<Arc<FontSet>>) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            fonts,
        }
    }

    /// A transparent 1080×1920 story canvas.
    pub fn story(fonts: Option<Arc<FontSet>>) -> Self {
        Self::new(CANVAS_WIDTH as u32, CANVAS_HEIGHT as u32, fonts)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Encode the current pixels as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, StoryError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| StoryError::Encode(format!("Failed to encode PNG: {}", e)))?;
        Ok(bytes)
    }

    /// Blend one color into a single pixel.
    fn blend_at(&mut self, x: i64, y: i64, color: Color, coverage: f32) {
        let (w, h) = self.image.dimensions();
        if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
            return;
        }
        let px = self.image.get_pixel_mut(x as u32, y as u32);
        blend_into(&mut px.0, color, coverage);
    }

    /// Composite a coverage mask in a solid color with its top-left at (left, top).
    fn composite_mask(
        &mut self,
        mask: &[f32],
        width: usize,
        height: usize,
        left: i64,
        top: i64,
        color: Color,
    ) {
        for my in 0..height {
            for mx in 0..width {
                let coverage = mask[my * width + mx];
                if coverage > 0.0 {
                    self.blend_at(left + mx as i64, top + my as i64, color, coverage);
                }
            }
        }
    }

    /// Paint a blurred, offset, tinted copy of `mask`.
    fn paint_shadow(
        &mut self,
        mask: &[f32],
        width: usize,
        height: usize,
        left: f32,
        top: f32,
        shadow: Shadow,
    ) {
        if shadow.color.a <= 0.0 {
            return;
        }

        let pad = (shadow.blur * 1.5).ceil().max(0.0) as usize;
        let mut gray = GrayImage::new((width + pad * 2) as u32, (height + pad * 2) as u32);
        for y in 0..height {
            for x in 0..width {
                let v = (mask[y * width + x].clamp(0.0, 1.0) * 255.0).round() as u8;
                gray.put_pixel((x + pad) as u32, (y + pad) as u32, Luma([v]));
            }
        }
        let blurred = if shadow.blur > 0.0 {
            imageops::blur(&gray, shadow.blur / 2.0)
        } else {
            gray
        };

        let origin_x = (left + shadow.offset_x).round() as i64 - pad as i64;
        let origin_y = (top + shadow.offset_y).round() as i64 - pad as i64;
        for (x, y, px) in blurred.enumerate_pixels() {
            let coverage = px.0[0] as f32 / 255.0;
            if coverage > 0.0 {
                self.blend_at(origin_x + x as i64, origin_y + y as i64, shadow.color, coverage);
            }
        }
    }

    /// Bilinear blit of the part of `image` that lands on the surface.
    ///
    /// Used when resampling the whole image to `dest` would allocate far
    /// more than the surface itself.
    fn sample_image(&mut self, image: &RgbaImage, dest: Rect) {
        let Some((x0, y0, x1, y1)) = self.pixel_span(dest) else {
            return;
        };
        let (src_w, src_h) = image.dimensions();
        let scale_x = src_w as f32 / dest.width;
        let scale_y = src_h as f32 / dest.height;
        let max_u = (src_w - 1) as f32;
        let max_v = (src_h - 1) as f32;

        for y in y0..y1 {
            let v = ((y as f32 + 0.5 - dest.y) * scale_y - 0.5).clamp(0.0, max_v);
            for x in x0..x1 {
                let u = ((x as f32 + 0.5 - dest.x) * scale_x - 0.5).clamp(0.0, max_u);
                let src = sample_bilinear(image, u, v);
                let color = Color::rgba(src[0], src[1], src[2], src[3] as f32 / 255.0);
                self.blend_at(x as i64, y as i64, color, 1.0);
            }
        }
    }

    /// Clip a float rect to integer pixel bounds on this surface.
    fn pixel_span(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let (w, h) = self.image.dimensions();
        let x0 = rect.x.floor().max(0.0);
        let y0 = rect.y.floor().max(0.0);
        let x1 = rect.right().ceil().min(w as f32);
        let y1 = rect.bottom().ceil().min(h as f32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn fill_rect(&mut self, rect: Rect, paint: Paint) {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.pixel_span(rect) else {
            return;
        };

        let row_bytes = self.image.width() as usize * 4;
        let buffer: &mut [u8] = &mut self.image;
        buffer
            .par_chunks_mut(row_bytes)
            .enumerate()
            .skip(y0 as usize)
            .take((y1 - y0) as usize)
            .for_each(|(y, row)| {
                let cov_y = overlap(y as f32, rect.y, rect.bottom());
                for x in x0..x1 {
                    let coverage = cov_y * overlap(x as f32, rect.x, rect.right());
                    if coverage <= 0.0 {
                        continue;
                    }
                    let color = match paint {
                        Paint::Solid(c) => c,
                        Paint::Linear(g) => g.color_at(Point::new(x as f32 + 0.5, y as f32 + 0.5)),
                    };
                    let i = x as usize * 4;
                    blend_into(&mut row[i..i + 4], color, coverage);
                }
            });
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        if radius <= 0.0 {
            return;
        }
        let bounds = Rect::new(
            center.x - radius - 1.0,
            center.y - radius - 1.0,
            radius * 2.0 + 2.0,
            radius * 2.0 + 2.0,
        );
        let Some((x0, y0, x1, y1)) = self.pixel_span(bounds) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - center.x;
                let dy = y as f32 + 0.5 - center.y;
                let coverage = (radius - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend_at(x as i64, y as i64, color, coverage);
                }
            }
        }
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color) {
        if points.len() < 3 {
            return;
        }
        let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let Some((x0, y0, x1, y1)) =
            self.pixel_span(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
        else {
            return;
        };

        for y in y0..y1 {
            for x in x0..x1 {
                let hits = POLYGON_SAMPLES
                    .iter()
                    .filter(|(sx, sy)| winding(points, Point::new(x as f32 + sx, y as f32 + sy)) != 0)
                    .count();
                if hits > 0 {
                    let coverage = hits as f32 / POLYGON_SAMPLES.len() as f32;
                    self.blend_at(x as i64, y as i64, color, coverage);
                }
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke) {
        let path = [
            Point::new(rect.x, rect.y),
            Point::new(rect.right(), rect.y),
            Point::new(rect.right(), rect.bottom()),
            Point::new(rect.x, rect.bottom()),
            Point::new(rect.x, rect.y),
        ];
        let segments = match stroke.dash {
            Some((on, off)) if on > 0.0 => dash_segments(&path, on, off.max(0.0)),
            _ => path.windows(2).map(|w| (w[0], w[1])).collect(),
        };
        let solid = Stroke::solid(stroke.color, stroke.width);
        for (from, to) in segments {
            self.stroke_line(from, to, solid);
        }
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: Stroke) {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len <= 0.0 || stroke.width <= 0.0 {
            return;
        }
        let nx = -dy / len * stroke.width / 2.0;
        let ny = dx / len * stroke.width / 2.0;
        let quad = [
            Point::new(from.x + nx, from.y + ny),
            Point::new(to.x + nx, to.y + ny),
            Point::new(to.x - nx, to.y - ny),
            Point::new(from.x - nx, from.y - ny),
        ];
        self.fill_polygon(&quad, stroke.color);
    }

    fn draw_image(&mut self, image: &RgbaImage, dest: Rect, shadow: Option<Shadow>) {
        let width = dest.width.round();
        let height = dest.height.round();
        if width < 1.0 || height < 1.0 || image.width() == 0 || image.height() == 0 {
            return;
        }
        let (surface_w, surface_h) = self.image.dimensions();
        if width * height > MAX_RESAMPLE_FACTOR * surface_w as f32 * surface_h as f32 {
            debug!(width, height, "oversized image dest, sampling visible pixels only");
            self.sample_image(image, Rect::new(dest.x.round(), dest.y.round(), width, height));
            return;
        }
        let (width, height) = (width as u32, height as u32);

        let resized;
        let scaled = if image.dimensions() == (width, height) {
            image
        } else {
            resized = imageops::resize(image, width, height, imageops::FilterType::Triangle);
            &resized
        };

        let left = dest.x.round();
        let top = dest.y.round();

        if let Some(shadow) = shadow {
            let mask: Vec<f32> = scaled.pixels().map(|p| p.0[3] as f32 / 255.0).collect();
            self.paint_shadow(&mask, width as usize, height as usize, left, top, shadow);
        }

        let (left, top) = (left as i64, top as i64);
        let Some((x0, y0, x1, y1)) = self.pixel_span(Rect::new(
            left as f32,
            top as f32,
            width as f32,
            height as f32,
        )) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let src = scaled.get_pixel((x as i64 - left) as u32, (y as i64 - top) as u32).0;
                let color = Color::rgba(src[0], src[1], src[2], src[3] as f32 / 255.0);
                self.blend_at(x as i64, y as i64, color, 1.0);
            }
        }
    }

    fn fill_text(&mut self, text: &str, at: Point, style: TextStyle) {
        let Some(fonts) = self.fonts.clone() else {
            debug!(text, "no font loaded, skipping text");
            return;
        };
        if text.is_empty() {
            return;
        }

        let mask = fonts.render(text, style.font);
        let left = style.align.left_edge(at.x, mask.width as f32);
        let top = at.y - mask.baseline;

        if let Some(shadow) = style.shadow {
            self.paint_shadow(&mask.data, mask.width, mask.height, left, top, shadow);
        }
        self.composite_mask(
            &mask.data,
            mask.width,
            mask.height,
            left.round() as i64,
            top.round() as i64,
            style.color,
        );
    }

    fn measure_text(&self, text: &str, font: FontSpec) -> f32 {
        match &self.fonts {
            Some(fonts) => fonts.measure(text, font),
            None => approximate_width(text, font),
        }
    }
}

/// Source-over blend of `color` at `coverage` into an RGBA8 pixel.
fn blend_into(px: &mut [u8], color: Color, coverage: f32) {
    let sa = (color.a * coverage).clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = px[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return;
    }
    let mix = |s: u8, d: u8| {
        let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    px[0] = mix(color.r, px[0]);
    px[1] = mix(color.g, px[1]);
    px[2] = mix(color.b, px[2]);
    px[3] = (out_a * 255.0).round() as u8;
}

/// Length of the overlap between pixel `[p, p+1)` and `[lo, hi)`.
#[inline]
/// Bilinear sample at continuous source coordinates (pixel centers at integers).
fn sample_bilinear(image: &RgbaImage, u: f32, v: f32) -> [u8; 4] {
    let (w, h) = image.dimensions();
    let x0 = u.floor() as u32;
    let y0 = v.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = u - x0 as f32;
    let fy = v - y0 as f32;

    let (a, b) = (image.get_pixel(x0, y0).0, image.get_pixel(x1, y0).0);
    let (c, d) = (image.get_pixel(x0, y1).0, image.get_pixel(x1, y1).0);
    let mut out = [0u8; 4];
    for i in 0..4 {
        let top = a[i] as f32 + (b[i] as f32 - a[i] as f32) * fx;
        let bottom = c[i] as f32 + (d[i] as f32 - c[i] as f32) * fx;
        out[i] = (top + (bottom - top) * fy).round() as u8;
    }
    out
}

fn overlap(p: f32, lo: f32, hi: f32) -> f32 {
    ((p + 1.0).min(hi) - p.max(lo)).clamp(0.0, 1.0)
}

/// Nonzero winding number of `p` with respect to a closed polygon.
fn winding(points: &[Point], p: Point) -> i32 {
    let mut wn = 0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let cross = (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y);
        if a.y <= p.y {
            if b.y > p.y && cross > 0.0 {
                wn += 1;
            }
        } else if b.y <= p.y && cross < 0.0 {
            wn -= 1;
        }
    }
    wn
}

/// Split a polyline into dash segments; the dash phase carries across corners.
fn dash_segments(path: &[Point], on: f32, off: f32) -> Vec<(Point, Point)> {
    let mut segments = Vec::new();
    let mut drawing = true;
    let mut remaining = on;

    for pair in path.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let len = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
        if len <= 0.0 {
            continue;
        }
        let at = |d: f32| Point::new(a.x + (b.x - a.x) * d / len, a.y + (b.y - a.y) * d / len);

        let mut pos = 0.0;
        while pos < len {
            let step = remaining.min(len - pos);
            if drawing {
                segments.push((at(pos), at(pos + step)));
            }
            pos += step;
            remaining -= step;
            if remaining <= 0.0 {
                drawing = !drawing;
                remaining = if drawing { on } else { off };
                if remaining <= 0.0 {
                    drawing = true;
                    remaining = on;
                }
            }
        }
    }
    segments
}
