//! Background patterns.
//!
//! Two sources of decorative backgrounds:
//!
//! - [`generate_pattern`]: a procedural fill. A diagonal gradient from the
//!   seed color to a 20% darker shade, overlaid with randomly placed
//!   translucent white circles or triangles. Output differs on every call.
//! - [`PatternLibrary`]: pre-made bitmaps keyed by [`BitmapPattern`], loaded
//!   from `{key}.png` files in a directory.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use rand::Rng;
use tracing::{debug, warn};

use super::style::{BitmapPattern, GeometricKind};
use crate::assets::decode_image;
use crate::canvas::{Color, LinearGradient, Paint, Surface};
use crate::geometry::{Point, Rect};

/// Brightness change applied to the seed color for the gradient end stop.
const DARKEN_PERCENT: f32 = -20.0;

const CIRCLE_COUNT: usize = 15;
const CIRCLE_ALPHA: f32 = 0.1;
const CIRCLE_RADIUS_MIN: f32 = 50.0;
const CIRCLE_RADIUS_MAX: f32 = 200.0;

const TRIANGLE_COUNT: usize = 12;
const TRIANGLE_ALPHA: f32 = 0.08;
const TRIANGLE_SIZE_MIN: f32 = 40.0;
const TRIANGLE_SIZE_MAX: f32 = 120.0;

/// Fill `surface` with a procedural pattern seeded by `seed`.
pub fn generate_pattern(surface: &mut dyn Surface, kind: GeometricKind, seed: Color) {
    generate_pattern_with(surface, kind, seed, &mut rand::rng());
}

/// [`generate_pattern`] with an explicit random source.
pub fn generate_pattern_with<R: Rng + ?Sized>(
    surface: &mut dyn Surface,
    kind: GeometricKind,
    seed: Color,
    rng: &mut R,
) {
    let (w, h) = surface.size();
    let (width, height) = (w as f32, h as f32);

    surface.fill_rect(
        Rect::new(0.0, 0.0, width, height),
        Paint::Linear(LinearGradient {
            from: Point::new(0.0, 0.0),
            to: Point::new(width, height),
            start: seed.with_alpha(1.0),
            end: seed.adjust_brightness(DARKEN_PERCENT).with_alpha(1.0),
        }),
    );

    match kind {
        GeometricKind::Circles => {
            let color = Color::WHITE.with_alpha(CIRCLE_ALPHA);
            for _ in 0..CIRCLE_COUNT {
                let center = Point::new(rng.random_range(0.0..width), rng.random_range(0.0..height));
                let radius = rng.random_range(CIRCLE_RADIUS_MIN..CIRCLE_RADIUS_MAX);
                surface.fill_circle(center, radius, color);
            }
        }
        GeometricKind::Triangles => {
            let color = Color::WHITE.with_alpha(TRIANGLE_ALPHA);
            for _ in 0..TRIANGLE_COUNT {
                let x = rng.random_range(0.0..width);
                let y = rng.random_range(0.0..height);
                let size = rng.random_range(TRIANGLE_SIZE_MIN..TRIANGLE_SIZE_MAX);
                // Isosceles, apex up
                let points = [
                    Point::new(x, y - size),
                    Point::new(x - size, y + size),
                    Point::new(x + size, y + size),
                ];
                surface.fill_polygon(&points, color);
            }
        }
    }
}

/// Decoded bitmap backgrounds.
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    bitmaps: HashMap<BitmapPattern, Arc<RgbaImage>>,
}

impl PatternLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every known pattern present in `dir`; missing or corrupt files
    /// are logged and left out.
    pub fn load_dir(dir: &Path) -> Self {
        let mut library = Self::new();
        for pattern in BitmapPattern::ALL {
            let path = dir.join(pattern.file_name());
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "pattern bitmap unavailable");
                    continue;
                }
            };
            match decode_image(&bytes, pattern.key()) {
                Ok(image) => {
                    debug!(pattern = pattern.key(), "loaded pattern bitmap");
                    library.insert(pattern, image);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "pattern bitmap skipped"),
            }
        }
        library
    }

    pub fn insert(&mut self, pattern: BitmapPattern, image: RgbaImage) {
        self.bitmaps.insert(pattern, Arc::new(image));
    }

    pub fn get(&self, pattern: BitmapPattern) -> Option<Arc<RgbaImage>> {
        self.bitmaps.get(&pattern).cloned()
    }

    pub fn contains(&self, pattern: BitmapPattern) -> bool {
        self.bitmaps.contains_key(&pattern)
    }

    /// Keys that have a loaded bitmap, in declaration order.
    pub fn available(&self) -> Vec<BitmapPattern> {
        BitmapPattern::ALL
            .into_iter()
            .filter(|p| self.bitmaps.contains_key(p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DisplayList, DrawOp};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_circles_layout() {
        let mut list = DisplayList::default();
        let mut rng = StdRng::seed_from_u64(7);
        let seed = Color::rgb(100, 200, 250);
        generate_pattern_with(&mut list, GeometricKind::Circles, seed, &mut rng);

        assert_eq!(list.len(), 1 + CIRCLE_COUNT);
        match &list.ops()[0] {
            DrawOp::FillRect {
                rect,
                paint: Paint::Linear(g),
            } => {
                assert_eq!(*rect, Rect::canvas());
                assert_eq!(g.start, seed);
                assert_eq!(g.end, Color::rgb(80, 160, 200));
                assert_eq!(g.to, Point::new(1080.0, 1920.0));
            }
            other => panic!("expected gradient fill, got {:?}", other),
        }
        for op in &list.ops()[1..] {
            match op {
                DrawOp::FillCircle {
                    center,
                    radius,
                    color,
                } => {
                    assert!((CIRCLE_RADIUS_MIN..CIRCLE_RADIUS_MAX).contains(radius));
                    assert!((0.0..1080.0).contains(&center.x));
                    assert!((0.0..1920.0).contains(&center.y));
                    assert_eq!(color.a, CIRCLE_ALPHA);
                }
                other => panic!("expected circle, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_triangles_are_isosceles_apex_up() {
        let mut list = DisplayList::default();
        let mut rng = StdRng::seed_from_u64(11);
        generate_pattern_with(&mut list, GeometricKind::Triangles, Color::BLACK, &mut rng);

        assert_eq!(list.len(), 1 + TRIANGLE_COUNT);
        for op in &list.ops()[1..] {
            let DrawOp::FillPolygon { points, color } = op else {
                panic!("expected polygon, got {:?}", op);
            };
            assert_eq!(points.len(), 3);
            assert_eq!(color.a, TRIANGLE_ALPHA);
            let (apex, left, right) = (points[0], points[1], points[2]);
            let size = apex.x - left.x;
            assert!((TRIANGLE_SIZE_MIN..TRIANGLE_SIZE_MAX).contains(&size));
            assert!(apex.y < left.y);
            assert_eq!(left.y, right.y);
            assert!((right.x - apex.x - size).abs() < 1e-3);
        }
    }

    #[test]
    fn test_unseeded_calls_differ() {
        let mut a = DisplayList::default();
        let mut b = DisplayList::default();
        generate_pattern(&mut a, GeometricKind::Circles, Color::BLACK);
        generate_pattern(&mut b, GeometricKind::Circles, Color::BLACK);
        assert_ne!(a.ops(), b.ops());
    }

    #[test]
    fn test_library_missing_dir_is_empty() {
        let library = PatternLibrary::load_dir(Path::new("/nonexistent/story-patterns"));
        assert!(library.available().is_empty());
        assert!(library.get(BitmapPattern::PurpleWave).is_none());
    }

    #[test]
    fn test_library_insert() {
        let mut library = PatternLibrary::new();
        library.insert(BitmapPattern::PurpleWave, RgbaImage::new(2, 2));
        assert!(library.contains(BitmapPattern::PurpleWave));
        assert_eq!(library.available(), vec![BitmapPattern::PurpleWave]);
    }
}
