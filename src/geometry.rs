//! # Geometry and Placement Constraints
//!
//! Canvas-space rectangles for the two movable overlays and the rules that
//! keep them on the story canvas.
//!
//! ## Canvas
//!
//! ```text
//!   (0,0) ─────────────── 1080 ─┐
//!     │   header text @ y=150   │
//!     │                         │
//!     │  floor plan: y ≥ 200    │
//!     │                         │
//!     │   financial card        │
//!     │   bottom strip          │
//!     └──────────────────── 1920
//! ```
//!
//! ## Bounds
//!
//! | Rect | Min size | x | y | Resize limit |
//! |------|----------|---|---|--------------|
//! | Floor plan | 100×75 | [0, 1080−w] | [200, 1920−h] | w ≤ 1070−x, h ≤ 1910−y |
//! | Background | 400×300 | [−200, 1280] | [0, 1920−h] | w ≤ 1480−x, h ≤ 2220−y |
//!
//! All clamps are written as `max(lo, min(hi, v))`, so when a range
//! collapses (`hi < lo`) the lower bound wins. This keeps every clamp
//! idempotent for any finite or infinite input.

use serde::{Deserialize, Serialize};

/// Logical canvas width in pixels.
pub const CANVAS_WIDTH: f32 = 1080.0;

/// Logical canvas height in pixels.
pub const CANVAS_HEIGHT: f32 = 1920.0;

/// Side length of the square resize handle at a rect's bottom-right corner.
pub const HANDLE_SIZE: f32 = 20.0;

/// A point in canvas (or screen) space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in canvas pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The full story canvas.
    pub const fn canvas() -> Self {
        Self::new(0.0, 0.0, CANVAS_WIDTH, CANVAS_HEIGHT)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Same size, new top-left corner.
    pub fn with_origin(self, x: f32, y: f32) -> Self {
        Self { x, y, ..self }
    }

    /// Same top-left corner, new size.
    pub fn with_size(self, width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..self
        }
    }

    /// Shrink by `amount` on every side.
    pub fn inset(self, amount: f32) -> Self {
        Self::new(
            self.x + amount,
            self.y + amount,
            self.width - amount * 2.0,
            self.height - amount * 2.0,
        )
    }
}

/// Which of the two movable overlays a rect belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementKind {
    FloorPlan,
    Background,
}

impl PlacementKind {
    /// Minimum (width, height).
    pub fn min_size(self) -> (f32, f32) {
        match self {
            PlacementKind::FloorPlan => (100.0, 75.0),
            PlacementKind::Background => (400.0, 300.0),
        }
    }

    /// Rect used when the overlay's image is first supplied.
    pub fn default_rect(self) -> Rect {
        match self {
            PlacementKind::FloorPlan => Rect::new(340.0, 650.0, 400.0, 300.0),
            PlacementKind::Background => Rect::new(0.0, 150.0, 1080.0, 1350.0),
        }
    }

    /// Right and bottom edges a resize may reach.
    fn resize_limits(self) -> (f32, f32) {
        match self {
            PlacementKind::FloorPlan => (CANVAS_WIDTH - 10.0, CANVAS_HEIGHT - 10.0),
            PlacementKind::Background => (CANVAS_WIDTH + 400.0, CANVAS_HEIGHT + 300.0),
        }
    }

    /// Largest (width, height) a resize can produce from the lowest origin.
    pub fn max_size(self) -> (f32, f32) {
        let (limit_x, limit_y) = self.resize_limits();
        let (lo_x, lo_y) = self.origin_floor();
        (limit_x - lo_x, limit_y - lo_y)
    }

    fn origin_floor(self) -> (f32, f32) {
        match self {
            PlacementKind::FloorPlan => (0.0, 200.0),
            PlacementKind::Background => (-200.0, 0.0),
        }
    }

    fn origin_ceiling(self) -> (f32, f32) {
        match self {
            PlacementKind::FloorPlan => (CANVAS_WIDTH, CANVAS_HEIGHT),
            PlacementKind::Background => (CANVAS_WIDTH + 200.0, CANVAS_HEIGHT),
        }
    }

    /// Pull a rect into the envelope that drags and resizes stay within.
    ///
    /// Anything the placement controller can produce passes through
    /// unchanged. Non-positive or NaN sizes become the minimum and sizes
    /// are capped at [`max_size`](Self::max_size).
    pub fn bound(self, rect: Rect) -> Rect {
        let (min_w, min_h) = self.min_size();
        let (max_w, max_h) = self.max_size();
        let (lo_x, lo_y) = self.origin_floor();
        let (hi_x, hi_y) = self.origin_ceiling();
        let width = if rect.width > 0.0 { rect.width.min(max_w) } else { min_w };
        let height = if rect.height > 0.0 { rect.height.min(max_h) } else { min_h };
        Rect::new(
            clamp_range(rect.x, lo_x, hi_x),
            clamp_range(rect.y, lo_y, hi_y),
            width,
            height,
        )
    }

    /// True when [`bound`](Self::bound) would leave `rect` alone.
    pub fn in_bounds(self, rect: Rect) -> bool {
        self.bound(rect) == rect
    }

    /// Clamp the top-left corner only; size is left untouched.
    pub fn clamp_position(self, rect: Rect) -> Rect {
        let (lo_x, lo_y) = self.origin_floor();
        let x = match self {
            PlacementKind::FloorPlan => clamp_range(rect.x, lo_x, CANVAS_WIDTH - rect.width),
            PlacementKind::Background => clamp_range(rect.x, lo_x, CANVAS_WIDTH + 200.0),
        };
        let y = clamp_range(rect.y, lo_y, CANVAS_HEIGHT - rect.height);
        rect.with_origin(x, y)
    }

    /// Enforce the size range, then the position bounds.
    pub fn clamp(self, rect: Rect) -> Rect {
        let (min_w, min_h) = self.min_size();
        let (max_w, max_h) = self.max_size();
        let sized = rect.with_size(
            rect.width.max(min_w).min(max_w),
            rect.height.max(min_h).min(max_h),
        );
        self.clamp_position(sized)
    }

    /// Resize so the bottom-right corner follows `pointer`.
    ///
    /// The origin never moves. Size is floored at the minimum, then capped
    /// at the canvas-derived limit for each axis.
    pub fn resize_to(self, rect: Rect, pointer: Point) -> Rect {
        let (min_w, min_h) = self.min_size();
        let (limit_x, limit_y) = self.resize_limits();
        let width = (pointer.x - rect.x).max(min_w).min(limit_x - rect.x);
        let height = (pointer.y - rect.y).max(min_h).min(limit_y - rect.y);
        rect.with_size(width, height)
    }
}

/// Clamp a floor-plan rect to its size and position bounds.
pub fn clamp_floor_plan(rect: Rect) -> Rect {
    PlacementKind::FloorPlan.clamp(rect)
}

/// Clamp a background rect to its size and position bounds.
pub fn clamp_background(rect: Rect) -> Rect {
    PlacementKind::Background.clamp(rect)
}

/// Inclusive containment: points on the edge are inside.
pub fn hit_test(point: Point, rect: Rect) -> bool {
    point.x >= rect.x && point.x <= rect.right() && point.y >= rect.y && point.y <= rect.bottom()
}

/// The resize handle square anchored at the rect's bottom-right corner.
pub fn handle_rect(rect: Rect) -> Rect {
    Rect::new(
        rect.right() - HANDLE_SIZE,
        rect.bottom() - HANDLE_SIZE,
        HANDLE_SIZE,
        HANDLE_SIZE,
    )
}

/// Inclusive containment in the rect's resize handle.
pub fn hit_test_handle(point: Point, rect: Rect) -> bool {
    hit_test(point, handle_rect(rect))
}

/// Aspect-preserving containment of an image inside a box.
///
/// Returns the image's rect relative to the box's top-left corner: scaled to
/// fill the tighter axis and centered on the other.
pub fn fit_contain(image_width: f32, image_height: f32, box_width: f32, box_height: f32) -> Rect {
    if image_width <= 0.0 || image_height <= 0.0 || box_width <= 0.0 || box_height <= 0.0 {
        return Rect::default();
    }

    let image_aspect = image_width / image_height;
    let box_aspect = box_width / box_height;

    if image_aspect > box_aspect {
        // Wider than the box: full width, letterboxed vertically
        let height = box_width / image_aspect;
        Rect::new(0.0, (box_height - height) / 2.0, box_width, height)
    } else {
        let width = box_height * image_aspect;
        Rect::new((box_width - width) / 2.0, 0.0, width, box_height)
    }
}

/// `max(lo, min(hi, v))`: the lower bound wins when the range is empty.
#[inline]
fn clamp_range(value: f32, lo: f32, hi: f32) -> f32 {
    value.min(hi).max(lo)
}
