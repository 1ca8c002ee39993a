//! # Interactive Placement
//!
//! Pointer-driven drag and resize of the floor-plan and background rects.
//!
//! ## State machine
//!
//! ```text
//!                 pointer_down on ...
//!        ┌──────── floor-plan handle ──────► ResizingFloorPlan ────┐
//!        ├──────── background handle ──────► ResizingBackground ───┤
//!  Idle ─┼──────── floor-plan body ────────► DraggingFloorPlan ────┼─ pointer_up /
//!        └──────── background body ────────► DraggingBackground ───┘  pointer_leave
//!   ▲                                                              │
//!   └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Hit tests run in the priority order shown. A rect whose image is absent
//! is never hit.
//!
//! ## Reporting
//!
//! Every rect change restarts a 100 ms [`Debouncer`]. Once it elapses,
//! [`PlacementController::poll`] returns a [`Placements`] snapshot and hands
//! it to the observer, if one is registered. A burst of moves yields one
//! report.

pub mod debounce;

pub use debounce::{Debouncer, REPORT_QUIET_PERIOD};

use std::fmt;
use std::time::Instant;

use tracing::trace;

use crate::geometry::{
    CANVAS_HEIGHT, CANVAS_WIDTH, PlacementKind, Point, Rect, hit_test, hit_test_handle,
};

/// Current gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    Idle,
    /// `grab` is the press point relative to the rect's top-left.
    DraggingFloorPlan { grab: Point },
    ResizingFloorPlan,
    DraggingBackground { grab: Point },
    ResizingBackground,
}

/// Pointer glyph to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorGlyph {
    #[default]
    Default,
    Move,
    Resize,
}

impl CursorGlyph {
    /// CSS cursor name.
    pub fn css(self) -> &'static str {
        match self {
            CursorGlyph::Default => "default",
            CursorGlyph::Move => "move",
            CursorGlyph::Resize => "nw-resize",
        }
    }
}

/// Maps element-local screen coordinates to canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenMapping {
    /// Element's top-left on screen.
    pub left: f32,
    pub top: f32,
    /// Element's rendered size on screen.
    pub displayed_width: f32,
    pub displayed_height: f32,
}

impl Default for ScreenMapping {
    /// Canvas shown at its logical size at the origin.
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            displayed_width: CANVAS_WIDTH,
            displayed_height: CANVAS_HEIGHT,
        }
    }
}

impl ScreenMapping {
    pub fn new(left: f32, top: f32, displayed_width: f32, displayed_height: f32) -> Self {
        Self {
            left,
            top,
            displayed_width,
            displayed_height,
        }
    }

    pub fn to_canvas(&self, screen: Point) -> Point {
        let scale = |logical: f32, displayed: f32| {
            if displayed > 0.0 { logical / displayed } else { 1.0 }
        };
        Point::new(
            (screen.x - self.left) * scale(CANVAS_WIDTH, self.displayed_width),
            (screen.y - self.top) * scale(CANVAS_HEIGHT, self.displayed_height),
        )
    }
}

/// Snapshot of both rects; `None` until the rect is first activated.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Placements {
    pub floor_plan: Option<Rect>,
    pub background: Option<Rect>,
}

impl Placements {
    pub fn get(&self, kind: PlacementKind) -> Option<Rect> {
        match kind {
            PlacementKind::FloorPlan => self.floor_plan,
            PlacementKind::Background => self.background,
        }
    }
}

type Observer = Box<dyn FnMut(Placements) + Send>;

/// Owns both placement rects and turns pointer events into edits.
pub struct PlacementController {
    placements: Placements,
    floor_plan_present: bool,
    background_present: bool,
    state: Interaction,
    cursor: CursorGlyph,
    mapping: ScreenMapping,
    debounce: Debouncer,
    observer: Option<Observer>,
}

impl fmt::Debug for PlacementController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlacementController")
            .field("placements", &self.placements)
            .field("floor_plan_present", &self.floor_plan_present)
            .field("background_present", &self.background_present)
            .field("state", &self.state)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl Default for PlacementController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementController {
    pub fn new() -> Self {
        Self {
            placements: Placements::default(),
            floor_plan_present: false,
            background_present: false,
            state: Interaction::Idle,
            cursor: CursorGlyph::Default,
            mapping: ScreenMapping::default(),
            debounce: Debouncer::default(),
            observer: None,
        }
    }

    /// Register the listener for debounced reports.
    pub fn set_observer(&mut self, observer: impl FnMut(Placements) + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn set_mapping(&mut self, mapping: ScreenMapping) {
        self.mapping = mapping;
    }

    pub fn state(&self) -> Interaction {
        self.state
    }

    pub fn cursor(&self) -> CursorGlyph {
        self.cursor
    }

    pub fn placements(&self) -> Placements {
        self.placements
    }

    pub fn rect(&self, kind: PlacementKind) -> Option<Rect> {
        self.placements.get(kind)
    }

    pub fn is_present(&self, kind: PlacementKind) -> bool {
        match kind {
            PlacementKind::FloorPlan => self.floor_plan_present,
            PlacementKind::Background => self.background_present,
        }
    }

    /// Mark whether a rect's image exists.
    ///
    /// The first time an image is supplied its rect takes the default value.
    pub fn set_present(&mut self, kind: PlacementKind, present: bool, now: Instant) {
        match kind {
            PlacementKind::FloorPlan => self.floor_plan_present = present,
            PlacementKind::Background => self.background_present = present,
        }
        if present && self.rect(kind).is_none() {
            self.store(kind, kind.default_rect(), now);
        }
        if !present && self.state_targets(kind) {
            self.release();
        }
    }

    /// Replace both rects (e.g. from a saved template).
    ///
    /// Rects a gesture could have produced are kept verbatim; anything
    /// else is pulled in with [`PlacementKind::bound`].
    pub fn restore(&mut self, placements: Placements, now: Instant) {
        self.state = Interaction::Idle;
        self.cursor = CursorGlyph::Default;
        self.placements = Placements {
            floor_plan: placements.floor_plan.map(|r| PlacementKind::FloorPlan.bound(r)),
            background: placements.background.map(|r| PlacementKind::Background.bound(r)),
        };
        self.debounce.touch(now);
    }

    /// Start a gesture at `screen`; returns the new state.
    pub fn pointer_down(&mut self, screen: Point) -> Interaction {
        let p = self.mapping.to_canvas(screen);

        self.state = if self.hits_handle(PlacementKind::FloorPlan, p) {
            Interaction::ResizingFloorPlan
        } else if self.hits_handle(PlacementKind::Background, p) {
            Interaction::ResizingBackground
        } else if let Some(rect) = self.hit_body(PlacementKind::FloorPlan, p) {
            Interaction::DraggingFloorPlan {
                grab: Point::new(p.x - rect.x, p.y - rect.y),
            }
        } else if let Some(rect) = self.hit_body(PlacementKind::Background, p) {
            Interaction::DraggingBackground {
                grab: Point::new(p.x - rect.x, p.y - rect.y),
            }
        } else {
            Interaction::Idle
        };

        trace!(state = ?self.state, x = p.x, y = p.y, "pointer down");
        self.state
    }

    /// Continue the gesture, or update the hover cursor when idle.
    ///
    /// Returns true if a rect changed.
    pub fn pointer_move(&mut self, screen: Point, now: Instant) -> bool {
        let p = self.mapping.to_canvas(screen);

        let (kind, next) = match self.state {
            Interaction::Idle => {
                self.cursor = self.hover_cursor(p);
                return false;
            }
            Interaction::DraggingFloorPlan { grab } => (PlacementKind::FloorPlan, Some(grab)),
            Interaction::DraggingBackground { grab } => (PlacementKind::Background, Some(grab)),
            Interaction::ResizingFloorPlan => (PlacementKind::FloorPlan, None),
            Interaction::ResizingBackground => (PlacementKind::Background, None),
        };

        let Some(rect) = self.rect(kind) else {
            return false;
        };
        let updated = match next {
            Some(grab) => kind.clamp_position(rect.with_origin(p.x - grab.x, p.y - grab.y)),
            None => kind.resize_to(rect, p),
        };

        if updated == rect {
            return false;
        }
        self.store(kind, updated, now);
        true
    }

    /// End any gesture.
    pub fn pointer_up(&mut self) {
        self.release();
    }

    /// Pointer left the element; same as release.
    pub fn pointer_leave(&mut self) {
        self.release();
    }

    /// Emit a snapshot if the quiet period has elapsed since the last change.
    pub fn poll(&mut self, now: Instant) -> Option<Placements> {
        if !self.debounce.poll(now) {
            return None;
        }
        let snapshot = self.placements;
        if let Some(observer) = self.observer.as_mut() {
            observer(snapshot);
        }
        Some(snapshot)
    }

    fn release(&mut self) {
        self.state = Interaction::Idle;
        self.cursor = CursorGlyph::Default;
    }

    fn store(&mut self, kind: PlacementKind, rect: Rect, now: Instant) {
        match kind {
            PlacementKind::FloorPlan => self.placements.floor_plan = Some(rect),
            PlacementKind::Background => self.placements.background = Some(rect),
        }
        self.debounce.touch(now);
    }

    fn state_targets(&self, kind: PlacementKind) -> bool {
        match self.state {
            Interaction::Idle => false,
            Interaction::DraggingFloorPlan { .. } | Interaction::ResizingFloorPlan => {
                kind == PlacementKind::FloorPlan
            }
            Interaction::DraggingBackground { .. } | Interaction::ResizingBackground => {
                kind == PlacementKind::Background
            }
        }
    }

    /// The rect, if its image is present.
    fn live_rect(&self, kind: PlacementKind) -> Option<Rect> {
        if self.is_present(kind) {
            self.rect(kind)
        } else {
            None
        }
    }

    fn hits_handle(&self, kind: PlacementKind, p: Point) -> bool {
        self.live_rect(kind)
            .is_some_and(|rect| hit_test_handle(p, rect))
    }

    fn hit_body(&self, kind: PlacementKind, p: Point) -> Option<Rect> {
        self.live_rect(kind).filter(|rect| hit_test(p, *rect))
    }

    fn hover_cursor(&self, p: Point) -> CursorGlyph {
        if self.hits_handle(PlacementKind::FloorPlan, p)
            || self.hits_handle(PlacementKind::Background, p)
        {
            CursorGlyph::Resize
        } else if self.hit_body(PlacementKind::FloorPlan, p).is_some()
            || self.hit_body(PlacementKind::Background, p).is_some()
        {
            CursorGlyph::Move
        } else {
            CursorGlyph::Default
        }
    }
}
