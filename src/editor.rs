//! # Story Editor
//!
//! The client-side working copy of one story: property data, the two image
//! slots, the background style and the placement controller. It renders
//! live previews (with editing handles), exports final PNGs (without), and
//! converts to and from saved templates.
//!
//! ```text
//! pointer events ──► PlacementController ──┐
//! image bytes ─────► ImageSlot ×2 ─────────┼──► Scene ──► compositor ──► Surface
//! style picks ─────► StyleSelection ───────┤
//! form input ──────► PropertyData ─────────┘
//! ```

use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;
use tracing::{info, warn};

use crate::assets::{DecodeOutcome, DecodeTicket, ImageSlot, decode_image};
use crate::canvas::{FontSet, Surface};
use crate::error::StoryError;
use crate::geometry::PlacementKind;
use crate::placement::{PlacementController, Placements};
use crate::property::PropertyData;
use crate::render::{BackgroundFill, PatternLibrary, Scene, StyleSelection, render, render_png};
use crate::template::{
    DEFAULT_TEMPLATE_NAME, ImageRefs, StoryTemplate, TemplateDraft, decode_rect, encode_rect,
};

const FLOOR_PLAN_FIELD: &str = "floorPlanPosition";
const BACKGROUND_FIELD: &str = "backgroundPosition";

/// Editable state of one story.
#[derive(Debug)]
pub struct StoryEditor {
    name: String,
    property: PropertyData,
    background: ImageSlot,
    floor_plan: ImageSlot,
    style: StyleSelection,
    placement: PlacementController,
    patterns: Arc<PatternLibrary>,
    fonts: Option<Arc<FontSet>>,
}

impl StoryEditor {
    pub fn new(fonts: Option<Arc<FontSet>>, patterns: Arc<PatternLibrary>) -> Self {
        Self {
            name: DEFAULT_TEMPLATE_NAME.to_string(),
            property: PropertyData::default(),
            background: ImageSlot::new(),
            floor_plan: ImageSlot::new(),
            style: StyleSelection::default(),
            placement: PlacementController::new(),
            patterns,
            fonts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn property(&self) -> &PropertyData {
        &self.property
    }

    /// Replace the property data.
    ///
    /// The monthly payment is recomputed whenever cost and rate are both
    /// set, so it always follows the inputs.
    pub fn set_property(&mut self, property: PropertyData) {
        self.property = property;
        if self.property.total_cost > 0 && self.property.bank_rate > 0.0 {
            self.property.recalculate_payment();
        }
    }

    pub fn style(&self) -> &StyleSelection {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut StyleSelection {
        &mut self.style
    }

    pub fn placement(&self) -> &PlacementController {
        &self.placement
    }

    pub fn placement_mut(&mut self) -> &mut PlacementController {
        &mut self.placement
    }

    fn slot(&self, kind: PlacementKind) -> &ImageSlot {
        match kind {
            PlacementKind::FloorPlan => &self.floor_plan,
            PlacementKind::Background => &self.background,
        }
    }

    fn slot_mut(&mut self, kind: PlacementKind) -> &mut ImageSlot {
        match kind {
            PlacementKind::FloorPlan => &mut self.floor_plan,
            PlacementKind::Background => &mut self.background,
        }
    }

    pub fn image(&self, kind: PlacementKind) -> Option<&RgbaImage> {
        self.slot(kind).image().map(|image| image.as_ref())
    }

    /// Start decoding a new image for `kind`. Hand the bytes to a decoder
    /// and pass the result to [`complete_decode`](Self::complete_decode).
    pub fn begin_decode(&mut self, kind: PlacementKind, source_name: &str) -> DecodeTicket {
        self.slot_mut(kind).begin(source_name)
    }

    /// Accept a decode result unless a newer request has been made since.
    pub fn complete_decode(
        &mut self,
        kind: PlacementKind,
        ticket: DecodeTicket,
        result: Result<RgbaImage, StoryError>,
        now: Instant,
    ) -> DecodeOutcome {
        let outcome = self.slot_mut(kind).complete(ticket, result);
        match outcome {
            DecodeOutcome::Loaded => self.placement.set_present(kind, true, now),
            DecodeOutcome::Failed => self.placement.set_present(kind, false, now),
            DecodeOutcome::Stale => {}
        }
        outcome
    }

    /// Decode synchronously and install the image.
    pub fn load_image(
        &mut self,
        kind: PlacementKind,
        source_name: &str,
        bytes: &[u8],
        now: Instant,
    ) -> DecodeOutcome {
        let ticket = self.begin_decode(kind, source_name);
        self.complete_decode(kind, ticket, decode_image(bytes, source_name), now)
    }

    /// Remove the image for `kind`; its rect is kept for when one returns.
    pub fn clear_image(&mut self, kind: PlacementKind, now: Instant) {
        self.slot_mut(kind).clear();
        self.placement.set_present(kind, false, now);
    }

    /// Inputs for one render.
    pub fn scene(&self, show_handles: bool) -> Scene<'_> {
        let placements = self.placement.placements();
        Scene {
            property: &self.property,
            background_image: self.image(PlacementKind::Background),
            floor_plan_image: self.image(PlacementKind::FloorPlan),
            floor_plan_rect: placements.floor_plan,
            background_rect: placements.background,
            fill: BackgroundFill::resolve(self.style.active(), &self.patterns),
            show_handles,
        }
    }

    /// Live preview with editing handles. Property data is not validated.
    pub fn render_preview(&self, surface: &mut dyn Surface) {
        render(surface, &self.scene(true));
    }

    /// Final image: validated, no handles, PNG-encoded.
    pub fn export_png(&self) -> Result<Vec<u8>, StoryError> {
        self.encode(false)
    }

    /// Like [`export_png`](Self::export_png) but with the editing handles.
    pub fn preview_png(&self) -> Result<Vec<u8>, StoryError> {
        self.encode(true)
    }

    fn encode(&self, show_handles: bool) -> Result<Vec<u8>, StoryError> {
        self.property.validate()?;
        let png = render_png(&self.scene(show_handles), self.fonts.clone())?;
        info!(bytes = png.len(), show_handles, "story exported");
        Ok(png)
    }

    /// Debounced placement report; see [`PlacementController::poll`].
    pub fn poll(&mut self, now: Instant) -> Option<Placements> {
        self.placement.poll(now)
    }

    /// The current state as a template draft ready to save.
    pub fn to_draft(&self) -> Result<TemplateDraft, StoryError> {
        let placements = self.placement.placements();
        let blob = |field: &str, rect: Option<_>| rect.map(|r| encode_rect(field, r)).transpose();
        Ok(TemplateDraft {
            name: self.name.clone(),
            property: self.property.clone(),
            floor_plan_position: blob(FLOOR_PLAN_FIELD, placements.floor_plan)?,
            background_position: blob(BACKGROUND_FIELD, placements.background)?,
        })
    }

    /// File names of the images currently loaded.
    pub fn image_refs(&self) -> ImageRefs {
        let name = |slot: &ImageSlot| {
            if slot.is_present() {
                slot.source_name().map(str::to_string)
            } else {
                None
            }
        };
        ImageRefs {
            background: name(&self.background),
            floor_plan: name(&self.floor_plan),
        }
    }

    /// Load a saved template: name, property data and rects.
    ///
    /// Templates only remember image file names, so loaded images stay as
    /// they are. A rect blob that fails to parse is logged and the current
    /// rect is kept.
    pub fn apply_template(&mut self, template: &StoryTemplate, now: Instant) {
        self.name = template.name.clone();
        self.property = template.property.clone();

        let current = self.placement.placements();
        let restore = |field: &str, blob: &Option<String>, current| match blob {
            Some(blob) => match decode_rect(field, blob) {
                Ok(rect) => Some(rect),
                Err(e) => {
                    warn!(template = %template.id, error = %e, "ignoring malformed placement");
                    current
                }
            },
            None => current,
        };
        let placements = Placements {
            floor_plan: restore(
                FLOOR_PLAN_FIELD,
                &template.floor_plan_position,
                current.floor_plan,
            ),
            background: restore(
                BACKGROUND_FIELD,
                &template.background_position,
                current.background,
            ),
        };
        self.placement.restore(placements, now);
        info!(template = %template.id, name = %template.name, "template applied");
    }
}
