//! Template records as stored and sent over the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FieldError, StoryError};
use crate::geometry::{PlacementKind, Rect};
use crate::property::PropertyData;

/// Name given to templates saved without one.
pub const DEFAULT_TEMPLATE_NAME: &str = "Новый проект";

fn default_name() -> String {
    DEFAULT_TEMPLATE_NAME.to_string()
}

/// A persisted story template.
///
/// Placement rects are kept as opaque JSON strings and handed back exactly
/// as they were saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryTemplate {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub property: PropertyData,
    /// Original file name of the background upload.
    pub background_image_url: Option<String>,
    /// Original file name of the floor-plan upload.
    pub floor_plan_url: Option<String>,
    pub floor_plan_position: Option<String>,
    pub background_position: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Client-supplied template fields (no id, no timestamp).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(flatten)]
    pub property: PropertyData,
    #[serde(default)]
    pub floor_plan_position: Option<String>,
    #[serde(default)]
    pub background_position: Option<String>,
}

impl Default for TemplateDraft {
    fn default() -> Self {
        Self {
            name: default_name(),
            property: PropertyData::default(),
            floor_plan_position: None,
            background_position: None,
        }
    }
}

impl TemplateDraft {
    /// Check name, property data and placement blobs; all violations are
    /// reported together.
    pub fn validate(&self) -> Result<(), StoryError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "must not be empty"));
        }
        errors.extend(self.property.field_errors());
        let blobs = [
            ("floorPlanPosition", PlacementKind::FloorPlan, &self.floor_plan_position),
            ("backgroundPosition", PlacementKind::Background, &self.background_position),
        ];
        for (field, kind, blob) in blobs {
            let Some(blob) = blob else { continue };
            match decode_rect(field, blob) {
                Ok(rect) if !kind.in_bounds(rect) => {
                    errors.push(FieldError::new(field, "rect is outside the canvas bounds"));
                }
                Ok(_) => {}
                Err(StoryError::Validation(mut found)) => errors.append(&mut found),
                Err(e) => errors.push(FieldError::new(field, e.to_string())),
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(StoryError::Validation(errors))
        }
    }
}

/// Original file names of the uploaded images.
///
/// On update, `None` keeps whatever the template already had.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRefs {
    pub background: Option<String>,
    pub floor_plan: Option<String>,
}

impl StoryTemplate {
    /// New record with a fresh id and the current time.
    pub fn create(draft: TemplateDraft, images: ImageRefs) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: draft.name,
            property: draft.property,
            background_image_url: images.background,
            floor_plan_url: images.floor_plan,
            floor_plan_position: draft.floor_plan_position,
            background_position: draft.background_position,
            created_at: Utc::now(),
        }
    }

    /// Overwrite the editable fields; id and `created_at` stay.
    pub fn apply(&mut self, draft: TemplateDraft, images: ImageRefs) {
        self.name = draft.name;
        self.property = draft.property;
        self.floor_plan_position = draft.floor_plan_position;
        self.background_position = draft.background_position;
        if images.background.is_some() {
            self.background_image_url = images.background;
        }
        if images.floor_plan.is_some() {
            self.floor_plan_url = images.floor_plan;
        }
    }

    /// The editable fields as a draft.
    pub fn to_draft(&self) -> TemplateDraft {
        TemplateDraft {
            name: self.name.clone(),
            property: self.property.clone(),
            floor_plan_position: self.floor_plan_position.clone(),
            background_position: self.background_position.clone(),
        }
    }
}

/// Serialize a placement rect into its stored form.
pub fn encode_rect(field: &str, rect: Rect) -> Result<String, StoryError> {
    if ![rect.x, rect.y, rect.width, rect.height]
        .iter()
        .all(|v| v.is_finite())
    {
        return Err(StoryError::invalid(field, "rect has non-finite coordinates"));
    }
    serde_json::to_string(&rect).map_err(|e| StoryError::invalid(field, e.to_string()))
}

/// Parse a stored placement rect.
pub fn decode_rect(field: &str, blob: &str) -> Result<Rect, StoryError> {
    serde_json::from_str(blob).map_err(|e| StoryError::invalid(field, e.to_string()))
}
