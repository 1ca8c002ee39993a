//! Server-side story rendering.

use axum::{
    Json,
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::assets::decode_or_skip;
use crate::error::StoryError;
use crate::geometry::{PlacementKind, Rect};
use crate::property::PropertyData;
use crate::render::{ActiveStyle, BackgroundFill, Scene, render_png};
use crate::template::decode_rect;

use super::super::state::AppState;
use super::super::upload::{ApiError, StoryForm, error_response};

/// JSON carried in the `data` field of a render request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    #[serde(flatten)]
    pub property: PropertyData,
    #[serde(default)]
    pub floor_plan_position: Option<String>,
    #[serde(default)]
    pub background_position: Option<String>,
    #[serde(default)]
    pub style: Option<ActiveStyle>,
    #[serde(default)]
    pub show_handles: bool,
}

impl RenderRequest {
    /// From `data` when present, else from the individual template fields.
    fn from_form(form: &StoryForm) -> Result<Self, StoryError> {
        let mut request = match form.data_as::<RenderRequest>()? {
            Some(request) => request,
            None => {
                let draft = form.draft()?;
                RenderRequest {
                    property: draft.property,
                    floor_plan_position: draft.floor_plan_position,
                    background_position: draft.background_position,
                    ..RenderRequest::default()
                }
            }
        };
        request.show_handles |= form.flag("showHandles");
        Ok(request)
    }
}

/// Decode a placement blob and pull it into the gesture envelope, so a
/// client-supplied rect renders exactly as the editor would show it.
fn rect_field(
    field: &str,
    kind: PlacementKind,
    blob: Option<&str>,
) -> Result<Option<Rect>, StoryError> {
    let Some(blob) = blob else { return Ok(None) };
    let rect = decode_rect(field, blob)?;
    let bounded = kind.bound(rect);
    if bounded != rect {
        debug!(field, ?rect, ?bounded, "placement rect pulled into bounds");
    }
    Ok(Some(bounded))
}

/// POST /api/render - Render a story to PNG.
///
/// Attachments that fail to decode are left out of the image.
pub async fn render(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = StoryForm::read(multipart, state.config.max_upload_bytes).await?;
    let request = RenderRequest::from_form(&form).map_err(error_response)?;
    request.property.validate().map_err(error_response)?;

    let floor_plan_rect = rect_field(
        "floorPlanPosition",
        PlacementKind::FloorPlan,
        request.floor_plan_position.as_deref(),
    )
    .map_err(error_response)?;
    let background_rect = rect_field(
        "backgroundPosition",
        PlacementKind::Background,
        request.background_position.as_deref(),
    )
    .map_err(error_response)?;
    let fill = BackgroundFill::resolve(request.style, &state.patterns);
    let fonts = state.fonts.clone();

    // Decoding and painting are CPU-bound
    let png_bytes = tokio::task::spawn_blocking(move || {
        let background = form
            .background
            .as_ref()
            .and_then(|f| decode_or_skip(&f.bytes, &f.file_name));
        let floor_plan = form
            .floor_plan
            .as_ref()
            .and_then(|f| decode_or_skip(&f.bytes, &f.file_name));

        let scene = Scene {
            property: &request.property,
            background_image: background.as_ref(),
            floor_plan_image: floor_plan.as_ref(),
            floor_plan_rect,
            background_rect,
            fill,
            show_handles: request.show_handles,
        };
        render_png(&scene, fonts)
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": format!("Render task failed: {}", e) })),
        )
    })?
    .map_err(error_response)?;

    info!(bytes = png_bytes.len(), "story rendered");
    Ok(([(header::CONTENT_TYPE, "image/png")], png_bytes))
}
