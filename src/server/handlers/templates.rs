//! Template CRUD handlers.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::StoryError;
use crate::template::{StoryTemplate, TemplateDraft};

use super::super::state::AppState;
use super::super::upload::{ApiError, StoryForm, error_response};

/// Unparseable ids are just ids nobody stored.
fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| error_response(StoryError::NotFound(Uuid::nil())))
}

async fn read_draft(
    state: &AppState,
    multipart: Multipart,
) -> Result<(StoryForm, TemplateDraft), ApiError> {
    let form = StoryForm::read(multipart, state.config.max_upload_bytes).await?;
    let draft = form.draft().map_err(error_response)?;
    draft.validate().map_err(error_response)?;
    Ok((form, draft))
}

/// GET /api/templates - List all templates.
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StoryTemplate>>, ApiError> {
    let templates = state.store.list().await.map_err(error_response)?;
    Ok(Json(templates))
}

/// GET /api/templates/:id - Fetch one template.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StoryTemplate>, ApiError> {
    let id = parse_id(&id)?;
    let template = state.store.get(id).await.map_err(error_response)?;
    Ok(Json(template))
}

/// POST /api/templates - Create a template from a multipart form.
pub async fn create(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (form, draft) = read_draft(&state, multipart).await?;
    let template = state
        .store
        .create(draft, form.image_refs())
        .await
        .map_err(error_response)?;
    info!(id = %template.id, name = %template.name, "template created");
    Ok((StatusCode::CREATED, Json(template)))
}

/// PUT /api/templates/:id - Replace a template's fields.
///
/// Attachments left out keep the file names already stored.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<StoryTemplate>, ApiError> {
    let id = parse_id(&id)?;
    let (form, draft) = read_draft(&state, multipart).await?;
    let template = state
        .store
        .update(id, draft, form.image_refs())
        .await
        .map_err(error_response)?;
    info!(%id, "template updated");
    Ok(Json(template))
}
