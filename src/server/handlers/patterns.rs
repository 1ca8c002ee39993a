//! Background style catalogue.

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use crate::render::{BitmapPattern, GeometricKind};

use super::super::state::AppState;

/// One bitmap pattern as listed by the API.
#[derive(Debug, Serialize)]
pub struct BitmapInfo {
    pub key: &'static str,
    pub title: &'static str,
    /// Whether the pattern image was found at startup.
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct GeometricInfo {
    pub key: &'static str,
    pub title: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PatternCatalogue {
    pub bitmap: Vec<BitmapInfo>,
    pub geometric: Vec<GeometricInfo>,
}

/// GET /api/patterns - List bitmap patterns and geometric kinds.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<PatternCatalogue> {
    let bitmap = BitmapPattern::ALL
        .into_iter()
        .map(|pattern| BitmapInfo {
            key: pattern.key(),
            title: pattern.title(),
            available: state.patterns.contains(pattern),
        })
        .collect();
    let geometric = GeometricKind::ALL
        .into_iter()
        .map(|kind| GeometricInfo {
            key: kind.key(),
            title: kind.title(),
        })
        .collect();
    Json(PatternCatalogue { bitmap, geometric })
}
