//! # HTTP Server for Story Templates and Rendering
//!
//! Stores story templates and renders stories on request.
//!
//! ## Usage
//!
//! ```bash
//! story-render serve --listen 0.0.0.0:8080 --patterns-dir ./patterns
//! ```
//!
//! | Method | Path | |
//! |--------|------|--|
//! | GET | `/api/templates` | list templates |
//! | POST | `/api/templates` | create (multipart) |
//! | GET | `/api/templates/:id` | fetch one |
//! | PUT | `/api/templates/:id` | update (multipart) |
//! | POST | `/api/render` | render to PNG (multipart) |
//! | GET | `/api/patterns` | background style catalogue |

mod handlers;
mod state;
mod upload;

pub use handlers::render::RenderRequest;
pub use state::{AppState, DEFAULT_MAX_UPLOAD_BYTES, ServerConfig};
pub use upload::{ApiError, error_response};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::StoryError;

/// Room for form text next to two full-size attachments.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the application router.
///
/// The request body limit admits two maximum-size attachments so that an
/// oversized file is reported per field rather than as a truncated body.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_mul(2)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        // Templates
        .route(
            "/api/templates",
            get(handlers::templates::list).post(handlers::templates::create),
        )
        .route(
            "/api/templates/:id",
            get(handlers::templates::get).put(handlers::templates::update),
        )
        // Rendering
        .route("/api/render", post(handlers::render::render))
        .route("/api/patterns", get(handlers::patterns::list))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use story_render::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), story_render::StoryError> {
/// let config = ServerConfig {
///     listen_addr: "127.0.0.1:8080".to_string(),
///     ..ServerConfig::default()
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), StoryError> {
    let listen_addr = config.listen_addr.clone();
    let max_upload_bytes = config.max_upload_bytes;
    let app = router(Arc::new(AppState::new(config)));

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| StoryError::Transport(format!("Failed to bind to {}: {}", listen_addr, e)))?;

    info!(addr = %listen_addr, max_upload_bytes, "story-render server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| StoryError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}
