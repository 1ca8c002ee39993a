//! Server state and configuration.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::canvas::FontSet;
use crate::render::PatternLibrary;
use crate::template::{MemoryTemplateStore, TemplateStore};

/// Per-file ceiling for template and render uploads.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Largest accepted attachment, in bytes
    pub max_upload_bytes: usize,
    /// TrueType font for regular text
    pub font_regular: Option<PathBuf>,
    /// TrueType font for bold text (falls back to the regular one)
    pub font_bold: Option<PathBuf>,
    /// Directory holding the bitmap pattern PNGs
    pub patterns_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            font_regular: None,
            font_bold: None,
            patterns_dir: None,
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<dyn TemplateStore>,
    pub fonts: Option<Arc<FontSet>>,
    pub patterns: Arc<PatternLibrary>,
}

impl AppState {
    /// Load fonts and patterns from the configured paths, with an empty
    /// in-memory template store.
    pub fn new(config: ServerConfig) -> Self {
        let fonts = FontSet::discover(config.font_regular.as_deref(), config.font_bold.as_deref());
        let patterns = config
            .patterns_dir
            .as_deref()
            .map(PatternLibrary::load_dir)
            .unwrap_or_default();
        info!(
            fonts = fonts.is_some(),
            patterns = patterns.available().len(),
            "server assets loaded"
        );
        Self::with_parts(config, Arc::new(MemoryTemplateStore::new()), fonts, patterns)
    }

    pub fn with_parts(
        config: ServerConfig,
        store: Arc<dyn TemplateStore>,
        fonts: Option<Arc<FontSet>>,
        patterns: PatternLibrary,
    ) -> Self {
        Self {
            config,
            store,
            fonts,
            patterns: Arc::new(patterns),
        }
    }
}
