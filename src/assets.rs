//! # Image Assets
//!
//! Decoding of user-supplied images and the slots that hold them.
//!
//! ## Stale decodes
//!
//! Decoding is asynchronous, so a user can supply a second image before the
//! first finishes decoding. Every decode request takes a [`DecodeTicket`]
//! from its [`ImageSlot`]; a result is only accepted if its ticket is still
//! the slot's latest. Older results are dropped.
//!
//! ```text
//! begin("a.jpg") → ticket 1 ─┐
//! begin("b.jpg") → ticket 2 ─┼─► complete(2, img_b)  accepted
//!                            └─► complete(1, img_a)  stale, dropped
//! ```
//!
//! Ticket numbers come from one process-wide counter, so a ticket from one
//! slot never matches another.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbaImage;
use tracing::{debug, warn};

use crate::error::StoryError;

static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// Identifies one decode request against an [`ImageSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodeTicket(u64);

impl DecodeTicket {
    fn next() -> Self {
        DecodeTicket(NEXT_TICKET.fetch_add(1, Ordering::Relaxed))
    }
}

/// What happened to a completed decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// The image is now in the slot.
    Loaded,
    /// Decoding failed; the slot is empty and the layer will be skipped.
    Failed,
    /// A newer request superseded this one; the result was dropped.
    Stale,
}

/// Decode an encoded image (PNG, JPEG, ...) into RGBA pixels.
///
/// `layer` names the image in errors and logs.
pub fn decode_image(bytes: &[u8], layer: &str) -> Result<RgbaImage, StoryError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| StoryError::Decode {
        layer: layer.to_string(),
        reason: e.to_string(),
    })?;
    debug!(layer, width = decoded.width(), height = decoded.height(), "decoded image");
    Ok(decoded.to_rgba8())
}

/// [`decode_image`] on the blocking thread pool.
pub async fn decode_image_async(bytes: Vec<u8>, layer: String) -> Result<RgbaImage, StoryError> {
    let task_layer = layer.clone();
    tokio::task::spawn_blocking(move || decode_image(&bytes, &task_layer))
        .await
        .map_err(|e| StoryError::Decode {
            layer,
            reason: format!("decode task failed: {}", e),
        })?
}

/// Decode, or log and return `None` so the layer is skipped.
pub fn decode_or_skip(bytes: &[u8], layer: &str) -> Option<RgbaImage> {
    match decode_image(bytes, layer) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!(layer, error = %e, "image layer skipped");
            None
        }
    }
}

/// One optional image input with stale-result protection.
#[derive(Debug, Clone, Default)]
pub struct ImageSlot {
    latest: Option<DecodeTicket>,
    source_name: Option<String>,
    image: Option<Arc<RgbaImage>>,
}

impl ImageSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new decode request; any earlier request becomes stale.
    ///
    /// The previous image stays visible until the new one completes.
    pub fn begin(&mut self, source_name: impl Into<String>) -> DecodeTicket {
        let ticket = DecodeTicket::next();
        self.latest = Some(ticket);
        self.source_name = Some(source_name.into());
        ticket
    }

    /// Deliver the result for `ticket`.
    pub fn complete(
        &mut self,
        ticket: DecodeTicket,
        result: Result<RgbaImage, StoryError>,
    ) -> DecodeOutcome {
        if self.latest != Some(ticket) {
            debug!(?ticket, "discarding stale decode");
            return DecodeOutcome::Stale;
        }
        match result {
            Ok(image) => {
                self.image = Some(Arc::new(image));
                DecodeOutcome::Loaded
            }
            Err(e) => {
                warn!(source = self.source_name.as_deref().unwrap_or(""), error = %e, "image layer skipped");
                self.image = None;
                DecodeOutcome::Failed
            }
        }
    }

    /// Empty the slot; in-flight decodes become stale.
    pub fn clear(&mut self) {
        self.latest = Some(DecodeTicket::next());
        self.source_name = None;
        self.image = None;
    }

    pub fn image(&self) -> Option<&Arc<RgbaImage>> {
        self.image.as_ref()
    }

    pub fn is_present(&self) -> bool {
        self.image.is_some()
    }

    /// Original file name of the latest request.
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }
}
