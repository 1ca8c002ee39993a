//! # Templates
//!
//! Named, persisted snapshots of everything needed to re-render a story.
//!
//! - [`model`]: the record, the client-side draft, rect blob helpers
//! - [`store`]: the [`TemplateStore`] trait and an in-memory implementation

pub mod model;
pub mod store;

pub use model::{
    DEFAULT_TEMPLATE_NAME, ImageRefs, StoryTemplate, TemplateDraft, decode_rect, encode_rect,
};
pub use store::{MemoryTemplateStore, TemplateStore};
