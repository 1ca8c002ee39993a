//! # story-render - Real-Estate Story Renderer
//!
//! story-render paints 1080×1920 portrait "stories" advertising a property
//! for sale: a background (photo, bitmap pattern, procedural pattern, flat
//! color or the default gradient), a floor plan, an address header, a
//! mortgage card and a bank strip. It provides:
//!
//! - **Compositing**: a fixed painter's-order pipeline over a [`Surface`](canvas::Surface)
//! - **Placement**: pointer-driven drag and resize of the image rects
//! - **Templates**: named snapshots with a CRUD HTTP API
//!
//! ## Quick Start
//!
//! ```
//! use story_render::{
//!     canvas::DisplayList,
//!     property::PropertyData,
//!     render::{Scene, render},
//! };
//!
//! let property = PropertyData {
//!     property_address: "ул. Ленина, 10".into(),
//!     property_area: 51.29,
//!     ..PropertyData::default()
//! };
//!
//! let mut list = DisplayList::default();
//! render(&mut list, &Scene::new(&property));
//! assert_eq!(list.texts()[0], "УЛ. ЛЕНИНА, 10");
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`canvas`] | Drawing surfaces: raster and recording |
//! | [`geometry`] | Rects, clamping, hit testing |
//! | [`property`] | Listing data, labels, mortgage math |
//! | [`render`] | Background styles and the compositor |
//! | [`placement`] | Interactive placement controller |
//! | [`assets`] | Image decoding with stale-result protection |
//! | [`editor`] | One story's editable state |
//! | [`template`] | Template records and storage |
//! | [`server`] | HTTP API |
//! | [`error`] | Error types |

pub mod assets;
pub mod canvas;
pub mod editor;
pub mod error;
pub mod format;
pub mod geometry;
pub mod placement;
pub mod property;
pub mod render;
pub mod server;
pub mod template;

// Re-exports for convenience
pub use editor::StoryEditor;
pub use error::StoryError;
pub use property::PropertyData;
