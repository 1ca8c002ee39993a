//! # Rendering Module
//!
//! This module turns property data, images and a style choice into a story.
//!
//! ## Modules
//!
//! - [`compositor`]: layer-by-layer story rendering onto a [`Surface`](crate::canvas::Surface)
//! - [`patterns`]: procedural geometric backgrounds and the bitmap pattern library
//! - [`style`]: the mutually exclusive background style selection
//!
//! ## Usage Example
//!
//! ```
//! use story_render::canvas::DisplayList;
//! use story_render::property::PropertyData;
//! use story_render::render::compositor::{self, Scene};
//!
//! let property = PropertyData {
//!     property_address: "ул. Ленина, 10".into(),
//!     property_area: 51.29,
//!     ..PropertyData::default()
//! };
//!
//! let mut list = DisplayList::default();
//! compositor::render(&mut list, &Scene::new(&property));
//!
//! assert_eq!(list.texts()[0], "УЛ. ЛЕНИНА, 10");
//! ```

pub mod compositor;
pub mod patterns;
pub mod style;

pub use compositor::{BackgroundFill, Scene, render, render_png};
pub use patterns::{PatternLibrary, generate_pattern};
pub use style::{ActiveStyle, BitmapPattern, GeometricKind, StyleSelection};
