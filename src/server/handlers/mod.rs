//! HTTP handlers for the server.

pub mod patterns;
pub mod render;
pub mod templates;
