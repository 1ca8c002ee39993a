//! # Error Types
//!
//! This module defines error types used throughout the story-render library.
//!
//! The variants map one-to-one onto the outcomes a caller has to tell apart:
//! a failed image decode, rejected property data, a missing template, and a
//! rejected upload are never folded into each other.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// A single failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Wire name of the offending field (e.g. "propertyArea").
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Main error type for story-render operations
#[derive(Debug, Error)]
pub enum StoryError {
    /// An image could not be decoded
    #[error("Decode error ({layer}): {reason}")]
    Decode { layer: String, reason: String },

    /// Property or template data failed validation
    #[error("Validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    /// No template stored under this id
    #[error("Template not found: {0}")]
    NotFound(Uuid),

    /// Attachment exceeds the upload ceiling
    #[error("Upload too large: {field} is {size} bytes (limit {limit})")]
    UploadTooLarge {
        field: String,
        size: usize,
        limit: usize,
    },

    /// Attachment has a type we do not accept
    #[error("Unsupported upload: {0}")]
    UnsupportedUpload(String),

    /// Image encoding error
    #[error("Encode error: {0}")]
    Encode(String),

    /// Font loading error
    #[error("Font error: {0}")]
    Font(String),

    /// Server-level errors (bind, serve)
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoryError {
    /// Convenience constructor for a single-field validation failure.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        StoryError::Validation(vec![FieldError::new(field, message)])
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
