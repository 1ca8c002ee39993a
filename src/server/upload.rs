//! Multipart form parsing and error responses shared by the handlers.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use axum::{Json, extract::Multipart, http::StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, error};

use crate::error::{FieldError, StoryError};
use crate::property::PropertyData;
use crate::template::{DEFAULT_TEMPLATE_NAME, ImageRefs, TemplateDraft};

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<Value>);

/// File fields a form may carry.
pub const BACKGROUND_FIELD: &str = "background";
pub const FLOOR_PLAN_FIELD: &str = "floorPlan";

const ACCEPTED_TYPES: [&str; 4] = ["jpeg", "jpg", "png", "pdf"];

/// Map a library error onto a status code and JSON body.
pub fn error_response(err: StoryError) -> ApiError {
    let (status, body) = match &err {
        StoryError::Validation(errors) => (
            StatusCode::BAD_REQUEST,
            json!({ "message": "Invalid input data", "errors": errors }),
        ),
        StoryError::UnsupportedUpload(_) => {
            (StatusCode::BAD_REQUEST, json!({ "message": err.to_string() }))
        }
        StoryError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            json!({ "message": "Template not found" }),
        ),
        StoryError::UploadTooLarge { .. } => (
            StatusCode::PAYLOAD_TOO_LARGE,
            json!({ "message": err.to_string() }),
        ),
        StoryError::Decode { .. }
        | StoryError::Encode(_)
        | StoryError::Font(_)
        | StoryError::Transport(_)
        | StoryError::Io(_) => {
            error!(error = %err, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": err.to_string() }),
            )
        }
    };
    (status, Json(body))
}

/// A received attachment. Only its name is persisted.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Everything a story form submitted.
#[derive(Debug, Default)]
pub struct StoryForm {
    /// Raw `data` field: the whole record as JSON.
    pub data: Option<String>,
    /// Remaining text fields by name.
    pub fields: HashMap<String, String>,
    pub background: Option<UploadedFile>,
    pub floor_plan: Option<UploadedFile>,
}

impl StoryForm {
    /// Drain a multipart body, enforcing type and size rules on attachments.
    pub async fn read(mut multipart: Multipart, max_file_bytes: usize) -> Result<Self, ApiError> {
        let mut form = StoryForm::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            (e.status(), Json(json!({ "message": e.body_text() })))
        })? {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                BACKGROUND_FIELD | FLOOR_PLAN_FIELD => {
                    let file_name = field.file_name().unwrap_or("").to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(|e| {
                        (e.status(), Json(json!({ "message": e.body_text() })))
                    })?;
                    // An empty file input arrives as a nameless, empty part
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    let file = check_upload(
                        &name,
                        file_name,
                        content_type.as_deref(),
                        bytes.to_vec(),
                        max_file_bytes,
                    )
                    .map_err(error_response)?;
                    debug!(field = %name, file = %file.file_name, bytes = file.bytes.len(), "attachment received");
                    if name == BACKGROUND_FIELD {
                        form.background = Some(file);
                    } else {
                        form.floor_plan = Some(file);
                    }
                }
                _ => {
                    let text = field.text().await.map_err(|e| {
                        (e.status(), Json(json!({ "message": e.body_text() })))
                    })?;
                    if name == "data" {
                        form.data = Some(text);
                    } else {
                        form.fields.insert(name, text);
                    }
                }
            }
        }

        Ok(form)
    }

    /// File names of the attachments, for the template record.
    pub fn image_refs(&self) -> ImageRefs {
        ImageRefs {
            background: self.background.as_ref().map(|f| f.file_name.clone()),
            floor_plan: self.floor_plan.as_ref().map(|f| f.file_name.clone()),
        }
    }

    /// Parse the `data` field as `T`, if present.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<Option<T>, StoryError> {
        self.data
            .as_deref()
            .map(|data| serde_json::from_str(data).map_err(|e| StoryError::invalid("data", e.to_string())))
            .transpose()
    }

    /// The template fields, from `data` or else from individual fields with
    /// defaults for anything missing.
    pub fn draft(&self) -> Result<TemplateDraft, StoryError> {
        if let Some(draft) = self.data_as::<TemplateDraft>()? {
            return Ok(draft);
        }

        let mut errors = Vec::new();

        let property = PropertyData {
            property_address: self
                .fields
                .get("propertyAddress")
                .cloned()
                .unwrap_or_default(),
            property_type: parse_or_default(self.text("propertyType"), &mut errors),
            property_area: parse_number("propertyArea", self.text("propertyArea"), &mut errors),
            total_cost: parse_number("totalCost", self.text("totalCost"), &mut errors),
            initial_payment: parse_number("initialPayment", self.text("initialPayment"), &mut errors),
            bank_rate: parse_number("bankRate", self.text("bankRate"), &mut errors),
            monthly_payment: parse_number("monthlyPayment", self.text("monthlyPayment"), &mut errors),
            selected_bank: parse_or_default(self.text("selectedBank"), &mut errors),
            mortgage_type: parse_or_default(self.text("mortgageType"), &mut errors),
        };

        if !errors.is_empty() {
            return Err(StoryError::Validation(errors));
        }

        Ok(TemplateDraft {
            name: self.text("name").unwrap_or(DEFAULT_TEMPLATE_NAME).to_string(),
            property,
            floor_plan_position: self.text("floorPlanPosition").map(str::to_string),
            background_position: self.text("backgroundPosition").map(str::to_string),
        })
    }

    /// A trimmed, non-empty text field.
    fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// A boolean text field; "true", "1" and "on" count as set.
    pub fn flag(&self, key: &str) -> bool {
        matches!(
            self.fields.get(key).map(|v| v.trim()),
            Some("true" | "1" | "on")
        )
    }
}

fn parse_or_default<T>(value: Option<&str>, errors: &mut Vec<FieldError>) -> T
where
    T: FromStr<Err = StoryError> + Default,
{
    match value.map(T::from_str) {
        Some(Ok(v)) => v,
        Some(Err(StoryError::Validation(mut e))) => {
            errors.append(&mut e);
            T::default()
        }
        Some(Err(_)) | None => T::default(),
    }
}

fn parse_number<T>(field: &str, value: Option<&str>, errors: &mut Vec<FieldError>) -> T
where
    T: FromStr + Default,
{
    match value.map(str::parse::<T>) {
        Some(Ok(v)) => v,
        Some(Err(_)) => {
            errors.push(FieldError::new(field, "must be a number"));
            T::default()
        }
        None => T::default(),
    }
}

/// Accept jpeg, jpg, png and pdf, judged by extension and MIME type, up to
/// `limit` bytes.
pub fn check_upload(
    field: &str,
    file_name: String,
    content_type: Option<&str>,
    bytes: Vec<u8>,
    limit: usize,
) -> Result<UploadedFile, StoryError> {
    let extension = Path::new(&file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let extension_ok = extension
        .as_deref()
        .is_some_and(|e| ACCEPTED_TYPES.contains(&e));

    let mime = match content_type {
        Some(declared) => declared.to_ascii_lowercase(),
        None => mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    };
    let mime_ok = ACCEPTED_TYPES.iter().any(|t| mime.contains(t));

    if !(extension_ok && mime_ok) {
        return Err(StoryError::UnsupportedUpload(format!(
            "{} must be a jpeg, png or pdf file (got '{}', {})",
            field, file_name, mime
        )));
    }
    if bytes.len() > limit {
        return Err(StoryError::UploadTooLarge {
            field: field.to_string(),
            size: bytes.len(),
            limit,
        });
    }
    Ok(UploadedFile { file_name, bytes })
}
