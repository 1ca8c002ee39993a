//! # HTTP API Tests
//!
//! Drive the axum router in-process with `tower::ServiceExt::oneshot`.

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use image::{ImageFormat, Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

use story_render::render::PatternLibrary;
use story_render::server::{AppState, ServerConfig, router};
use story_render::template::MemoryTemplateStore;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

const BOUNDARY: &str = "story-render-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        field: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                field,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        field, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(method: &str, uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn app_with_limit(max_upload_bytes: usize) -> Router {
    let config = ServerConfig {
        max_upload_bytes,
        ..ServerConfig::default()
    };
    let state = AppState::with_parts(
        config,
        Arc::new(MemoryTemplateStore::new()),
        None,
        PatternLibrary::new(),
    );
    router(Arc::new(state))
}

fn app() -> Router {
    app_with_limit(ServerConfig::default().max_upload_bytes)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn template_data(name: &str) -> String {
    json!({
        "name": name,
        "propertyAddress": "ул. Ленина, 10",
        "propertyType": "3k",
        "propertyArea": 72.5,
        "totalCost": 9_500_000,
        "initialPayment": 2_000_000,
        "bankRate": 12.5,
        "monthlyPayment": 80_045.12,
        "selectedBank": "vtb",
        "mortgageType": "family",
        "floorPlanPosition": "{\"x\":340,\"y\":650,\"width\":400,\"height\":300}",
        "backgroundPosition": "{\"x\":-12.5,\"y\":150,\"width\":1080,\"height\":1350}"
    })
    .to_string()
}

fn png_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbaImage::from_pixel(8, 6, Rgba([10, 200, 90, 255]))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

// ============================================================================
// TEMPLATES
// ============================================================================

#[tokio::test]
async fn test_create_get_update_list() {
    let app = app();
    let data = template_data("Ленина");
    let png = png_bytes();

    let (status, created) = send_json(
        &app,
        multipart_request(
            "POST",
            "/api/templates",
            &[
                Part::Text("data", &data),
                Part::File {
                    field: "background",
                    file_name: "facade.png",
                    content_type: "image/png",
                    bytes: &png,
                },
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Ленина");
    assert_eq!(created["propertyType"], "3k");
    assert_eq!(created["backgroundImageUrl"], "facade.png");
    assert!(created["floorPlanUrl"].is_null());
    assert_eq!(
        created["backgroundPosition"],
        "{\"x\":-12.5,\"y\":150,\"width\":1080,\"height\":1350}"
    );
    let id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = send_json(&app, get_request(&format!("/api/templates/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let renamed = template_data("Ленина, обновлено");
    let (status, updated) = send_json(
        &app,
        multipart_request(
            "PUT",
            &format!("/api/templates/{}", id),
            &[Part::Text("data", &renamed)],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_eq!(updated["name"], "Ленина, обновлено");
    assert_eq!(updated["backgroundImageUrl"], "facade.png");

    let (status, list) = send_json(&app, get_request("/api/templates")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0], updated);
}

#[tokio::test]
async fn test_create_from_plain_fields_uses_defaults() {
    let app = app();
    let (status, created) = send_json(
        &app,
        multipart_request(
            "POST",
            "/api/templates",
            &[
                Part::Text("propertyAddress", "пр. Мира, 5"),
                Part::Text("propertyArea", "33.3"),
                Part::Text("totalCost", "4100000"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Новый проект");
    assert_eq!(created["propertyType"], "2k");
    assert_eq!(created["selectedBank"], "sovkombank");
    assert_eq!(created["mortgageType"], "basic");
    assert_eq!(created["totalCost"], 4_100_000);
    assert_eq!(created["initialPayment"], 0);
}

#[tokio::test]
async fn test_unknown_id_is_404() {
    let app = app();
    let missing = format!("/api/templates/{}", uuid::Uuid::new_v4());

    let (status, body) = send_json(&app, get_request(&missing)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Template not found" }));

    let (status, _) = send_json(&app, get_request("/api/templates/not-a-uuid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let data = template_data("x");
    let (status, _) = send_json(
        &app,
        multipart_request("PUT", &missing, &[Part::Text("data", &data)]),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_upload_leaves_record_untouched() {
    let app = app_with_limit(1024);
    let data = template_data("Лимит");

    let (status, created) = send_json(
        &app,
        multipart_request("POST", "/api/templates", &[Part::Text("data", &data)]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/templates/{}", created["id"].as_str().unwrap());

    let renamed = template_data("Не сохранится");
    let huge = vec![0u8; 1025];
    let (status, _) = send_json(
        &app,
        multipart_request(
            "PUT",
            &uri,
            &[
                Part::Text("data", &renamed),
                Part::File {
                    field: "floorPlan",
                    file_name: "plan.png",
                    content_type: "image/png",
                    bytes: &huge,
                },
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let (_, after) = send_json(&app, get_request(&uri)).await;
    assert_eq!(after, created);
}

#[tokio::test]
async fn test_invalid_data_is_400() {
    let app = app();
    let data = json!({ "name": "Пусто", "propertyArea": 0 }).to_string();

    let (status, body) = send_json(
        &app,
        multipart_request("POST", "/api/templates", &[Part::Text("data", &data)]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid input data");
    assert_eq!(body["errors"][0]["field"], "propertyArea");

    let (_, list) = send_json(&app, get_request("/api/templates")).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_out_of_bounds_rect_is_400() {
    let app = app();
    let mut data: Value = serde_json::from_str(&template_data("Гигант")).unwrap();
    data["backgroundPosition"] = json!("{\"x\":0,\"y\":0,\"width\":100000,\"height\":100000}");
    data["floorPlanPosition"] = json!("not json");
    let data = data.to_string();

    let (status, body) = send_json(
        &app,
        multipart_request("POST", "/api/templates", &[Part::Text("data", &data)]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "floorPlanPosition");
    assert_eq!(body["errors"][1]["field"], "backgroundPosition");

    let (_, list) = send_json(&app, get_request("/api/templates")).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_unsupported_attachment_is_400() {
    let app = app();
    let data = template_data("Гиф");
    let (status, _) = send_json(
        &app,
        multipart_request(
            "POST",
            "/api/templates",
            &[
                Part::Text("data", &data),
                Part::File {
                    field: "background",
                    file_name: "anim.gif",
                    content_type: "image/gif",
                    bytes: b"GIF89a",
                },
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// RENDERING
// ============================================================================

#[tokio::test]
async fn test_render_returns_png_and_skips_corrupt_layer() {
    let app = app();
    let data = template_data("Рендер");
    let png = png_bytes();

    let response = app
        .clone()
        .oneshot(multipart_request(
            "POST",
            "/api/render",
            &[
                Part::Text("data", &data),
                Part::File {
                    field: "floorPlan",
                    file_name: "plan.png",
                    content_type: "image/png",
                    bytes: &png,
                },
                Part::File {
                    field: "background",
                    file_name: "broken.jpg",
                    content_type: "image/jpeg",
                    bytes: &[0xff, 0xd8, 0xff, 0x00],
                },
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let story = image::load_from_memory(&body).unwrap();
    assert_eq!((story.width(), story.height()), (1080, 1920));
}

#[tokio::test]
async fn test_render_bounds_oversized_rects() {
    let app = app();
    let mut data: Value = serde_json::from_str(&template_data("Гигант")).unwrap();
    data["backgroundPosition"] = json!("{\"x\":0,\"y\":0,\"width\":100000,\"height\":100000}");
    data["floorPlanPosition"] = json!("{\"x\":-5000,\"y\":-5000,\"width\":1e30,\"height\":1e30}");
    let data = data.to_string();
    let png = png_bytes();

    let (status, body) = send(
        &app,
        multipart_request(
            "POST",
            "/api/render",
            &[
                Part::Text("data", &data),
                Part::File {
                    field: "background",
                    file_name: "facade.png",
                    content_type: "image/png",
                    bytes: &png,
                },
                Part::File {
                    field: "floorPlan",
                    file_name: "plan.png",
                    content_type: "image/png",
                    bytes: &png,
                },
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let story = image::load_from_memory(&body).unwrap();
    assert_eq!((story.width(), story.height()), (1080, 1920));
}

#[tokio::test]
async fn test_render_rejects_invalid_property() {
    let app = app();
    let data = json!({ "propertyArea": -1 }).to_string();
    let (status, body) = send_json(
        &app,
        multipart_request("POST", "/api/render", &[Part::Text("data", &data)]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "propertyArea");
}

#[tokio::test]
async fn test_pattern_catalogue() {
    let app = app();
    let (status, body) = send_json(&app, get_request("/api/patterns")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["geometric"][0]["key"], "circles");
    assert_eq!(body["geometric"][1]["key"], "triangles");
    let bitmaps = body["bitmap"].as_array().unwrap();
    assert_eq!(bitmaps.len(), 4);
    assert!(bitmaps.iter().all(|b| b["available"] == false));
}
