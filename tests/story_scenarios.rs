//! # Story Scenarios
//!
//! End-to-end checks across property data, placement, compositing and
//! templates, driven through the public API.

use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::{ImageFormat, Rgba, RgbaImage};
use pretty_assertions::assert_eq;

use story_render::assets::DecodeOutcome;
use story_render::canvas::{Color, DisplayList, RasterSurface};
use story_render::geometry::{PlacementKind, Point, Rect};
use story_render::property::{PropertyData, calculate_monthly_payment};
use story_render::render::{PatternLibrary, Scene, render};
use story_render::template::{ImageRefs, MemoryTemplateStore, StoryTemplate, TemplateStore};
use story_render::{StoryEditor, StoryError};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn scenario_property() -> PropertyData {
    PropertyData {
        property_address: "Москва, Пресненская наб., 12".into(),
        property_area: 51.29,
        total_cost: 5_922_500,
        initial_payment: 1_783_000,
        bank_rate: 14.99,
        ..PropertyData::default()
    }
}

fn editor() -> StoryEditor {
    StoryEditor::new(None, Arc::new(PatternLibrary::new()))
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbaImage::from_pixel(width, height, Rgba([20, 120, 40, 255]))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Standard annuity formula, written out independently.
fn reference_payment(principal: f64, annual_rate: f64, years: u32) -> f64 {
    let r = annual_rate / 100.0 / 12.0;
    let n = (years * 12) as i32;
    let growth = (1.0 + r).powi(n);
    (principal * r * growth / (growth - 1.0) * 100.0).round() / 100.0
}

fn assert_close(actual: Rgba<u8>, expected: Color, tolerance: i16) {
    for (channel, want) in [expected.r, expected.g, expected.b].into_iter().enumerate() {
        let diff = (actual[channel] as i16 - want as i16).abs();
        assert!(
            diff <= tolerance,
            "channel {} is {}, expected {} (±{})",
            channel,
            actual[channel],
            want,
            tolerance
        );
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn scenario_monthly_payment() {
    let property = scenario_property();
    assert_eq!(property.loan_amount(), 4_139_500);

    let expected = reference_payment(4_139_500.0, 14.99, 30);
    assert_eq!(expected, 52_308.56);
    let actual = calculate_monthly_payment(5_922_500.0, 1_783_000.0, 14.99, 30);
    assert_eq!(actual, 52_308.56);

    let mut e = editor();
    e.set_property(property);
    assert_eq!(e.property().monthly_payment, 52_308.56);
}

#[test]
fn scenario_background_drag_is_clamped() {
    let t0 = Instant::now();
    let mut e = editor();
    assert_eq!(
        e.load_image(PlacementKind::Background, "bg.png", &png_bytes(16, 20), t0),
        DecodeOutcome::Loaded
    );
    assert_eq!(
        e.placement().rect(PlacementKind::Background),
        Some(Rect::new(0.0, 150.0, 1080.0, 1350.0))
    );

    let controller = e.placement_mut();
    controller.pointer_down(Point::new(500.0, 400.0));
    controller.pointer_move(Point::new(550.0, 400.0), t0);
    let rect = controller.rect(PlacementKind::Background).unwrap();
    assert_eq!(rect.x, 50.0);
    assert!((-200.0..=1280.0).contains(&rect.x));

    controller.pointer_move(Point::new(500.0 - 9999.0, 400.0), t0);
    let rect = controller.rect(PlacementKind::Background).unwrap();
    assert_eq!(rect.x, -200.0);
    assert_eq!((rect.width, rect.height), (1080.0, 1350.0));
    controller.pointer_up();

    // One report for the whole gesture
    assert!(e.poll(t0 + Duration::from_millis(50)).is_none());
    assert!(e.poll(t0 + Duration::from_millis(100)).is_some());
    assert!(e.poll(t0 + Duration::from_millis(300)).is_none());
}

#[test]
fn scenario_default_gradient_background() {
    let property = scenario_property();
    let mut surface = RasterSurface::story(None);
    render(&mut surface, &Scene::new(&property));

    let image = surface.image();
    assert_close(*image.get_pixel(0, 0), Color::hsl(217.0, 0.91, 0.60), 2);
    assert_close(*image.get_pixel(1079, 1919), Color::hsl(217.0, 0.91, 0.45), 2);
}

#[tokio::test]
async fn scenario_template_roundtrip() {
    let t0 = Instant::now();
    let mut e = editor();
    e.set_name("Пресня");
    e.set_property(scenario_property());
    e.load_image(PlacementKind::FloorPlan, "plan.png", &png_bytes(40, 30), t0);
    e.placement_mut().pointer_down(Point::new(500.0, 800.0));
    e.placement_mut().pointer_move(Point::new(437.5, 833.25), t0);
    e.placement_mut().pointer_up();

    let draft = e.to_draft().unwrap();
    let store = MemoryTemplateStore::new();
    let saved = store.create(draft.clone(), e.image_refs()).await.unwrap();

    let json = serde_json::to_vec(&store.get(saved.id).await.unwrap()).unwrap();
    let reloaded: StoryTemplate = serde_json::from_slice(&json).unwrap();
    assert_eq!(reloaded.property, draft.property);
    assert_eq!(reloaded.floor_plan_position, draft.floor_plan_position);
    assert_eq!(reloaded.background_position, draft.background_position);
    assert_eq!(reloaded.floor_plan_url.as_deref(), Some("plan.png"));

    let mut restored = editor();
    restored.apply_template(&reloaded, t0);
    assert_eq!(restored.placement().placements(), e.placement().placements());
    assert_eq!(restored.to_draft().unwrap(), draft);
}

#[test]
fn header_follows_address() {
    let mut property = scenario_property();
    let mut list = DisplayList::default();
    render(&mut list, &Scene::new(&property));
    assert_eq!(list.texts()[0], "МОСКВА, ПРЕСНЕНСКАЯ НАБ., 12");

    property.property_address.clear();
    let mut list = DisplayList::default();
    render(&mut list, &Scene::new(&property));
    assert_eq!(list.texts()[0], "АДРЕС НЕ УКАЗАН");
}

#[test]
fn corrupt_image_only_loses_its_layer() {
    let t0 = Instant::now();
    let mut e = editor();
    e.set_property(scenario_property());
    e.load_image(PlacementKind::FloorPlan, "plan.png", &png_bytes(40, 30), t0);
    assert_eq!(
        e.load_image(PlacementKind::Background, "photo.jpg", &[0xff, 0xd8, 0x00], t0),
        DecodeOutcome::Failed
    );

    let mut list = DisplayList::default();
    e.render_preview(&mut list);
    assert_eq!(list.image_dests().len(), 1);

    let png = e.export_png().unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1080, 1920));
}

#[test]
fn invalid_property_blocks_export() {
    let mut e = editor();
    let mut property = scenario_property();
    property.property_area = 0.0;
    e.set_property(property);
    assert!(matches!(e.export_png(), Err(StoryError::Validation(_))));
}

#[test]
fn unchanged_template_reapplies_identically() {
    let t0 = Instant::now();
    let template = StoryTemplate::create(
        story_render::template::TemplateDraft {
            name: "Эталон".into(),
            property: scenario_property(),
            floor_plan_position: Some(r#"{"x":100,"y":700,"width":500,"height":350}"#.into()),
            background_position: None,
        },
        ImageRefs::default(),
    );

    let mut e = editor();
    e.apply_template(&template, t0);
    assert_eq!(
        e.placement().rect(PlacementKind::FloorPlan),
        Some(Rect::new(100.0, 700.0, 500.0, 350.0))
    );
    assert_eq!(e.placement().rect(PlacementKind::Background), None);
}

#[test]
fn runaway_template_rects_are_pulled_in() {
    let t0 = Instant::now();
    // Stored before drafts were checked for bounds
    let template = StoryTemplate::create(
        story_render::template::TemplateDraft {
            name: "Старый".into(),
            property: scenario_property(),
            floor_plan_position: Some(r#"{"x":-50,"y":5000,"width":99999,"height":10}"#.into()),
            background_position: Some(r#"{"x":0,"y":0,"width":100000,"height":100000}"#.into()),
        },
        ImageRefs::default(),
    );

    let mut e = editor();
    e.apply_template(&template, t0);
    assert_eq!(
        e.placement().rect(PlacementKind::FloorPlan),
        Some(Rect::new(0.0, 1920.0, 1070.0, 10.0))
    );
    assert_eq!(
        e.placement().rect(PlacementKind::Background),
        Some(Rect::new(0.0, 0.0, 1680.0, 2220.0))
    );

    e.load_image(PlacementKind::Background, "bg.png", &png_bytes(16, 20), t0);
    let png = e.export_png().unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1080, 1920));
}
