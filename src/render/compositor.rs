//! # Story Compositor
//!
//! Paints a complete story onto any [`Surface`]. Layers, back to front:
//!
//! | # | Layer | Notes |
//! |---|-------|-------|
//! | 1 | Background fill | bitmap > geometric > flat color > default gradient |
//! | 2 | Background image | placed rect or auto-fit; handles; 30% black overlay |
//! | 3 | Floor plan | inset 2px, aspect-fit, drop shadow; handles on top |
//! | 4 | Header | address, uppercased, centered at y=150 |
//! | 5 | Financial card | program, type, area, monthly payment, rate |
//! | 6 | Bottom strip | down payment, total cost, bank |
//!
//! Rendering never fails. Image layers that could not be decoded are simply
//! absent from the [`Scene`].

use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;
use tracing::{debug, warn};

use super::patterns::{PatternLibrary, generate_pattern};
use super::style::{ActiveStyle, GeometricKind};
use crate::canvas::{
    Color, FontSet, FontSpec, LinearGradient, Paint, RasterSurface, Shadow, Stroke, Surface,
    TextAlign, TextStyle,
};
use crate::error::StoryError;
use crate::format::{format_grouped, format_plain};
use crate::geometry::{
    CANVAS_HEIGHT, CANVAS_WIDTH, PlacementKind, Point, Rect, fit_contain, handle_rect,
};
use crate::property::PropertyData;

/// Space reserved above an auto-fit background image for the header.
const HEADER_CLEARANCE: f32 = 150.0;

/// Auto-fit background images use the top 70% of the canvas.
const AUTO_FIT_HEIGHT: f32 = CANVAS_HEIGHT * 0.7;

/// Floor-plan padding inside its placement rect.
const FLOOR_PLAN_INSET: f32 = 2.0;

const CAPTION_GRAY: Color = Color::rgb(0x9c, 0xa3, 0xaf);
const RATE_BLUE: Color = Color::rgb(0x3b, 0x82, 0xf6);

const CARD: Rect = Rect::new(40.0, 1320.0, 1000.0, 300.0);
const CARD_LEFT: f32 = 70.0;
const CARD_RIGHT: f32 = 1010.0;

const STRIP_LEFT: f32 = 60.0;

/// How the full canvas is filled before any image is drawn.
#[derive(Debug, Clone)]
pub enum BackgroundFill {
    /// Blit a pre-made bitmap scaled to the canvas, untinted.
    Bitmap(Arc<RgbaImage>),
    /// Procedural pattern over a gradient seeded by `tint`.
    Geometric { kind: GeometricKind, tint: Color },
    Color(Color),
    /// Diagonal light-to-dark blue.
    DefaultGradient,
}

impl BackgroundFill {
    /// Turn a style choice into a concrete fill.
    ///
    /// A bitmap pattern with no loaded bitmap falls back to the default
    /// gradient.
    pub fn resolve(style: Option<ActiveStyle>, library: &PatternLibrary) -> Self {
        match style {
            Some(ActiveStyle::BitmapPattern { pattern }) => match library.get(pattern) {
                Some(bitmap) => BackgroundFill::Bitmap(bitmap),
                None => {
                    warn!(pattern = pattern.key(), "pattern bitmap not loaded, using default gradient");
                    BackgroundFill::DefaultGradient
                }
            },
            Some(ActiveStyle::GeometricPattern { kind, tint }) => {
                BackgroundFill::Geometric { kind, tint }
            }
            Some(ActiveStyle::Color { color }) => BackgroundFill::Color(color),
            None => BackgroundFill::DefaultGradient,
        }
    }
}

/// Everything one render needs.
#[derive(Debug, Clone)]
pub struct Scene<'a> {
    pub property: &'a PropertyData,
    pub background_image: Option<&'a RgbaImage>,
    pub floor_plan_image: Option<&'a RgbaImage>,
    pub floor_plan_rect: Option<Rect>,
    pub background_rect: Option<Rect>,
    pub fill: BackgroundFill,
    /// Draw dashed borders and resize handles around the images.
    pub show_handles: bool,
}

impl<'a> Scene<'a> {
    /// Text-only scene over the default gradient.
    pub fn new(property: &'a PropertyData) -> Self {
        Self {
            property,
            background_image: None,
            floor_plan_image: None,
            floor_plan_rect: None,
            background_rect: None,
            fill: BackgroundFill::DefaultGradient,
            show_handles: false,
        }
    }
}

/// Stops of the default background gradient.
pub fn default_gradient() -> LinearGradient {
    LinearGradient {
        from: Point::new(0.0, 0.0),
        to: Point::new(CANVAS_WIDTH, CANVAS_HEIGHT),
        start: Color::hsl(217.0, 0.91, 0.60),
        end: Color::hsl(217.0, 0.91, 0.45),
    }
}

/// Where the background image lands when the user has not placed it.
pub fn auto_fit_background(image_width: f32, image_height: f32) -> Rect {
    let fit = fit_contain(image_width, image_height, CANVAS_WIDTH, AUTO_FIT_HEIGHT);
    Rect::new(fit.x, fit.y + HEADER_CLEARANCE, fit.width, fit.height)
}

/// Floor-plan rect when none has been set: 400×300, centered, y=650.
pub fn default_floor_plan_rect() -> Rect {
    let rect = PlacementKind::FloorPlan.default_rect();
    rect.with_origin(CANVAS_WIDTH / 2.0 - rect.width / 2.0, rect.y)
}

/// Paint `scene` onto `surface`.
pub fn render(surface: &mut dyn Surface, scene: &Scene<'_>) {
    let started = Instant::now();

    paint_fill(surface, &scene.fill);

    if let Some(image) = scene.background_image {
        paint_background_image(surface, image, scene.background_rect, scene.show_handles);
    }
    if let Some(image) = scene.floor_plan_image {
        paint_floor_plan(surface, image, scene.floor_plan_rect, scene.show_handles);
    }

    paint_header(surface, scene.property);
    paint_card(surface, scene.property);
    paint_bottom_strip(surface, scene.property);

    debug!(elapsed_ms = started.elapsed().as_millis() as u64, "story rendered");
}

/// Render to a fresh 1080×1920 raster and encode it as PNG.
pub fn render_png(scene: &Scene<'_>, fonts: Option<Arc<FontSet>>) -> Result<Vec<u8>, StoryError> {
    let mut surface = RasterSurface::story(fonts);
    render(&mut surface, scene);
    surface.to_png()
}

fn paint_fill(surface: &mut dyn Surface, fill: &BackgroundFill) {
    let canvas = Rect::canvas();
    match fill {
        BackgroundFill::Bitmap(bitmap) => surface.draw_image(bitmap, canvas, None),
        BackgroundFill::Geometric { kind, tint } => generate_pattern(surface, *kind, *tint),
        BackgroundFill::Color(color) => surface.fill_rect(canvas, Paint::Solid(*color)),
        BackgroundFill::DefaultGradient => {
            surface.fill_rect(canvas, Paint::Linear(default_gradient()))
        }
    }
}

fn paint_background_image(
    surface: &mut dyn Surface,
    image: &RgbaImage,
    placed: Option<Rect>,
    show_handles: bool,
) {
    let rect =
        placed.unwrap_or_else(|| auto_fit_background(image.width() as f32, image.height() as f32));
    surface.draw_image(image, rect, None);

    if show_handles {
        paint_handles(surface, rect, &BACKGROUND_HANDLES);
    }

    // Readability overlay
    surface.fill_rect(rect, Paint::Solid(Color::BLACK.with_alpha(0.3)));
}

fn paint_floor_plan(
    surface: &mut dyn Surface,
    image: &RgbaImage,
    placed: Option<Rect>,
    show_handles: bool,
) {
    let rect = placed.unwrap_or_else(default_floor_plan_rect);
    let inner = rect.inset(FLOOR_PLAN_INSET);
    let fit = fit_contain(
        image.width() as f32,
        image.height() as f32,
        inner.width,
        inner.height,
    );
    let dest = Rect::new(inner.x + fit.x, inner.y + fit.y, fit.width, fit.height);
    surface.draw_image(
        image,
        dest,
        Some(Shadow::soft(Color::BLACK.with_alpha(0.8), 10.0)),
    );

    if show_handles {
        paint_handles(surface, rect, &FLOOR_PLAN_HANDLES);
    }
}

/// Opacities of the editing affordances.
struct HandleLook {
    border_alpha: f32,
    dash: (f32, f32),
    box_alpha: f32,
    outline_alpha: f32,
    glyph_alpha: f32,
}

const BACKGROUND_HANDLES: HandleLook = HandleLook {
    border_alpha: 0.6,
    dash: (10.0, 5.0),
    box_alpha: 0.8,
    outline_alpha: 0.4,
    glyph_alpha: 0.6,
};

const FLOOR_PLAN_HANDLES: HandleLook = HandleLook {
    border_alpha: 0.8,
    dash: (5.0, 5.0),
    box_alpha: 0.9,
    outline_alpha: 0.5,
    glyph_alpha: 0.7,
};

/// Dashed border plus the resize handle at the bottom-right corner.
fn paint_handles(surface: &mut dyn Surface, rect: Rect, look: &HandleLook) {
    let (on, off) = look.dash;
    surface.stroke_rect(
        rect,
        Stroke::dashed(Color::WHITE.with_alpha(look.border_alpha), 2.0, on, off),
    );

    let handle = handle_rect(rect);
    surface.fill_rect(handle, Paint::Solid(Color::WHITE.with_alpha(look.box_alpha)));
    surface.stroke_rect(
        handle,
        Stroke::solid(Color::BLACK.with_alpha(look.outline_alpha), 1.0),
    );

    // Diagonal grip lines, in handle-local coordinates
    let glyph = Stroke::solid(Color::BLACK.with_alpha(look.glyph_alpha), 2.0);
    let at = |dx: f32, dy: f32| Point::new(handle.x + dx, handle.y + dy);
    for ((x0, y0), (x1, y1)) in [
        ((6.0, 14.0), (14.0, 6.0)),
        ((10.0, 14.0), (14.0, 10.0)),
        ((6.0, 10.0), (10.0, 6.0)),
    ] {
        surface.stroke_line(at(x0, y0), at(x1, y1), glyph);
    }
}

fn paint_header(surface: &mut dyn Surface, property: &PropertyData) {
    let style = TextStyle::new(FontSpec::bold(64.0), Color::WHITE)
        .align(TextAlign::Center)
        .shadow(Shadow::soft(Color::BLACK.with_alpha(0.5), 10.0));
    surface.fill_text(
        &property.header_text(),
        Point::new(CANVAS_WIDTH / 2.0, 150.0),
        style,
    );
}

fn paint_card(surface: &mut dyn Surface, property: &PropertyData) {
    surface.fill_rect(CARD, Paint::Solid(Color::BLACK.with_alpha(0.7)));

    // Left column
    surface.fill_text(
        property.mortgage_type.label(),
        Point::new(CARD_LEFT, CARD.y + 60.0),
        TextStyle::new(FontSpec::regular(32.0), CAPTION_GRAY),
    );
    surface.fill_text(
        property.property_type.label(),
        Point::new(CARD_LEFT, CARD.y + 110.0),
        TextStyle::new(FontSpec::bold(40.0), Color::WHITE),
    );
    surface.fill_text(
        &format!("{} м²", format_plain(property.property_area)),
        Point::new(CARD_LEFT, CARD.y + 150.0),
        TextStyle::new(FontSpec::regular(32.0), Color::WHITE),
    );

    // Right column
    surface.fill_text(
        "Ежемесячный платёж:",
        Point::new(CARD_RIGHT, CARD.y + 60.0),
        TextStyle::new(FontSpec::regular(32.0), CAPTION_GRAY).align(TextAlign::Right),
    );
    surface.fill_text(
        &format!("{} ₽", format_grouped(property.monthly_payment)),
        Point::new(CARD_RIGHT, CARD.y + 120.0),
        TextStyle::new(FontSpec::bold(56.0), Color::WHITE).align(TextAlign::Right),
    );

    // Rate readout
    surface.fill_text(
        "Ставка:",
        Point::new(CARD_LEFT, CARD.y + 200.0),
        TextStyle::new(FontSpec::regular(24.0), CAPTION_GRAY),
    );
    let rate_text = format!("{}%", format_plain(property.bank_rate));
    let rate_font = FontSpec::bold(36.0);
    let rate_box = Rect::new(
        CARD.x + 120.0,
        CARD.y + 175.0,
        surface.measure_text(&rate_text, rate_font) + 20.0,
        50.0,
    );
    surface.fill_rect(rate_box, Paint::Solid(RATE_BLUE));
    surface.fill_text(
        &rate_text,
        Point::new(rate_box.x + 10.0, rate_box.y + 32.0),
        TextStyle::new(rate_font, Color::WHITE),
    );
}

fn paint_bottom_strip(surface: &mut dyn Surface, property: &PropertyData) {
    let bottom = CANVAS_HEIGHT - 160.0;
    let style = TextStyle::new(FontSpec::bold(48.0), Color::WHITE)
        .shadow(Shadow::offset(Color::BLACK, 8.0, 3.0, 3.0));

    surface.fill_text(
        &format!(
            "Первый взнос: {} ₽",
            format_grouped(property.initial_payment as f64)
        ),
        Point::new(STRIP_LEFT, bottom),
        style,
    );
    surface.fill_text(
        &format!("Стоимость: {} ₽", format_grouped(property.total_cost as f64)),
        Point::new(STRIP_LEFT, bottom + 60.0),
        style,
    );

    surface.fill_text(
        property.selected_bank.label(),
        Point::new(CARD_RIGHT, bottom + 70.0),
        TextStyle::new(FontSpec::bold(36.0), Color::WHITE)
            .align(TextAlign::Right)
            .shadow(Shadow::offset(Color::BLACK.with_alpha(0.8), 6.0, 2.0, 2.0)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DisplayList, DrawOp};
    use crate::property::{Bank, MortgageProgram, PropertyType};
    use crate::render::style::BitmapPattern;
    use pretty_assertions::assert_eq;

    fn sample_property() -> PropertyData {
        PropertyData {
            property_address: "ул. Ленина, 10".into(),
            property_type: PropertyType::TwoRoom,
            property_area: 51.29,
            total_cost: 5_922_500,
            initial_payment: 1_783_000,
            bank_rate: 14.99,
            monthly_payment: 52_308.56,
            selected_bank: Bank::Sovkombank,
            mortgage_type: MortgageProgram::Family,
        }
    }

    fn text_at(list: &DisplayList, text: &str) -> (Point, TextStyle) {
        match list.find_text(text) {
            Some(DrawOp::FillText { at, style, .. }) => (*at, *style),
            other => panic!("text {:?} not drawn: {:?}", text, other),
        }
    }

    #[test]
    fn test_text_layers() {
        let property = sample_property();
        let mut list = DisplayList::default();
        render(&mut list, &Scene::new(&property));

        assert_eq!(
            list.texts(),
            vec![
                "УЛ. ЛЕНИНА, 10",
                "СЕМЕЙНАЯ ИПОТЕКА",
                "2К КВАРТИРА",
                "51.29 м²",
                "Ежемесячный платёж:",
                "52\u{a0}308,56 ₽",
                "Ставка:",
                "14.99%",
                "Первый взнос: 1\u{a0}783\u{a0}000 ₽",
                "Стоимость: 5\u{a0}922\u{a0}500 ₽",
                "СОВКОМБАНК",
            ]
        );

        let (at, style) = text_at(&list, "УЛ. ЛЕНИНА, 10");
        assert_eq!(at, Point::new(540.0, 150.0));
        assert_eq!(style.align, TextAlign::Center);
        assert_eq!(style.font, FontSpec::bold(64.0));

        let (at, style) = text_at(&list, "52\u{a0}308,56 ₽");
        assert_eq!(at, Point::new(1010.0, 1440.0));
        assert_eq!(style.align, TextAlign::Right);

        let (at, _) = text_at(&list, "14.99%");
        assert_eq!(at, Point::new(170.0, 1527.0));

        let (at, style) = text_at(&list, "СОВКОМБАНК");
        assert_eq!(at, Point::new(1010.0, 1830.0));
        assert_eq!(
            style.shadow,
            Some(Shadow::offset(Color::BLACK.with_alpha(0.8), 6.0, 2.0, 2.0))
        );
    }

    #[test]
    fn test_rate_box_sized_by_measured_text() {
        let property = sample_property();
        let mut list = DisplayList::default();
        render(&mut list, &Scene::new(&property));

        let expected_width = list.measure_text("14.99%", FontSpec::bold(36.0)) + 20.0;
        let rate_box = list.ops().iter().find_map(|op| match op {
            DrawOp::FillRect {
                rect,
                paint: Paint::Solid(c),
            } if *c == RATE_BLUE => Some(*rect),
            _ => None,
        });
        assert_eq!(rate_box, Some(Rect::new(160.0, 1495.0, expected_width, 50.0)));
    }

    #[test]
    fn test_empty_address_and_zero_values() {
        let property = PropertyData::default();
        let mut list = DisplayList::default();
        render(&mut list, &Scene::new(&property));
        let texts = list.texts();
        assert_eq!(texts[0], "АДРЕС НЕ УКАЗАН");
        assert!(texts.contains(&"0 м²"));
        assert!(texts.contains(&"0 ₽"));
        assert!(texts.contains(&"0%"));
    }

    #[test]
    fn test_default_gradient_first() {
        let property = sample_property();
        let mut list = DisplayList::default();
        render(&mut list, &Scene::new(&property));
        assert_eq!(
            list.ops()[0],
            DrawOp::FillRect {
                rect: Rect::canvas(),
                paint: Paint::Linear(default_gradient()),
            }
        );
    }

    #[test]
    fn test_fill_priority() {
        let mut library = PatternLibrary::new();
        library.insert(BitmapPattern::BlueGeometric, RgbaImage::new(10, 10));

        let fill = BackgroundFill::resolve(
            Some(ActiveStyle::BitmapPattern {
                pattern: BitmapPattern::BlueGeometric,
            }),
            &library,
        );
        assert!(matches!(fill, BackgroundFill::Bitmap(_)));

        let fill = BackgroundFill::resolve(
            Some(ActiveStyle::BitmapPattern {
                pattern: BitmapPattern::PurpleWave,
            }),
            &library,
        );
        assert!(matches!(fill, BackgroundFill::DefaultGradient));

        let fill = BackgroundFill::resolve(
            Some(ActiveStyle::Color {
                color: Color::BLACK,
            }),
            &library,
        );
        assert!(matches!(fill, BackgroundFill::Color(c) if c == Color::BLACK));
        assert!(matches!(
            BackgroundFill::resolve(None, &library),
            BackgroundFill::DefaultGradient
        ));
    }

    #[test]
    fn test_bitmap_fill_blits_full_canvas() {
        let property = sample_property();
        let mut scene = Scene::new(&property);
        scene.fill = BackgroundFill::Bitmap(Arc::new(RgbaImage::new(540, 960)));
        let mut list = DisplayList::default();
        render(&mut list, &scene);
        assert_eq!(
            list.ops()[0],
            DrawOp::DrawImage {
                source_size: (540, 960),
                dest: Rect::canvas(),
                shadow: None,
            }
        );
    }

    #[test]
    fn test_background_auto_fit_and_overlay() {
        let property = sample_property();
        let image = RgbaImage::new(2000, 1000);
        let mut scene = Scene::new(&property);
        scene.background_image = Some(&image);
        let mut list = DisplayList::default();
        render(&mut list, &scene);

        let expected = Rect::new(0.0, 402.0 + 150.0, 1080.0, 540.0);
        assert_eq!(list.image_dests(), vec![expected]);
        assert_eq!(
            list.ops()[2],
            DrawOp::FillRect {
                rect: expected,
                paint: Paint::Solid(Color::BLACK.with_alpha(0.3)),
            }
        );
    }

    #[test]
    fn test_background_handles_before_overlay() {
        let property = sample_property();
        let image = RgbaImage::new(100, 100);
        let placed = Rect::new(0.0, 150.0, 1080.0, 1350.0);
        let mut scene = Scene::new(&property);
        scene.background_image = Some(&image);
        scene.background_rect = Some(placed);
        scene.show_handles = true;
        let mut list = DisplayList::default();
        render(&mut list, &scene);

        let ops = list.ops();
        assert!(matches!(ops[1], DrawOp::DrawImage { dest, .. } if dest == placed));
        assert_eq!(
            ops[2],
            DrawOp::StrokeRect {
                rect: placed,
                stroke: Stroke::dashed(Color::WHITE.with_alpha(0.6), 2.0, 10.0, 5.0),
            }
        );
        assert_eq!(
            ops[3],
            DrawOp::FillRect {
                rect: Rect::new(1060.0, 1480.0, 20.0, 20.0),
                paint: Paint::Solid(Color::WHITE.with_alpha(0.8)),
            }
        );
        assert_eq!(
            ops[5],
            DrawOp::StrokeLine {
                from: Point::new(1066.0, 1494.0),
                to: Point::new(1074.0, 1486.0),
                stroke: Stroke::solid(Color::BLACK.with_alpha(0.6), 2.0),
            }
        );
        assert_eq!(
            ops[8],
            DrawOp::FillRect {
                rect: placed,
                paint: Paint::Solid(Color::BLACK.with_alpha(0.3)),
            }
        );
    }

    #[test]
    fn test_floor_plan_default_placement() {
        let property = sample_property();
        let image = RgbaImage::new(300, 600);
        let mut scene = Scene::new(&property);
        scene.floor_plan_image = Some(&image);
        let mut list = DisplayList::default();
        render(&mut list, &scene);

        // Inner box 396×296 at (342, 652); tall image fits to 148×296
        let dest = list.image_dests();
        assert_eq!(dest, vec![Rect::new(342.0 + 124.0, 652.0, 148.0, 296.0)]);
        assert!(list.ops().iter().any(|op| matches!(
            op,
            DrawOp::DrawImage { shadow: Some(s), .. }
                if *s == Shadow::soft(Color::BLACK.with_alpha(0.8), 10.0)
        )));
    }

    #[test]
    fn test_floor_plan_handles_after_image() {
        let property = sample_property();
        let image = RgbaImage::new(400, 300);
        let rect = Rect::new(100.0, 300.0, 500.0, 400.0);
        let mut scene = Scene::new(&property);
        scene.floor_plan_image = Some(&image);
        scene.floor_plan_rect = Some(rect);
        scene.show_handles = true;
        let mut list = DisplayList::default();
        render(&mut list, &scene);

        let ops = list.ops();
        assert!(matches!(ops[1], DrawOp::DrawImage { .. }));
        assert_eq!(
            ops[2],
            DrawOp::StrokeRect {
                rect,
                stroke: Stroke::dashed(Color::WHITE.with_alpha(0.8), 2.0, 5.0, 5.0),
            }
        );
        assert_eq!(
            ops[4],
            DrawOp::StrokeRect {
                rect: Rect::new(580.0, 680.0, 20.0, 20.0),
                stroke: Stroke::solid(Color::BLACK.with_alpha(0.5), 1.0),
            }
        );
    }

    #[test]
    fn test_no_handles_when_exporting() {
        let property = sample_property();
        let image = RgbaImage::new(400, 300);
        let mut scene = Scene::new(&property);
        scene.floor_plan_image = Some(&image);
        scene.background_image = Some(&image);
        let mut list = DisplayList::default();
        render(&mut list, &scene);
        assert!(
            !list
                .ops()
                .iter()
                .any(|op| matches!(op, DrawOp::StrokeRect { .. } | DrawOp::StrokeLine { .. }))
        );
    }

    #[test]
    fn test_geometric_fill_uses_tint() {
        let property = sample_property();
        let mut scene = Scene::new(&property);
        let tint = Color::rgb(200, 100, 50);
        scene.fill = BackgroundFill::Geometric {
            kind: GeometricKind::Triangles,
            tint,
        };
        let mut list = DisplayList::default();
        render(&mut list, &scene);
        match &list.ops()[0] {
            DrawOp::FillRect {
                paint: Paint::Linear(g),
                ..
            } => assert_eq!(g.start, tint),
            other => panic!("expected gradient, got {:?}", other),
        }
        assert!(matches!(list.ops()[1], DrawOp::FillPolygon { .. }));
    }
}
