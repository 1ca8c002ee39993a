//! Background style selection.
//!
//! At most one style is active at a time. The three kinds live in one
//! tagged union, so choosing one structurally replaces the others.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::canvas::Color;
use crate::error::StoryError;

/// Picker color before the user chooses anything.
pub const DEFAULT_PICKER_COLOR: Color = Color::rgb(0x3b, 0x82, 0xf6);

/// Pre-made bitmap backgrounds, loaded from `{key}.png`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BitmapPattern {
    BlueGeometric,
    PurpleWave,
    GreenHexagonal,
    OrangeCircles,
}

impl BitmapPattern {
    pub const ALL: [BitmapPattern; 4] = [
        BitmapPattern::BlueGeometric,
        BitmapPattern::PurpleWave,
        BitmapPattern::GreenHexagonal,
        BitmapPattern::OrangeCircles,
    ];

    pub fn key(self) -> &'static str {
        match self {
            BitmapPattern::BlueGeometric => "blue-geometric",
            BitmapPattern::PurpleWave => "purple-wave",
            BitmapPattern::GreenHexagonal => "green-hexagonal",
            BitmapPattern::OrangeCircles => "orange-circles",
        }
    }

    /// Human-readable name shown in pattern pickers.
    pub fn title(self) -> &'static str {
        match self {
            BitmapPattern::BlueGeometric => "Геометрический синий",
            BitmapPattern::PurpleWave => "Фиолетовые волны",
            BitmapPattern::GreenHexagonal => "Зеленые шестиугольники",
            BitmapPattern::OrangeCircles => "Оранжевые круги",
        }
    }

    /// File name inside the pattern directory.
    pub fn file_name(self) -> String {
        format!("{}.png", self.key())
    }
}

/// Procedurally generated motifs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometricKind {
    Circles,
    Triangles,
}

impl GeometricKind {
    pub const ALL: [GeometricKind; 2] = [GeometricKind::Circles, GeometricKind::Triangles];

    pub fn key(self) -> &'static str {
        match self {
            GeometricKind::Circles => "circles",
            GeometricKind::Triangles => "triangles",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            GeometricKind::Circles => "Круги",
            GeometricKind::Triangles => "Треугольники",
        }
    }
}

impl FromStr for BitmapPattern {
    type Err = StoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BitmapPattern::ALL
            .into_iter()
            .find(|p| p.key() == s)
            .ok_or_else(|| StoryError::invalid("pattern", format!("unknown pattern '{}'", s)))
    }
}

impl FromStr for GeometricKind {
    type Err = StoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GeometricKind::ALL
            .into_iter()
            .find(|k| k.key() == s)
            .ok_or_else(|| StoryError::invalid("geometric", format!("unknown kind '{}'", s)))
    }
}

impl fmt::Display for BitmapPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl fmt::Display for GeometricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The one background style in effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActiveStyle {
    Color { color: Color },
    BitmapPattern { pattern: BitmapPattern },
    GeometricPattern { kind: GeometricKind, tint: Color },
}

/// Style picker state: the active style (if any) plus the picker color.
///
/// The picker color outlives style changes: it seeds geometric patterns and
/// is what the color input shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleSelection {
    active: Option<ActiveStyle>,
    picker: Color,
}

impl Default for StyleSelection {
    fn default() -> Self {
        Self {
            active: None,
            picker: DEFAULT_PICKER_COLOR,
        }
    }
}

impl StyleSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<ActiveStyle> {
        self.active
    }

    pub fn picker_color(&self) -> Color {
        self.picker
    }

    /// Use a flat color; any pattern is dropped.
    pub fn select_color(&mut self, color: Color) {
        self.picker = color;
        self.active = Some(ActiveStyle::Color { color });
    }

    /// Use a bitmap pattern; the picker color returns to its default.
    pub fn select_bitmap(&mut self, pattern: BitmapPattern) {
        self.picker = DEFAULT_PICKER_COLOR;
        self.active = Some(ActiveStyle::BitmapPattern { pattern });
    }

    /// Use a geometric pattern tinted with the current picker color.
    pub fn select_geometric(&mut self, kind: GeometricKind) {
        self.active = Some(ActiveStyle::GeometricPattern {
            kind,
            tint: self.picker,
        });
    }

    /// Apply independent choices in one go. A color also tints a geometric
    /// pattern chosen alongside it.
    pub fn apply_choices(
        &mut self,
        color: Option<Color>,
        pattern: Option<BitmapPattern>,
        geometric: Option<GeometricKind>,
    ) {
        if let Some(color) = color {
            self.select_color(color);
        }
        if let Some(pattern) = pattern {
            self.select_bitmap(pattern);
        }
        if let Some(kind) = geometric {
            self.select_geometric(kind);
        }
    }

    /// Back to the default gradient.
    pub fn clear(&mut self) {
        self.active = None;
    }

    pub fn color(&self) -> Option<Color> {
        match self.active {
            Some(ActiveStyle::Color { color }) => Some(color),
            _ => None,
        }
    }

    pub fn bitmap(&self) -> Option<BitmapPattern> {
        match self.active {
            Some(ActiveStyle::BitmapPattern { pattern }) => Some(pattern),
            _ => None,
        }
    }

    pub fn geometric(&self) -> Option<GeometricKind> {
        match self.active {
            Some(ActiveStyle::GeometricPattern { kind, .. }) => Some(kind),
            _ => None,
        }
    }
}
