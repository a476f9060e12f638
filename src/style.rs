//! Style configuration.
//!
//! A [`StyleConfig`] is an immutable value describing how to paint a matrix:
//! module shape, eye shape, color source, output size and an optional logo.
//! Every render takes one by reference; nothing here is shared or mutated
//! behind the renderer's back.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{Error, RenderError};
use crate::logo::LogoSource;

/// Output sizes offered by the interactive editor.
pub const TARGET_SIZE_RANGE: RangeInclusive<u32> = 128..=512;

/// Increment between editor size presets.
pub const TARGET_SIZE_STEP: usize = 16;

/// Editor size presets: 128, 144, ..., 512.
pub fn target_size_presets() -> impl Iterator<Item = u32> {
    TARGET_SIZE_RANGE.step_by(TARGET_SIZE_STEP)
}

/// An sRGB color with straight alpha.
///
/// Serialized as a hex string: `#rgb`, `#rrggbb` or `#rrggbbaa`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        match digits.len() {
            3 => {
                let mut short = digits.chars().map(|c| c.to_digit(16).map(|v| (v * 17) as u8));
                Some(Self::rgb(short.next()??, short.next()??, short.next()??))
            }
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: channel(6)?,
            }),
            _ => None,
        }
    }

    /// Lowercase `#rrggbb`, or `#rrggbbaa` when not opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("invalid hex color `{}`", value))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Where foreground paint comes from. Exactly one variant is active.
///
/// A gradient always runs diagonally from the top-left to the bottom-right
/// corner of the whole artifact.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColorSource {
    Solid { foreground: Color, background: Color },
    Gradient { start: Color, end: Color, background: Color },
}

impl ColorSource {
    pub fn background(&self) -> Color {
        match *self {
            ColorSource::Solid { background, .. } | ColorSource::Gradient { background, .. } => background,
        }
    }

    pub fn is_gradient(&self) -> bool {
        matches!(self, ColorSource::Gradient { .. })
    }
}

impl Default for ColorSource {
    fn default() -> Self {
        ColorSource::Solid {
            foreground: Palette::DARK_MODE.dark,
            background: Palette::DARK_MODE.light,
        }
    }
}

/// Spike count for star modules.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarSpikes {
    Four,
    Five,
}

impl StarSpikes {
    pub fn count(self) -> usize {
        match self {
            StarSpikes::Four => 4,
            StarSpikes::Five => 5,
        }
    }
}

/// Shape painted for each dark data module.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleShape {
    #[default]
    Square,
    Circle,
    Rounded,
    Diamond,
    Star(StarSpikes),
}

/// Shape of the three finder markers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeShape {
    #[default]
    Square,
    Rounded,
    Circle,
}

/// A center logo overlay.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Logo {
    pub source: LogoSource,
    /// Paint a background clear-zone behind the logo, shaped after the eyes.
    #[serde(default)]
    pub frame: bool,
}

/// Everything a renderer needs besides the matrix.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub module_shape: ModuleShape,
    pub eye_shape: EyeShape,
    pub colors: ColorSource,
    /// Output edge length in device-independent units.
    pub target_size: u32,
    pub logo: Option<Logo>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            module_shape: ModuleShape::Square,
            eye_shape: EyeShape::Square,
            colors: ColorSource::default(),
            target_size: 256,
            logo: None,
        }
    }
}

impl StyleConfig {
    /// Parses a style from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let style: StyleConfig = serde_json::from_str(json)?;
        style.validate()?;
        Ok(style)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.target_size == 0 {
            return Err(RenderError::InvalidStyle("target size must be positive".to_string()));
        }
        Ok(())
    }

    pub fn with_module_shape(mut self, shape: ModuleShape) -> Self {
        self.module_shape = shape;
        self
    }

    pub fn with_eye_shape(mut self, shape: EyeShape) -> Self {
        self.eye_shape = shape;
        self
    }

    pub fn with_colors(mut self, colors: ColorSource) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_target_size(mut self, size: u32) -> Self {
        self.target_size = size;
        self
    }

    pub fn with_logo(mut self, logo: Option<Logo>) -> Self {
        self.logo = logo;
        self
    }
}

/// A named foreground/background preset.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Palette {
    pub name: &'static str,
    pub dark: Color,
    pub light: Color,
}

impl Palette {
    pub const DARK_MODE: Palette = Palette {
        name: "Dark Mode",
        dark: Color::rgb(0x1f, 0x29, 0x37),
        light: Color::WHITE,
    };

    pub const ALL: [Palette; 5] = [
        Palette::DARK_MODE,
        Palette {
            name: "Sky Blue",
            dark: Color::rgb(0x00, 0x78, 0xd4),
            light: Color::rgb(0xf0, 0xf8, 0xff),
        },
        Palette {
            name: "Forest",
            dark: Color::rgb(0x10, 0x7c, 0x10),
            light: Color::rgb(0xf0, 0xff, 0xf0),
        },
        Palette {
            name: "Lava",
            dark: Color::rgb(0xd8, 0x3b, 0x01),
            light: Color::rgb(0xff, 0xf5, 0xf2),
        },
        Palette {
            name: "Lemon",
            dark: Color::rgb(0xff, 0xb9, 0x00),
            light: Color::rgb(0xff, 0xff, 0xf0),
        },
    ];

    pub fn by_name(name: &str) -> Option<Palette> {
        Palette::ALL.into_iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// Editable color state behind a [`ColorSource`].
///
/// The solid pair and the gradient stops are kept side by side. While the
/// gradient is enabled, foreground edits are stored but have no visual
/// effect; disabling the gradient brings the last solid pair back.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ColorEditor {
    foreground: Color,
    background: Color,
    gradient_start: Color,
    gradient_end: Color,
    gradient_enabled: bool,
}

impl Default for ColorEditor {
    fn default() -> Self {
        Self {
            foreground: Palette::DARK_MODE.dark,
            background: Palette::DARK_MODE.light,
            gradient_start: Color::rgb(0x00, 0x78, 0xd4),
            gradient_end: Color::rgb(0x00, 0xa1, 0xf1),
            gradient_enabled: false,
        }
    }
}

impl ColorEditor {
    pub fn set_foreground(&mut self, color: Color) {
        self.foreground = color;
    }

    /// The background applies to both variants.
    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    pub fn set_gradient_stops(&mut self, start: Color, end: Color) {
        self.gradient_start = start;
        self.gradient_end = end;
    }

    pub fn set_gradient_enabled(&mut self, enabled: bool) {
        self.gradient_enabled = enabled;
    }

    pub fn gradient_enabled(&self) -> bool {
        self.gradient_enabled
    }

    pub fn apply_palette(&mut self, palette: &Palette) {
        self.foreground = palette.dark;
        self.background = palette.light;
    }

    /// The color source a render should use right now.
    pub fn color_source(&self) -> ColorSource {
        if self.gradient_enabled {
            ColorSource::Gradient {
                start: self.gradient_start,
                end: self.gradient_end,
                background: self.background,
            }
        } else {
            ColorSource::Solid {
                foreground: self.foreground,
                background: self.background,
            }
        }
    }
}
