use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

use super::EntityId;

/// Largest accepted credential edge, in pixels.
pub const MAX_DIMENSION: u32 = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("color '{0}' must be '#' followed by exactly 6 hexadecimal characters")]
pub struct ColorError(pub String);

/// `#rrggbb` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scales every channel towards black; `factor` is clamped to `0..=1`.
    pub fn darken(self, factor: f32) -> Self {
        let keep = 1.0 - factor.clamp(0.0, 1.0);
        let scale = |channel: u8| (f32::from(channel) * keep).round() as u8;
        Self::rgb(scale(self.r), scale(self.g), scale(self.b))
    }
}

impl FromStr for HexColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| ColorError(s.to_string()))?;
        let channel = |at: usize| {
            u8::from_str_radix(&hex[at..at + 2], 16).map_err(|_| ColorError(s.to_string()))
        };
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for HexColor {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Default for Dimensions {
    fn default() -> Self {
        CredentialSize::Standard.dimensions()
    }
}

impl Dimensions {
    pub fn is_renderable(&self) -> bool {
        (1..=MAX_DIMENSION).contains(&self.width) && (1..=MAX_DIMENSION).contains(&self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Design {
    pub background_color: HexColor,
    pub header_color: HexColor,
    pub text_color: HexColor,
    pub accent_color: HexColor,
}

impl Default for Design {
    fn default() -> Self {
        Self {
            background_color: HexColor::rgb(0xff, 0xff, 0xff),
            header_color: HexColor::rgb(0x25, 0x63, 0xeb),
            text_color: HexColor::rgb(0x1f, 0x29, 0x37),
            accent_color: HexColor::rgb(0x10, 0xb9, 0x81),
        }
    }
}

/// Named badge sizes offered in the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSize {
    #[default]
    Standard,
    Large,
    Small,
}

impl CredentialSize {
    pub fn dimensions(&self) -> Dimensions {
        let (width, height) = match self {
            CredentialSize::Standard => (400, 250),
            CredentialSize::Large => (500, 300),
            CredentialSize::Small => (300, 200),
        };
        Dimensions { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: EntityId,
    pub name: String,
    #[sqlx(json)]
    pub dimensions: Dimensions,
    #[sqlx(json)]
    pub design: Design,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub design: Design,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub dimensions: Option<Dimensions>,
    pub design: Option<Design>,
}

impl Template {
    pub fn apply(&mut self, patch: TemplatePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(dimensions) = patch.dimensions {
            self.dimensions = dimensions;
        }
        if let Some(design) = patch.design {
            self.design = design;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color_parsing() {
        let color: HexColor = "#2563EB".parse().unwrap();
        assert_eq!(color, HexColor::rgb(0x25, 0x63, 0xeb));
        assert_eq!(color.to_string(), "#2563eb");

        for bad in ["2563eb", "#2563e", "#2563ebff", "#zz63eb", ""] {
            assert!(bad.parse::<HexColor>().is_err(), "{bad}");
        }
    }

    #[test]
    fn test_darken() {
        let color = HexColor::rgb(200, 100, 0);
        assert_eq!(color.darken(0.5), HexColor::rgb(100, 50, 0));
        assert_eq!(color.darken(2.0), HexColor::rgb(0, 0, 0));
    }

    #[test]
    fn test_design_json_uses_camel_case_hex() {
        let json = serde_json::to_value(Design::default()).unwrap();
        assert_eq!(json["headerColor"], "#2563eb");
        assert_eq!(json["backgroundColor"], "#ffffff");

        let bad = r##"{"backgroundColor":"white","headerColor":"#000000","textColor":"#000000","accentColor":"#000000"}"##;
        assert!(serde_json::from_str::<Design>(bad).is_err());
    }

    #[test]
    fn test_dimension_bounds() {
        assert!(Dimensions::default().is_renderable());
        assert!(!Dimensions { width: 0, height: 250 }.is_renderable());
        assert!(!Dimensions {
            width: 400,
            height: MAX_DIMENSION + 1
        }
        .is_renderable());
    }

    #[test]
    fn test_credential_sizes() {
        assert_eq!(
            CredentialSize::Large.dimensions(),
            Dimensions {
                width: 500,
                height: 300
            }
        );
        assert_eq!(Dimensions::default().width, 400);
    }
}
