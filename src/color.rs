use crate::error::{Error, Result};
use ::color::{Rgba8, Srgb};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A QR foreground or background color.
///
/// Accepts any CSS color string. Keeps the text exactly as the user typed
/// it (that is what gets stored and shown back) alongside the sRGB value
/// used for painting. Translucent colors are flattened onto white.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    raw: String,
    rgb: [u8; 3],
}

impl Color {
    pub fn black() -> Self {
        Self {
            raw: "#000000".to_string(),
            rgb: [0, 0, 0],
        }
    }

    pub fn white() -> Self {
        Self {
            raw: "#ffffff".to_string(),
            rgb: [0xff, 0xff, 0xff],
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn rgb(&self) -> [u8; 3] {
        self.rgb
    }

    /// Lowercase `#rrggbb` form, as the SVG renderer expects.
    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.rgb;
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let parsed = ::color::parse_color(&trimmed.to_ascii_lowercase())
            .map_err(|e| Error::Validation(format!("'{}' is not a color: {}", s, e)))?;
        let Rgba8 { r, g, b, a } = parsed.to_alpha_color::<Srgb>().to_rgba8();

        Ok(Self {
            raw: trimmed.to_string(),
            rgb: [r, g, b].map(|c| over_white(c, a)),
        })
    }
}

fn over_white(c: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((c as u32 * a + 255 * (255 - a)) / 255) as u8
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.raw
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
