use crate::color::Color;
use crate::error::{Error, Result};
use crate::record::QrRecord;
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};

/// On-screen edge length of the symbol.
///
/// Chosen by the shell from its own viewport instead of being read from
/// window globals here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplaySize {
    /// Narrow viewports (below 640px)
    Compact,
    #[default]
    Regular,
    /// Shared-link preview page, narrow viewports
    PreviewCompact,
    /// Shared-link preview page
    Preview,
}

impl DisplaySize {
    pub fn pixels(self) -> u32 {
        match self {
            DisplaySize::Compact => 180,
            DisplaySize::Regular => 220,
            DisplaySize::PreviewCompact => 200,
            DisplaySize::Preview => 280,
        }
    }

    /// Padding of the card around the symbol.
    pub fn padding(self) -> u32 {
        match self {
            DisplaySize::Compact => 16,
            DisplaySize::Regular | DisplaySize::PreviewCompact => 24,
            DisplaySize::Preview => 32,
        }
    }

    pub fn for_viewport_width(width: u32) -> Self {
        if width < 640 {
            DisplaySize::Compact
        } else {
            DisplaySize::Regular
        }
    }

    pub fn preview_for_viewport_width(width: u32) -> Self {
        Self::for_viewport_width(width).preview()
    }

    /// The matching size on the preview page, which shows the symbol larger.
    pub fn preview(self) -> Self {
        match self {
            DisplaySize::Compact | DisplaySize::PreviewCompact => DisplaySize::PreviewCompact,
            DisplaySize::Regular | DisplaySize::Preview => DisplaySize::Preview,
        }
    }
}

/// An encoded QR symbol together with the colors and size it is shown at.
#[derive(Clone)]
pub struct RenderedQr {
    content: String,
    fg: Color,
    bg: Color,
    size: DisplaySize,
    code: QrCode,
}

impl RenderedQr {
    pub fn new(content: &str, fg: Color, bg: Color, size: DisplaySize) -> Result<Self> {
        let code = QrCode::with_error_correction_level(content.as_bytes(), EcLevel::M)?;

        Ok(Self {
            content: content.to_string(),
            fg,
            bg,
            size,
            code,
        })
    }

    /// Re-render a stored record for the read-only preview.
    pub fn from_record(record: &QrRecord, size: DisplaySize) -> Result<Self> {
        let fg: Color = record.fg_color.parse()?;
        let bg: Color = record.bg_color.parse()?;
        Self::new(&record.text, fg, bg, size)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn fg(&self) -> &Color {
        &self.fg
    }

    pub fn bg(&self) -> &Color {
        &self.bg
    }

    pub fn size(&self) -> DisplaySize {
        self.size
    }

    /// Number of modules along one edge.
    pub fn module_count(&self) -> usize {
        self.code.width()
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.code[(x, y)] == qrcode::Color::Dark
    }

    pub fn to_svg(&self) -> String {
        let px = self.size.pixels();
        let fg = self.fg.to_hex();
        let bg = self.bg.to_hex();

        self.code
            .render::<svg::Color>()
            .quiet_zone(false)
            .min_dimensions(px, px)
            .max_dimensions(px, px)
            .dark_color(svg::Color(&fg))
            .light_color(svg::Color(&bg))
            .build()
    }
}

impl std::fmt::Debug for RenderedQr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedQr")
            .field("content", &self.content)
            .field("fg", &self.fg)
            .field("bg", &self.bg)
            .field("size", &self.size)
            .field("modules", &self.module_count())
            .finish()
    }
}

/// Render content straight to SVG markup for the live preview.
pub fn render_svg(content: &str, fg: &str, bg: &str, size: DisplaySize) -> Result<String> {
    if content.is_empty() {
        return Err(Error::Validation("nothing to encode".to_string()));
    }
    let rendered = RenderedQr::new(content, fg.parse()?, bg.parse()?, size)?;
    Ok(rendered.to_svg())
}
