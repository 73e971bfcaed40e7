use crate::error::{Error, Result};
use crate::qrcode::RenderedQr;
use image::{Rgba, RgbaImage};

/// Pixel ratio used for every export and upload.
pub const EXPORT_SCALE: u32 = 2;

const CARD_COLOR: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);

/// Turns a rendered symbol into a bitmap.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, rendered: &RenderedQr) -> Result<RgbaImage>;
}

/// Where the symbol lands inside the rasterized card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Edge of the whole card in pixels
    pub card: u32,
    /// Top-left corner of the colored symbol box
    pub box_origin: u32,
    /// Edge of the colored symbol box
    pub box_edge: u32,
    /// Top-left corner of the first module
    pub module_origin: u32,
    /// Edge of one module
    pub module_px: u32,
}

impl Layout {
    pub fn compute(rendered: &RenderedQr, scale: u32) -> Result<Self> {
        if scale == 0 {
            return Err(Error::Render("scale must be positive".to_string()));
        }

        let modules = rendered.module_count() as u32;
        let box_edge = rendered.size().pixels() * scale;
        let padding = rendered.size().padding() * scale;
        let module_px = (box_edge / modules).max(1);
        let symbol_edge = module_px * modules;
        // Modules that do not divide the box evenly are centered in it
        let inset = box_edge.saturating_sub(symbol_edge) / 2;

        Ok(Self {
            card: box_edge.max(symbol_edge) + 2 * padding,
            box_origin: padding,
            box_edge: box_edge.max(symbol_edge),
            module_origin: padding + inset,
            module_px,
        })
    }

    /// Pixel at the center of module `(x, y)`.
    pub fn module_center(&self, x: u32, y: u32) -> (u32, u32) {
        (
            self.module_origin + x * self.module_px + self.module_px / 2,
            self.module_origin + y * self.module_px + self.module_px / 2,
        )
    }
}

/// Paints the symbol on a white padded card, like the on-screen preview.
#[derive(Debug, Clone, Copy)]
pub struct CardRasterizer {
    scale: u32,
}

impl CardRasterizer {
    pub fn new(scale: u32) -> Self {
        Self { scale }
    }
}

impl Default for CardRasterizer {
    fn default() -> Self {
        Self::new(EXPORT_SCALE)
    }
}

impl Rasterizer for CardRasterizer {
    fn rasterize(&self, rendered: &RenderedQr) -> Result<RgbaImage> {
        let layout = Layout::compute(rendered, self.scale)?;
        let [fr, fg, fb] = rendered.fg().rgb();
        let [br, bg, bb] = rendered.bg().rgb();
        let dark = Rgba([fr, fg, fb, 0xff]);
        let light = Rgba([br, bg, bb, 0xff]);

        let mut img = RgbaImage::from_pixel(layout.card, layout.card, CARD_COLOR);

        for y in layout.box_origin..layout.box_origin + layout.box_edge {
            for x in layout.box_origin..layout.box_origin + layout.box_edge {
                img.put_pixel(x, y, light);
            }
        }

        let modules = rendered.module_count();
        for my in 0..modules {
            for mx in 0..modules {
                if !rendered.is_dark(mx, my) {
                    continue;
                }
                let x0 = layout.module_origin + mx as u32 * layout.module_px;
                let y0 = layout.module_origin + my as u32 * layout.module_px;
                for dy in 0..layout.module_px {
                    for dx in 0..layout.module_px {
                        img.put_pixel(x0 + dx, y0 + dy, dark);
                    }
                }
            }
        }

        log::debug!(
            "rasterized {}x{} modules into {}px card",
            modules,
            modules,
            layout.card
        );

        Ok(img)
    }
}
