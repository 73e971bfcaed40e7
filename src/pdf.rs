//! One-page PDF documents holding a single image.

use crate::error::Result;
use image::RgbaImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

const MM_TO_PT: f32 = 72.0 / 25.4;

/// Page dimensions in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width_mm: 210.0,
        height_mm: 297.0,
    };

    pub fn width_pt(&self) -> f32 {
        self.width_mm * MM_TO_PT
    }

    pub fn height_pt(&self) -> f32 {
        self.height_mm * MM_TO_PT
    }
}

/// Image box on the page, millimetres from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

impl Placement {
    /// A `width` x `height` box centered on both axes of `page`.
    pub fn centered(page: PageSize, width_mm: f32, height_mm: f32) -> Self {
        Self {
            x_mm: (page.width_mm - width_mm) / 2.0,
            y_mm: (page.height_mm - height_mm) / 2.0,
            width_mm,
            height_mm,
        }
    }
}

/// Build a one-page document showing `image` inside `placement`.
///
/// Transparent pixels are flattened onto white. The pixel data is stored
/// Flate-compressed.
pub fn single_image_page(image: &RgbaImage, page: PageSize, placement: Placement) -> Result<Vec<u8>> {
    let mut rgb = Vec::with_capacity((image.width() * image.height() * 3) as usize);
    for px in image.pixels() {
        let [r, g, b, a] = px.0;
        let a = a as u32;
        for c in [r, g, b] {
            rgb.push(((c as u32 * a + 255 * (255 - a)) / 255) as u8);
        }
    }

    let w = placement.width_mm * MM_TO_PT;
    let h = placement.height_mm * MM_TO_PT;
    let x = placement.x_mm * MM_TO_PT;
    // PDF user space grows upwards from the bottom edge
    let y = page.height_pt() - placement.y_mm * MM_TO_PT - h;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut pixels = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width() as i64,
            "Height" => image.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
        },
        rgb,
    );
    pixels.compress()?;
    let image_id = doc.add_object(pixels);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![w.into(), 0.into(), 0.into(), h.into(), x.into(), y.into()],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), page.width_pt().into(), page.height_pt().into()],
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}
