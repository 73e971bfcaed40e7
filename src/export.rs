use crate::error::{Error, Result};
use crate::pdf::{self, PageSize, Placement};
use crate::qrcode::RenderedQr;
use crate::raster::Rasterizer;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Edge of the image box on the PDF page, in millimetres.
const PDF_IMAGE_MM: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
        }
    }
}

/// `qr-code-<suffix>`; the generator uses a timestamp, the preview the record id.
pub fn default_filename(suffix: impl std::fmt::Display) -> String {
    format!("qr-code-{}", suffix)
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

pub fn export_png(
    rasterizer: &dyn Rasterizer,
    rendered: &RenderedQr,
    dir: &Path,
    filename: &str,
) -> Result<PathBuf> {
    let bytes = rasterize(rasterizer, rendered).and_then(|img| encode_png(&img));
    let bytes = bytes.map_err(|e| {
        log::error!("Error downloading QR code: {}", e);
        e
    })?;
    write_file(dir, filename, ExportFormat::Png, &bytes)
}

pub fn export_pdf(
    rasterizer: &dyn Rasterizer,
    rendered: &RenderedQr,
    dir: &Path,
    filename: &str,
) -> Result<PathBuf> {
    let placement = Placement::centered(PageSize::A4, PDF_IMAGE_MM, PDF_IMAGE_MM);
    let bytes = rasterize(rasterizer, rendered)
        .and_then(|img| pdf::single_image_page(&img, PageSize::A4, placement))
        .map_err(|e| {
            log::error!("Error downloading PDF: {}", e);
            e
        })?;
    write_file(dir, filename, ExportFormat::Pdf, &bytes)
}

pub fn export(
    format: ExportFormat,
    rasterizer: &dyn Rasterizer,
    rendered: &RenderedQr,
    dir: &Path,
    filename: &str,
) -> Result<PathBuf> {
    match format {
        ExportFormat::Png => export_png(rasterizer, rendered, dir, filename),
        ExportFormat::Pdf => export_pdf(rasterizer, rendered, dir, filename),
    }
}

fn rasterize(rasterizer: &dyn Rasterizer, rendered: &RenderedQr) -> Result<RgbaImage> {
    rasterizer.rasterize(rendered).map_err(|e| match e {
        Error::Render(_) => e,
        other => Error::Render(other.to_string()),
    })
}

fn write_file(dir: &Path, filename: &str, format: ExportFormat, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.{}", filename, format.extension()));
    std::fs::write(&path, bytes).map_err(|e| {
        log::error!("Failed to write {}: {}", path.display(), e);
        e
    })?;
    log::info!("Saved {}", path.display());
    Ok(path)
}
