use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::SurfaceSize;
use crate::foundation::error::{EditorError, EditorResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// An encoded image as handed over by the host (file picker, drag-and-drop, CLI argument).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageFile {
    /// Original file name, e.g. `photo.jpg`.
    pub name: String,
    /// Declared media type, e.g. `image/jpeg`. May be empty when unknown.
    pub media_type: String,
    /// Encoded bytes.
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Read `path` from disk, guessing the media type from the extension.
    pub fn from_path(path: &std::path::Path) -> EditorResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| EditorError::load(format!("read '{}': {e}", path.display())))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let media_type = image::ImageFormat::from_path(path)
            .map(|f| f.to_mime_type().to_string())
            .unwrap_or_default();
        Ok(Self {
            name,
            media_type,
            bytes,
        })
    }
}

/// Decoded source image, kept premultiplied for compositing.
#[derive(Clone, Debug)]
pub struct SourceImage {
    /// Original file name.
    pub name: String,
    /// Media type of the source; the export format is derived from it.
    pub media_type: String,
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 pixels, row-major.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl SourceImage {
    /// Natural dimensions.
    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }
}

/// Decode `file` into premultiplied RGBA8.
///
/// The declared media type is used as a format hint when it names a known format; otherwise the
/// format is sniffed from the bytes and the sniffed media type is recorded on the result. Images
/// with a zero or oversized dimension are rejected.
#[tracing::instrument(skip(file), fields(name = %file.name, media_type = %file.media_type))]
pub fn decode_image(file: &ImageFile) -> EditorResult<SourceImage> {
    let hinted = image::ImageFormat::from_mime_type(&file.media_type);
    let dyn_img = match hinted {
        Some(format) => image::load_from_memory_with_format(&file.bytes, format)
            .or_else(|_| image::load_from_memory(&file.bytes)),
        None => image::load_from_memory(&file.bytes),
    }
    .context("decode image from memory")
    .map_err(|e| EditorError::load(format!("{e:#}")))?;

    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(EditorError::load("image has a zero dimension"));
    }
    if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
        return Err(EditorError::load(format!(
            "image {width}x{height} exceeds the {max}x{max} limit",
            max = u16::MAX
        )));
    }

    // An unknown declared type is replaced by the sniffed one so the export keeps the format.
    let media_type = match hinted {
        Some(_) => file.media_type.clone(),
        None => image::guess_format(&file.bytes)
            .map(|f| f.to_mime_type().to_string())
            .unwrap_or_else(|_| file.media_type.clone()),
    };

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    tracing::debug!(width, height, "decoded image");

    Ok(SourceImage {
        name: file.name.clone(),
        media_type,
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
