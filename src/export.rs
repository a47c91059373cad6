use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use image::ImageEncoder as _;

use crate::foundation::error::{EditorError, EditorResult};
use crate::render::surface::Frame;

/// Encoders the serializer can write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// `image/png`
    Png,
    /// `image/jpeg`, lossy with the configured quality.
    Jpeg,
    /// `image/webp`, lossless.
    WebP,
    /// `image/bmp`
    Bmp,
    /// `image/gif`
    Gif,
    /// `image/tiff`
    Tiff,
}

impl ExportFormat {
    /// Format for a media type, or `None` when no encoder is available for it.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/bmp" | "image/x-bmp" => Some(Self::Bmp),
            "image/gif" => Some(Self::Gif),
            "image/tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    /// Canonical media type.
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Bmp => "image/bmp",
            Self::Gif => "image/gif",
            Self::Tiff => "image/tiff",
        }
    }

    /// Canonical file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Bmp => "bmp",
            Self::Gif => "gif",
            Self::Tiff => "tiff",
        }
    }
}

/// A flattened raster produced by a save. Immutable once handed to a sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Encoded bytes (never empty).
    pub bytes: Vec<u8>,
    /// Media type of `bytes`; inherited from the source unless it had to fall back to PNG.
    pub media_type: String,
    /// File name; the source name, with the extension rewritten on PNG fallback.
    pub file_name: String,
    /// Time the artifact was produced.
    pub modified: SystemTime,
}

/// Receiver of exported artifacts (the upload collaborator).
pub trait ArtifactSink {
    /// Take ownership of one artifact.
    fn deliver(&mut self, artifact: ExportArtifact) -> EditorResult<()>;
}

/// Sink that keeps artifacts in memory.
#[derive(Debug, Default)]
pub struct InMemorySink {
    /// Delivered artifacts, oldest first.
    pub artifacts: Vec<ExportArtifact>,
}

impl InMemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactSink for InMemorySink {
    fn deliver(&mut self, artifact: ExportArtifact) -> EditorResult<()> {
        self.artifacts.push(artifact);
        Ok(())
    }
}

/// Sink that writes each artifact to a fixed path.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Write artifacts to `path`, creating parent directories as needed.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArtifactSink for FileSink {
    fn deliver(&mut self, artifact: ExportArtifact) -> EditorResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                EditorError::export(format!("create '{}': {e}", parent.display()))
            })?;
        }
        std::fs::write(&self.path, &artifact.bytes).map_err(|e| {
            EditorError::export(format!("write '{}': {e}", self.path.display()))
        })
    }
}

/// Encode `frame` using `media_type`, falling back to PNG when there is no encoder for it.
pub fn encode_frame(
    frame: &Frame,
    media_type: &str,
    file_name: &str,
    quality: u8,
) -> EditorResult<ExportArtifact> {
    if frame.width == 0 || frame.height == 0 || frame.data.is_empty() {
        return Err(EditorError::export("surface has zero area"));
    }

    let (format, file_name) = match ExportFormat::from_media_type(media_type) {
        Some(f) => (f, file_name.to_string()),
        None => {
            tracing::warn!(media_type, "no encoder for media type; exporting PNG instead");
            let renamed = Path::new(file_name).with_extension(ExportFormat::Png.extension());
            (ExportFormat::Png, renamed.to_string_lossy().into_owned())
        }
    };

    let bytes = encode_rgba8(frame, format, quality.clamp(1, 100))?;
    if bytes.is_empty() {
        return Err(EditorError::export("encoder produced no data"));
    }
    tracing::debug!(
        media_type = format.media_type(),
        len = bytes.len(),
        "frame encoded"
    );

    Ok(ExportArtifact {
        bytes,
        media_type: format.media_type().to_string(),
        file_name,
        modified: SystemTime::now(),
    })
}

fn encode_rgba8(frame: &Frame, format: ExportFormat, quality: u8) -> EditorResult<Vec<u8>> {
    let (w, h) = (frame.width, frame.height);
    let rgba = frame.to_straight_rgba8();
    let mut buf = Vec::new();
    let encode_err = |e: image::ImageError| EditorError::export(format!("encode {format:?}: {e}"));

    match format {
        ExportFormat::Png => image::codecs::png::PngEncoder::new(&mut buf)
            .write_image(&rgba, w, h, image::ExtendedColorType::Rgba8)
            .map_err(encode_err)?,
        ExportFormat::Jpeg => {
            let rgb: Vec<u8> = rgba
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality)
                .write_image(&rgb, w, h, image::ExtendedColorType::Rgb8)
                .map_err(encode_err)?
        }
        ExportFormat::WebP => image::codecs::webp::WebPEncoder::new_lossless(&mut buf)
            .write_image(&rgba, w, h, image::ExtendedColorType::Rgba8)
            .map_err(encode_err)?,
        ExportFormat::Bmp | ExportFormat::Gif | ExportFormat::Tiff => {
            let img = image::RgbaImage::from_raw(w, h, rgba)
                .ok_or_else(|| EditorError::export("frame buffer size mismatch"))?;
            let target = match format {
                ExportFormat::Bmp => image::ImageFormat::Bmp,
                ExportFormat::Gif => image::ImageFormat::Gif,
                _ => image::ImageFormat::Tiff,
            };
            image::DynamicImage::ImageRgba8(img)
                .write_to(&mut Cursor::new(&mut buf), target)
                .map_err(encode_err)?
        }
    }
    Ok(buf)
}

#[cfg(test)]
#[path = "../tests/unit/export.rs"]
mod tests;
