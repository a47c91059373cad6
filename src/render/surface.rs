use crate::foundation::core::SurfaceSize;
use crate::foundation::error::{EditorError, EditorResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;

/// The 2D drawing target, resized to match its container before each draw.
pub struct RenderSurface {
    pixmap: Option<vello_cpu::Pixmap>,
    size: SurfaceSize,
}

impl std::fmt::Debug for RenderSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSurface")
            .field("size", &self.size)
            .finish()
    }
}

impl Default for RenderSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface {
    /// Zero-area surface; nothing is drawn until it is resized.
    pub fn new() -> Self {
        Self {
            pixmap: None,
            size: SurfaceSize::default(),
        }
    }

    /// Current pixel size.
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Resize to `size` when it differs. Returns `true` when the backing store was reallocated.
    pub fn ensure_size(&mut self, size: SurfaceSize) -> EditorResult<bool> {
        if size == self.size {
            return Ok(false);
        }
        let (w, h) = to_u16_dims(size)?;
        self.pixmap = (!size.is_empty()).then(|| vello_cpu::Pixmap::new(w, h));
        self.size = size;
        tracing::debug!(width = size.width, height = size.height, "surface resized");
        Ok(true)
    }

    /// Premultiplied RGBA8 pixels, row-major.
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.as_ref().map_or(&[], |p| p.data_as_u8_slice())
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [u8] {
        match self.pixmap.as_mut() {
            Some(p) => p.data_as_u8_slice_mut(),
            None => &mut [],
        }
    }

    /// Copy the current contents into an owned [`Frame`].
    pub fn frame(&self) -> Frame {
        Frame {
            width: self.size.width,
            height: self.size.height,
            data: self.pixels().to_vec(),
        }
    }
}

pub(crate) fn to_u16_dims(size: SurfaceSize) -> EditorResult<(u16, u16)> {
    let w: u16 = size
        .width
        .try_into()
        .map_err(|_| EditorError::render("surface width exceeds u16"))?;
    let h: u16 = size
        .height
        .try_into()
        .map_err(|_| EditorError::render("surface height exceeds u16"))?;
    Ok((w, h))
}

/// A rendered frame: premultiplied RGBA8, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel data.
    pub data: Vec<u8>,
}

impl Frame {
    /// Premultiplied pixel at `(x, y)`, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Straight-alpha copy of the pixel data, as encoders expect.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
