use serde::{Deserialize, Serialize};

use crate::foundation::core::{Background, Point, Rgba8, Vec2};

/// Largest accepted overlay font size in pixels.
pub const MAX_FONT_SIZE_PX: u32 = 1024;

/// Session-unique overlay identifier. Ids increase monotonically and are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OverlayId(pub u64);

/// Visual style of a text overlay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Glyph color.
    pub color: Rgba8,
    /// Fill drawn behind the text box.
    pub background: Background,
    /// Requested font family; unknown families fall back to the default registered font.
    pub font_family: String,
    /// Font size in pixels, clamped to `1..=MAX_FONT_SIZE_PX` when stored.
    pub size_px: u32,
    /// Bold weight.
    pub bold: bool,
    /// Italic style.
    pub italic: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Rgba8::WHITE,
            background: Background::Transparent,
            font_family: "sans-serif".to_string(),
            size_px: 32,
            bold: false,
            italic: false,
        }
    }
}

/// A positioned text object drawn above the transformed image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    /// Identifier.
    pub id: OverlayId,
    /// Text content (never empty or whitespace-only).
    pub text: String,
    /// Center of the text box, in render-surface coordinates.
    pub position: Point,
    /// Style.
    pub style: TextStyle,
}

/// Partial update for an overlay. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayPatch {
    /// Replacement text; empty or whitespace-only text is ignored.
    pub text: Option<String>,
    /// New center position.
    pub position: Option<Point>,
    /// New glyph color.
    pub color: Option<Rgba8>,
    /// New background.
    pub background: Option<Background>,
    /// New font family.
    pub font_family: Option<String>,
    /// New size in pixels.
    pub size_px: Option<u32>,
    /// New bold flag.
    pub bold: Option<bool>,
    /// New italic flag.
    pub italic: Option<bool>,
}

/// Ordered overlay collection.
///
/// Sequence position is the z-order: index 0 is bottom-most and painted first; the last element
/// is topmost and wins hit-tests. Overlays are only ever appended or removed, never reordered.
#[derive(Clone, Debug, Default)]
pub struct OverlayStore {
    overlays: Vec<TextOverlay>,
    next_id: u64,
}

impl OverlayStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new topmost overlay centered at `at`.
    ///
    /// Returns `None` (and stores nothing) when `text` is empty or whitespace-only.
    pub fn add(&mut self, text: &str, mut style: TextStyle, at: Point) -> Option<OverlayId> {
        if text.trim().is_empty() {
            tracing::debug!("ignoring overlay with empty text");
            return None;
        }
        style.size_px = style.size_px.clamp(1, MAX_FONT_SIZE_PX);
        self.next_id += 1;
        let id = OverlayId(self.next_id);
        self.overlays.push(TextOverlay {
            id,
            text: text.to_string(),
            position: at,
            style,
        });
        Some(id)
    }

    /// Apply `patch` to the overlay with `id`. Returns `false` when the id is unknown or the
    /// patch changes nothing.
    pub fn update(&mut self, id: OverlayId, patch: &OverlayPatch) -> bool {
        let Some(o) = self.get_mut(id) else {
            tracing::debug!(?id, "update for unknown overlay");
            return false;
        };
        let before = o.clone();
        if let Some(text) = patch.text.as_deref().filter(|t| !t.trim().is_empty()) {
            o.text = text.to_string();
        }
        if let Some(p) = patch.position.filter(|p| p.x.is_finite() && p.y.is_finite()) {
            o.position = p;
        }
        if let Some(c) = patch.color {
            o.style.color = c;
        }
        if let Some(bg) = patch.background {
            o.style.background = bg;
        }
        if let Some(family) = &patch.font_family {
            o.style.font_family = family.clone();
        }
        if let Some(size) = patch.size_px {
            o.style.size_px = size.clamp(1, MAX_FONT_SIZE_PX);
        }
        if let Some(bold) = patch.bold {
            o.style.bold = bold;
        }
        if let Some(italic) = patch.italic {
            o.style.italic = italic;
        }
        *o != before
    }

    /// Move the overlay with `id` by `delta`.
    pub fn translate(&mut self, id: OverlayId, delta: Vec2) -> bool {
        if !delta.is_finite() || delta == Vec2::ZERO {
            return false;
        }
        match self.get_mut(id) {
            Some(o) => {
                o.position += delta;
                true
            }
            None => false,
        }
    }

    /// Remove and return the overlay with `id`. The order of the rest is preserved.
    pub fn remove(&mut self, id: OverlayId) -> Option<TextOverlay> {
        let idx = self.overlays.iter().position(|o| o.id == id)?;
        Some(self.overlays.remove(idx))
    }

    /// Drop every overlay. Ids issued afterwards keep increasing.
    pub fn reset(&mut self) {
        self.overlays.clear();
    }

    /// Look up an overlay.
    pub fn get(&self, id: OverlayId) -> Option<&TextOverlay> {
        self.overlays.iter().find(|o| o.id == id)
    }

    fn get_mut(&mut self, id: OverlayId) -> Option<&mut TextOverlay> {
        self.overlays.iter_mut().find(|o| o.id == id)
    }

    /// Overlays in paint order (bottom-most first).
    pub fn iter(&self) -> std::slice::Iter<'_, TextOverlay> {
        self.overlays.iter()
    }

    /// Overlays in hit-test order (topmost first).
    pub fn iter_topmost_first(&self) -> std::iter::Rev<std::slice::Iter<'_, TextOverlay>> {
        self.overlays.iter().rev()
    }

    /// Overlays as a slice, in paint order.
    pub fn as_slice(&self) -> &[TextOverlay] {
        &self.overlays
    }

    /// Number of overlays.
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    /// `true` when there are no overlays.
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/overlay.rs"]
mod tests;
