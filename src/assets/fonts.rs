use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::error::{EditorError, EditorResult};

const LAYOUT_CACHE_CAP: usize = 256;

#[derive(Clone)]
struct RegisteredFamily {
    name: String,
    font: vello_cpu::peniko::FontData,
}

/// Shaped single-line text plus the font its glyph ids refer to.
#[derive(Clone)]
pub(crate) struct ShapedText {
    pub(crate) layout: parley::Layout<()>,
    pub(crate) font: vello_cpu::peniko::FontData,
}

impl ShapedText {
    /// Laid-out advance width in pixels.
    pub(crate) fn width(&self) -> f64 {
        f64::from(self.layout.width())
    }

    /// Laid-out line height in pixels.
    pub(crate) fn height(&self) -> f64 {
        f64::from(self.layout.height())
    }

    /// Glyphs positioned relative to the layout's top-left corner.
    pub(crate) fn glyphs(&self) -> Vec<vello_cpu::Glyph> {
        let mut out = Vec::new();
        for line in self.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                out.extend(run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                }));
            }
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct LayoutKey {
    text: String,
    family: usize,
    size_px: u32,
}

/// Registered fonts and a shaping cache.
///
/// Fonts come in as raw bytes; nothing is discovered from the file system. The first registered
/// family is the fallback for any family name that is not registered.
pub struct FontBook {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    families: Vec<RegisteredFamily>,
    cache: HashMap<LayoutKey, Arc<ShapedText>>,
}

impl Default for FontBook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("families", &self.family_names())
            .field("cached_layouts", &self.cache.len())
            .finish()
    }
}

impl FontBook {
    /// Empty font book with fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: Vec::new(),
            cache: HashMap::new(),
        }
    }

    /// Register a font file (TTF/OTF bytes) and return its family name.
    pub fn register(&mut self, bytes: Vec<u8>) -> EditorResult<String> {
        let registered = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = registered
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| EditorError::config("no font families found in font bytes"))?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| EditorError::config("registered font family has no name"))?
            .to_string();

        if self.families.iter().all(|f| f.name != name) {
            self.families.push(RegisteredFamily {
                name: name.clone(),
                font: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0),
            });
        }
        tracing::debug!(family = %name, "registered font");
        Ok(name)
    }

    /// `true` once at least one font is registered.
    pub fn has_fonts(&self) -> bool {
        !self.families.is_empty()
    }

    /// Registered family names in registration order.
    pub fn family_names(&self) -> Vec<&str> {
        self.families.iter().map(|f| f.name.as_str()).collect()
    }

    /// Index of the family to use for `requested` (case-insensitive), falling back to the first.
    fn resolve(&self, requested: &str) -> Option<usize> {
        if self.families.is_empty() {
            return None;
        }
        let idx = self
            .families
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(requested.trim()))
            .unwrap_or(0);
        Some(idx)
    }

    /// Shape `text` in `family` at `size_px`. Returns `None` when no font is registered.
    pub(crate) fn shape(
        &mut self,
        text: &str,
        family: &str,
        size_px: u32,
    ) -> Option<Arc<ShapedText>> {
        let family = self.resolve(family)?;
        let key = LayoutKey {
            text: text.to_string(),
            family,
            size_px,
        };
        if let Some(hit) = self.cache.get(&key) {
            return Some(Arc::clone(hit));
        }
        if self.cache.len() >= LAYOUT_CACHE_CAP {
            self.cache.clear();
        }

        let entry = &self.families[family];
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(entry.name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px as f32));
        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);

        let shaped = Arc::new(ShapedText {
            layout,
            font: entry.font.clone(),
        });
        self.cache.insert(key, Arc::clone(&shaped));
        Some(shaped)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
