use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8;
use crate::foundation::error::{EditorError, EditorResult};

/// Editor tuning knobs.
///
/// Every field has a default, so a partial JSON document (or `{}`) is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Coalescing window for throttled redraws, in milliseconds.
    pub redraw_window_ms: u64,
    /// Upper bound between the first request of a burst and its draw, in milliseconds.
    pub redraw_max_wait_ms: u64,
    /// Opaque base color painted before the image.
    pub background: Rgba8,
    /// Encoder quality factor (1..=100) for lossy media types.
    pub export_quality: u8,
    /// Padding around the approximate text box for overlay background fills.
    pub overlay_padding_px: f64,
    /// Drop shadow drawn behind overlay text.
    pub shadow: ShadowConfig,
    /// Dashed outline drawn around the overlay being dragged.
    pub selection: SelectionConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            redraw_window_ms: 30,
            redraw_max_wait_ms: 100,
            background: Rgba8::BLACK,
            export_quality: 92,
            overlay_padding_px: 6.0,
            shadow: ShadowConfig::default(),
            selection: SelectionConfig::default(),
        }
    }
}

/// Fixed text drop shadow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Shadow color (straight alpha).
    pub color: Rgba8,
    /// Horizontal offset in pixels.
    pub offset_x: f64,
    /// Vertical offset in pixels.
    pub offset_y: f64,
    /// Gaussian blur radius in pixels; 0 disables the blur.
    pub blur_radius_px: u32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            color: Rgba8::new(0, 0, 0, 153),
            offset_x: 2.0,
            offset_y: 2.0,
            blur_radius_px: 4,
        }
    }
}

/// Dashed selection outline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Outline color.
    pub color: Rgba8,
    /// Dash length in pixels.
    pub dash_px: f64,
    /// Gap between dashes in pixels.
    pub gap_px: f64,
    /// Line width in pixels.
    pub width_px: f64,
    /// Extra distance between the overlay box and the outline.
    pub padding_px: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            color: Rgba8::WHITE,
            dash_px: 6.0,
            gap_px: 4.0,
            width_px: 2.0,
            padding_px: 4.0,
        }
    }
}

impl EditorConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(json: &str) -> EditorResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| EditorError::config(format!("invalid config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> EditorResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Apply `SNAPEDIT_*` environment overrides. Unparseable values are ignored.
    ///
    /// - `SNAPEDIT_REDRAW_WINDOW_MS`
    /// - `SNAPEDIT_REDRAW_MAX_WAIT_MS`
    /// - `SNAPEDIT_EXPORT_QUALITY`
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    pub(crate) fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("SNAPEDIT_REDRAW_WINDOW_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&n| n > 0)
        {
            self.redraw_window_ms = v;
        }
        if let Some(v) = lookup("SNAPEDIT_REDRAW_MAX_WAIT_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&n| n > 0)
        {
            self.redraw_max_wait_ms = v;
        }
        if let Some(v) = lookup("SNAPEDIT_EXPORT_QUALITY")
            .and_then(|v| v.trim().parse::<u8>().ok())
            .filter(|n| (1..=100).contains(n))
        {
            self.export_quality = v;
        }
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> EditorResult<()> {
        if self.redraw_window_ms == 0 {
            return Err(EditorError::config("redraw_window_ms must be > 0"));
        }
        if self.redraw_max_wait_ms < self.redraw_window_ms {
            return Err(EditorError::config(
                "redraw_max_wait_ms must be >= redraw_window_ms",
            ));
        }
        if !(1..=100).contains(&self.export_quality) {
            return Err(EditorError::config("export_quality must be in 1..=100"));
        }
        if self.background.a != 255 {
            return Err(EditorError::config("background must be opaque"));
        }
        let finite_non_negative = |v: f64| v.is_finite() && v >= 0.0;
        if !finite_non_negative(self.overlay_padding_px) {
            return Err(EditorError::config(
                "overlay_padding_px must be finite and >= 0",
            ));
        }
        if !self.shadow.offset_x.is_finite() || !self.shadow.offset_y.is_finite() {
            return Err(EditorError::config("shadow offsets must be finite"));
        }
        if self.shadow.blur_radius_px > 64 {
            return Err(EditorError::config("shadow.blur_radius_px must be <= 64"));
        }
        let sel = &self.selection;
        if !(sel.dash_px.is_finite() && sel.dash_px > 0.0) {
            return Err(EditorError::config("selection.dash_px must be > 0"));
        }
        if !finite_non_negative(sel.gap_px)
            || !finite_non_negative(sel.width_px)
            || !finite_non_negative(sel.padding_px)
        {
            return Err(EditorError::config(
                "selection gap/width/padding must be finite and >= 0",
            ));
        }
        Ok(())
    }

    pub(crate) fn redraw_window(&self) -> Duration {
        Duration::from_millis(self.redraw_window_ms)
    }

    pub(crate) fn redraw_max_wait(&self) -> Duration {
        Duration::from_millis(self.redraw_max_wait_ms)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
