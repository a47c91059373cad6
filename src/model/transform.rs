use serde::{Deserialize, Serialize};

use crate::foundation::core::{Affine, SurfaceSize, Vec2};

/// Smallest allowed zoom factor.
pub const MIN_SCALE: f64 = 0.3;
/// Largest allowed zoom factor.
pub const MAX_SCALE: f64 = 5.0;
/// Rotation lower bound in degrees.
pub const MIN_ROTATION_DEG: f64 = -180.0;
/// Rotation upper bound in degrees.
pub const MAX_ROTATION_DEG: f64 = 180.0;

/// Pan/zoom/rotation applied to the base image.
///
/// Pan is unbounded: the image may be dragged fully off the surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageTransform {
    scale: f64,
    rotation_deg: f64,
    pan: Vec2,
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation_deg: 0.0,
            pan: Vec2::ZERO,
        }
    }
}

impl ImageTransform {
    /// Current zoom factor.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Current rotation in degrees.
    pub fn rotation_deg(&self) -> f64 {
        self.rotation_deg
    }

    /// Current pan offset in surface pixels.
    pub fn pan_offset(&self) -> Vec2 {
        self.pan
    }

    /// Add `delta` to the zoom factor, clamped to `[MIN_SCALE, MAX_SCALE]`.
    ///
    /// Returns `true` when the stored value changed; at the boundary this is a silent no-op.
    pub fn set_scale(&mut self, delta: f64) -> bool {
        if !delta.is_finite() {
            tracing::debug!(delta, "ignoring non-finite scale delta");
            return false;
        }
        let next = (self.scale + delta).clamp(MIN_SCALE, MAX_SCALE);
        if next == self.scale {
            return false;
        }
        self.scale = next;
        true
    }

    /// Set the absolute rotation, clamped to `[MIN_ROTATION_DEG, MAX_ROTATION_DEG]`.
    pub fn set_rotation(&mut self, value_deg: f64) -> bool {
        if !value_deg.is_finite() {
            tracing::debug!(value_deg, "ignoring non-finite rotation");
            return false;
        }
        let next = value_deg.clamp(MIN_ROTATION_DEG, MAX_ROTATION_DEG);
        if next == self.rotation_deg {
            return false;
        }
        self.rotation_deg = next;
        true
    }

    /// Move the image by `(dx, dy)` surface pixels. No clamping.
    pub fn pan(&mut self, dx: f64, dy: f64) -> bool {
        if !dx.is_finite() || !dy.is_finite() || (dx == 0.0 && dy == 0.0) {
            return false;
        }
        self.pan += Vec2::new(dx, dy);
        true
    }

    /// Scale 1, rotation 0, pan (0, 0).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// `true` when no pan/zoom/rotation is applied.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Image-local frame in surface space: origin at the surface center plus pan, then rotation,
    /// then scale.
    pub fn local_frame(&self, surface: SurfaceSize) -> Affine {
        let origin = surface.center() + self.pan;
        Affine::translate(origin.to_vec2())
            * Affine::rotate(self.rotation_deg.to_radians())
            * Affine::scale(self.scale)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/transform.rs"]
mod tests;
