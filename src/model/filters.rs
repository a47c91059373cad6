use serde::{Deserialize, Serialize};

/// Lowest accepted filter percentage.
pub const FILTER_MIN_PCT: i32 = 0;
/// Highest accepted filter percentage.
pub const FILTER_MAX_PCT: i32 = 200;
/// Neutral filter percentage (no visual change).
pub const FILTER_NEUTRAL_PCT: i32 = 100;

/// Brightness/contrast/saturation slider state, each in `[0, 200]` percent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    brightness_pct: i32,
    contrast_pct: i32,
    saturation_pct: i32,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            brightness_pct: FILTER_NEUTRAL_PCT,
            contrast_pct: FILTER_NEUTRAL_PCT,
            saturation_pct: FILTER_NEUTRAL_PCT,
        }
    }
}

impl Filters {
    /// Brightness in percent.
    pub fn brightness_pct(&self) -> i32 {
        self.brightness_pct
    }

    /// Contrast in percent.
    pub fn contrast_pct(&self) -> i32 {
        self.contrast_pct
    }

    /// Saturation in percent.
    pub fn saturation_pct(&self) -> i32 {
        self.saturation_pct
    }

    /// Set brightness, clamped into range. Returns `true` when the stored value changed.
    pub fn set_brightness(&mut self, value: i32) -> bool {
        set_clamped(&mut self.brightness_pct, value, "brightness")
    }

    /// Set contrast, clamped into range. Returns `true` when the stored value changed.
    pub fn set_contrast(&mut self, value: i32) -> bool {
        set_clamped(&mut self.contrast_pct, value, "contrast")
    }

    /// Set saturation, clamped into range. Returns `true` when the stored value changed.
    pub fn set_saturation(&mut self, value: i32) -> bool {
        set_clamped(&mut self.saturation_pct, value, "saturation")
    }

    /// Restore all three sliders to neutral.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// `true` when all sliders are neutral.
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    /// Compose the sliders into a single color matrix.
    ///
    /// Order is fixed: brightness, then contrast, then saturation.
    pub fn chain(&self) -> FilterChain {
        let b = brightness_matrix(pct_to_factor(self.brightness_pct));
        let c = contrast_matrix(pct_to_factor(self.contrast_pct));
        let s = saturation_matrix(pct_to_factor(self.saturation_pct));
        FilterChain {
            matrix: mul_color_matrix(s, mul_color_matrix(c, b)),
        }
    }
}

fn set_clamped(slot: &mut i32, value: i32, name: &str) -> bool {
    let clamped = value.clamp(FILTER_MIN_PCT, FILTER_MAX_PCT);
    if clamped != value {
        tracing::debug!(filter = name, value, clamped, "filter value clamped");
    }
    if *slot == clamped {
        return false;
    }
    *slot = clamped;
    true
}

fn pct_to_factor(pct: i32) -> f32 {
    pct as f32 / 100.0
}

/// A 4x5 affine color matrix applied as `out = M * [r, g, b, a, 1]` on straight-alpha channels
/// normalized to `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterChain {
    matrix: [f32; 20],
}

impl FilterChain {
    /// The no-op chain.
    pub fn identity() -> Self {
        Self {
            matrix: IDENTITY_MATRIX,
        }
    }

    /// Row-major matrix coefficients.
    pub fn matrix(&self) -> &[f32; 20] {
        &self.matrix
    }

    /// `true` when applying the chain cannot change any pixel.
    pub fn is_identity(&self) -> bool {
        let eps = 1.0e-6;
        self.matrix
            .iter()
            .zip(IDENTITY_MATRIX.iter())
            .all(|(a, b)| (*a - *b).abs() <= eps)
    }

    /// Apply the chain to premultiplied RGBA8 pixels.
    pub fn apply_premul_in_place(&self, rgba8_premul: &mut [u8]) {
        if self.is_identity() {
            return;
        }
        crate::render::raster::color_matrix_premul_in_place(rgba8_premul, &self.matrix);
    }
}

const IDENTITY_MATRIX: [f32; 20] = [
    1.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0, //
];

fn brightness_matrix(b: f32) -> [f32; 20] {
    [
        b, 0.0, 0.0, 0.0, 0.0, //
        0.0, b, 0.0, 0.0, 0.0, //
        0.0, 0.0, b, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0, //
    ]
}

fn contrast_matrix(c: f32) -> [f32; 20] {
    let t = 0.5 * (1.0 - c);
    [
        c, 0.0, 0.0, 0.0, t, //
        0.0, c, 0.0, 0.0, t, //
        0.0, 0.0, c, 0.0, t, //
        0.0, 0.0, 0.0, 1.0, 0.0, //
    ]
}

// Rec. 709 luminance weights, as used by CSS `saturate()`.
fn saturation_matrix(s: f32) -> [f32; 20] {
    let (lr, lg, lb) = (0.213f32, 0.715f32, 0.072f32);
    [
        lr + (1.0 - lr) * s,
        lg - lg * s,
        lb - lb * s,
        0.0,
        0.0,
        //
        lr - lr * s,
        lg + (1.0 - lg) * s,
        lb - lb * s,
        0.0,
        0.0,
        //
        lr - lr * s,
        lg - lg * s,
        lb + (1.0 - lb) * s,
        0.0,
        0.0,
        //
        0.0,
        0.0,
        0.0,
        1.0,
        0.0,
    ]
}

// Composes as a(b(x)).
fn mul_color_matrix(a: [f32; 20], b: [f32; 20]) -> [f32; 20] {
    let mut out = [0.0f32; 20];
    for row in 0..4 {
        let base = row * 5;
        for col in 0..4 {
            let mut v = 0.0f32;
            for k in 0..4 {
                v += a[row * 5 + k] * b[k * 5 + col];
            }
            out[row * 5 + col] = v;
        }
        out[base + 4] = a[base + 4]
            + a[base] * b[4]
            + a[base + 1] * b[9]
            + a[base + 2] * b[14]
            + a[base + 3] * b[19];
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/model/filters.rs"]
mod tests;
