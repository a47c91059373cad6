use std::sync::Arc;

use crate::foundation::core::Affine;
use crate::foundation::error::{EditorError, EditorResult};
use crate::foundation::math::{add_sat_u8, mul_div255_u8};

/// One premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Premultiplied source-over of one pixel, with an extra opacity multiplier.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let op = (opacity.clamp(0.0, 1.0) * 255.0).round() as u16;
    let src_a = mul_div255_u8(u16::from(src[3]), op);
    if src_a == 0 {
        return dst;
    }
    let keep = 255 - u16::from(src_a);
    let mut out = dst;
    for (i, o) in out.iter_mut().enumerate() {
        let s = if i == 3 {
            src_a
        } else {
            mul_div255_u8(u16::from(src[i]), op)
        };
        *o = add_sat_u8(s, mul_div255_u8(u16::from(dst[i]), keep));
    }
    out
}

/// Composite `src` over `dst`; both are premultiplied RGBA8 buffers of equal size.
pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> EditorResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(EditorError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Fill every pixel of `buf` with `px`.
pub fn fill_premul(buf: &mut [u8], px: PremulRgba8) {
    for d in buf.chunks_exact_mut(4) {
        d.copy_from_slice(&px);
    }
}

/// Apply a 4x5 row-major color matrix (straight-alpha semantics, normalized channels) to a
/// premultiplied buffer.
pub fn color_matrix_premul_in_place(rgba8_premul: &mut [u8], m: &[f32; 20]) {
    for px in rgba8_premul.chunks_exact_mut(4) {
        if px[3] == 0 {
            continue;
        }
        let pa = f32::from(px[3]) / 255.0;
        let inv_a = 1.0 / pa;
        let r = f32::from(px[0]) / 255.0 * inv_a;
        let g = f32::from(px[1]) / 255.0 * inv_a;
        let b = f32::from(px[2]) / 255.0 * inv_a;
        let a = pa;

        let out_r = (m[0] * r + m[1] * g + m[2] * b + m[3] * a + m[4]).clamp(0.0, 1.0);
        let out_g = (m[5] * r + m[6] * g + m[7] * b + m[8] * a + m[9]).clamp(0.0, 1.0);
        let out_b = (m[10] * r + m[11] * g + m[12] * b + m[13] * a + m[14]).clamp(0.0, 1.0);
        let out_a = (m[15] * r + m[16] * g + m[17] * b + m[18] * a + m[19]).clamp(0.0, 1.0);

        px[0] = to_u8(out_r * out_a);
        px[1] = to_u8(out_g * out_a);
        px[2] = to_u8(out_b * out_a);
        px[3] = to_u8(out_a);
    }
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Separable gaussian blur of a premultiplied buffer. `radius == 0` returns a copy.
///
/// Edge pixels are clamped, so a uniform buffer is left unchanged.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> EditorResult<Vec<u8>> {
    let (w, h) = (width as usize, height as usize);
    let len = w
        .checked_mul(h)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| EditorError::render("blur buffer size overflow"))?;
    if src.len() != len {
        return Err(EditorError::render("blur input does not match width*height*4"));
    }
    if radius == 0 || len == 0 {
        return Ok(src.to_vec());
    }

    let taps = gaussian_taps_q16(radius, sigma)?;
    let mut rows = vec![0u8; len];
    let mut out = vec![0u8; len];
    blur_pass(src, &mut rows, w, h, &taps, Axis::Horizontal);
    blur_pass(&rows, &mut out, w, h, &taps, Axis::Vertical);
    Ok(out)
}

/// Pixel-aligned region `[x0, x1) x [y0, y1)` of a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRegion {
    /// Left edge (inclusive).
    pub x0: u32,
    /// Top edge (inclusive).
    pub y0: u32,
    /// Right edge (exclusive).
    pub x1: u32,
    /// Bottom edge (exclusive).
    pub y1: u32,
}

impl PixelRegion {
    /// Round `rect` outwards and clip it to a `width x height` buffer. `None` when nothing remains.
    pub fn clipped(rect: kurbo::Rect, width: u32, height: u32) -> Option<Self> {
        let clip = |v: f64, max: u32| v.clamp(0.0, f64::from(max)) as u32;
        let r = Self {
            x0: clip(rect.x0.floor(), width),
            y0: clip(rect.y0.floor(), height),
            x1: clip(rect.x1.ceil(), width),
            y1: clip(rect.y1.ceil(), height),
        };
        (r.x1 > r.x0 && r.y1 > r.y0).then_some(r)
    }

    fn width(self) -> u32 {
        self.x1 - self.x0
    }

    fn height(self) -> u32 {
        self.y1 - self.y0
    }
}

/// Blur only `region` of a `width`-wide premultiplied buffer, in place.
pub fn blur_region_in_place(
    buf: &mut [u8],
    width: u32,
    region: PixelRegion,
    radius: u32,
    sigma: f32,
) -> EditorResult<()> {
    if radius == 0 {
        return Ok(());
    }
    let stride = width as usize * 4;
    let row_len = region.width() as usize * 4;
    let x_off = region.x0 as usize * 4;
    let rows = region.y0 as usize..region.y1 as usize;
    if region.x1 > width || rows.end * stride > buf.len() {
        return Err(EditorError::render("blur region outside buffer"));
    }

    let mut sub = Vec::with_capacity(row_len * rows.len());
    for y in rows.clone() {
        let start = y * stride + x_off;
        sub.extend_from_slice(&buf[start..start + row_len]);
    }
    let blurred = blur_rgba8_premul(&sub, region.width(), region.height(), radius, sigma)?;
    for (i, y) in rows.enumerate() {
        let start = y * stride + x_off;
        buf[start..start + row_len].copy_from_slice(&blurred[i * row_len..(i + 1) * row_len]);
    }
    Ok(())
}

/// Q16 gaussian taps over `-radius..=radius`, summing to exactly `1 << 16`.
fn gaussian_taps_q16(radius: u32, sigma: f32) -> EditorResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(EditorError::render("blur sigma must be > 0"));
    }
    let two_var = 2.0 * f64::from(sigma).powi(2);
    let r = i64::from(radius);
    let raw: Vec<f64> = (-r..=r)
        .map(|i| (-((i * i) as f64) / two_var).exp())
        .collect();
    let total: f64 = raw.iter().sum();
    let mut taps: Vec<u32> = raw
        .iter()
        .map(|w| (w / total * 65536.0).round() as u32)
        .collect();
    // Rounding residue lands on the center tap.
    let sum: i64 = taps.iter().map(|&t| i64::from(t)).sum();
    let mid = taps.len() / 2;
    taps[mid] = (i64::from(taps[mid]) + 65536 - sum).clamp(0, 65536) as u32;
    Ok(taps)
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

/// One 1-D convolution pass along `axis`, clamping samples at the buffer edge.
fn blur_pass(src: &[u8], dst: &mut [u8], w: usize, h: usize, taps: &[u32], axis: Axis) {
    let reach = taps.len() / 2;
    let (line_len, step) = match axis {
        Axis::Horizontal => (w, 4),
        Axis::Vertical => (h, w * 4),
    };
    for y in 0..h {
        for x in 0..w {
            let pos = match axis {
                Axis::Horizontal => x,
                Axis::Vertical => y,
            };
            let here = (y * w + x) * 4;
            let line_start = here - pos * step;
            let mut acc = [0u64; 4];
            for (t, &weight) in taps.iter().enumerate() {
                let s = (pos + t).saturating_sub(reach).min(line_len - 1);
                let i = line_start + s * step;
                for (a, &v) in acc.iter_mut().zip(&src[i..i + 4]) {
                    *a += u64::from(weight) * u64::from(v);
                }
            }
            for (d, a) in dst[here..here + 4].iter_mut().zip(acc) {
                *d = ((a + (1 << 15)) >> 16).min(255) as u8;
            }
        }
    }
}

/// Wrap premultiplied bytes in a `vello_cpu` pixmap.
pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> EditorResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| EditorError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| EditorError::render("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(EditorError::render("pixmap byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| {
            vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]])
        })
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

/// Image paint sampling a premultiplied buffer.
pub(crate) fn image_paint(bytes: &[u8], width: u32, height: u32) -> EditorResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn rect_to_cpu(r: kurbo::Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
