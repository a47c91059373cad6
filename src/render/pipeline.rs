use std::sync::Arc;

use crate::assets::decode::SourceImage;
use crate::assets::fonts::{FontBook, ShapedText};
use crate::config::EditorConfig;
use crate::foundation::core::{Affine, Background, Point, Rect, Rgba8, SurfaceSize, Vec2};
use crate::foundation::error::{EditorError, EditorResult};
use crate::interaction::hit_test::{DragTarget, approx_text_box};
use crate::model::filters::Filters;
use crate::model::overlay::{OverlayStore, TextOverlay};
use crate::model::transform::ImageTransform;
use crate::render::raster::{
    PixelRegion, affine_to_cpu, blur_region_in_place, fill_premul, image_paint, over_in_place,
    rect_to_cpu,
};
use crate::render::surface::{RenderSurface, to_u16_dims};

/// Horizontal shear applied to glyphs for faux italic.
const ITALIC_SKEW: f64 = -0.2;

/// Everything a draw reads. The pipeline never mutates editor state.
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a> {
    /// Decoded source image.
    pub source: &'a SourceImage,
    /// Pan/zoom/rotation of the image.
    pub transform: &'a ImageTransform,
    /// Filter sliders.
    pub filters: &'a Filters,
    /// Overlays in paint order.
    pub overlays: &'a OverlayStore,
    /// Active drag target; an overlay target gets a selection outline.
    pub drag_target: Option<DragTarget>,
}

/// Result of a draw request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The surface now shows the scene.
    Drawn,
    /// The container has zero area; nothing was drawn.
    Deferred,
}

/// "Cover" fit factor: the smallest uniform scale at which the image fills the whole surface.
pub fn cover_fit(image: SurfaceSize, surface: SurfaceSize) -> f64 {
    if image.is_empty() {
        return 1.0;
    }
    let sx = f64::from(surface.width) / f64::from(image.width);
    let sy = f64::from(surface.height) / f64::from(image.height);
    sx.max(sy)
}

/// Image-space to surface-space transform: the local frame of `transform`, then the cover fit,
/// with the image centered on the frame origin.
pub fn image_placement(
    transform: &ImageTransform,
    image: SurfaceSize,
    surface: SurfaceSize,
) -> Affine {
    let fit = cover_fit(image, surface);
    transform.local_frame(surface)
        * Affine::scale(fit)
        * Affine::translate((-f64::from(image.width) / 2.0, -f64::from(image.height) / 2.0))
}

/// Split the outline of `rect` into dash rectangles of thickness `width`.
pub fn dashed_rect_segments(rect: Rect, dash: f64, gap: f64, width: f64) -> Vec<Rect> {
    let mut out = Vec::new();
    if width <= 0.0 || dash <= 0.0 {
        return out;
    }
    let half = width / 2.0;
    let step = dash + gap.max(0.0);
    let runs = |from: f64, to: f64| {
        let mut spans = Vec::new();
        let mut s = from;
        while s < to {
            spans.push((s, (s + dash).min(to)));
            s += step;
        }
        spans
    };
    for (a, b) in runs(rect.x0, rect.x1) {
        out.push(Rect::new(a, rect.y0 - half, b, rect.y0 + half));
        out.push(Rect::new(a, rect.y1 - half, b, rect.y1 + half));
    }
    for (a, b) in runs(rect.y0, rect.y1) {
        out.push(Rect::new(rect.x0 - half, a, rect.x0 + half, b));
        out.push(Rect::new(rect.x1 - half, a, rect.x1 + half, b));
    }
    out
}

struct CachedImage {
    key: usize,
    paint: vello_cpu::Image,
}

/// CPU render pipeline.
///
/// Owns the reusable `vello_cpu` context, a scratch layer, the image paint and the font book.
/// Each pass is rasterized into the scratch layer and composited onto the surface.
pub struct Renderer {
    ctx: Option<vello_cpu::RenderContext>,
    scratch: Option<vello_cpu::Pixmap>,
    image: Option<CachedImage>,
    fonts: FontBook,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("fonts", &self.fonts)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Renderer with no registered fonts.
    pub fn new() -> Self {
        Self {
            ctx: None,
            scratch: None,
            image: None,
            fonts: FontBook::new(),
        }
    }

    /// Registered fonts.
    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Registered fonts, for registration.
    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    /// Draw `scene` onto `surface`, resizing it to `size` first.
    #[tracing::instrument(skip_all, fields(width = size.width, height = size.height))]
    pub fn render(
        &mut self,
        scene: &Scene<'_>,
        config: &EditorConfig,
        size: SurfaceSize,
        surface: &mut RenderSurface,
    ) -> EditorResult<RenderOutcome> {
        if size.is_empty() {
            tracing::debug!("container has zero area; draw deferred");
            return Ok(RenderOutcome::Deferred);
        }
        surface.ensure_size(size)?;
        let (w, h) = to_u16_dims(size)?;

        fill_premul(surface.pixels_mut(), config.background.to_premul());

        self.draw_image_layer(scene, size, w, h)?;
        let chain = scene.filters.chain();
        {
            let layer = self.scratch_bytes_mut()?;
            chain.apply_premul_in_place(layer);
        }
        self.composite_scratch(surface)?;

        let selected = match scene.drag_target {
            Some(DragTarget::Overlay(id)) => Some(id),
            _ => None,
        };
        for overlay in scene.overlays.iter() {
            self.draw_overlay(overlay, selected == Some(overlay.id), config, size, surface)?;
        }
        Ok(RenderOutcome::Drawn)
    }

    fn with_layer<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> EditorResult<R>,
    ) -> EditorResult<R> {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        let out = f(self, &mut ctx);

        let mut scratch = match self.scratch.take() {
            Some(p) if p.width() == width && p.height() == height => p,
            _ => vello_cpu::Pixmap::new(width, height),
        };
        scratch.data_as_u8_slice_mut().fill(0);
        ctx.flush();
        ctx.render_to_pixmap(&mut scratch);
        self.scratch = Some(scratch);
        self.ctx = Some(ctx);
        out
    }

    fn scratch_bytes_mut(&mut self) -> EditorResult<&mut [u8]> {
        self.scratch
            .as_mut()
            .map(|p| p.data_as_u8_slice_mut())
            .ok_or_else(|| EditorError::render("scratch layer missing"))
    }

    fn composite_scratch(&mut self, surface: &mut RenderSurface) -> EditorResult<()> {
        let layer = self
            .scratch
            .as_ref()
            .ok_or_else(|| EditorError::render("scratch layer missing"))?;
        over_in_place(surface.pixels_mut(), layer.data_as_u8_slice(), 1.0)
    }

    fn image_paint_for(&mut self, source: &SourceImage) -> EditorResult<vello_cpu::Image> {
        let key = Arc::as_ptr(&source.rgba8_premul) as usize;
        if let Some(cached) = self.image.as_ref().filter(|c| c.key == key) {
            return Ok(cached.paint.clone());
        }
        let paint = image_paint(&source.rgba8_premul, source.width, source.height)?;
        self.image = Some(CachedImage {
            key,
            paint: paint.clone(),
        });
        Ok(paint)
    }

    fn draw_image_layer(
        &mut self,
        scene: &Scene<'_>,
        size: SurfaceSize,
        w: u16,
        h: u16,
    ) -> EditorResult<()> {
        let paint = self.image_paint_for(scene.source)?;
        let placement = image_placement(scene.transform, scene.source.size(), size);
        let image_rect = Rect::new(
            0.0,
            0.0,
            f64::from(scene.source.width),
            f64::from(scene.source.height),
        );
        self.with_layer(w, h, |_, ctx| {
            ctx.set_transform(affine_to_cpu(placement));
            ctx.set_paint(paint);
            ctx.fill_rect(&rect_to_cpu(image_rect));
            Ok(())
        })
    }

    fn draw_overlay(
        &mut self,
        overlay: &TextOverlay,
        selected: bool,
        config: &EditorConfig,
        size: SurfaceSize,
        surface: &mut RenderSurface,
    ) -> EditorResult<()> {
        let (w, h) = to_u16_dims(size)?;
        let text_box = approx_text_box(overlay);

        let background = match overlay.style.background {
            Background::Solid(c) if c.a > 0 => Some(c),
            _ => None,
        };
        if background.is_some() || selected {
            let sel = &config.selection;
            let pad = config.overlay_padding_px;
            self.with_layer(w, h, |_, ctx| {
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                if let Some(c) = background {
                    ctx.set_paint(cpu_color(c));
                    ctx.fill_rect(&rect_to_cpu(text_box.inflate(pad, pad)));
                }
                if selected {
                    let outline = text_box.inflate(sel.padding_px, sel.padding_px);
                    ctx.set_paint(cpu_color(sel.color));
                    let dashes =
                        dashed_rect_segments(outline, sel.dash_px, sel.gap_px, sel.width_px);
                    for dash in dashes {
                        ctx.fill_rect(&rect_to_cpu(dash));
                    }
                }
                Ok(())
            })?;
            self.composite_scratch(surface)?;
        }

        let size_px = overlay.style.size_px;
        let Some(shaped) = self
            .fonts
            .shape(&overlay.text, &overlay.style.font_family, size_px)
        else {
            tracing::debug!(id = ?overlay.id, "no font registered; skipping glyphs");
            return Ok(());
        };
        let origin = Point::new(
            overlay.position.x - shaped.width() / 2.0,
            overlay.position.y - shaped.height() / 2.0,
        );

        let shadow = &config.shadow;
        if shadow.color.a > 0 {
            let shadow_origin = origin + Vec2::new(shadow.offset_x, shadow.offset_y);
            self.with_layer(w, h, |_, ctx| {
                fill_text(ctx, &shaped, shadow_origin, size_px, shadow.color, &overlay.style);
                Ok(())
            })?;
            if shadow.blur_radius_px > 0 {
                let r = f64::from(shadow.blur_radius_px);
                let ink = (shaped.width(), shaped.height());
                let extent = Rect::from_origin_size(shadow_origin, ink)
                    .inflate(r + shaped.height() * 0.25 + 2.0, r + 2.0);
                if let Some(region) = PixelRegion::clipped(extent, size.width, size.height) {
                    let sigma = (shadow.blur_radius_px as f32 / 2.0).max(0.5);
                    let layer = self.scratch_bytes_mut()?;
                    blur_region_in_place(layer, size.width, region, shadow.blur_radius_px, sigma)?;
                }
            }
            self.composite_scratch(surface)?;
        }

        self.with_layer(w, h, |_, ctx| {
            fill_text(ctx, &shaped, origin, size_px, overlay.style.color, &overlay.style);
            Ok(())
        })?;
        self.composite_scratch(surface)
    }
}

fn cpu_color(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn fill_text(
    ctx: &mut vello_cpu::RenderContext,
    shaped: &ShapedText,
    origin: Point,
    size_px: u32,
    color: Rgba8,
    style: &crate::model::overlay::TextStyle,
) {
    let mut tr = Affine::translate(origin.to_vec2());
    if style.italic {
        let mid = shaped.height() / 2.0;
        tr = tr
            * Affine::translate((0.0, mid))
            * Affine::skew(ITALIC_SKEW, 0.0)
            * Affine::translate((0.0, -mid));
    }
    let glyphs = shaped.glyphs();
    let font_size = size_px as f32;
    ctx.set_paint(cpu_color(color));

    let strikes: &[f64] = if style.bold {
        &[0.0, 1.0]
    } else {
        &[0.0]
    };
    let bold_offset = (f64::from(size_px) * 0.03).max(0.75);
    for &k in strikes {
        ctx.set_transform(affine_to_cpu(Affine::translate((k * bold_offset, 0.0)) * tr));
        ctx.glyph_run(&shaped.font)
            .font_size(font_size)
            .fill_glyphs(glyphs.iter().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            }));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
