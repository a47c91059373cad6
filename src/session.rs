use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::assets::decode::{ImageFile, SourceImage, decode_image};
use crate::config::EditorConfig;
use crate::export::{ArtifactSink, ExportArtifact, encode_frame};
use crate::foundation::core::Viewport;
use crate::foundation::error::{EditorError, EditorResult};
use crate::interaction::drag::{DragRouter, PointerEvent};
use crate::interaction::hit_test::DragTarget;
use crate::model::filters::Filters;
use crate::model::overlay::{OverlayId, OverlayPatch, OverlayStore, TextOverlay, TextStyle};
use crate::model::transform::ImageTransform;
use crate::render::pipeline::{RenderOutcome, Renderer, Scene};
use crate::render::scheduler::{RedrawScheduler, RedrawTicket};
use crate::render::surface::{Frame, RenderSurface};

/// Every state mutation the editor understands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditCommand {
    /// Add `delta` to the zoom factor.
    ScaleBy {
        /// Zoom delta.
        delta: f64,
    },
    /// Set the absolute rotation.
    SetRotation {
        /// Rotation in degrees.
        degrees: f64,
    },
    /// Move the image.
    Pan {
        /// Horizontal delta in surface pixels.
        dx: f64,
        /// Vertical delta in surface pixels.
        dy: f64,
    },
    /// Scale 1, rotation 0, no pan.
    ResetTransform,
    /// Brightness slider, percent.
    SetBrightness {
        /// Value in `[0, 200]`; out-of-range values are clamped.
        value: i32,
    },
    /// Contrast slider, percent.
    SetContrast {
        /// Value in `[0, 200]`; out-of-range values are clamped.
        value: i32,
    },
    /// Saturation slider, percent.
    SetSaturation {
        /// Value in `[0, 200]`; out-of-range values are clamped.
        value: i32,
    },
    /// All sliders back to 100.
    ResetFilters,
    /// Add a text overlay at the surface center.
    AddText {
        /// Text content; blank text is ignored.
        text: String,
        /// Style; omitted fields use defaults.
        #[serde(default)]
        style: TextStyle,
    },
    /// Patch one overlay.
    UpdateOverlay {
        /// Target overlay.
        id: OverlayId,
        /// Fields to change.
        patch: OverlayPatch,
    },
    /// Remove one overlay.
    RemoveOverlay {
        /// Target overlay.
        id: OverlayId,
    },
    /// Remove every overlay.
    ClearOverlays,
    /// Reset transform, filters and overlays.
    ResetAll,
}

/// What a command did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// State changed; a redraw was requested.
    Changed,
    /// The command was a no-op (clamped to the current value, unknown id, blank text).
    Unchanged,
    /// A new overlay was added.
    Added(OverlayId),
}

impl CommandOutcome {
    fn from_changed(changed: bool) -> Self {
        if changed { Self::Changed } else { Self::Unchanged }
    }

    /// `true` for [`CommandOutcome::Changed`] and [`CommandOutcome::Added`].
    pub fn is_change(self) -> bool {
        self != Self::Unchanged
    }
}

/// Serializable view of the editable state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Source file name.
    pub source_name: String,
    /// Source natural width.
    pub source_width: u32,
    /// Source natural height.
    pub source_height: u32,
    /// Image transform.
    pub transform: ImageTransform,
    /// Filter sliders.
    pub filters: Filters,
    /// Overlays in paint order.
    pub overlays: Vec<TextOverlay>,
    /// Surface placement.
    pub viewport: Viewport,
    /// Active drag target.
    pub drag_target: Option<DragTarget>,
}

/// Root aggregate of one editing session.
///
/// Created by [`EditorSession::open`], mutated only through `&mut self`, consumed by
/// [`EditorSession::cancel`]. Mutations request a throttled redraw; the host drives the throttle
/// with [`EditorSession::poll_redraw`] and the returned deadlines.
#[derive(Debug)]
pub struct EditorSession {
    config: EditorConfig,
    source: SourceImage,
    transform: ImageTransform,
    filters: Filters,
    overlays: OverlayStore,
    drag: DragRouter,
    viewport: Viewport,
    renderer: Renderer,
    surface: RenderSurface,
    scheduler: RedrawScheduler,
    last_ticket: Option<RedrawTicket>,
    frames_drawn: u64,
}

impl EditorSession {
    /// Decode `file` and open a session showing it in `viewport`.
    ///
    /// Fails with [`EditorError::Load`] when the image cannot be decoded and with
    /// [`EditorError::Config`] when `config` is invalid. The first frame is drawn immediately.
    #[tracing::instrument(skip(file, config), fields(name = %file.name))]
    pub fn open(file: &ImageFile, viewport: Viewport, config: EditorConfig) -> EditorResult<Self> {
        config.validate()?;
        let source = decode_image(file)?;
        let scheduler = RedrawScheduler::new(config.redraw_window(), config.redraw_max_wait());
        let mut session = Self {
            config,
            source,
            transform: ImageTransform::default(),
            filters: Filters::default(),
            overlays: OverlayStore::new(),
            drag: DragRouter::new(),
            viewport,
            renderer: Renderer::new(),
            surface: RenderSurface::new(),
            scheduler,
            last_ticket: None,
            frames_drawn: 0,
        };
        session.render_now()?;
        tracing::info!(
            width = session.source.width,
            height = session.source.height,
            "session opened"
        );
        Ok(session)
    }

    /// Active configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Decoded source image.
    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    /// Image transform.
    pub fn transform(&self) -> &ImageTransform {
        &self.transform
    }

    /// Filter sliders.
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Overlays in paint order.
    pub fn overlays(&self) -> &OverlayStore {
        &self.overlays
    }

    /// Surface placement and container size.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Active drag target, if a drag is in progress.
    pub fn drag_target(&self) -> Option<DragTarget> {
        self.drag.target()
    }

    /// The render surface as last drawn.
    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    /// Copy of the last drawn frame.
    pub fn frame(&self) -> Frame {
        self.surface.frame()
    }

    /// Number of completed draws.
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Deadline of the pending throttled redraw.
    pub fn redraw_deadline(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    /// Ticket of the most recent redraw request, for host timers.
    pub fn last_redraw_ticket(&self) -> Option<RedrawTicket> {
        self.last_ticket
    }

    /// Apply one command at time `now`.
    pub fn apply(&mut self, cmd: EditCommand, now: Instant) -> CommandOutcome {
        let outcome = match cmd {
            EditCommand::ScaleBy { delta } => {
                CommandOutcome::from_changed(self.transform.set_scale(delta))
            }
            EditCommand::SetRotation { degrees } => {
                CommandOutcome::from_changed(self.transform.set_rotation(degrees))
            }
            EditCommand::Pan { dx, dy } => CommandOutcome::from_changed(self.transform.pan(dx, dy)),
            EditCommand::ResetTransform => {
                let changed = !self.transform.is_identity();
                self.transform.reset();
                CommandOutcome::from_changed(changed)
            }
            EditCommand::SetBrightness { value } => {
                CommandOutcome::from_changed(self.filters.set_brightness(value))
            }
            EditCommand::SetContrast { value } => {
                CommandOutcome::from_changed(self.filters.set_contrast(value))
            }
            EditCommand::SetSaturation { value } => {
                CommandOutcome::from_changed(self.filters.set_saturation(value))
            }
            EditCommand::ResetFilters => {
                let changed = !self.filters.is_neutral();
                self.filters.reset();
                CommandOutcome::from_changed(changed)
            }
            EditCommand::AddText { text, style } => {
                let at = self.viewport.size.center();
                match self.overlays.add(&text, style, at) {
                    Some(id) => CommandOutcome::Added(id),
                    None => CommandOutcome::Unchanged,
                }
            }
            EditCommand::UpdateOverlay { id, patch } => {
                CommandOutcome::from_changed(self.overlays.update(id, &patch))
            }
            EditCommand::RemoveOverlay { id } => {
                CommandOutcome::from_changed(self.overlays.remove(id).is_some())
            }
            EditCommand::ClearOverlays => {
                let changed = !self.overlays.is_empty();
                self.overlays.reset();
                CommandOutcome::from_changed(changed)
            }
            EditCommand::ResetAll => {
                let changed = !self.transform.is_identity()
                    || !self.filters.is_neutral()
                    || !self.overlays.is_empty();
                self.reset_state();
                CommandOutcome::from_changed(changed)
            }
        };
        if outcome.is_change() {
            self.request_redraw(now);
        }
        outcome
    }

    /// Route a pointer event given in screen coordinates. Returns `true` when a redraw was
    /// requested.
    pub fn pointer(&mut self, event: PointerEvent, now: Instant) -> bool {
        let local = self.viewport.to_surface(event.position);
        let effect = self.drag.route(
            event.phase,
            local,
            self.viewport.size,
            &mut self.overlays,
            &mut self.transform,
        );
        if effect.needs_redraw() {
            self.request_redraw(now);
        }
        effect.needs_redraw()
    }

    /// The hosting container moved or changed size.
    pub fn resize(&mut self, viewport: Viewport, now: Instant) {
        if viewport == self.viewport {
            return;
        }
        tracing::debug!(
            width = viewport.size.width,
            height = viewport.size.height,
            "viewport changed"
        );
        self.viewport = viewport;
        self.request_redraw(now);
    }

    /// Reset transform, filters and overlays, and end any drag.
    pub fn reset(&mut self, now: Instant) {
        self.reset_state();
        self.request_redraw(now);
    }

    fn reset_state(&mut self) {
        self.transform.reset();
        self.filters.reset();
        self.overlays.reset();
        self.drag.release();
    }

    fn request_redraw(&mut self, now: Instant) {
        self.last_ticket = Some(self.scheduler.request(now));
    }

    /// Draw if the throttled redraw is due at `now`.
    pub fn poll_redraw(&mut self, now: Instant) -> EditorResult<Option<RenderOutcome>> {
        if !self.scheduler.poll(now) {
            return Ok(None);
        }
        self.render_now().map(Some)
    }

    /// Host-timer callback for `ticket`; stale tickets do nothing.
    pub fn fire_redraw(
        &mut self,
        ticket: RedrawTicket,
        now: Instant,
    ) -> EditorResult<Option<RenderOutcome>> {
        if !self.scheduler.fire(ticket, now) {
            return Ok(None);
        }
        self.render_now().map(Some)
    }

    /// Draw the current state immediately, bypassing the throttle.
    #[tracing::instrument(skip(self))]
    pub fn render_now(&mut self) -> EditorResult<RenderOutcome> {
        let scene = Scene {
            source: &self.source,
            transform: &self.transform,
            filters: &self.filters,
            overlays: &self.overlays,
            drag_target: self.drag.target(),
        };
        let outcome =
            self.renderer
                .render(&scene, &self.config, self.viewport.size, &mut self.surface)?;
        if outcome == RenderOutcome::Drawn {
            self.frames_drawn += 1;
        }
        Ok(outcome)
    }

    /// Cancel any pending redraw, draw the current state and encode it.
    ///
    /// Fails with [`EditorError::Export`] when the surface has zero area or the encoder produces
    /// no data; the session stays usable and the save may be retried.
    #[tracing::instrument(skip(self), fields(name = %self.source.name))]
    pub fn save(&mut self) -> EditorResult<ExportArtifact> {
        if self.scheduler.cancel() {
            tracing::debug!("pending redraw superseded by save");
        }
        if self.render_now()? == RenderOutcome::Deferred {
            return Err(EditorError::export("surface has zero area"));
        }
        let artifact = encode_frame(
            &self.surface.frame(),
            &self.source.media_type,
            &self.source.name,
            self.config.export_quality,
        )?;
        tracing::info!(
            media_type = %artifact.media_type,
            len = artifact.bytes.len(),
            "exported"
        );
        Ok(artifact)
    }

    /// [`EditorSession::save`] and hand the artifact to `sink`.
    pub fn save_to(&mut self, sink: &mut dyn ArtifactSink) -> EditorResult<()> {
        let artifact = self.save()?;
        sink.deliver(artifact)
    }

    /// Discard the session without emitting anything.
    pub fn cancel(self) {
        tracing::debug!(name = %self.source.name, "session cancelled");
    }

    /// Register a font for overlay text; it is used from the next draw on.
    pub fn register_font(&mut self, bytes: Vec<u8>) -> EditorResult<String> {
        self.renderer.fonts_mut().register(bytes)
    }

    /// Serializable view of the editable state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            source_name: self.source.name.clone(),
            source_width: self.source.width,
            source_height: self.source.height,
            transform: self.transform,
            filters: self.filters,
            overlays: self.overlays.as_slice().to_vec(),
            viewport: self.viewport,
            drag_target: self.drag.target(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/session.rs"]
mod tests;
