//! snapedit is the core of an interactive photo editor: pan/zoom/rotate a picture, adjust
//! brightness, contrast and saturation, place draggable text overlays, and export the flattened
//! result.
//!
//! The API is session-oriented:
//!
//! - Decode an [`ImageFile`] into an [`EditorSession`]
//! - Mutate it with [`EditCommand`]s and [`PointerEvent`]s; redraws are throttled by a
//!   [`RedrawScheduler`] the host polls
//! - [`EditorSession::save`] forces a synchronous draw and encodes an [`ExportArtifact`]
//!
//! Rendering runs on the CPU through `vello_cpu`; text is shaped with `parley` from fonts
//! registered as raw bytes.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod config;
mod export;
mod foundation;
mod interaction;
mod model;
mod render;
mod session;

pub use crate::foundation::core::{
    Affine, Background, Point, Rect, Rgba8, SurfaceSize, Vec2, Viewport,
};
pub use crate::foundation::error::{EditorError, EditorResult};

pub use crate::assets::decode::{ImageFile, SourceImage, decode_image};
pub use crate::assets::fonts::FontBook;
pub use crate::config::{EditorConfig, SelectionConfig, ShadowConfig};
pub use crate::export::{
    ArtifactSink, ExportArtifact, ExportFormat, FileSink, InMemorySink, encode_frame,
};
pub use crate::interaction::drag::{DragEffect, DragRouter, DragState, PointerEvent, PointerPhase};
pub use crate::interaction::hit_test::{DragTarget, GLYPH_WIDTH_FACTOR, approx_text_box, hit_test};
pub use crate::model::filters::{
    FILTER_MAX_PCT, FILTER_MIN_PCT, FILTER_NEUTRAL_PCT, FilterChain, Filters,
};
pub use crate::model::overlay::{
    MAX_FONT_SIZE_PX, OverlayId, OverlayPatch, OverlayStore, TextOverlay, TextStyle,
};
pub use crate::model::transform::{
    ImageTransform, MAX_ROTATION_DEG, MAX_SCALE, MIN_ROTATION_DEG, MIN_SCALE,
};
pub use crate::render::pipeline::{
    RenderOutcome, Renderer, Scene, cover_fit, dashed_rect_segments, image_placement,
};
pub use crate::render::scheduler::{RedrawScheduler, RedrawTicket};
pub use crate::render::surface::{Frame, RenderSurface};
pub use crate::session::{CommandOutcome, EditCommand, EditorSession, SessionSnapshot};
