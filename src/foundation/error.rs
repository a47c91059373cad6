/// Convenience result type used across the editor.
pub type EditorResult<T> = Result<T, EditorError>;

/// Error taxonomy for editor entry points.
///
/// Conditions the editor treats as no-ops (empty overlay text, out-of-range slider values,
/// unknown overlay ids, pointer misses) are never reported through this type.
#[derive(thiserror::Error, Debug)]
pub enum EditorError {
    /// The source image could not be decoded; the editor does not open.
    #[error("load error: {0}")]
    Load(String),

    /// The surface could not be serialized; the caller may retry the save.
    #[error("export error: {0}")]
    Export(String),

    /// A surface or pixel-buffer invariant was violated while drawing.
    #[error("render error: {0}")]
    Render(String),

    /// Invalid configuration values.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EditorError {
    /// Build an [`EditorError::Load`] value.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Build an [`EditorError::Export`] value.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build an [`EditorError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build an [`EditorError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Export failures are recoverable: the session stays usable and the save can be retried.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Load(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
