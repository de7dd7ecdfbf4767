/// Convenience result type used across viewfx.
pub type ViewfxResult<T> = Result<T, ViewfxError>;

/// Top-level error taxonomy used by pipeline, animation and geometry APIs.
#[derive(thiserror::Error, Debug)]
pub enum ViewfxError {
    /// Invalid configuration or parameter edits (unknown step, malformed state, bad pairs).
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed animator descriptors or keyframe data.
    #[error("animation error: {0}")]
    Animation(String),

    /// Failures while processing a frame or driving an external process.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Missing or undecodable image resources.
    #[error("asset error: {0}")]
    Asset(String),

    /// Errors when serializing or deserializing declarations.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ViewfxError {
    /// Build a [`ViewfxError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ViewfxError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`ViewfxError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`ViewfxError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`ViewfxError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for ViewfxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
