/// Crate-wide result alias.
pub type WatermarkResult<T> = Result<T, WatermarkError>;

#[derive(thiserror::Error, Debug)]
/// Error type shared by every stage of the compositing pipeline.
///
/// Any error returned from [`crate::Watermark::render`] aborts the whole composite; there is no
/// partial result.
pub enum WatermarkError {
    /// Invalid engine configuration, e.g. a non-positive density scale.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Image overlay with neither a pixel buffer nor a resource handle.
    #[error("missing overlay source: {0}")]
    MissingSource(String),

    /// Overlay descriptor that cannot be drawn (empty text, zero-pixel target size).
    #[error("invalid overlay: {0}")]
    InvalidOverlay(String),

    /// Resource could not be found or decoded.
    #[error("failed to decode resource '{handle}': {reason}")]
    ResourceDecode {
        /// Handle that was requested.
        handle: String,
        /// Underlying failure.
        reason: String,
    },

    /// Text shaping or rasterization backend failure.
    #[error("render error: {0}")]
    Render(String),

    /// Overlay plan (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, with context attached by the caller.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WatermarkError {
    /// Build [`WatermarkError::InvalidConfiguration`].
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Build [`WatermarkError::MissingSource`].
    pub fn missing_source(msg: impl Into<String>) -> Self {
        Self::MissingSource(msg.into())
    }

    /// Build [`WatermarkError::InvalidOverlay`].
    pub fn invalid_overlay(msg: impl Into<String>) -> Self {
        Self::InvalidOverlay(msg.into())
    }

    /// Build [`WatermarkError::ResourceDecode`].
    pub fn resource_decode(handle: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ResourceDecode {
            handle: handle.into(),
            reason: reason.to_string(),
        }
    }

    /// Build [`WatermarkError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build [`WatermarkError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}
