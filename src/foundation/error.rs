/// Convenience result type used across montage.
pub type MontageResult<T> = Result<T, MontageError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum MontageError {
    /// A required attribute (duration, fps) is not set on the clip.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid user-provided data (shapes, codecs, timestamps).
    #[error("validation error: {0}")]
    Validation(String),

    /// Media metadata could not be parsed from the probe output.
    #[error("probe error: {0}")]
    Probe(String),

    /// The decoder produced no usable frame.
    #[error("stream underrun: {0}")]
    StreamUnderrun(String),

    /// The encoder subprocess failed.
    #[error("encode failure: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MontageError {
    /// Build a [`MontageError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`MontageError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MontageError::Probe`] value.
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    /// Build a [`MontageError::StreamUnderrun`] value.
    pub fn underrun(msg: impl Into<String>) -> Self {
        Self::StreamUnderrun(msg.into())
    }

    /// Build a [`MontageError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Error returned by operations that need a bounded clip.
    pub(crate) fn missing_duration() -> Self {
        Self::configuration("attribute 'duration' not set")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
