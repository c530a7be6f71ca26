use thiserror::Error;

/// Rejected engine parameters. Raised at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("depth must be at least 3, got {0}")]
    DepthTooSmall(usize),
    #[error("similarity threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),
    #[error("max children must be at least 1")]
    NoChildren,
    #[error("invalid preprocess rule {pattern:?}: {source}")]
    InvalidRule {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Failure while saving or restoring engine state.
#[derive(Debug, Error)]
pub enum StateError {
    /// Serializing the state on save failed.
    #[error("state could not be serialized: {0}")]
    Json(#[from] serde_json::Error),
    /// A loaded document is not valid JSON, has the wrong shape, or is inconsistent.
    #[error("malformed state: {0}")]
    Malformed(String),
    /// A loaded document is well formed but its configuration does not validate.
    #[error("state carries an invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("state i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl StateError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        StateError::Malformed(msg.into())
    }
}
