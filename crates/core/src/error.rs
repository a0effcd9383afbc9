/// Result alias that carries the custom [`MetronomeError`] type.
pub type Result<T> = std::result::Result<T, MetronomeError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum MetronomeError {
    /// A rejected tempo configuration: non-positive or non-finite BPM, or a
    /// zero beat or subdivision count. The previously accepted configuration
    /// stays in effect.
    #[error("invalid tempo configuration: {0}")]
    InvalidConfiguration(&'static str),
    /// A timestamp the clock refuses to work with (non-finite, or earlier
    /// than the epoch of the current run segment).
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(&'static str),
    /// Ad-hoc condition without a dedicated variant, e.g. a poisoned lock.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON serialisation errors.
    #[error("{0}")]
    Serialization(#[from] serde_json::Error),
}

impl MetronomeError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for MetronomeError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for MetronomeError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
