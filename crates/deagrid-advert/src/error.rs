//! Error types for node advertisements.

use thiserror::Error;

/// Result type alias for advertisement operations.
pub type AdvertResult<T> = Result<T, AdvertError>;

/// Errors that can occur while building an advertisement or loading config.
///
/// Only construction and configuration can fail. Every query on a built
/// [`Advertisement`](crate::Advertisement) is total.
#[derive(Debug, Error)]
pub enum AdvertError {
    #[error("malformed advertisement: {0}")]
    MalformedAdvertisement(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdvertError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedAdvertisement(reason.into())
    }
}
