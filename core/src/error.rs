//! Error types for the platform client.
//!
//! # Design
//! Every failing call surfaces one of these variants unchanged. Non-2xx
//! responses are not translated into domain errors: the caller gets the raw
//! status code and body in `Http`.

use thiserror::Error;

/// Errors returned by `GiiaClient` parse methods and `PlatformClient` calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (connect, DNS, I/O).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Status code of an `Http` error, `None` for every other variant.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
