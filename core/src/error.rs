//! Error types for the canteen API client.
//!
//! # Design
//! One enum covers the whole crate, split along who is at fault: `Config`
//! is a programmer error caught at construction, `Network` is the transport,
//! `Api` is the remote service speaking for itself, and `Validation` is
//! local input rejection. `Api` gets the message the server put in its error
//! body, so callers can show it verbatim.
//!
//! Causes are carried as rendered strings rather than source errors. That
//! keeps the enum `Clone`, which `ApiConnection` relies on to replay a
//! terminal failure without re-dialing.

use thiserror::Error;

/// Errors returned by the canteen client.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The endpoint and path do not combine into a valid URL.
    #[error("malformed API URL {url:?}: {reason}")]
    Config { url: String, reason: String },

    /// Transport-level failure. `context` names the operation that was
    /// being attempted when the transport gave up.
    #[error("{context}: {reason}")]
    Network { context: String, reason: String },

    /// Failure reported by the remote API, carrying its detail message,
    /// or a generic message when the status was unexpected and no error
    /// body was sent.
    #[error("{0}")]
    Api(String),

    /// A request payload could not be encoded as JSON.
    #[error("encoding request body: {0}")]
    Serialize(String),

    /// A success payload could not be decoded into the expected type.
    #[error("decoding response body: {0}")]
    Deserialize(String),

    /// Locally rejected input, e.g. a bad username during account creation.
    #[error("{0}")]
    Validation(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ApiError>;
