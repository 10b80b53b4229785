//! Error types shared by the node runtime and adapter implementations.

use thiserror::Error;

/// A specialized `Result` type for restnode operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents the failure conditions a node operation can surface.
///
/// The node layer performs no recovery: every variant propagates to the
/// immediate caller unchanged. Resilience policy (timeouts, pooling,
/// retries) belongs to the [`Adapter`](crate::Adapter) implementation.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A required request body was not supplied. Detected before any
    /// network I/O.
    #[error("required request body was not supplied")]
    ArgumentMissing,

    /// A template placeholder had no binding at request-build time.
    #[error("unresolved path placeholder: {name}")]
    UnresolvedPath {
        /// Name of the placeholder that was left unbound.
        name: String,
    },

    /// A path template or segment violated the template grammar.
    #[error("invalid path template: {0}")]
    Template(String),

    /// A raw or base URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Network-level failure surfaced unchanged from the adapter.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with a non-success status code.
    #[error("API returned status {status}: {body}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Response body, as text, for diagnostics.
        body: String,
    },

    /// The request body could not be serialized.
    #[error("request serialization failed: {0}")]
    Serialization(String),

    /// The response body did not match the declared result shape.
    #[error("response deserialization failed: {0}")]
    Deserialization(String),

    /// Caller-initiated cancellation preempted the in-flight call.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` for failures detected before any network I/O.
    pub fn is_pre_flight(&self) -> bool {
        matches!(
            self,
            Error::ArgumentMissing
                | Error::UnresolvedPath { .. }
                | Error::Template(_)
                | Error::InvalidUrl(_)
                | Error::Serialization(_)
        )
    }
}
