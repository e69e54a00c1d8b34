//! Unified error type.

use thiserror::Error;

/// The error type returned by resty's fallible operations.
///
/// Request-level failures (unknown resource, missing capability, malformed
/// form) are expressed as HTTP [`Response`](crate::Response) values, not as
/// `Error`s. This type surfaces startup and infrastructure failures: building
/// the registry, binding a port, accepting a connection.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{0}`")]
    InvalidAddress(String),

    /// A name was registered twice. The first binding is kept.
    #[error("resource `{0}` is already registered")]
    DuplicateResource(String),

    /// Resource names are a single, non-empty path segment.
    #[error("invalid resource name `{0}`")]
    InvalidResourceName(String),
}
