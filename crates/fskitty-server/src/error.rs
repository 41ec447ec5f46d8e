//! Server error type.

use std::io;

use fskitty_proto::{EndpointError, ProtoError};
use thiserror::Error;

/// Errors that stop a listener or a single connection.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be parsed.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    /// Binding the listener failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The client speaks a different protocol revision.
    #[error("protocol version mismatch: client {client}, server {server}")]
    VersionMismatch {
        /// Revision announced by the client.
        client: u32,
        /// Revision spoken by this server.
        server: u32,
    },

    /// Framing or encoding failure on a connection.
    #[error(transparent)]
    Proto(#[from] ProtoError),

    /// Socket I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
