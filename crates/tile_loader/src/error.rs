use std::io;
use thiserror::Error;
use vtile::DecodeError;

/// Why a tile could not be delivered.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Socket-level failure that survived the one reconnect attempt.
    #[error("connection error: {0}")]
    Connection(#[source] io::Error),

    /// The server answered, but not with something we can use.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("fetch cancelled")]
    Cancelled,

    #[error("invalid tile endpoint: {0}")]
    InvalidEndpoint(String),
}

impl FetchError {
    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        FetchError::Protocol(msg.into())
    }
}
