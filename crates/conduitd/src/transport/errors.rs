//! Error types for socket listener and framing operations.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced while binding or running the socket listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to resolve TCP address {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("no TCP addresses resolved for {host}:{port}")]
    ResolveEmpty { host: String, port: u16 },
    #[error("failed to bind TCP listener at {addr}: {source}")]
    BindTcp {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to read local address of TCP listener: {source}")]
    LocalAddr {
        #[source]
        source: io::Error,
    },
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        #[source]
        source: io::Error,
    },
    #[error("failed to spawn listener thread: {source}")]
    Spawn {
        #[source]
        source: io::Error,
    },
    #[error("listener thread panicked")]
    ThreadPanic,
}

/// Errors surfaced while reading or writing length-prefixed frames.
///
/// Every variant is fatal to the connection that produced it.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The length prefix was zero or above the frame size limit.
    #[error("invalid frame length {length}: must be between 1 and {max} bytes")]
    InvalidLength { length: u32, max: usize },

    /// The peer closed the stream part-way through a frame body.
    #[error("connection closed after {received} of {expected} frame bytes")]
    UnexpectedEof { expected: usize, received: usize },

    /// An outbound payload cannot be represented as a frame.
    #[error("frame payload of {size} bytes must be between 1 and {max} bytes")]
    PayloadSize { size: usize, max: usize },

    /// The peer accepted zero bytes during a send.
    #[error("connection accepted zero bytes while sending a frame")]
    WriteZero,

    /// Socket read or write failed.
    #[error("frame IO error: {0}")]
    Io(#[from] io::Error),
}
