//! Socket listener and wire framing for the command transport.
//!
//! The transport module binds the configured TCP endpoint, accepts one
//! connection at a time on a background thread, and provides the
//! length-prefixed frame codec used by the session loop.

mod errors;
mod frame;
mod handler;
mod listener;
#[cfg(test)]
mod test_utils;

pub use self::errors::{FrameError, ListenerError};
#[cfg(test)]
pub(crate) use self::frame::encode_frame;
pub(crate) use self::frame::{MAX_FRAME_BYTES, read_frame, write_frame};
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream};
pub(crate) use self::listener::{ListenerHandle, SocketListener};
#[cfg(test)]
pub(crate) use self::test_utils::{CountingHandler, HoldingHandler};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
