//! Per-connection request loop.
//!
//! A session reads one frame, answers it, and waits for the next, so
//! requests and responses on a connection strictly alternate. Malformed JSON
//! is answered with an error response and the session carries on; framing
//! and socket failures end it.

use std::io::{Read, Write};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::health::HealthReporter;
use crate::transport::{
    ConnectionHandler, ConnectionStream, FrameError, MAX_FRAME_BYTES, read_frame, write_frame,
};

use super::errors::DispatchError;
use super::request::CommandRequest;
use super::response::CommandResponse;
use super::router::{DISPATCH_TARGET, Dispatcher};

/// Reasons a session ends before the peer disconnects cleanly.
#[derive(Debug, Error)]
enum SessionError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Connection handler that runs the request loop over a [`Dispatcher`].
pub(crate) struct SessionHandler {
    dispatcher: Arc<Dispatcher>,
    reporter: Arc<dyn HealthReporter>,
}

impl SessionHandler {
    pub(crate) fn new(dispatcher: Arc<Dispatcher>, reporter: Arc<dyn HealthReporter>) -> Self {
        Self {
            dispatcher,
            reporter,
        }
    }

    /// Serves frames until the peer disconnects or a transport error occurs.
    fn serve<S: Read + Write>(&self, stream: &mut S) -> Result<(), SessionError> {
        while let Some(payload) = read_frame(stream)? {
            let response = self.respond(&payload);
            let encoded = encode_response(&response)?;
            write_frame(stream, &encoded)?;
        }
        Ok(())
    }

    fn respond(&self, payload: &[u8]) -> CommandResponse {
        match CommandRequest::parse(payload) {
            Ok(request) => self.dispatcher.dispatch(request),
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    %error,
                    bytes = payload.len(),
                    "malformed request"
                );
                CommandResponse::from(&error)
            }
        }
    }
}

impl ConnectionHandler for SessionHandler {
    fn handle(&self, mut stream: ConnectionStream) {
        let peer = stream.peer();
        self.reporter.client_connected(peer);
        match self.serve(&mut stream) {
            Ok(()) => debug!(target: DISPATCH_TARGET, %peer, "session ended"),
            Err(error) => warn!(
                target: DISPATCH_TARGET,
                %peer,
                %error,
                "session terminated"
            ),
        }
        self.reporter.client_disconnected(peer);
    }
}

/// Encodes a response, replacing one that cannot fit in a frame with an
/// error response that keeps the request id.
fn encode_response(response: &CommandResponse) -> Result<Vec<u8>, serde_json::Error> {
    let encoded = response.to_vec()?;
    if encoded.len() <= MAX_FRAME_BYTES {
        return Ok(encoded);
    }

    let error = DispatchError::ResponseTooLarge {
        size: encoded.len(),
        max: MAX_FRAME_BYTES,
    };
    warn!(target: DISPATCH_TARGET, %error, "replacing oversized response");
    let mut replacement = CommandResponse::from(&error);
    if let Some(id) = response.id() {
        replacement.set_id(id);
    }
    replacement.to_vec()
}
