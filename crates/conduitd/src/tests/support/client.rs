//! Minimal framed client for driving a server over loopback TCP.

use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use serde_json::Value;

use crate::transport::{FrameError, read_frame, write_frame};

/// Blocking client speaking the length-prefixed JSON protocol.
#[derive(Debug)]
pub struct FrameClient {
    stream: TcpStream,
}

impl FrameClient {
    /// Connects to `address` with a generous read timeout so a hung server
    /// fails the test instead of stalling it.
    pub fn connect(address: SocketAddr) -> Self {
        let stream = TcpStream::connect(address).expect("connect to server");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("set read timeout");
        Self { stream }
    }

    /// Sends `request` and waits for the response.
    pub fn request(&mut self, request: &Value) -> Value {
        let payload = serde_json::to_vec(request).expect("encode request");
        self.request_raw(&payload)
    }

    /// Sends an arbitrary frame payload and waits for the response.
    pub fn request_raw(&mut self, payload: &[u8]) -> Value {
        write_frame(&mut self.stream, payload).expect("write request frame");
        let response = self
            .receive()
            .expect("read response frame")
            .expect("server closed the connection");
        serde_json::from_slice(&response).expect("decode response")
    }

    /// Reads the next frame; `Ok(None)` means the server closed the stream.
    pub fn receive(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        read_frame(&mut self.stream)
    }

    /// Writes raw bytes without framing them.
    pub fn send_bytes(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).expect("write raw bytes");
    }

    pub fn set_read_timeout(&self, timeout: Duration) {
        self.stream
            .set_read_timeout(Some(timeout))
            .expect("set read timeout");
    }

    /// Whether the server has closed the connection, as seen by a read.
    pub fn is_closed(&mut self) -> bool {
        match self.receive() {
            Ok(None) => true,
            Err(FrameError::Io(error)) => !matches!(
                error.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            Ok(Some(_)) | Err(_) => false,
        }
    }
}
