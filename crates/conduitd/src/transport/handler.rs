//! Connection handling abstractions for the daemon listener.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};

/// An accepted client connection.
///
/// The stream is owned exclusively by the session serving it and is closed
/// when dropped, whichever way the session ends.
#[derive(Debug)]
pub(crate) struct ConnectionStream {
    stream: TcpStream,
    peer: SocketAddr,
}

impl ConnectionStream {
    pub(crate) const fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self { stream, peer }
    }

    /// Address of the connected client.
    pub(crate) const fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

/// Serves accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Serves a single connection until it ends. The listener does not accept
    /// another connection until this returns. Implementations should avoid
    /// panicking.
    fn handle(&self, stream: ConnectionStream);
}
