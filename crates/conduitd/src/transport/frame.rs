//! Length-prefixed framing for the command protocol.
//!
//! Every message on the wire is a 4-byte big-endian payload length followed by
//! that many bytes of UTF-8 JSON:
//!
//! ```text
//! ┌────────────┬──────────────────────────┐
//! │   Length   │     Payload (JSON)       │
//! │  (4 bytes) │  (1 ..= 10 MiB bytes)    │
//! └────────────┴──────────────────────────┘
//! ```
//!
//! Empty frames are not representable and anything above [`MAX_FRAME_BYTES`]
//! is treated as a corrupt stream.

use std::io::{self, Read, Write};

use super::FrameError;

/// Maximum payload size of a single frame (10 MiB).
pub(crate) const MAX_FRAME_BYTES: usize = 10 * 1024 * 1024;

const HEADER_BYTES: usize = 4;

/// Reads one frame payload from the stream.
///
/// Returns `Ok(None)` when the peer closes the connection before a complete
/// length prefix arrives; that is a clean disconnect rather than an error.
pub(crate) fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>, FrameError> {
    let mut header = [0_u8; HEADER_BYTES];
    let mut filled = 0;
    while filled < HEADER_BYTES {
        let read = read_with_retry(reader, &mut header[filled..])?;
        if read == 0 {
            return Ok(None);
        }
        filled += read;
    }

    let length = u32::from_be_bytes(header);
    let expected = validate_length(length)?;

    let mut payload = vec![0_u8; expected];
    let mut received = 0;
    while received < expected {
        let read = read_with_retry(reader, &mut payload[received..])?;
        if read == 0 {
            return Err(FrameError::UnexpectedEof { expected, received });
        }
        received += read;
    }
    Ok(Some(payload))
}

/// Writes one frame, looping until every byte has been accepted.
pub(crate) fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError> {
    let frame = encode_frame(payload)?;
    let mut sent = 0;
    while sent < frame.len() {
        let written = write_with_retry(writer, &frame[sent..])?;
        if written == 0 {
            return Err(FrameError::WriteZero);
        }
        sent += written;
    }
    writer.flush()?;
    Ok(())
}

/// Prepends the length prefix to a payload.
pub(crate) fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let size = payload.len();
    let length = u32::try_from(size)
        .ok()
        .filter(|_| (1..=MAX_FRAME_BYTES).contains(&size))
        .ok_or(FrameError::PayloadSize {
            size,
            max: MAX_FRAME_BYTES,
        })?;

    let mut frame = Vec::with_capacity(HEADER_BYTES + size);
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

fn validate_length(length: u32) -> Result<usize, FrameError> {
    usize::try_from(length)
        .ok()
        .filter(|size| (1..=MAX_FRAME_BYTES).contains(size))
        .ok_or(FrameError::InvalidLength {
            length,
            max: MAX_FRAME_BYTES,
        })
}

/// Reads from the stream, retrying on interrupts.
fn read_with_retry<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

fn write_with_retry<W: Write>(writer: &mut W, buf: &[u8]) -> io::Result<usize> {
    loop {
        match writer.write(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
