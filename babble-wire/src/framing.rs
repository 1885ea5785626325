//! Length-prefixed framing over a byte stream.
//!
//! Concrete implementation of the `network_send`/`network_recv` collaborator
//! `spec.md` §6 specifies by interface only: `send(sock, len, buf)` transmits
//! `len` bytes, `recv(sock)` returns the next framed message in a freshly
//! allocated buffer. Here the length prefix is explicit on the wire (a
//! big-endian `u32`) rather than implied by the transport, since `std::net`
//! gives us no message boundaries to rely on.

use std::io::{self, Read, Write};

/// Write one frame: a 4-byte big-endian length, then `bytes`.
pub fn send_frame<W: Write>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "frame too large to send")
    })?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(bytes)?;
    writer.flush()
}

/// Read one frame. Returns `Ok(None)` on a clean EOF before any byte of the
/// length prefix arrives (the framing-layer equivalent of `recv == 0`); any
/// other short read is a genuine transport error.
pub fn recv_frame<R: Read>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        match reader.read(&mut len_buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer closed mid-frame",
                ))
            }
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(Some(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_frame() {
        let mut buf = Vec::new();
        send_frame(&mut buf, b"hello").unwrap();
        let mut cursor = Cursor::new(buf);
        let frame = recv_frame(&mut cursor).unwrap().unwrap();
        assert_eq!(frame, b"hello");
    }

    #[test]
    fn empty_stream_is_clean_eof() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        assert!(recv_frame(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn truncated_length_prefix_is_an_error() {
        let mut cursor = Cursor::new(vec![0u8, 1]);
        assert!(recv_frame(&mut cursor).is_err());
    }
}
