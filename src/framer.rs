//! Line framer
//!
//! One socket read is one line. Each call reads at most `capacity` bytes
//! into a fresh buffer and decodes whatever arrived; nothing is carried
//! over between calls, so a line split across TCP segments is delivered
//! as two separate lines.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Read a single frame of at most `capacity` bytes
///
/// Returns `Ok(None)` when the peer has closed its side (zero-byte read).
/// The returned line may be empty; callers decide what that means.
pub async fn read_frame<R>(reader: &mut R, capacity: usize) -> io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; capacity];
    let n = reader.read(&mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(decode(&buf[..n])))
}

/// Decode raw bytes into a line
///
/// Trims NUL padding from both ends, then removes every carriage return
/// and line feed, including interior ones. Invalid UTF-8 is replaced.
pub fn decode(bytes: &[u8]) -> String {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&b| b != 0).map_or(start, |i| i + 1);
    String::from_utf8_lossy(&bytes[start..end])
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect()
}
