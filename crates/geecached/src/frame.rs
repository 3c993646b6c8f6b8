//! RESP2 frames exchanged between peers and clients

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Largest bulk string accepted from the wire
const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Largest array accepted from the wire
const MAX_ARRAY_LEN: usize = 1024 * 1024;

/// Deepest array nesting accepted from the wire
const MAX_DEPTH: usize = 32;

/// One RESP value
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// `+OK\r\n`
    Simple(String),
    /// `-ERR message\r\n`
    Error(String),
    /// `:42\r\n`
    Integer(i64),
    /// `$3\r\nfoo\r\n`
    Bulk(Bytes),
    /// `$-1\r\n`
    Null,
    /// `*2\r\n...`
    Array(Vec<Frame>),
}

impl Frame {
    /// Build a command: an array of bulk strings
    #[cfg(test)]
    pub fn command(parts: &[&[u8]]) -> Frame {
        Frame::Array(
            parts
                .iter()
                .map(|part| Frame::Bulk(Bytes::copy_from_slice(part)))
                .collect(),
        )
    }

    /// Append the wire form of this frame to `dst`
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            Frame::Simple(s) => put_text_line(dst, b'+', s),
            Frame::Error(msg) => put_text_line(dst, b'-', msg),
            Frame::Integer(n) => put_line(dst, b':', n.to_string().as_bytes()),
            Frame::Bulk(data) => {
                put_line(dst, b'$', data.len().to_string().as_bytes());
                dst.put_slice(data);
                dst.put_slice(b"\r\n");
            }
            Frame::Null => dst.put_slice(b"$-1\r\n"),
            Frame::Array(items) => {
                put_line(dst, b'*', items.len().to_string().as_bytes());
                for item in items {
                    item.encode(dst);
                }
            }
        }
    }

    /// Take one complete frame off the front of `src`
    ///
    /// Returns `Ok(None)` and leaves `src` untouched when more bytes are needed.
    pub fn decode(src: &mut BytesMut) -> Result<Option<Frame>, String> {
        match parse(src, 0, 0)? {
            Some((frame, consumed)) => {
                src.advance(consumed);
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }
}

fn put_line(dst: &mut BytesMut, tag: u8, body: &[u8]) {
    dst.put_u8(tag);
    dst.put_slice(body);
    dst.put_slice(b"\r\n");
}

/// Simple and error lines cannot carry CR or LF; they become spaces
fn put_text_line(dst: &mut BytesMut, tag: u8, text: &str) {
    dst.put_u8(tag);
    for &b in text.as_bytes() {
        dst.put_u8(if b == b'\r' || b == b'\n' { b' ' } else { b });
    }
    dst.put_slice(b"\r\n");
}

/// Parse a frame starting at `pos`; returns it with the position just past it
///
/// `depth` counts the arrays enclosing this frame.
fn parse(buf: &[u8], pos: usize, depth: usize) -> Result<Option<(Frame, usize)>, String> {
    let Some(&tag) = buf.get(pos) else {
        return Ok(None);
    };
    let Some((line, next)) = read_line(buf, pos + 1) else {
        return Ok(None);
    };

    match tag {
        b'+' => Ok(Some((Frame::Simple(utf8(line)?), next))),
        b'-' => Ok(Some((Frame::Error(utf8(line)?), next))),
        b':' => Ok(Some((Frame::Integer(number(line)?), next))),
        b'$' => {
            let len = number(line)?;
            if len == -1 {
                return Ok(Some((Frame::Null, next)));
            }
            let len = length(len, MAX_BULK_LEN, "bulk string")?;
            if buf.len() < next + len + 2 {
                return Ok(None);
            }
            if &buf[next + len..next + len + 2] != b"\r\n" {
                return Err("expected CRLF after bulk string".to_string());
            }
            let data = Bytes::copy_from_slice(&buf[next..next + len]);
            Ok(Some((Frame::Bulk(data), next + len + 2)))
        }
        b'*' => {
            if depth >= MAX_DEPTH {
                return Err("nesting too deep".to_string());
            }
            let len = length(number(line)?, MAX_ARRAY_LEN, "array")?;
            let mut items = Vec::with_capacity(len.min(64));
            let mut pos = next;
            for _ in 0..len {
                match parse(buf, pos, depth + 1)? {
                    Some((item, after)) => {
                        items.push(item);
                        pos = after;
                    }
                    None => return Ok(None),
                }
            }
            Ok(Some((Frame::Array(items), pos)))
        }
        other => Err(format!("unknown frame type byte {:?}", other as char)),
    }
}

fn read_line(buf: &[u8], pos: usize) -> Option<(&[u8], usize)> {
    let rest = buf.get(pos..)?;
    let end = rest.windows(2).position(|w| w == b"\r\n")?;
    Some((&rest[..end], pos + end + 2))
}

fn utf8(line: &[u8]) -> Result<String, String> {
    String::from_utf8(line.to_vec()).map_err(|e| e.to_string())
}

fn number(line: &[u8]) -> Result<i64, String> {
    utf8(line)?.parse::<i64>().map_err(|e| e.to_string())
}

fn length(len: i64, max: usize, what: &str) -> Result<usize, String> {
    let len = usize::try_from(len).map_err(|_| format!("invalid {} length {}", what, len))?;
    if len > max {
        return Err(format!("{} too large: {} (max {})", what, len, max));
    }
    Ok(len)
}
