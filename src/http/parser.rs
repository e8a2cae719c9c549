//! From-scratch HTTP/1.1 request reading.
//!
//! # Responsibilities
//! - Read exactly one request off an async stream (header block, then body)
//! - Enforce header and body size caps while reading, not after
//! - Distinguish a clean peer close (no bytes) from a truncated request
//!
//! # Design Decisions
//! - `Content-Length` framing only; chunked transfer encoding is rejected
//! - The parser never blocks past what the caller's deadline allows; the
//!   session wraps the whole read in a single timeout

use std::collections::HashMap;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::Request;

/// End of the header block.
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Size caps applied while reading a request.
#[derive(Debug, Clone, Copy)]
pub struct ReadLimits {
    /// Maximum size of the request line plus all headers, in bytes.
    pub max_header_bytes: usize,
    /// Maximum size of the decoded body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            max_header_bytes: 8 * 1024,
            max_body_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    /// The peer closed the connection before sending anything.
    #[error("connection closed by peer")]
    Eof,
    /// The peer closed the connection mid-request.
    #[error("connection closed mid-request")]
    UnexpectedEof,
    #[error("malformed request line")]
    InvalidRequestLine,
    #[error("malformed header line")]
    InvalidHeader,
    #[error("header block exceeds {0} bytes")]
    HeadersTooLarge(usize),
    #[error("invalid Content-Length header")]
    InvalidContentLength,
    #[error("request body exceeds {0} bytes")]
    BodyTooLarge(usize),
    #[error("chunked transfer encoding is not supported")]
    UnsupportedTransferEncoding,
    #[error("request body is not valid UTF-8")]
    InvalidBodyEncoding,
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// A clean close carries no diagnostic value and is not logged as a fault.
    pub fn is_clean_close(&self) -> bool {
        matches!(self, ParseError::Eof)
    }
}

/// Read one full request from the stream.
///
/// Reads until the header terminator, parses the head, then reads the body to
/// `Content-Length`. Bytes already buffered past the header block are counted
/// toward the body.
pub async fn read_request<S>(stream: &mut S, limits: ReadLimits) -> Result<Request, ParseError>
where
    S: AsyncRead + Unpin,
{
    let mut buffer: Vec<u8> = Vec::with_capacity(1024);
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = find_terminator(&buffer) {
            break pos;
        }
        if buffer.len() > limits.max_header_bytes {
            return Err(ParseError::HeadersTooLarge(limits.max_header_bytes));
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            if buffer.is_empty() {
                return Err(ParseError::Eof);
            }
            return Err(ParseError::UnexpectedEof);
        }
        buffer.extend_from_slice(&chunk[..n]);
    };

    let head = std::str::from_utf8(&buffer[..head_end]).map_err(|_| ParseError::InvalidHeader)?;
    let mut request = parse_head(head)?;

    if request
        .header("transfer-encoding")
        .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"))
    {
        return Err(ParseError::UnsupportedTransferEncoding);
    }

    let content_length = match request.header("content-length") {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidContentLength)?,
        None => 0,
    };
    if content_length > limits.max_body_bytes {
        return Err(ParseError::BodyTooLarge(limits.max_body_bytes));
    }

    let body_start = head_end + HEADER_TERMINATOR.len();
    let mut body = buffer[body_start..].to_vec();
    if body.len() > content_length {
        // Pipelined bytes beyond the declared body are dropped; this server
        // answers one request per connection.
        body.truncate(content_length);
    }
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(ParseError::UnexpectedEof);
        }
        let needed = content_length - body.len();
        body.extend_from_slice(&chunk[..n.min(needed)]);
    }

    request.body = String::from_utf8(body).map_err(|_| ParseError::InvalidBodyEncoding)?;
    Ok(request)
}

/// Parse the request line and header block. The body is left empty.
pub fn parse_head(head: &str) -> Result<Request, ParseError> {
    let mut lines = head.split("\r\n");

    let request_line = lines.next().ok_or(ParseError::InvalidRequestLine)?;
    let mut parts = request_line.split(' ');
    let method_token = parts.next().filter(|s| !s.is_empty());
    let target = parts.next().filter(|s| s.starts_with('/') || *s == "*");
    let version = parts.next().filter(|s| s.starts_with("HTTP/"));
    let (method_token, target, version) = match (method_token, target, version) {
        (Some(m), Some(t), Some(v)) if parts.next().is_none() => (m, t, v),
        _ => return Err(ParseError::InvalidRequestLine),
    };

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;
        if name.is_empty() || name.contains(' ') {
            return Err(ParseError::InvalidHeader);
        }
        headers.insert(name.to_ascii_lowercase(), value.trim().to_string());
    }

    Ok(Request {
        method_token: method_token.to_string(),
        target: target.to_string(),
        version: version.to_string(),
        headers,
        body: String::new(),
    })
}

fn find_terminator(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_request_with_body() {
        let raw = b"POST /users HTTP/1.1\r\nHost: localhost\r\nContent-Length: 14\r\n\r\n{\"name\":\"ada\"}";
        let mut stream = &raw[..];
        let req = read_request(&mut stream, ReadLimits::default()).await.unwrap();
        assert_eq!(req.method_token, "POST");
        assert_eq!(req.target, "/users");
        assert_eq!(req.header("host"), Some("localhost"));
        assert_eq!(req.body, "{\"name\":\"ada\"}");
    }

    #[tokio::test]
    async fn bytes_past_declared_length_are_dropped() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: 2\r\n\r\nab-trailing-junk";
        let mut stream = &raw[..];
        let req = read_request(&mut stream, ReadLimits::default()).await.unwrap();
        assert_eq!(req.body, "ab");
    }

    #[tokio::test]
    async fn clean_close_is_eof() {
        let mut stream: &[u8] = b"";
        let err = read_request(&mut stream, ReadLimits::default()).await.unwrap_err();
        assert!(err.is_clean_close());
    }

    #[tokio::test]
    async fn truncated_request_is_not_clean() {
        let mut stream: &[u8] = b"GET / HTTP/1.1\r\nHost";
        let err = read_request(&mut stream, ReadLimits::default()).await.unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof));
    }

    #[tokio::test]
    async fn oversized_header_block_is_rejected() {
        let raw = format!("GET / HTTP/1.1\r\nX-Pad: {}\r\n\r\n", "a".repeat(64));
        let limits = ReadLimits {
            max_header_bytes: 32,
            max_body_bytes: 1024,
        };
        let mut stream = raw.as_bytes();
        let err = read_request(&mut stream, limits).await.unwrap_err();
        assert!(matches!(err, ParseError::HeadersTooLarge(32)));
    }

    #[tokio::test]
    async fn declared_body_over_cap_is_rejected() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: 2048\r\n\r\n";
        let limits = ReadLimits {
            max_header_bytes: 8192,
            max_body_bytes: 1024,
        };
        let mut stream = &raw[..];
        let err = read_request(&mut stream, limits).await.unwrap_err();
        assert!(matches!(err, ParseError::BodyTooLarge(1024)));
    }

    #[test]
    fn parse_head_rejects_garbage() {
        assert!(matches!(
            parse_head("NOT A REQUEST"),
            Err(ParseError::InvalidRequestLine)
        ));
        assert!(matches!(
            parse_head("GET /path"),
            Err(ParseError::InvalidRequestLine)
        ));
        assert!(matches!(
            parse_head("GET / HTTP/1.1\r\nbroken header"),
            Err(ParseError::InvalidHeader)
        ));
    }

    #[test]
    fn parse_head_accepts_options_asterisk() {
        let req = parse_head("OPTIONS * HTTP/1.1\r\nHost: x").unwrap();
        assert_eq!(req.target, "*");
    }
}
