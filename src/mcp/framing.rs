//! Message framing for the stdio transport.
//!
//! Two on-wire shapes are auto-detected per message boundary:
//!
//! - Header-delimited (LSP style): `Content-Length: <n>` followed by a
//!   blank line and exactly `n` bytes of payload.
//! - Line-delimited (MCP style): one line of JSON terminated by `\n`.
//!
//! The framer extracts raw payload bytes only; JSON validation happens
//! in the codec. Responses are always written line-delimited.

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// One framing unit read from the transport.
#[derive(Debug, PartialEq)]
pub enum Frame {
    /// Raw payload bytes of a single message.
    Message(Vec<u8>),
    /// The underlying stream closed cleanly (or mid-message).
    Eof,
}

/// Errors surfaced by the framer. Any of these is fatal to the
/// connection: the read loop exits.
#[derive(Debug, Error)]
pub enum FramingError {
    #[error("invalid Content-Length header: {0}")]
    InvalidContentLength(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read the next message from the stream, skipping blank lines.
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame, FramingError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) => return Ok(Frame::Eof),
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(Frame::Eof),
            Err(e) => return Err(e.into()),
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            // Blank lines between messages are not messages.
            continue;
        }

        if let Some(rest) = strip_content_length(trimmed) {
            let length = parse_content_length(rest)?;
            return read_header_delimited(reader, length).await;
        }

        // Direct JSON line: the line itself is the payload.
        return Ok(Frame::Message(trimmed.as_bytes().to_vec()));
    }
}

/// Case-insensitive match of the `Content-Length:` header prefix.
fn strip_content_length(line: &str) -> Option<&str> {
    const HEADER: &str = "content-length:";
    if line.len() >= HEADER.len() && line[..HEADER.len()].eq_ignore_ascii_case(HEADER) {
        Some(&line[HEADER.len()..])
    } else {
        None
    }
}

fn parse_content_length(value: &str) -> Result<usize, FramingError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| FramingError::InvalidContentLength(value.trim().to_string()))
}

/// Consume the remaining header lines up to the blank separator, then
/// read exactly `length` payload bytes.
async fn read_header_delimited<R>(reader: &mut R, length: usize) -> Result<Frame, FramingError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header).await {
            Ok(0) => return Ok(Frame::Eof),
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(Frame::Eof),
            Err(e) => return Err(e.into()),
        }
        if header.trim().is_empty() {
            break;
        }
        // Other headers (e.g. Content-Type) carry no framing information.
    }

    let mut body = vec![0u8; length];
    match reader.read_exact(&mut body).await {
        Ok(_) => Ok(Frame::Message(body)),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(Frame::Eof),
        Err(e) => Err(e.into()),
    }
}
