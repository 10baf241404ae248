//! Envelope framing
//!
//! Wraps command bodies and reply payloads for transport over a stream.
//!
//! ### Request Envelope
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Code (1) │ Len (4)  │         Body                │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Response Envelope
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! Lengths are little-endian, matching the command bodies.

use std::io::{Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};

/// Header size: 1 byte code/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Types
// =============================================================================

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    Error = 0x01,
}

impl Status {
    /// Parse a status byte
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(Status::Ok),
            0x01 => Ok(Status::Error),
            _ => Err(WireError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                byte
            ))),
        }
    }
}

/// A command body addressed by opcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub code: u8,
    pub body: Bytes,
}

impl Request {
    pub fn new(code: u8, body: Bytes) -> Self {
        Self { code, body }
    }
}

/// A reply to one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Command payload for OK, UTF-8 message for ERROR
    pub payload: Bytes,
}

impl Response {
    /// Create an OK response
    pub fn ok(payload: Bytes) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Bytes::copy_from_slice(message.as_bytes()),
        }
    }

    /// Payload of an OK response, or `WireError::Server` otherwise
    pub fn into_payload(self) -> Result<Bytes> {
        match self.status {
            Status::Ok => Ok(self.payload),
            status => Err(WireError::Server {
                status: status as u8,
                message: String::from_utf8_lossy(&self.payload).into_owned(),
            }),
        }
    }
}

// =============================================================================
// Encoding/Decoding
// =============================================================================

fn encode_envelope(lead: u8, payload: &[u8]) -> Result<Bytes> {
    let payload_len = u32::try_from(payload.len()).map_err(|_| {
        WireError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload.len(),
            u32::MAX
        ))
    })?;

    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(lead);
    message.put_u32_le(payload_len);
    message.put_slice(payload);
    Ok(message.freeze())
}

fn parse_header(header: &[u8], max_payload: u32) -> Result<(u8, usize)> {
    let lead = header[0];
    let payload_len = u32::from_le_bytes([header[1], header[2], header[3], header[4]]);

    if payload_len > max_payload {
        return Err(WireError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, max_payload
        )));
    }

    Ok((lead, payload_len as usize))
}

fn decode_envelope(bytes: &[u8]) -> Result<(u8, Bytes)> {
    if bytes.len() < HEADER_SIZE {
        return Err(WireError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let (lead, payload_len) = parse_header(&bytes[..HEADER_SIZE], MAX_PAYLOAD_SIZE)?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(WireError::Protocol(format!(
            "Incomplete payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    Ok((lead, Bytes::copy_from_slice(&bytes[HEADER_SIZE..total_len])))
}

/// Encode a request envelope
///
/// Format: code (1) + body_len (4) + body
pub fn encode_request(request: &Request) -> Result<Bytes> {
    encode_envelope(request.code, &request.body)
}

/// Decode a request envelope from bytes
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    let (code, body) = decode_envelope(bytes)?;
    Ok(Request { code, body })
}

/// Encode a response envelope
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Result<Bytes> {
    encode_envelope(response.status as u8, &response.payload)
}

/// Decode a response envelope from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status, payload) = decode_envelope(bytes)?;
    Ok(Response {
        status: Status::from_byte(status)?,
        payload,
    })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one envelope, blocking until it is complete
fn read_envelope<R: Read>(reader: &mut R, max_payload: u32) -> Result<(u8, Bytes)> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let (lead, payload_len) = parse_header(&header, max_payload)?;

    let mut payload = vec![0u8; payload_len];
    if payload_len > 0 {
        reader.read_exact(&mut payload)?;
    }

    Ok((lead, Bytes::from(payload)))
}

/// Read a complete request from a stream
pub fn read_request<R: Read>(reader: &mut R, max_payload: u32) -> Result<Request> {
    let (code, body) = read_envelope(reader, max_payload)?;
    Ok(Request { code, body })
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    writer.write_all(&encode_request(request)?)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R, max_payload: u32) -> Result<Response> {
    let (status, payload) = read_envelope(reader, max_payload)?;
    Ok(Response {
        status: Status::from_byte(status)?,
        payload,
    })
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response)?)?;
    writer.flush()?;
    Ok(())
}
