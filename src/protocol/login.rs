//! Login command
//!
//! Exchanges a username/password, plus an optional client version and
//! application context, for a user identifier.
//!
//! ## Request Body (little-endian)
//! ```text
//! ┌────────┬──────────┬────────┬──────────┬─────────┬─────────┬─────────┬─────────┐
//! │ ULen(1)│ username │ PLen(1)│ password │ VLen(4) │ version │ CLen(4) │ context │
//! └────────┴──────────┴────────┴──────────┴─────────┴─────────┴─────────┴─────────┘
//! ```
//! Username and password are 1..=255 bytes. Version and context may be
//! empty, in which case only their zero length prefix is written.
//!
//! ## Response Payload
//! ```text
//! ┌──────────────┬──────────────────┐
//! │ user_id (4)  │ ignored trailer  │
//! └──────────────┴──────────────────┘
//! ```

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};
use super::codec::CommandCodec;

/// Opcode of the login command
pub const LOGIN_CODE: u8 = 38;

/// Maximum encoded length of username and password
pub const MAX_CREDENTIAL_LEN: usize = 255;

/// Size of the user id at the start of a login reply
pub const USER_ID_SIZE: usize = 4;

// =============================================================================
// Request
// =============================================================================

/// Credentials sent by the login command
///
/// Fields hold raw bytes; callers encoding text should use UTF-8 on both ends.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginRequest {
    username: Bytes,
    password: Bytes,
    client_version: Option<Bytes>,
    context: Option<Bytes>,
}

impl LoginRequest {
    /// Create a request with no client version or context
    pub fn new(username: impl AsRef<[u8]>, password: impl AsRef<[u8]>) -> Self {
        Self {
            username: Bytes::copy_from_slice(username.as_ref()),
            password: Bytes::copy_from_slice(password.as_ref()),
            client_version: None,
            context: None,
        }
    }

    /// Attach the client version string
    pub fn with_version(mut self, version: impl AsRef<[u8]>) -> Self {
        self.client_version = Some(Bytes::copy_from_slice(version.as_ref()));
        self
    }

    /// Attach the application context string
    pub fn with_context(mut self, context: impl AsRef<[u8]>) -> Self {
        self.context = Some(Bytes::copy_from_slice(context.as_ref()));
        self
    }

    pub fn username(&self) -> &[u8] {
        &self.username
    }

    pub fn password(&self) -> &[u8] {
        &self.password
    }

    pub fn client_version(&self) -> Option<&[u8]> {
        self.client_version.as_deref()
    }

    pub fn context(&self) -> Option<&[u8]> {
        self.context.as_deref()
    }

    /// Check field bounds. First failure wins: username, then password.
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() || self.username.len() > MAX_CREDENTIAL_LEN {
            return Err(WireError::InvalidField(
                "Username should be between 1 and 255 bytes".to_string(),
            ));
        }
        if self.password.is_empty() || self.password.len() > MAX_CREDENTIAL_LEN {
            return Err(WireError::InvalidField(
                "Password should be between 1 and 255 bytes".to_string(),
            ));
        }
        check_long_field(self.client_version(), "Client version")?;
        check_long_field(self.context(), "Context")?;
        Ok(())
    }

    /// Size of the encoded body
    pub fn encoded_len(&self) -> usize {
        let version = self.client_version().map_or(0, <[u8]>::len);
        let context = self.context().map_or(0, <[u8]>::len);
        1 + self.username.len() + 1 + self.password.len() + 4 + version + 4 + context
    }

    /// Parse a request body produced by [`Login::encode`].
    ///
    /// Empty optional fields come back as `None`.
    pub fn decode_body(body: &[u8]) -> Result<Self> {
        let mut cursor = body;

        let username_len = take_u8(&mut cursor, "username length")? as usize;
        let username = take_bytes(&mut cursor, username_len, "username")?;
        let password_len = take_u8(&mut cursor, "password length")? as usize;
        let password = take_bytes(&mut cursor, password_len, "password")?;
        let version_len = take_u32_le(&mut cursor, "version length")? as usize;
        let version = take_bytes(&mut cursor, version_len, "version")?;
        let context_len = take_u32_le(&mut cursor, "context length")? as usize;
        let context = take_bytes(&mut cursor, context_len, "context")?;

        if !cursor.is_empty() {
            return Err(WireError::Protocol(format!(
                "LOGIN request: {} trailing bytes",
                cursor.len()
            )));
        }

        let request = Self {
            username,
            password,
            client_version: non_empty(version),
            context: non_empty(context),
        };
        request.validate()?;
        Ok(request)
    }

    /// Build the body. Lengths must already be validated.
    fn assemble(&self) -> Bytes {
        let mut body = BytesMut::with_capacity(self.encoded_len());

        body.put_u8(self.username.len() as u8);
        body.put_slice(&self.username);
        body.put_u8(self.password.len() as u8);
        body.put_slice(&self.password);
        put_optional(&mut body, self.client_version());
        put_optional(&mut body, self.context());

        body.freeze()
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &String::from_utf8_lossy(&self.username))
            .field("password", &"<redacted>")
            .field(
                "client_version",
                &self.client_version().map(String::from_utf8_lossy),
            )
            .field("context", &self.context().map(String::from_utf8_lossy))
            .finish()
    }
}

/// Optional fields are length-prefixed with a u32
fn check_long_field(field: Option<&[u8]>, name: &str) -> Result<()> {
    let len = field.map_or(0, <[u8]>::len);
    if u32::try_from(len).is_err() {
        return Err(WireError::InvalidField(format!(
            "{} should be at most {} bytes",
            name,
            u32::MAX
        )));
    }
    Ok(())
}

fn put_optional(body: &mut BytesMut, field: Option<&[u8]>) {
    match field {
        Some(value) if !value.is_empty() => {
            body.put_u32_le(value.len() as u32);
            body.put_slice(value);
        }
        _ => body.put_u32_le(0),
    }
}

fn non_empty(field: Bytes) -> Option<Bytes> {
    if field.is_empty() {
        None
    } else {
        Some(field)
    }
}

fn take_u8(cursor: &mut &[u8], what: &str) -> Result<u8> {
    match cursor.split_first() {
        Some((&byte, rest)) => {
            *cursor = rest;
            Ok(byte)
        }
        None => Err(WireError::Protocol(format!("LOGIN request: missing {}", what))),
    }
}

fn take_u32_le(cursor: &mut &[u8], what: &str) -> Result<u32> {
    if cursor.len() < 4 {
        return Err(WireError::Protocol(format!("LOGIN request: missing {}", what)));
    }
    let (head, rest) = cursor.split_at(4);
    *cursor = rest;
    Ok(u32::from_le_bytes([head[0], head[1], head[2], head[3]]))
}

fn take_bytes(cursor: &mut &[u8], len: usize, what: &str) -> Result<Bytes> {
    if cursor.len() < len {
        return Err(WireError::Protocol(format!(
            "LOGIN request: incomplete {} (expected {}, got {})",
            what,
            len,
            cursor.len()
        )));
    }
    let (head, rest) = cursor.split_at(len);
    *cursor = rest;
    Ok(Bytes::copy_from_slice(head))
}

// =============================================================================
// Response
// =============================================================================

/// Result of a successful login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginResponse {
    pub user_id: u32,
}

impl LoginResponse {
    /// Read the user id from the first 4 bytes of a reply payload.
    /// Any trailing bytes are ignored.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        match payload.get(..USER_ID_SIZE) {
            Some(&[a, b, c, d]) => Ok(Self {
                user_id: u32::from_le_bytes([a, b, c, d]),
            }),
            _ => Err(WireError::MalformedResponse(format!(
                "LOGIN reply: expected at least {} bytes, got {}",
                USER_ID_SIZE,
                payload.len()
            ))),
        }
    }

    /// Encode as a reply payload
    pub fn to_payload(&self) -> Bytes {
        Bytes::copy_from_slice(&self.user_id.to_le_bytes())
    }
}

// =============================================================================
// Codec
// =============================================================================

/// Codec for the login command
pub struct Login;

impl CommandCodec for Login {
    const CODE: u8 = LOGIN_CODE;
    const NAME: &'static str = "login";
    type Request = LoginRequest;
    type Response = LoginResponse;

    fn encode(request: &LoginRequest) -> Result<Bytes> {
        request.validate()?;
        Ok(request.assemble())
    }

    fn decode(payload: &[u8]) -> Result<LoginResponse> {
        LoginResponse::from_payload(payload)
    }

    fn decode_body(body: &[u8]) -> Result<LoginRequest> {
        LoginRequest::decode_body(body)
    }

    fn encode_reply(response: &LoginResponse) -> Result<Bytes> {
        Ok(response.to_payload())
    }
}
