//! Session commands without a request body
//!
//! - PING (0x01): liveness check
//! - LOGOUT (0x27): end the authenticated session
//!
//! Both send an empty body and ignore whatever payload the reply carries.

use bytes::Bytes;

use crate::error::{Result, WireError};
use super::codec::CommandCodec;

/// Opcode of the ping command
pub const PING_CODE: u8 = 1;

/// Opcode of the logout command
pub const LOGOUT_CODE: u8 = 39;

fn expect_empty(body: &[u8], name: &str) -> Result<()> {
    if !body.is_empty() {
        return Err(WireError::Protocol(format!(
            "{} command: unexpected payload of {} bytes",
            name,
            body.len()
        )));
    }
    Ok(())
}

/// Codec for the ping command
pub struct Ping;

impl CommandCodec for Ping {
    const CODE: u8 = PING_CODE;
    const NAME: &'static str = "ping";
    type Request = ();
    type Response = ();

    fn encode(_: &()) -> Result<Bytes> {
        Ok(Bytes::new())
    }

    fn decode(_: &[u8]) -> Result<()> {
        Ok(())
    }

    fn decode_body(body: &[u8]) -> Result<()> {
        expect_empty(body, "PING")
    }

    fn encode_reply(_: &()) -> Result<Bytes> {
        Ok(Bytes::new())
    }
}

/// Codec for the logout command
pub struct Logout;

impl CommandCodec for Logout {
    const CODE: u8 = LOGOUT_CODE;
    const NAME: &'static str = "logout";
    type Request = ();
    type Response = ();

    fn encode(_: &()) -> Result<Bytes> {
        Ok(Bytes::new())
    }

    fn decode(_: &[u8]) -> Result<()> {
        Ok(())
    }

    fn decode_body(body: &[u8]) -> Result<()> {
        expect_empty(body, "LOGOUT")
    }

    fn encode_reply(_: &()) -> Result<Bytes> {
        Ok(Bytes::new())
    }
}
