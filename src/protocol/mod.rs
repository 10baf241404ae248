//! Protocol Module
//!
//! Command codecs and the envelope that carries them.
//!
//! ## Commands
//! - 0x01: PING   - Body: empty
//! - 0x26: LOGIN  - Body: credentials, Reply: user_id (u32 LE)
//! - 0x27: LOGOUT - Body: empty
//!
//! Each command implements [`CommandCodec`]. A [`CommandTable`] maps opcodes
//! to commands and is built once, then shared read-only.
//!
//! ## Envelope
//! ```text
//! Request:  Code (1)   | Len (4 LE) | Body
//! Response: Status (1) | Len (4 LE) | Payload
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: ERROR

mod codec;
mod envelope;
mod login;
mod session;

pub use codec::{CommandCodec, CommandInfo, CommandTable, CommandTableBuilder};
pub use envelope::{
    encode_request, decode_request, encode_response, decode_response,
    read_request, write_request, read_response, write_response,
    Request, Response, Status, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub use login::{Login, LoginRequest, LoginResponse, LOGIN_CODE, MAX_CREDENTIAL_LEN, USER_ID_SIZE};
pub use session::{Logout, Ping, LOGOUT_CODE, PING_CODE};
