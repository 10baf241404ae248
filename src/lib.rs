//! # cmdwire
//!
//! Typed command codecs for a length-prefixed binary client-server protocol:
//! - Pure encode/decode pairs keyed by opcode (`CommandCodec`)
//! - Immutable opcode table shared by client and server
//! - Login handshake exchanging credentials for a user id
//! - Blocking TCP client and a reference server
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Caller (login, ping, ...)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ typed request
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Client (dispatcher)                          │
//! │      CommandTable lookup → CommandCodec::encode              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ code + body
//!                       ▼
//!               ┌───────────────┐        ┌──────────────────┐
//!               │   Envelope    │ ─TCP─▶ │ Server / Handler │
//!               └───────┬───────┘        └──────────────────┘
//!                       │ payload
//!                       ▼
//!               CommandCodec::decode → typed response
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{WireError, Result};
pub use config::{ClientConfig, ServerConfig};
pub use protocol::{CommandCodec, CommandTable, Login, LoginRequest, LoginResponse};
pub use network::{Client, Server};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of cmdwire
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
