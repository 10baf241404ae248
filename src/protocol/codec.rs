//! Command codec contract
//!
//! Every command is a stateless set of functions keyed by an opcode.
//! The dispatcher sends `CODE` plus the output of [`CommandCodec::encode`]
//! as one message and hands the reply payload to [`CommandCodec::decode`].
//! The serving side runs the mirror pair, [`CommandCodec::decode_body`] and
//! [`CommandCodec::encode_reply`].
//!
//! Codecs are registered into a [`CommandTable`] once at startup. The table
//! is immutable after `build()` and is shared by reference (usually an
//! `Arc`) with the client and the server. Each entry carries type-erased
//! entry points into its codec, so the table alone decides how a frame with
//! a given opcode is checked.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;

use crate::error::{Result, WireError};
use super::login::Login;
use super::session::{Logout, Ping};

/// Encode/decode contract implemented by every command.
///
/// Implementations are marker types; all functions are pure and may be
/// called concurrently from any number of threads.
pub trait CommandCodec {
    /// Opcode identifying the command on the wire
    const CODE: u8;

    /// Human readable name, used in logs and the command table
    const NAME: &'static str;

    /// Typed request accepted by `encode`
    type Request;

    /// Typed result produced by `decode`
    type Response;

    /// Build the request body. Validation failures return before any
    /// bytes are produced.
    fn encode(request: &Self::Request) -> Result<Bytes>;

    /// Parse a successful reply payload.
    fn decode(payload: &[u8]) -> Result<Self::Response>;

    /// Parse a request body on the serving side.
    fn decode_body(body: &[u8]) -> Result<Self::Request>;

    /// Build the reply payload on the serving side.
    fn encode_reply(response: &Self::Response) -> Result<Bytes>;
}

fn check_body<C: CommandCodec>(body: &[u8]) -> Result<()> {
    C::decode_body(body).map(|_| ())
}

fn check_reply<C: CommandCodec>(payload: &[u8]) -> Result<()> {
    C::decode(payload).map(|_| ())
}

/// Entry describing one registered command
#[derive(Clone, Copy)]
pub struct CommandInfo {
    pub code: u8,
    pub name: &'static str,
    check_body: fn(&[u8]) -> Result<()>,
    check_reply: fn(&[u8]) -> Result<()>,
}

impl CommandInfo {
    /// Describe the codec `C`
    pub fn of<C: CommandCodec>() -> Self {
        Self {
            code: C::CODE,
            name: C::NAME,
            check_body: check_body::<C>,
            check_reply: check_reply::<C>,
        }
    }

    /// Run the codec's request parser over `body`
    pub fn check_body(&self, body: &[u8]) -> Result<()> {
        (self.check_body)(body)
    }

    /// Run the codec's reply parser over `payload`
    pub fn check_reply(&self, payload: &[u8]) -> Result<()> {
        (self.check_reply)(payload)
    }
}

impl fmt::Debug for CommandInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandInfo")
            .field("code", &self.code)
            .field("name", &self.name)
            .finish()
    }
}

/// Immutable mapping from opcode to command
#[derive(Debug, Clone)]
pub struct CommandTable {
    commands: BTreeMap<u8, CommandInfo>,
}

impl CommandTable {
    /// Create a new table builder
    pub fn builder() -> CommandTableBuilder {
        CommandTableBuilder::default()
    }

    /// Table holding every command shipped with this crate
    pub fn standard() -> Self {
        let mut commands = BTreeMap::new();
        for info in [
            CommandInfo::of::<Ping>(),
            CommandInfo::of::<Login>(),
            CommandInfo::of::<Logout>(),
        ] {
            commands.insert(info.code, info);
        }
        Self { commands }
    }

    /// Look up a command by opcode
    pub fn get(&self, code: u8) -> Option<&CommandInfo> {
        self.commands.get(&code)
    }

    /// Look up a command, failing with `UnknownCommand` if absent
    pub fn require(&self, code: u8) -> Result<&CommandInfo> {
        self.get(code).ok_or(WireError::UnknownCommand(code))
    }

    /// Check a request body against the codec registered for `code`
    pub fn check_request(&self, code: u8, body: &[u8]) -> Result<&CommandInfo> {
        let info = self.require(code)?;
        info.check_body(body)?;
        Ok(info)
    }

    pub fn contains(&self, code: u8) -> bool {
        self.commands.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate over registered commands in opcode order
    pub fn iter(&self) -> impl Iterator<Item = &CommandInfo> {
        self.commands.values()
    }
}

/// Builder for CommandTable
#[derive(Debug, Default)]
pub struct CommandTableBuilder {
    commands: BTreeMap<u8, CommandInfo>,
    duplicate: Option<(CommandInfo, CommandInfo)>,
}

impl CommandTableBuilder {
    /// Register the codec `C` under its opcode
    pub fn register<C: CommandCodec>(mut self) -> Self {
        let info = CommandInfo::of::<C>();
        if let Some(existing) = self.commands.insert(info.code, info) {
            // Only the first conflict is reported
            self.duplicate.get_or_insert((existing, info));
        }
        self
    }

    /// Finish the table. Fails if two commands share an opcode.
    pub fn build(self) -> Result<CommandTable> {
        if let Some((existing, added)) = self.duplicate {
            return Err(WireError::Config(format!(
                "Opcode {} registered twice ({} and {})",
                existing.code, existing.name, added.name
            )));
        }
        Ok(CommandTable {
            commands: self.commands,
        })
    }
}
