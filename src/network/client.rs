//! Blocking client
//!
//! Sends one command at a time over a single TCP connection and waits for
//! its reply, so replies always match the request that preceded them.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{Result, WireError};
use crate::protocol::{
    read_response, write_request, CommandCodec, CommandTable, Login, LoginRequest,
    LoginResponse, Logout, Ping, Request,
};

/// Client for a cmdwire server
pub struct Client {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Commands this client is allowed to send
    table: Arc<CommandTable>,

    config: ClientConfig,

    /// Peer address for logging
    peer_addr: String,
}

impl Client {
    /// Connect to `config.server_addr`
    pub fn connect(config: ClientConfig, table: Arc<CommandTable>) -> Result<Self> {
        let stream = TcpStream::connect(&config.server_addr)?;
        Self::from_stream(stream, config, table)
    }

    /// Wrap an already connected stream
    pub fn from_stream(
        stream: TcpStream,
        config: ClientConfig,
        table: Arc<CommandTable>,
    ) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;
        if config.read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
        }
        if config.write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(config.write_timeout_ms)))?;
        }

        let read_stream = stream.try_clone()?;

        tracing::debug!("Connected to {}", peer_addr);

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            table,
            config,
            peer_addr,
        })
    }

    /// Send a command and decode its reply.
    ///
    /// Unknown opcodes, invalid requests and bodies above
    /// `max_payload_size` fail before anything is written.
    /// An ERROR reply surfaces as `WireError::Server`.
    pub fn send<C: CommandCodec>(&mut self, request: &C::Request) -> Result<C::Response> {
        let name = self.table.require(C::CODE)?.name;
        let body = C::encode(request)?;

        // Peers apply the same limit to request bodies
        if body.len() > self.config.max_payload_size as usize {
            return Err(WireError::InvalidField(format!(
                "{} body is {} bytes (max {})",
                name,
                body.len(),
                self.config.max_payload_size
            )));
        }

        tracing::trace!(
            "Sending {} (code {}, {} bytes) to {}",
            name,
            C::CODE,
            body.len(),
            self.peer_addr
        );

        write_request(&mut self.writer, &Request::new(C::CODE, body)).map_err(closed)?;
        let response =
            read_response(&mut self.reader, self.config.max_payload_size).map_err(closed)?;

        tracing::trace!(
            "Received {:?} for {} ({} bytes)",
            response.status,
            name,
            response.payload.len()
        );

        let payload = response.into_payload()?;
        C::decode(&payload)
    }

    /// Log in and return the assigned user id
    pub fn login(&mut self, request: &LoginRequest) -> Result<LoginResponse> {
        let response = self.send::<Login>(request)?;
        tracing::debug!("Logged in to {} as user {}", self.peer_addr, response.user_id);
        Ok(response)
    }

    pub fn ping(&mut self) -> Result<()> {
        self.send::<Ping>(&())
    }

    pub fn logout(&mut self) -> Result<()> {
        self.send::<Logout>(&())?;
        tracing::debug!("Logged out from {}", self.peer_addr);
        Ok(())
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Map a short read to `ConnectionClosed`
fn closed(error: WireError) -> WireError {
    match error {
        WireError::Io(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            WireError::ConnectionClosed
        }
        other => other,
    }
}
