//! Connection Handler
//!
//! Serves requests from a single client connection.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, WireError};
use crate::protocol::{read_request, write_response, CommandTable, Request, Response};
use super::handler::RequestHandler;

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Commands the server accepts
    table: Arc<CommandTable>,

    /// Executes accepted commands
    handler: Arc<dyn RequestHandler>,

    /// Largest request body accepted
    max_payload_size: u32,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(
        stream: TcpStream,
        table: Arc<CommandTable>,
        handler: Arc<dyn RequestHandler>,
        max_payload_size: u32,
    ) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            table,
            handler,
            max_payload_size,
            peer_addr,
        })
    }

    /// Configure connection timeouts (milliseconds, 0 = none)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Returns when the client disconnects or the request stream is
    /// unreadable.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let request = match read_request(&mut self.reader, self.max_payload_size) {
                Ok(request) => request,
                Err(WireError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} disconnected ({:?})", self.peer_addr, e.kind());
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    // The stream is out of sync; report and close
                    if let Err(reply_err) =
                        write_response(&mut self.writer, &Response::error(&e.to_string()))
                    {
                        tracing::debug!(
                            "Could not send error reply to {}: {}",
                            self.peer_addr, reply_err
                        );
                    }
                    return Err(e);
                }
            };

            tracing::trace!(
                "Received code {} ({} bytes) from {}",
                request.code,
                request.body.len(),
                self.peer_addr
            );

            let response = self.execute(&request);

            if let Err(e) = write_response(&mut self.writer, &response) {
                if let WireError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) || io_err.kind() == std::io::ErrorKind::BrokenPipe {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr, e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Execute a request and return a response
    ///
    /// The body is checked by the codec registered for its opcode before the
    /// handler sees it, and the handler's payload must parse as that codec's
    /// reply.
    fn execute(&self, request: &Request) -> Response {
        let info = match self.table.check_request(request.code, &request.body) {
            Ok(info) => info,
            Err(e) => {
                tracing::debug!("Rejecting request from {}: {}", self.peer_addr, e);
                return Response::error(&e.to_string());
            }
        };

        let payload = match self.handler.handle(request.code, &request.body) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!("{} from {} failed: {}", info.name, self.peer_addr, e);
                return Response::error(&e.to_string());
            }
        };

        if let Err(e) = info.check_reply(&payload) {
            tracing::warn!("Handler produced an invalid {} reply: {}", info.name, e);
            return Response::error(&format!("Invalid {} reply", info.name));
        }

        Response::ok(payload)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_disconnect(kind: std::io::ErrorKind) -> bool {
    matches!(
        kind,
        std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            // Read timeout (Windows reports TimedOut instead of WouldBlock)
            | std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::TimedOut
    )
}
