//! Network Module
//!
//! TCP client and reference server.
//!
//! ## Architecture
//! - Client: one connection, one command in flight
//! - Server: single acceptor thread, worker thread pool for connections
//! - Request bodies checked by the CommandTable codec, then routed to a RequestHandler

mod client;
mod connection;
mod handler;
mod server;

pub use client::Client;
pub use connection::Connection;
pub use handler::{RequestHandler, Router, StaticUsers};
pub use server::{Server, ShutdownHandle};
