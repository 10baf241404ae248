//! TCP Server
//!
//! Accepts connections and dispatches them to worker threads.

use std::collections::HashMap;
use std::io;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver};

use crate::config::ServerConfig;
use crate::error::{Result, WireError};
use crate::protocol::CommandTable;
use super::connection::Connection;
use super::handler::RequestHandler;

/// Poll interval of the non-blocking accept loop
const ACCEPT_POLL: Duration = Duration::from_millis(20);

/// Stops a running [`Server`] from another thread
///
/// Once signalled, the accept loop exits and every open client socket is
/// shut down, so [`Server::run`] returns even while clients sit idle.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Sockets handed to workers, keyed by connection id
#[derive(Debug, Default)]
struct LiveConnections {
    next_id: AtomicU64,
    streams: Mutex<HashMap<u64, TcpStream>>,
}

impl LiveConnections {
    fn register(&self, stream: &TcpStream) -> io::Result<u64> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let clone = stream.try_clone()?;
        self.lock().insert(id, clone);
        Ok(id)
    }

    fn remove(&self, id: u64) {
        self.lock().remove(&id);
    }

    /// Shut down every registered socket, waking workers blocked in a read
    fn close_all(&self) {
        for (_, stream) in self.lock().drain() {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                tracing::debug!("Socket shutdown failed: {}", e);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, TcpStream>> {
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// TCP server for cmdwire
pub struct Server {
    config: ServerConfig,
    table: Arc<CommandTable>,
    handler: Arc<dyn RequestHandler>,
    listener: TcpListener,
    local_addr: SocketAddr,
    shutdown: ShutdownHandle,
    live: Arc<LiveConnections>,
}

impl Server {
    /// Bind the listen address. The server starts serving on [`Server::run`].
    pub fn bind(
        config: ServerConfig,
        table: Arc<CommandTable>,
        handler: Arc<dyn RequestHandler>,
    ) -> Result<Self> {
        if config.workers == 0 {
            return Err(WireError::Config("workers must be at least 1".to_string()));
        }

        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Listening on {}", local_addr);
        if config.read_timeout_ms == 0 {
            tracing::debug!("No read timeout; idle clients are only closed on shutdown");
        }

        Ok(Self {
            config,
            table,
            handler,
            listener,
            local_addr,
            shutdown: ShutdownHandle {
                flag: Arc::new(AtomicBool::new(false)),
            },
            live: Arc::new(LiveConnections::default()),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle for stopping the server
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Serve until shutdown is signalled (blocking)
    ///
    /// On shutdown the open client sockets are closed and the workers joined.
    /// A request already being executed still gets its reply attempt.
    pub fn run(self) -> Result<()> {
        let (sender, receiver) = channel::bounded::<(u64, TcpStream)>(self.config.backlog);

        let workers = (0..self.config.workers)
            .map(|id| self.spawn_worker(id, receiver.clone()))
            .collect::<io::Result<Vec<_>>>()?;
        drop(receiver);

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    tracing::debug!("Accepted connection from {}", addr);
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("Dropping connection from {}: {}", addr, e);
                        continue;
                    }
                    let id = match self.live.register(&stream) {
                        Ok(id) => id,
                        Err(e) => {
                            tracing::warn!("Dropping connection from {}: {}", addr, e);
                            continue;
                        }
                    };
                    if sender.send((id, stream)).is_err() {
                        tracing::error!("All workers exited, stopping accept loop");
                        break;
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    // e.g. EMFILE; keep the loop from spinning
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }

        tracing::info!("Shutting down, waiting for {} workers", workers.len());
        drop(sender);
        self.live.close_all();
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }

        Ok(())
    }

    fn spawn_worker(
        &self,
        id: usize,
        receiver: Receiver<(u64, TcpStream)>,
    ) -> io::Result<thread::JoinHandle<()>> {
        let table = Arc::clone(&self.table);
        let handler = Arc::clone(&self.handler);
        let live = Arc::clone(&self.live);
        let config = self.config.clone();

        thread::Builder::new()
            .name(format!("cmdwire-worker-{}", id))
            .spawn(move || {
                for (conn_id, stream) in receiver.iter() {
                    if let Err(e) = serve(stream, &config, &table, &handler) {
                        tracing::warn!("Connection closed with error: {}", e);
                    }
                    live.remove(conn_id);
                }
            })
    }
}

fn serve(
    stream: TcpStream,
    config: &ServerConfig,
    table: &Arc<CommandTable>,
    handler: &Arc<dyn RequestHandler>,
) -> Result<()> {
    let mut connection = Connection::new(
        stream,
        Arc::clone(table),
        Arc::clone(handler),
        config.max_payload_size,
    )?;
    connection.set_timeouts(config.read_timeout_ms, config.write_timeout_ms)?;
    connection.handle()
}
