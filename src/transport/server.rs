//! The connection multiplexer: accept loop, slot table, session tasks.
//!
//! The server accepts TCP connections, assigns each one a slot in a
//! fixed-capacity table, and spawns a session task to drive it. The slot
//! table is the sole source of truth for which connections are live: a
//! slot is released in the same step its session task finishes, so a
//! stale entry can never be mistaken for an active connection. A client
//! arriving while the table is full is rejected and logged without
//! touching existing sessions.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, instrument, warn};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::service::Session;
use crate::utils::EventLog;

/// Fixed-capacity table of live connections, indexed by slot.
///
/// A `None` entry means "free slot". Allocation scans for the first free
/// index; release clears it for reuse.
#[derive(Debug)]
pub struct SlotTable {
    slots: Vec<Option<SocketAddr>>,
}

impl SlotTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Claim the first free slot for `peer`. Returns `None` when the
    /// table is full.
    pub fn allocate(&mut self, peer: SocketAddr) -> Option<usize> {
        let index = self.slots.iter().position(Option::is_none)?;
        self.slots[index] = Some(peer);
        Some(index)
    }

    /// Free a slot so it can be reused.
    pub fn release(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = None;
        }
    }

    /// Number of live connections.
    pub fn active(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// The listening server, ready to run its accept loop.
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    slots: Arc<Mutex<SlotTable>>,
    log: Arc<EventLog>,
}

impl Server {
    /// Validate the configuration and bind the listener.
    ///
    /// Bind and directory failures surface here so the caller can treat
    /// them as fatal startup errors.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        config.validate_strict()?;

        let listener = TcpListener::bind(config.listen_addr()).await?;
        info!(address = %listener.local_addr()?, directory = %config.directory.display(), "Listening");

        let slots = Arc::new(Mutex::new(SlotTable::new(config.max_clients)));
        let log = Arc::new(EventLog::new(&config.log_file));

        Ok(Self {
            listener,
            config,
            slots,
            log,
        })
    }

    /// The address the listener actually bound (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run until ctrl-c.
    pub async fn run(self) -> Result<()> {
        // Create internal shutdown channel
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        // Set up ctrl-c handler that sends to our internal shutdown channel
        let shutdown_tx_clone = shutdown_tx.clone();
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received CTRL+C signal, shutting down");
                let _ = shutdown_tx_clone.send(()).await;
            }
        });

        self.run_with_shutdown(shutdown_rx).await
    }

    /// Run the accept loop until the shutdown channel fires.
    #[instrument(skip(self, shutdown_rx), fields(address = %self.config.listen_addr()))]
    pub async fn run_with_shutdown(self, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        loop {
            tokio::select! {
                // Check for shutdown signal from the provided channel
                _ = shutdown_rx.recv() => {
                    info!("Shutting down server. Waiting for connections to close...");
                    self.drain_connections().await;
                    return Ok(());
                }

                // Accept new connections
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, peer)) => {
                            self.log.record(&format!(
                                "New connection request from client at {peer}"
                            ));
                            self.admit(stream, peer).await;
                        }
                        Err(e) => {
                            error!(error = %e, "Error accepting connection");
                        }
                    }
                }
            }
        }
    }

    /// Give the connection a slot and a session task, or turn it away.
    async fn admit(&self, stream: TcpStream, peer: SocketAddr) {
        let slot = self.slots.lock().await.allocate(peer);

        let Some(slot) = slot else {
            // Capacity error: reject this client, existing sessions
            // are unaffected
            self.log
                .record("  Connection request denied; no more sockets available");
            drop(stream);
            return;
        };

        self.log.record(&format!(
            "  Connection request granted; adding to list of sockets as {slot}"
        ));

        let session = Session::new(
            stream,
            peer,
            slot,
            self.config.directory.clone(),
            self.log.clone(),
        );
        let slots = self.slots.clone();

        tokio::spawn(async move {
            session.run().await;

            // Clear the slot in the same step the socket closes
            let mut table = slots.lock().await;
            table.release(slot);
        });
    }

    /// Wait for active sessions to finish, up to the shutdown timeout.
    async fn drain_connections(&self) {
        let timeout = tokio::time::sleep(self.config.shutdown_timeout);
        tokio::pin!(timeout);

        loop {
            tokio::select! {
                _ = &mut timeout => {
                    warn!("Shutdown timeout reached, forcing exit");
                    break;
                }
                _ = tokio::time::sleep(Duration::from_millis(500)) => {
                    let connections = self.slots.lock().await.active();
                    info!(connections = %connections, "Waiting for connections to close");
                    if connections == 0 {
                        info!("All connections closed, shutting down");
                        break;
                    }
                }
            }
        }
    }
}
