//! Per-connection session handling.
//!
//! A [`Session`] owns one accepted socket, framed into newline-delimited
//! messages. Its loop reads one frame at a time, parses and validates it,
//! dispatches to the command handler for its type, and writes exactly one
//! response packet back (none for `leave`). Every failure mode is isolated
//! to this session: a misbehaving peer closes its own connection and
//! nothing else.

use crate::core::codec::FrameCodec;
use crate::core::packet::{self, PacketType};
use crate::error::{ProtocolError, Result};
use crate::protocol::commands;
use crate::utils::EventLog;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, error, instrument, warn};

/// What the session loop should do after a frame has been handled.
enum Flow {
    Continue,
    Close,
}

/// State for one live client connection.
pub struct Session {
    framed: Framed<TcpStream, FrameCodec>,
    peer: SocketAddr,
    slot: usize,
    directory: PathBuf,
    log: Arc<EventLog>,
}

impl Session {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        slot: usize,
        directory: PathBuf,
        log: Arc<EventLog>,
    ) -> Self {
        Self {
            framed: Framed::new(stream, FrameCodec),
            peer,
            slot,
            directory,
            log,
        }
    }

    /// Drive the session until the peer leaves, misbehaves, or disconnects.
    ///
    /// Messages are handled strictly in arrival order; each one runs to
    /// completion before the next frame is read.
    #[instrument(skip(self), fields(peer = %self.peer, slot = self.slot))]
    pub async fn run(mut self) {
        loop {
            let frame = match self.framed.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => {
                    warn!(error = %e, "Frame error");
                    self.record_unexpected_close();
                    break;
                }
                None => {
                    // Peer closed without a leave packet
                    self.record_unexpected_close();
                    break;
                }
            };

            match self.handle_frame(&frame).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Close) => break,
                Err(ProtocolError::DirectoryUnavailable { path, source }) => {
                    // Losing the sync directory is fatal to the whole
                    // daemon, not just this session
                    error!(path = %path, error = %source, "Cannot open sync directory");
                    self.log
                        .record(&format!("Cannot open sync directory {path}: {source}"));
                    std::process::exit(1);
                }
                Err(e) => {
                    warn!(error = %e, "Closing session after error");
                    self.record_unexpected_close();
                    break;
                }
            }
        }
    }

    /// Handle one complete frame: parse, validate, dispatch.
    async fn handle_frame(&mut self, frame: &str) -> Result<Flow> {
        let Ok(query) = serde_json::from_str::<Value>(frame) else {
            // Not a wire document at all; treat the peer as misbehaving
            debug!("Frame is not a wire document");
            self.record_unexpected_close();
            return Ok(Flow::Close);
        };

        debug!(packet = %query, "Received packet");

        if !packet::validate(&query) {
            // Invalid but parseable packets are dropped without a response
            debug!("Ignoring packet that failed validation");
            return Ok(Flow::Continue);
        }

        let Some(packet_type) = query
            .get("type")
            .and_then(Value::as_str)
            .and_then(PacketType::from_wire)
        else {
            return Ok(Flow::Continue);
        };

        match packet_type {
            PacketType::ListRequest => {
                self.log
                    .record(&format!("Client at {} requested a list of files", self.peer));
                let response = commands::list(&self.directory)?;
                self.send(&response).await?;
                Ok(Flow::Continue)
            }
            PacketType::PullRequest => {
                let items = packet::request_items(&query)?;
                self.log.record(&format!(
                    "Client at {} requested to pull files {}",
                    self.peer,
                    commands::pretty_file_list(&items)
                ));
                let response = commands::pull(&self.directory, &items)?;
                self.send(&response).await?;
                Ok(Flow::Continue)
            }
            PacketType::PushRequest => {
                let items = packet::request_items(&query)?;
                self.log.record(&format!(
                    "Client at {} requested to push files {}",
                    self.peer,
                    commands::pretty_file_list(&items)
                ));
                let response = commands::push(&self.directory, &items)?;
                self.send(&response).await?;
                Ok(Flow::Continue)
            }
            PacketType::Leave => {
                // Close without a response packet
                self.log
                    .record(&format!("Client at {} cleanly closed connection", self.peer));
                Ok(Flow::Close)
            }
            other => {
                // Well-formed, but not a request this server answers
                warn!(packet_type = other.as_wire(), "Unhandled packet type, closing session");
                Ok(Flow::Close)
            }
        }
    }

    async fn send(&mut self, response: &Value) -> Result<()> {
        self.framed.send(packet::serialize(response)).await
    }

    fn record_unexpected_close(&self) {
        self.log.record(&format!(
            "Client at {} unexpectedly closed connection",
            self.peer
        ));
    }
}
