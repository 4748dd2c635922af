//! # FileSync Protocol
//!
//! Session protocol engine and server daemon for flat-directory file
//! synchronization.
//!
//! A single server process serves many concurrent clients from one accept
//! loop. Each client may list the synchronized directory, pull specific
//! files, push new files, or leave cleanly. Messages are newline-delimited
//! JSON documents; binary file content travels as base64 and every file is
//! fingerprinted with a CRC32 checksum, both when cataloged and again
//! after a push write.
//!
//! ## Architecture
//! ```text
//! TcpListener ──accept──► SlotTable ──spawn──► Session (one per client)
//!                                                 │
//!                               Framed<TcpStream, FrameCodec>
//!                                                 │
//!                              parse ─► validate ─► dispatch
//!                                                 │
//!                             list / pull / push ─► File Catalog
//!                                                 │
//!                                       base64 + CRC32 + fs
//! ```
//!
//! ## Error Isolation
//! No client-induced condition terminates the process or touches another
//! session: malformed frames, failed validation, and unhandled packet
//! types cost at most the offending client its own connection. Only
//! startup failures and loss of the sync directory are fatal.
//!
//! ## Example
//! ```no_run
//! use filesync_protocol::config::ServerConfig;
//! use filesync_protocol::transport::Server;
//!
//! #[tokio::main]
//! async fn main() -> filesync_protocol::Result<()> {
//!     let config = ServerConfig::default_with_overrides(|c| c.port = 4500);
//!     let server = Server::bind(config).await?;
//!     server.run().await
//! }
//! ```

#![warn(clippy::unwrap_used, clippy::expect_used)]

pub mod catalog;
pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod utils;

pub use error::{ProtocolError, Result};
