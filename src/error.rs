//! # Error Types
//!
//! Comprehensive error handling for the sync protocol.
//!
//! This module defines all error variants that can occur while serving
//! clients, from low-level I/O errors to protocol violations.
//!
//! ## Error Categories
//! - **I/O Errors**: Network and file system failures
//! - **Protocol Errors**: Malformed frames, invalid packets, unhandled types
//! - **Catalog Errors**: Inaccessible sync directory, filename exhaustion
//!
//! All errors implement `std::error::Error` for interoperability.
//!
//! ## Example Usage
//! ```rust
//! use filesync_protocol::error::{ProtocolError, Result};
//! use std::fs::File;
//! use std::io::Read;
//! use tracing::{info, error};
//!
//! fn read_file(path: &str) -> Result<String> {
//!     let mut file = File::open(path).map_err(ProtocolError::Io)?;
//!     let mut contents = String::new();
//!     file.read_to_string(&mut contents).map_err(ProtocolError::Io)?;
//!     Ok(contents)
//! }
//!
//! fn main() {
//!     match read_file("example.txt") {
//!         Ok(contents) => info!(contents, "Successfully read file"),
//!         Err(e) => error!(error=%e, "Error reading file"),
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

// ProtocolError is the primary error type for all server operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed packet: {0}")]
    MalformedPacket(#[from] serde_json::Error),

    #[error("Frame is not valid UTF-8")]
    MalformedFrame,

    #[error("Frame too large: {0} bytes")]
    OversizedFrame(usize),

    #[error("Invalid request item: {0}")]
    InvalidRequest(String),

    #[error("Cannot open sync directory {path}: {source}")]
    DirectoryUnavailable { path: String, source: io::Error },

    #[error("No free name for {0} within nine collision suffixes")]
    FilenameExhausted(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
