//! # Core Protocol Components
//!
//! Low-level packet handling, codecs, and the binary-to-text subsystem.
//!
//! This module provides the foundation for the protocol: frame delimiting,
//! packet schema and validation, and the base64/CRC32 pair that makes file
//! content safe inside a text-oriented wire format.
//!
//! ## Components
//! - **Packet**: JSON packet schema, validation, serialization
//! - **Codec**: Tokio codec for newline-delimited framing over byte streams
//! - **Base64**: Binary payload encoding with a best-effort decoder
//! - **Checksum**: CRC32 file fingerprints as lowercase hex
//!
//! ## Wire Format
//! ```text
//! [JSON document] [\n]
//! ```
//!
//! ## Security
//! - Maximum frame size: 16MB (prevents memory exhaustion)
//! - The newline delimiter cannot occur inside base64 or hex payloads

pub mod base64;
pub mod checksum;
pub mod codec;
pub mod packet;
