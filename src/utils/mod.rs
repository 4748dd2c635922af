//! # Utility Modules
//!
//! Supporting utilities for logging and the durable event log.
//!
//! ## Components
//! - **Logging**: Tracing subscriber setup and the append-only server
//!   event log

pub mod logging;

// Re-export public types for advanced users
pub use logging::EventLog;
