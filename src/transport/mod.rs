//! # Transport
//!
//! The TCP listener, the accept loop, and the slot table that bounds how
//! many clients may be connected at once.

pub mod server;

pub use server::{Server, SlotTable};
