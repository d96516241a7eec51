//! PostgreSQL wire protocol implementation.
//!
//! This module contains the low-level protocol encoding and decoding.
//!
//! # Structure
//!
//! - `backend`: Server → Client messages (parsing)
//! - `frontend`: Client → Server messages (encoding)
//! - `builder`: Length-prefixed message builder used by every frontend writer
//! - `codec`: Low-level decoding primitives and inbound framing
//! - `types`: Common protocol types (FormatCode, Oid, TransactionStatus)
//!
//! # Wire format
//!
//! A tagged message is `[type byte][int32 length][payload]`, where the length
//! counts itself and the payload but not the type byte. Startup-class
//! messages omit the type byte. All integers are big-endian and all strings
//! are null-terminated.

pub mod backend;
pub mod builder;
pub mod codec;
pub mod frontend;
pub mod types;

// Re-export commonly used types
pub use backend::{BackendMessage, RawMessage};
pub use builder::{MessageBuilder, SizeSlot};
pub use types::{FormatCode, Oid, TransactionStatus};
