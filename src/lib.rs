//! Sans-I/O codec for the PostgreSQL frontend/backend protocol (version 3).
//!
//! # Features
//!
//! - **Message builder**: batches length-prefixed frontend messages into one
//!   reusable buffer, with back-patched size fields
//! - **Zero-copy decoding**: backend payloads are parsed directly from the read buffer
//! - **Structured server errors**: ErrorResponse/NoticeResponse decode into [`ServerError`]
//! - **Sans-I/O handshake**: startup and authentication (cleartext, MD5,
//!   SCRAM-SHA-256) without touching a socket
//!
//! # Example
//!
//! ```
//! use zero_postgres_wire::protocol::frontend::{write_parse, write_sync};
//! use zero_postgres_wire::protocol::{BackendMessage, MessageBuilder, RawMessage};
//!
//! let mut buf = MessageBuilder::new();
//! write_parse(&mut buf, "", "SELECT $1::int4", &[23])?;
//! write_sync(&mut buf);
//! let bytes = buf.finish();
//! assert_eq!(bytes[0], b'P');
//!
//! let msg = RawMessage::new(b'E', b"SERROR\0C23505\0Mduplicate key\0\0");
//! match BackendMessage::parse(msg)? {
//!     BackendMessage::Error(err) => {
//!         assert_eq!(err.to_string(), "ERROR: duplicate key (SQLSTATE 23505)");
//!     }
//!     _ => unreachable!(),
//! }
//! # Ok::<(), zero_postgres_wire::Error>(())
//! ```

pub mod buffer_set;
pub mod error;
pub mod opts;
pub mod protocol;
pub mod state;

pub use buffer_set::BufferSet;
pub use error::{Error, Result, ServerError};
pub use opts::Opts;
pub use protocol::types::{FormatCode, Oid, TransactionStatus};
pub use protocol::{BackendMessage, MessageBuilder, RawMessage};
pub use state::{Action, AsyncMessage, ConnectionState, ConnectionStateMachine};
