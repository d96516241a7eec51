//! PostgreSQL frontend (client → server) messages.
//!
//! Every writer appends one complete message to a [`MessageBuilder`], so
//! several calls can be batched into a single write to the transport.
//!
//! [`MessageBuilder`]: crate::protocol::builder::MessageBuilder

pub mod auth;
pub mod copy;
pub mod extended;
pub mod simple;
pub mod startup;

pub use auth::{write_password, write_sasl_initial_response, write_sasl_response};
pub use copy::{write_copy_data, write_copy_done, write_copy_fail};
pub use extended::{
    write_bind, write_close_portal, write_close_statement, write_describe_portal,
    write_describe_statement, write_execute, write_flush, write_parse, write_sync,
};
pub use simple::write_query;
pub use startup::{
    StartupMessage, write_cancel_request, write_gssenc_request, write_ssl_request, write_startup,
    write_terminate,
};

/// Type bytes of tagged frontend messages.
///
/// Startup-class messages (StartupMessage, SSLRequest, GSSENCRequest,
/// CancelRequest) have no type byte and are not listed.
pub mod msg_type {
    // authentication: PasswordMessage, SASLInitialResponse and SASLResponse share one tag
    pub const PASSWORD: u8 = b'p';

    pub const QUERY: u8 = b'Q';

    // extended query
    pub const PARSE: u8 = b'P';
    pub const BIND: u8 = b'B';
    pub const EXECUTE: u8 = b'E';
    pub const DESCRIBE: u8 = b'D';
    pub const CLOSE: u8 = b'C';
    pub const SYNC: u8 = b'S';
    pub const FLUSH: u8 = b'H';

    // COPY FROM STDIN
    pub const COPY_DATA: u8 = b'd';
    pub const COPY_DONE: u8 = b'c';
    pub const COPY_FAIL: u8 = b'f';

    pub const TERMINATE: u8 = b'X';
}
