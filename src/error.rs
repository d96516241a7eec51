//! Error types for zero-postgres-wire.

use thiserror::Error;

/// Result type for zero-postgres-wire operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error or notice reported by the server.
///
/// Decoded from the field-coded payload of an ErrorResponse or
/// NoticeResponse. See
/// <https://www.postgresql.org/docs/current/protocol-error-fields.html>.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{severity}: {message} (SQLSTATE {code})")]
pub struct ServerError {
    /// Severity: ERROR, FATAL, PANIC, WARNING, NOTICE, DEBUG, INFO, LOG (may be localized)
    pub severity: String,
    /// Non-localized severity (PostgreSQL 9.6+)
    pub severity_non_localized: Option<String>,
    /// SQLSTATE error code (5 characters)
    pub code: String,
    /// Primary error message
    pub message: String,
    /// Detailed error explanation
    pub detail: Option<String>,
    /// Suggestion for fixing the error
    pub hint: Option<String>,
    /// Cursor position in the original query string (1-based, in characters)
    pub position: Option<u32>,
    /// Cursor position in an internally generated command
    pub internal_position: Option<u32>,
    /// Text of the failed internally generated command
    pub internal_query: Option<String>,
    /// Context/stack trace
    pub where_: Option<String>,
    /// Schema name
    pub schema: Option<String>,
    /// Table name
    pub table: Option<String>,
    /// Column name
    pub column: Option<String>,
    /// Data type name
    pub data_type: Option<String>,
    /// Constraint name
    pub constraint: Option<String>,
    /// Source file name
    pub file: Option<String>,
    /// Source line number
    pub line: Option<u32>,
    /// Source routine name
    pub routine: Option<String>,
}

impl ServerError {
    /// Severity, preferring the non-localized form when the server sent one.
    pub fn severity(&self) -> &str {
        self.severity_non_localized
            .as_deref()
            .unwrap_or(&self.severity)
    }

    /// Returns true for FATAL and PANIC, after which the server closes the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self.severity(), "FATAL" | "PANIC")
    }
}

/// Error type for zero-postgres-wire.
#[derive(Debug, Error)]
pub enum Error {
    /// Server error response
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Protocol error (malformed message, bad frame length, unexpected response)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Invalid usage (e.g., malformed connection URL)
    #[error("Invalid usage: {0}")]
    InvalidUsage(String),

    /// Unsupported feature
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Returns true if the error indicates the connection is broken and cannot be reused.
    ///
    /// A protocol error means the stream is out of sync, so it is always fatal.
    pub fn is_connection_broken(&self) -> bool {
        match self {
            Error::Io(_) | Error::Protocol(_) => true,
            Error::Server(fields) => fields.is_fatal(),
            _ => false,
        }
    }

    /// Get the SQLSTATE code if this is a server error.
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Error::Server(fields) => Some(fields.code.as_str()),
            _ => None,
        }
    }
}

impl<Src: core::fmt::Debug, Dst: core::fmt::Debug + ?Sized>
    From<zerocopy::error::CastError<Src, Dst>> for Error
{
    fn from(err: zerocopy::error::CastError<Src, Dst>) -> Self {
        Error::Protocol(format!("zerocopy cast error: {err:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_violation() -> ServerError {
        ServerError {
            severity: "ERROR".into(),
            code: "23505".into(),
            message: "duplicate key value violates unique constraint \"users_pkey\"".into(),
            ..Default::default()
        }
    }

    #[test]
    fn server_error_display() {
        assert_eq!(
            unique_violation().to_string(),
            "ERROR: duplicate key value violates unique constraint \"users_pkey\" (SQLSTATE 23505)"
        );
    }

    #[test]
    fn server_variant_is_transparent() {
        let err = Error::from(unique_violation());
        assert_eq!(err.to_string(), unique_violation().to_string());
        assert_eq!(err.sqlstate(), Some("23505"));
        assert!(!err.is_connection_broken());
    }

    #[test]
    fn protocol_error_is_distinguishable() {
        let err = Error::Protocol("read_cstring: no null terminator found".into());
        assert!(err.to_string().starts_with("Protocol error: "));
        assert_eq!(err.sqlstate(), None);
        assert!(err.is_connection_broken());
    }

    #[test]
    fn fatal_severity_breaks_connection() {
        let fatal = ServerError {
            severity: "FATAL".into(),
            code: "28P01".into(),
            message: "password authentication failed for user \"alice\"".into(),
            ..Default::default()
        };
        assert!(fatal.is_fatal());
        assert!(Error::Server(fatal).is_connection_broken());

        let localized = ServerError {
            severity: "FATAL".into(),
            severity_non_localized: Some("FATAL".into()),
            ..Default::default()
        };
        assert_eq!(localized.severity(), "FATAL");
    }
}
