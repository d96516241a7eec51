//! Error and notice response messages.
//!
//! Both carry the same payload: a sequence of `[field code][cstring]`
//! entries terminated by a zero byte.

use crate::error::{Error, Result, ServerError};
use crate::protocol::codec::{read_cstring, read_u8};

/// Error field type codes from PostgreSQL protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorField {
    /// Severity (localized)
    Severity = b'S',
    /// Severity (non-localized, PostgreSQL 9.6+)
    SeverityNonLocalized = b'V',
    /// SQLSTATE code
    Code = b'C',
    /// Message
    Message = b'M',
    /// Detail
    Detail = b'D',
    /// Hint
    Hint = b'H',
    /// Position in query
    Position = b'P',
    /// Internal position
    InternalPosition = b'p',
    /// Internal query
    InternalQuery = b'q',
    /// Where (context)
    Where = b'W',
    /// Schema name
    Schema = b's',
    /// Table name
    Table = b't',
    /// Column name
    Column = b'c',
    /// Data type name
    DataType = b'd',
    /// Constraint name
    Constraint = b'n',
    /// File name
    File = b'F',
    /// Line number
    Line = b'L',
    /// Routine name
    Routine = b'R',
}

impl ErrorField {
    /// Map a field code byte to a known field.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            b'S' => ErrorField::Severity,
            b'V' => ErrorField::SeverityNonLocalized,
            b'C' => ErrorField::Code,
            b'M' => ErrorField::Message,
            b'D' => ErrorField::Detail,
            b'H' => ErrorField::Hint,
            b'P' => ErrorField::Position,
            b'p' => ErrorField::InternalPosition,
            b'q' => ErrorField::InternalQuery,
            b'W' => ErrorField::Where,
            b's' => ErrorField::Schema,
            b't' => ErrorField::Table,
            b'c' => ErrorField::Column,
            b'd' => ErrorField::DataType,
            b'n' => ErrorField::Constraint,
            b'F' => ErrorField::File,
            b'L' => ErrorField::Line,
            b'R' => ErrorField::Routine,
            _ => return None,
        })
    }
}

fn parse_number(field: ErrorField, value: &str) -> Result<u32> {
    value.parse().map_err(|e| {
        Error::Protocol(format!("error field {field:?}: invalid number {value:?}: {e}"))
    })
}

/// Parse error/notice fields from payload.
///
/// Unknown field codes are skipped. Bytes after the terminator are not inspected.
/// Text that is not valid UTF-8 is decoded lossily: errors raised before
/// `client_encoding` takes effect arrive in the server's own encoding.
pub fn parse_fields(payload: &[u8]) -> Result<ServerError> {
    let mut fields = ServerError::default();
    let mut data = payload;

    loop {
        let (code, rest) = read_u8(data)?;
        if code == 0 {
            break;
        }
        let (raw, rest) = read_cstring(rest)?;
        data = rest;

        let Some(field) = ErrorField::from_code(code) else {
            tracing::debug!("Unknown error field type: {}", code as char);
            continue;
        };

        let value = String::from_utf8_lossy(raw);
        match field {
            ErrorField::Severity => fields.severity = value.into_owned(),
            ErrorField::SeverityNonLocalized => {
                fields.severity_non_localized = Some(value.into_owned())
            }
            ErrorField::Code => fields.code = value.into_owned(),
            ErrorField::Message => fields.message = value.into_owned(),
            ErrorField::Detail => fields.detail = Some(value.into_owned()),
            ErrorField::Hint => fields.hint = Some(value.into_owned()),
            ErrorField::Position => fields.position = Some(parse_number(field, &value)?),
            ErrorField::InternalPosition => {
                fields.internal_position = Some(parse_number(field, &value)?)
            }
            ErrorField::InternalQuery => fields.internal_query = Some(value.into_owned()),
            ErrorField::Where => fields.where_ = Some(value.into_owned()),
            ErrorField::Schema => fields.schema = Some(value.into_owned()),
            ErrorField::Table => fields.table = Some(value.into_owned()),
            ErrorField::Column => fields.column = Some(value.into_owned()),
            ErrorField::DataType => fields.data_type = Some(value.into_owned()),
            ErrorField::Constraint => fields.constraint = Some(value.into_owned()),
            ErrorField::File => fields.file = Some(value.into_owned()),
            ErrorField::Line => fields.line = Some(parse_number(field, &value)?),
            ErrorField::Routine => fields.routine = Some(value.into_owned()),
        }
    }

    Ok(fields)
}

/// ErrorResponse message - the current command failed.
#[derive(Debug, Clone)]
pub struct ErrorResponse(pub ServerError);

impl ErrorResponse {
    /// Parse an ErrorResponse message from payload bytes.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        Ok(Self(parse_fields(payload)?))
    }

    /// Convert to an Error.
    pub fn into_error(self) -> Error {
        Error::Server(self.0)
    }
}

/// NoticeResponse message - non-fatal warning/info from server.
#[derive(Debug, Clone)]
pub struct NoticeResponse(pub ServerError);

impl NoticeResponse {
    /// Parse a NoticeResponse message from payload bytes.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        Ok(Self(parse_fields(payload)?))
    }
}
