//! Extended query protocol messages.

use crate::error::{Error, Result};
use crate::protocol::builder::MessageBuilder;
use crate::protocol::types::{FormatCode, Oid};

/// Count prefix for a list; the server reads these as 16-bit unsigned.
fn list_len(what: &str, len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_overflow| {
        Error::InvalidUsage(format!("{len} {what} exceed the protocol limit of {}", u16::MAX))
    })
}

/// Write a Parse message to create a prepared statement.
///
/// - `name`: Statement name (empty string for unnamed statement)
/// - `query`: SQL query with $1, $2, ... placeholders
/// - `param_oids`: Parameter type OIDs (0 = let server infer)
///
/// Fails with `InvalidUsage`, writing nothing, when there are more than 65535 OIDs.
pub fn write_parse(
    buf: &mut MessageBuilder,
    name: &str,
    query: &str,
    param_oids: &[Oid],
) -> Result<()> {
    let count = list_len("parameter types", param_oids.len())?;

    buf.start_message(super::msg_type::PARSE);
    buf.write_cstr(name);
    buf.write_cstr(query);
    buf.write_u16(count);
    for &oid in param_oids {
        buf.write_u32(oid);
    }
    buf.close_message();
    Ok(())
}

/// Write a Bind message to create a portal from a prepared statement.
///
/// - `portal`: Portal name (empty string for unnamed portal)
/// - `statement`: Statement name
/// - `param_formats`: Format codes for parameters (empty = all text, one = applies to all)
/// - `params`: Already-encoded parameter values, `None` for NULL
/// - `result_formats`: Format codes for results
///
/// Fails with `InvalidUsage`, writing nothing, when any list is longer than
/// 65535 entries or a value is larger than `i32::MAX` bytes.
pub fn write_bind(
    buf: &mut MessageBuilder,
    portal: &str,
    statement: &str,
    param_formats: &[FormatCode],
    params: &[Option<&[u8]>],
    result_formats: &[FormatCode],
) -> Result<()> {
    let format_count = list_len("parameter formats", param_formats.len())?;
    let param_count = list_len("parameters", params.len())?;
    let result_count = list_len("result formats", result_formats.len())?;
    if let Some(value) = params.iter().flatten().find(|v| i32::try_from(v.len()).is_err()) {
        return Err(Error::InvalidUsage(format!(
            "parameter value of {} bytes is too large",
            value.len()
        )));
    }

    buf.start_message(super::msg_type::BIND);

    buf.write_cstr(portal);
    buf.write_cstr(statement);

    buf.write_u16(format_count);
    for &fmt in param_formats {
        buf.write_u16(fmt.code());
    }

    // Parameter values: each is a length-prefixed value, or length -1 for NULL
    buf.write_u16(param_count);
    for param in params {
        let slot = buf.reserve_size();
        match param {
            Some(value) => {
                buf.write_bytes(value);
                buf.set_computed_size(slot);
            }
            None => buf.set_size(slot, -1),
        }
    }

    buf.write_u16(result_count);
    for &fmt in result_formats {
        buf.write_u16(fmt.code());
    }

    buf.close_message();
    Ok(())
}

/// Write an Execute message to run a portal.
///
/// - `portal`: Portal name
/// - `max_rows`: Maximum number of rows to return (0 = unlimited)
pub fn write_execute(buf: &mut MessageBuilder, portal: &str, max_rows: u32) {
    buf.start_message(super::msg_type::EXECUTE);
    buf.write_cstr(portal);
    buf.write_u32(max_rows);
    buf.close_message();
}

/// Write a Describe message to get metadata.
///
/// - `describe_type`: 'S' for statement, 'P' for portal
/// - `name`: Statement or portal name
pub fn write_describe(buf: &mut MessageBuilder, describe_type: u8, name: &str) {
    buf.start_message(super::msg_type::DESCRIBE);
    buf.write_u8(describe_type);
    buf.write_cstr(name);
    buf.close_message();
}

/// Write a Describe message for a statement.
pub fn write_describe_statement(buf: &mut MessageBuilder, name: &str) {
    write_describe(buf, b'S', name);
}

/// Write a Describe message for a portal.
pub fn write_describe_portal(buf: &mut MessageBuilder, name: &str) {
    write_describe(buf, b'P', name);
}

/// Write a Close message to release a statement or portal.
///
/// - `close_type`: 'S' for statement, 'P' for portal
/// - `name`: Statement or portal name
pub fn write_close(buf: &mut MessageBuilder, close_type: u8, name: &str) {
    buf.start_message(super::msg_type::CLOSE);
    buf.write_u8(close_type);
    buf.write_cstr(name);
    buf.close_message();
}

/// Write a Close message for a statement.
pub fn write_close_statement(buf: &mut MessageBuilder, name: &str) {
    write_close(buf, b'S', name);
}

/// Write a Close message for a portal.
pub fn write_close_portal(buf: &mut MessageBuilder, name: &str) {
    write_close(buf, b'P', name);
}

/// Write a Sync message.
///
/// This ends an extended query sequence and causes:
/// - Implicit COMMIT if successful and not in explicit transaction
/// - Implicit ROLLBACK if failed and not in explicit transaction
/// - Server responds with ReadyForQuery
pub fn write_sync(buf: &mut MessageBuilder) {
    buf.start_message(super::msg_type::SYNC);
    buf.close_message();
}

/// Write a Flush message.
///
/// Forces the server to send all pending responses without waiting for Sync.
pub fn write_flush(buf: &mut MessageBuilder) {
    buf.start_message(super::msg_type::FLUSH);
    buf.close_message();
}
