//! Session-level messages: key data, parameter reports, notifications,
//! protocol negotiation and ReadyForQuery.

use crate::error::{Error, Result};
use crate::protocol::codec::{read_cstr, read_u8, read_u32};
use crate::protocol::types::TransactionStatus;

fn expect_end(message: &str, rest: &[u8]) -> Result<()> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(Error::Protocol(format!(
            "{message}: {} unexpected trailing bytes",
            rest.len()
        )))
    }
}

/// Cancellation key for the backend process serving this connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendKeyData {
    pub process_id: u32,
    pub secret_key: u32,
}

impl BackendKeyData {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let (process_id, rest) = read_u32(payload)?;
        let (secret_key, rest) = read_u32(rest)?;
        expect_end("BackendKeyData", rest)?;
        Ok(Self {
            process_id,
            secret_key,
        })
    }
}

/// Current value of a run-time parameter, sent at startup and whenever it changes.
#[derive(Debug, Clone)]
pub struct ParameterStatus<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

impl<'a> ParameterStatus<'a> {
    pub fn parse(payload: &'a [u8]) -> Result<Self> {
        let (name, rest) = read_cstr(payload)?;
        let (value, rest) = read_cstr(rest)?;
        expect_end("ParameterStatus", rest)?;
        Ok(Self { name, value })
    }
}

/// NOTIFY delivered on a channel this session listens to.
#[derive(Debug, Clone)]
pub struct NotificationResponse<'a> {
    /// Backend that raised the notification
    pub pid: u32,
    pub channel: &'a str,
    pub payload: &'a str,
}

impl<'a> NotificationResponse<'a> {
    pub fn parse(payload: &'a [u8]) -> Result<Self> {
        let (pid, rest) = read_u32(payload)?;
        let (channel, rest) = read_cstr(rest)?;
        let (text, _) = read_cstr(rest)?;
        Ok(Self {
            pid,
            channel,
            payload: text,
        })
    }
}

/// Sent instead of failing when the requested minor version or `_pq_.` options
/// are not supported.
#[derive(Debug, Clone)]
pub struct NegotiateProtocolVersion<'a> {
    pub newest_minor_version: u32,
    pub unrecognized_options: Vec<&'a str>,
}

impl<'a> NegotiateProtocolVersion<'a> {
    pub fn parse(payload: &'a [u8]) -> Result<Self> {
        let (newest_minor_version, rest) = read_u32(payload)?;
        let (count, mut rest) = read_u32(rest)?;

        // each option takes at least its terminator
        let mut unrecognized_options = Vec::with_capacity((count as usize).min(rest.len()));
        for _ in 0..count {
            let (option, after) = read_cstr(rest)?;
            unrecognized_options.push(option);
            rest = after;
        }

        Ok(Self {
            newest_minor_version,
            unrecognized_options,
        })
    }
}

/// Decode a ReadyForQuery payload: exactly one status indicator byte.
pub fn ready_for_query(payload: &[u8]) -> Result<TransactionStatus> {
    let (indicator, rest) = read_u8(payload)?;
    expect_end("ReadyForQuery", rest)?;
    TransactionStatus::try_from(indicator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_key_data() {
        let key = BackendKeyData::parse(&[0, 0, 0x10, 0x92, 0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        assert_eq!(key.process_id, 4242);
        assert_eq!(key.secret_key, 0xDEAD_BEEF);
        assert!(BackendKeyData::parse(&[0, 0, 0x10]).is_err());
        assert!(BackendKeyData::parse(&[0, 0, 0, 1, 0, 0, 0, 2, 3]).is_err());
    }

    #[test]
    fn ready_for_query_indicator() {
        assert_eq!(ready_for_query(b"T").unwrap(), TransactionStatus::InTransaction);
        assert!(ready_for_query(b"X").is_err());
        assert!(ready_for_query(b"").is_err());
        assert!(ready_for_query(b"II").is_err());
    }

    #[test]
    fn notification() {
        let n = NotificationResponse::parse(b"\0\0\x10\x92jobs\0{\"id\":1}\0").unwrap();
        assert_eq!(n.pid, 4242);
        assert_eq!(n.channel, "jobs");
        assert_eq!(n.payload, "{\"id\":1}");
    }

    #[test]
    fn parameter_status() {
        let p = ParameterStatus::parse(b"server_version\x0016.2\0").unwrap();
        assert_eq!((p.name, p.value), ("server_version", "16.2"));
    }

    #[test]
    fn negotiate_protocol_version() {
        let payload = b"\0\0\0\x02\0\0\0\x01_pq_.compression\0";
        let nego = NegotiateProtocolVersion::parse(payload).unwrap();
        assert_eq!(nego.newest_minor_version, 2);
        assert_eq!(nego.unrecognized_options, ["_pq_.compression"]);

        // count larger than the options present
        assert!(NegotiateProtocolVersion::parse(b"\0\0\0\x02\xff\xff\xff\xff").is_err());
    }
}
