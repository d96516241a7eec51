//! PostgreSQL wire protocol decoding primitives and inbound framing.
//!
//! PostgreSQL uses big-endian (network byte order) for all integers.
//! Every reader returns the decoded value together with the unread rest of
//! the input, and fails with [`Error::Protocol`] instead of reading past the
//! end of the buffer.

use zerocopy::byteorder::big_endian::{I16 as I16BE, I32 as I32BE, U16 as U16BE, U32 as U32BE};
use zerocopy::{FromBytes, Immutable, KnownLayout};

use crate::error::{Error, Result};
use crate::protocol::backend::RawMessage;

/// Read 1-byte unsigned integer.
#[inline]
pub fn read_u8(data: &[u8]) -> Result<(u8, &[u8])> {
    match data.split_first() {
        Some((&value, rest)) => Ok((value, rest)),
        None => Err(Error::Protocol("read_u8: empty buffer".into())),
    }
}

/// Read 2-byte big-endian signed integer.
#[inline]
pub fn read_i16(data: &[u8]) -> Result<(i16, &[u8])> {
    let (value, rest) = I16BE::ref_from_prefix(data).map_err(|_e| {
        Error::Protocol(format!("read_i16: buffer too short: {} < 2", data.len()))
    })?;
    Ok((value.get(), rest))
}

/// Read 2-byte big-endian unsigned integer.
#[inline]
pub fn read_u16(data: &[u8]) -> Result<(u16, &[u8])> {
    let (value, rest) = U16BE::ref_from_prefix(data).map_err(|_e| {
        Error::Protocol(format!("read_u16: buffer too short: {} < 2", data.len()))
    })?;
    Ok((value.get(), rest))
}

/// Read 4-byte big-endian signed integer.
#[inline]
pub fn read_i32(data: &[u8]) -> Result<(i32, &[u8])> {
    let (value, rest) = I32BE::ref_from_prefix(data).map_err(|_e| {
        Error::Protocol(format!("read_i32: buffer too short: {} < 4", data.len()))
    })?;
    Ok((value.get(), rest))
}

/// Read 4-byte big-endian unsigned integer.
#[inline]
pub fn read_u32(data: &[u8]) -> Result<(u32, &[u8])> {
    let (value, rest) = U32BE::ref_from_prefix(data).map_err(|_e| {
        Error::Protocol(format!("read_u32: buffer too short: {} < 4", data.len()))
    })?;
    Ok((value.get(), rest))
}

/// Read fixed-length bytes.
#[inline]
pub fn read_bytes(data: &[u8], len: usize) -> Result<(&[u8], &[u8])> {
    data.split_at_checked(len).ok_or_else(|| {
        Error::Protocol(format!(
            "read_bytes: buffer too short: {} < {}",
            data.len(),
            len
        ))
    })
}

/// Read null-terminated string (PostgreSQL String type).
/// Returns the string bytes (without the null terminator) and remaining data.
#[inline]
pub fn read_cstring(data: &[u8]) -> Result<(&[u8], &[u8])> {
    match memchr::memchr(0, data) {
        Some(pos) => {
            let (bytes, rest) = data.split_at(pos);
            Ok((bytes, rest.get(1..).unwrap_or_default()))
        }
        None => Err(Error::Protocol(
            "read_cstring: no null terminator found".into(),
        )),
    }
}

/// Read null-terminated string as &str.
#[inline]
pub fn read_cstr(data: &[u8]) -> Result<(&str, &[u8])> {
    let (bytes, rest) = read_cstring(data)?;
    let s = simdutf8::compat::from_utf8(bytes)
        .map_err(|e| Error::Protocol(format!("read_cstr: invalid UTF-8: {e}")))?;
    Ok((s, rest))
}

/// Header of a tagged message: type byte followed by the length field.
///
/// The length counts itself and the payload, but not the type byte.
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
#[repr(C, packed)]
pub struct FrameHeader {
    /// Message type byte
    pub type_byte: u8,
    /// Length of the length field plus payload
    pub length: U32BE,
}

impl FrameHeader {
    /// Size of the header on the wire.
    pub const SIZE: usize = 5;

    /// Parse a frame header from the start of `data`.
    pub fn parse(data: &[u8]) -> Result<&Self> {
        let (header, _) = Self::ref_from_prefix(data).map_err(|_e| {
            Error::Protocol(format!(
                "frame header: buffer too short: {} < {}",
                data.len(),
                Self::SIZE
            ))
        })?;
        if header.length.get() < 4 {
            return Err(Error::Protocol(format!(
                "Invalid message length: {}",
                header.length.get()
            )));
        }
        Ok(header)
    }

    /// Number of payload bytes following the header.
    pub fn payload_len(&self) -> usize {
        self.length.get() as usize - 4
    }
}

/// Split one complete tagged message off the front of `data`.
///
/// Returns `Ok(None)` when `data` does not yet hold the whole frame.
pub fn split_frame(data: &[u8]) -> Result<Option<(RawMessage<'_>, &[u8])>> {
    if data.len() < FrameHeader::SIZE {
        return Ok(None);
    }
    let header = FrameHeader::parse(data)?;
    let type_byte = header.type_byte;
    let body = data.get(FrameHeader::SIZE..).unwrap_or_default();
    match body.split_at_checked(header.payload_len()) {
        Some((payload, rest)) => Ok(Some((RawMessage::new(type_byte, payload), rest))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_integers_big_endian() {
        let data = [0x01, 0x2C, 0xFF, 0xFF, 0xFF, 0xD6, 0x7F];
        let (a, rest) = read_u16(&data).unwrap();
        assert_eq!(a, 300);
        let (b, rest) = read_i32(rest).unwrap();
        assert_eq!(b, -42);
        assert_eq!(rest, &[0x7F]);
    }

    #[test]
    fn short_reads_are_protocol_errors() {
        assert!(matches!(read_u8(&[]), Err(Error::Protocol(_))));
        assert!(matches!(read_i16(&[1]), Err(Error::Protocol(_))));
        assert!(matches!(read_u32(&[1, 2, 3]), Err(Error::Protocol(_))));
        assert!(matches!(read_bytes(&[1, 2], 3), Err(Error::Protocol(_))));
    }

    #[test]
    fn cstring_requires_terminator() {
        let (s, rest) = read_cstr(b"user\0alice\0").unwrap();
        assert_eq!(s, "user");
        assert_eq!(rest, b"alice\0");

        let (s, rest) = read_cstr(rest).unwrap();
        assert_eq!(s, "alice");
        assert!(rest.is_empty());

        assert!(matches!(read_cstring(b"truncated"), Err(Error::Protocol(_))));
    }

    #[test]
    fn cstr_rejects_invalid_utf8() {
        assert!(matches!(read_cstr(&[0xFF, 0xFE, 0]), Err(Error::Protocol(_))));
    }

    #[test]
    fn frame_header_rejects_short_length() {
        assert!(matches!(
            FrameHeader::parse(&[b'Z', 0, 0, 0, 3]),
            Err(Error::Protocol(_))
        ));
        let header = FrameHeader::parse(&[b'Z', 0, 0, 0, 5, b'I']).unwrap();
        assert_eq!(header.type_byte, b'Z');
        assert_eq!(header.payload_len(), 1);
    }

    #[test]
    fn split_frame_waits_for_complete_payload() {
        let frame = [b'Z', 0, 0, 0, 5, b'I', b'C'];
        assert!(split_frame(&frame[..4]).unwrap().is_none());
        assert!(split_frame(&frame[..5]).unwrap().is_none());

        let (msg, rest) = split_frame(&frame).unwrap().unwrap();
        assert_eq!(msg.type_byte, b'Z');
        assert_eq!(msg.payload, b"I");
        assert_eq!(rest, b"C");
    }
}
