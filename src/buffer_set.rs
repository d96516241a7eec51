//! Connection-scoped buffers handed to the state machines.

use crate::error::{Error, Result};
use crate::protocol::backend::RawMessage;
use crate::protocol::builder::MessageBuilder;
use crate::protocol::codec::FrameHeader;

/// Largest payload [`BufferSet::prepare_read`] accepts unless configured otherwise.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1 << 30;

/// Buffer set for state machine operations.
///
/// One per connection. The transport reads a message into `type_byte` and
/// `read_buffer`, and after each step writes out `write_buffer` and clears it.
#[derive(Debug)]
pub struct BufferSet {
    /// Payload of the last message read (without type byte and length)
    pub read_buffer: Vec<u8>,
    /// Outgoing messages
    pub write_buffer: MessageBuilder,
    /// Type byte of the last message read
    pub type_byte: u8,
    max_message_size: usize,
}

impl BufferSet {
    /// Create a new buffer set.
    pub fn new() -> Self {
        Self::with_max_message_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Create a buffer set that refuses inbound payloads larger than `limit` bytes.
    pub fn with_max_message_size(limit: usize) -> Self {
        Self {
            read_buffer: Vec::with_capacity(8192),
            write_buffer: MessageBuilder::with_capacity(8192),
            type_byte: 0,
            max_message_size: limit,
        }
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Store an inbound frame's header and reserve its payload in `read_buffer`.
    ///
    /// Returns the payload slice for the transport to fill. A declared length
    /// over the configured maximum fails before anything is allocated.
    pub fn prepare_read(&mut self, header: &[u8; FrameHeader::SIZE]) -> Result<&mut [u8]> {
        let header = FrameHeader::parse(header)?;
        if header.payload_len() > self.max_message_size {
            return Err(Error::Protocol(format!(
                "message '{}' declares {} payload bytes, limit is {}",
                header.type_byte as char,
                header.payload_len(),
                self.max_message_size
            )));
        }
        self.type_byte = header.type_byte;
        self.read_buffer.clear();
        self.read_buffer.resize(header.payload_len(), 0);
        Ok(&mut self.read_buffer)
    }

    /// Copy a complete message into the read side.
    pub fn set_message(&mut self, msg: RawMessage<'_>) {
        self.type_byte = msg.type_byte;
        self.read_buffer.clear();
        self.read_buffer.extend_from_slice(msg.payload);
    }

    /// The last message read.
    pub fn message(&self) -> RawMessage<'_> {
        RawMessage::new(self.type_byte, &self.read_buffer)
    }
}

impl Default for BufferSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_read_sizes_payload() {
        let mut buffer_set = BufferSet::new();
        let payload = buffer_set.prepare_read(&[b'Z', 0, 0, 0, 5]).unwrap();
        assert_eq!(payload.len(), 1);
        payload[0] = b'I';

        let msg = buffer_set.message();
        assert_eq!(msg.type_byte, b'Z');
        assert_eq!(msg.payload, b"I");
    }

    #[test]
    fn prepare_read_rejects_bad_length() {
        let mut buffer_set = BufferSet::new();
        assert!(matches!(
            buffer_set.prepare_read(&[b'Z', 0, 0, 0, 2]),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn prepare_read_enforces_size_limit() {
        let mut buffer_set = BufferSet::with_max_message_size(16);
        assert_eq!(buffer_set.prepare_read(&[b'D', 0, 0, 0, 20]).unwrap().len(), 16);

        // declared length near 4 GiB
        assert!(matches!(
            buffer_set.prepare_read(&[b'D', 0xFF, 0xFF, 0xFF, 0xF0]),
            Err(Error::Protocol(_))
        ));
        assert!(buffer_set.read_buffer.capacity() < 1024 * 1024);
        assert_eq!(BufferSet::new().max_message_size(), DEFAULT_MAX_MESSAGE_SIZE);
    }
}
