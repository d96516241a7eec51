//! Outbound message builder.
//!
//! PostgreSQL message format:
//! - Type byte (1 byte) - NOT included in length
//! - Length (4 bytes) - includes itself
//! - Payload (Length - 4 bytes)
//!
//! A [`MessageBuilder`] owns one contiguous buffer and can hold any number of
//! messages back to back. At most one message is open at a time: starting a
//! new message closes the previous one, and [`MessageBuilder::finish`] closes
//! the last one before the bytes are handed to the transport.

/// Position of a 4-byte size field reserved with [`MessageBuilder::reserve_size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSlot(usize);

impl SizeSlot {
    /// Byte offset of the slot within the buffer.
    pub fn offset(self) -> usize {
        self.0
    }
}

/// Reusable, growable accumulator of length-prefixed frontend messages.
#[derive(Debug, Default, Clone)]
pub struct MessageBuilder {
    buf: Vec<u8>,
    /// Offset of the length field of the currently open message.
    length_at: Option<usize>,
}

impl MessageBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty builder with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            length_at: None,
        }
    }

    /// Start a message with a type byte, closing any message still open.
    pub fn start_message(&mut self, type_byte: u8) {
        self.close_message();
        self.buf.push(type_byte);
        self.open_length();
    }

    /// Start a startup-class message (no type byte), closing any message still open.
    pub fn start_untagged_message(&mut self) {
        self.close_message();
        self.open_length();
    }

    fn open_length(&mut self) {
        self.length_at = Some(self.buf.len());
        self.buf.extend_from_slice(&[0, 0, 0, 0]);
    }

    /// Fill in the length field of the open message.
    ///
    /// The length runs from the start of the length field to the end of the
    /// buffer. Does nothing if no message is open.
    pub fn close_message(&mut self) {
        if let Some(at) = self.length_at.take() {
            let len = (self.buf.len() - at) as u32;
            self.patch(at, len.to_be_bytes());
        }
    }

    /// Returns true if a message has been started but not yet closed.
    pub fn is_message_open(&self) -> bool {
        self.length_at.is_some()
    }

    /// Reserve a 4-byte size field inside the current payload.
    ///
    /// Fill it later with [`set_computed_size`](Self::set_computed_size) or
    /// [`set_size`](Self::set_size).
    pub fn reserve_size(&mut self) -> SizeSlot {
        let slot = SizeSlot(self.buf.len());
        self.buf.extend_from_slice(&[0, 0, 0, 0]);
        slot
    }

    /// Fill a reserved slot with the number of bytes written after it.
    ///
    /// Unlike the message length, this count excludes the slot itself.
    pub fn set_computed_size(&mut self, slot: SizeSlot) {
        let size = (self.buf.len() - slot.0 - 4) as u32;
        self.patch(slot.0, size.to_be_bytes());
    }

    /// Fill a reserved slot with an explicit value.
    ///
    /// The value need not match the bytes written after the slot; a NULL
    /// Bind parameter, for example, declares `-1` and writes nothing.
    pub fn set_size(&mut self, slot: SizeSlot, size: i32) {
        self.patch(slot.0, size.to_be_bytes());
    }

    fn patch(&mut self, at: usize, bytes: [u8; 4]) {
        debug_assert!(at + 4 <= self.buf.len(), "size slot {at} outside buffer");
        if let Some(dst) = self.buf.get_mut(at..at + 4) {
            dst.copy_from_slice(&bytes);
        }
    }

    /// Write a u8.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Write an i16.
    #[inline]
    pub fn write_i16(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a u16.
    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write an i32.
    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a u32.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write an i64.
    #[inline]
    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a u64.
    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Write null-terminated string (PostgreSQL String type).
    ///
    /// `s` must not contain a zero byte.
    #[inline]
    pub fn write_cstring(&mut self, s: &[u8]) {
        debug_assert!(!s.contains(&0), "embedded NUL in cstring");
        self.buf.extend_from_slice(s);
        self.buf.push(0);
    }

    /// Write null-terminated string from &str.
    #[inline]
    pub fn write_cstr(&mut self, s: &str) {
        self.write_cstring(s.as_bytes());
    }

    /// Close the open message and return every byte written so far.
    pub fn finish(&mut self) -> &[u8] {
        self.close_message();
        &self.buf
    }

    /// Bytes written so far. The open message, if any, still has a zero length.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Close the open message and take the buffer.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.close_message();
        self.buf
    }

    /// Number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Allocated capacity of the underlying buffer.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Discard all bytes, keeping the allocation for the next batch.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.length_at = None;
    }
}

impl std::io::Write for MessageBuilder {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.write_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
