//! Startup-class messages and Terminate.
//!
//! Startup-class messages carry no type byte: the leading 4-byte length
//! covers the whole message, and the next 4 bytes are a protocol version or
//! request code.

use crate::protocol::builder::MessageBuilder;

/// Pack a protocol version as sent in the StartupMessage.
pub const fn protocol_version(major: u16, minor: u16) -> i32 {
    ((major as i32) << 16) | minor as i32
}

/// Protocol version 3.0 (0x00030000)
pub const PROTOCOL_VERSION_3_0: i32 = protocol_version(3, 0);

/// Protocol version 3.2 (0x00030002)
pub const PROTOCOL_VERSION_3_2: i32 = protocol_version(3, 2);

/// SSL request code
pub const SSL_REQUEST_CODE: i32 = 80877103;

/// GSSAPI encryption request code
pub const GSSENC_REQUEST_CODE: i32 = 80877104;

/// Cancel request code
pub const CANCEL_REQUEST_CODE: i32 = 80877102;

/// Options sent in the StartupMessage.
///
/// Names are unique; setting an existing name replaces its value in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupMessage {
    version: i32,
    params: Vec<(String, String)>,
}

impl Default for StartupMessage {
    fn default() -> Self {
        Self::new()
    }
}

impl StartupMessage {
    /// Create an empty StartupMessage for protocol 3.0.
    pub fn new() -> Self {
        Self::with_version(PROTOCOL_VERSION_3_0)
    }

    /// Create an empty StartupMessage for a specific protocol version.
    pub fn with_version(version: i32) -> Self {
        Self {
            version,
            params: Vec::new(),
        }
    }

    /// Protocol version this message requests.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Set an option. Neither name nor value may contain a zero byte.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.params.push((name, value)),
        }
        self
    }

    /// Look up an option.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over `(name, value)` pairs.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Append the encoded message to `buf`.
    pub fn write(&self, buf: &mut MessageBuilder) {
        buf.start_untagged_message();
        buf.write_i32(self.version);
        for (name, value) in self.params() {
            buf.write_cstr(name);
            buf.write_cstr(value);
        }
        // Terminator
        buf.write_u8(0);
        buf.close_message();
    }

    /// Encode the message into a new buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = MessageBuilder::with_capacity(128);
        self.write(&mut buf);
        buf.into_bytes()
    }
}

/// Write an SSLRequest message.
///
/// This is sent before StartupMessage to request TLS encryption.
/// Server responds with single byte: 'S' (accepted) or 'N' (rejected).
pub fn write_ssl_request(buf: &mut MessageBuilder) {
    buf.start_untagged_message();
    buf.write_i32(SSL_REQUEST_CODE);
    buf.close_message();
}

/// Write a GSSENCRequest message.
///
/// This is sent before StartupMessage to request GSSAPI encryption.
/// Server responds with single byte: 'G' (accepted) or 'N' (rejected).
pub fn write_gssenc_request(buf: &mut MessageBuilder) {
    buf.start_untagged_message();
    buf.write_i32(GSSENC_REQUEST_CODE);
    buf.close_message();
}

/// Write a StartupMessage for protocol 3.0.
///
/// Parameters is a list of (name, value) pairs.
/// Required: "user" - database username
/// Optional: "database", "options", "replication", "client_encoding", etc.
pub fn write_startup(buf: &mut MessageBuilder, params: &[(&str, &str)]) {
    let mut msg = StartupMessage::new();
    for (name, value) in params {
        msg.set(*name, *value);
    }
    msg.write(buf);
}

/// Write a CancelRequest message.
///
/// This is sent on a NEW connection to cancel a query running on another connection.
/// The server closes the connection immediately with no response.
pub fn write_cancel_request(buf: &mut MessageBuilder, pid: u32, secret_key: u32) {
    buf.start_untagged_message();
    buf.write_i32(CANCEL_REQUEST_CODE);
    buf.write_u32(pid);
    buf.write_u32(secret_key);
    buf.close_message();
}

/// Write a Terminate message.
///
/// Sent to cleanly close the connection.
pub fn write_terminate(buf: &mut MessageBuilder) {
    buf.start_message(super::msg_type::TERMINATE);
    buf.close_message();
}
