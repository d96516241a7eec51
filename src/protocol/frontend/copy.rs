//! COPY protocol frontend messages.

use crate::protocol::builder::MessageBuilder;

/// Write a CopyData message.
pub fn write_copy_data(buf: &mut MessageBuilder, data: &[u8]) {
    buf.start_message(super::msg_type::COPY_DATA);
    buf.write_bytes(data);
    buf.close_message();
}

/// Write a CopyDone message.
pub fn write_copy_done(buf: &mut MessageBuilder) {
    buf.start_message(super::msg_type::COPY_DONE);
    buf.close_message();
}

/// Write a CopyFail message.
///
/// The server aborts the COPY and reports `error_message` back in an ErrorResponse.
pub fn write_copy_fail(buf: &mut MessageBuilder, error_message: &str) {
    buf.start_message(super::msg_type::COPY_FAIL);
    buf.write_cstr(error_message);
    buf.close_message();
}
