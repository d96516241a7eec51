//! Simple query protocol messages.

use crate::protocol::builder::MessageBuilder;

/// Write a Query message.
///
/// The query string may contain multiple SQL statements separated by semicolons.
pub fn write_query(buf: &mut MessageBuilder, query: &str) {
    buf.start_message(super::msg_type::QUERY);
    buf.write_cstr(query);
    buf.close_message();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query() {
        let mut buf = MessageBuilder::new();
        write_query(&mut buf, "SELECT 1");
        let bytes = buf.finish();

        assert_eq!(bytes[0], b'Q');

        // Length should be 4 (length field) + 9 (query + null terminator)
        let len = i32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
        assert_eq!(len, 13);

        assert_eq!(&bytes[5..14], b"SELECT 1\0");
    }
}
