//! Outbound framing: lengths, batching and startup encoding.

use zero_postgres_wire::protocol::codec::{read_cstr, read_i32, split_frame};
use zero_postgres_wire::protocol::frontend::startup::PROTOCOL_VERSION_3_0;
use zero_postgres_wire::protocol::frontend::{
    StartupMessage, write_bind, write_describe_portal, write_execute, write_gssenc_request,
    write_parse, write_query, write_sync,
};
use zero_postgres_wire::{FormatCode, MessageBuilder};

/// Split a buffer into `(tag, declared length, payload)` frames.
fn frames(mut data: &[u8]) -> Vec<(u8, usize, Vec<u8>)> {
    let mut out = Vec::new();
    while !data.is_empty() {
        let (msg, rest) = split_frame(data)
            .expect("valid header")
            .expect("complete frame");
        let declared = data.len() - rest.len() - 1;
        out.push((msg.type_byte, declared, msg.payload.to_vec()));
        data = rest;
    }
    out
}

#[test]
fn closed_length_matches_payload_for_mixed_fields() {
    let mut buf = MessageBuilder::new();
    buf.start_message(b'd');
    buf.write_u8(7);
    buf.write_i16(-3);
    buf.write_u16(65535);
    buf.write_i32(i32::MIN);
    buf.write_u32(0);
    buf.write_i64(i64::MAX);
    buf.write_u64(1);
    buf.write_cstr("text");
    buf.write_bytes(&[1, 2, 3]);
    let bytes = buf.finish();

    let declared = i32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
    assert_eq!(declared, 4 + 1 + 2 + 2 + 4 + 4 + 8 + 8 + 5 + 3);
    assert_eq!(declared, bytes.len() - 1);
}

#[test]
fn consecutive_messages_split_into_valid_frames() {
    let mut buf = MessageBuilder::new();
    buf.start_message(b'Q');
    buf.write_cstr("BEGIN");
    // no explicit close: starting the next message finalizes this one
    buf.start_message(b'Q');
    buf.write_cstr("COMMIT");

    let parsed = frames(buf.finish());
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].0, b'Q');
    assert_eq!(parsed[0].2, b"BEGIN\0");
    assert_eq!(parsed[1].0, b'Q');
    assert_eq!(parsed[1].2, b"COMMIT\0");
    for (_, declared, payload) in &parsed {
        assert_eq!(*declared, payload.len() + 4);
    }
}

#[test]
fn extended_query_batch() {
    let mut buf = MessageBuilder::with_capacity(256);
    write_parse(&mut buf, "", "SELECT $1::int4, $2::text", &[23, 25]).unwrap();
    write_bind(
        &mut buf,
        "",
        "",
        &[FormatCode::Binary, FormatCode::Text],
        &[Some(&300_i32.to_be_bytes()[..]), None],
        &[FormatCode::Binary],
    )
    .unwrap();
    write_describe_portal(&mut buf, "");
    write_execute(&mut buf, "", 0);
    write_sync(&mut buf);

    let parsed = frames(buf.finish());
    let tags: Vec<u8> = parsed.iter().map(|f| f.0).collect();
    assert_eq!(tags, b"PBDES");

    // The NULL parameter's size slot holds -1 while no value bytes follow it,
    // so declared and written sizes differ on purpose.
    let bind = &parsed[1].2;
    assert_eq!(
        bind.as_slice(),
        &[
            0, 0, // portal, statement
            0, 2, 0, 1, 0, 0, // parameter formats
            0, 2, // parameter count
            0, 0, 0, 4, 0, 0, 0x01, 0x2C, // $1 = 300
            0xFF, 0xFF, 0xFF, 0xFF, // $2 = NULL
            0, 1, 0, 1, // result formats
        ]
    );
}

#[test]
fn builder_is_reused_across_batches() {
    let mut buf = MessageBuilder::with_capacity(64);
    write_query(&mut buf, "SELECT 1");
    let first = buf.finish().to_vec();
    let capacity = buf.capacity();

    buf.clear();
    write_query(&mut buf, "SELECT 1");
    assert_eq!(buf.finish(), first.as_slice());
    assert_eq!(buf.capacity(), capacity);
}

#[test]
fn big_endian_integer_widths() {
    let cases: [(i64, &[u8]); 4] = [
        (0, &[0, 0]),
        (300, &[0x01, 0x2C]),
        (i64::from(i16::MAX), &[0x7F, 0xFF]),
        (-2, &[0xFF, 0xFE]),
    ];
    for (value, expected) in cases {
        let mut buf = MessageBuilder::new();
        buf.write_i16(value as i16);
        assert_eq!(buf.as_bytes(), expected, "i16 {value}");
    }

    let mut buf = MessageBuilder::new();
    buf.write_i32(300);
    buf.write_i32(-1);
    buf.write_u32(u32::MAX);
    buf.write_i64(300);
    assert_eq!(
        buf.as_bytes(),
        &[
            0x00, 0x00, 0x01, 0x2C, //
            0xFF, 0xFF, 0xFF, 0xFF, //
            0xFF, 0xFF, 0xFF, 0xFF, //
            0, 0, 0, 0, 0, 0, 0x01, 0x2C,
        ]
    );
}

#[test]
fn startup_message_layout() {
    let mut msg = StartupMessage::new();
    msg.set("user", "alice").set("database", "test");
    let bytes = msg.to_bytes();

    let (total, rest) = read_i32(&bytes).unwrap();
    assert_eq!(total as usize, bytes.len());

    let (version, mut rest) = read_i32(rest).unwrap();
    assert_eq!(version, 196608);
    assert_eq!(version, PROTOCOL_VERSION_3_0);

    let mut pairs = Vec::new();
    while rest.first() != Some(&0) {
        let (name, after_name) = read_cstr(rest).unwrap();
        let (value, after_value) = read_cstr(after_name).unwrap();
        pairs.push((name, value));
        rest = after_value;
    }
    pairs.sort();
    assert_eq!(pairs, [("database", "test"), ("user", "alice")]);
    // single trailing terminator
    assert_eq!(rest, &[0]);
}

#[test]
fn startup_class_requests_have_no_tag() {
    let mut buf = MessageBuilder::new();
    write_gssenc_request(&mut buf);
    assert_eq!(buf.finish(), &[0, 0, 0, 8, 0x04, 0xD2, 0x16, 0x30]);
}
