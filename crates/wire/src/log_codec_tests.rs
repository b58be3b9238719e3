// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bytes::BytesMut;
use fxemu_core::{LogLevel, LogRecord};
use tokio_util::codec::Decoder;

use super::LogCodec;

fn record(r#type: &str, text: &str) -> LogRecord {
    LogRecord {
        level: LogLevel::Info,
        r#type: r#type.to_string(),
        text: text.to_string(),
        data: serde_json::json!({}),
    }
}

#[test]
fn decodes_one_complete_line() {
    let mut codec = LogCodec;
    let mut buf = BytesMut::from(
        r#"{"level":"INFO","type":"log","text":"hi","data":{}}
"#,
    );
    let decoded = codec.decode(&mut buf).expect("decode ok").expect("a record");
    assert_eq!(decoded, record("log", "hi"));
    assert!(buf.is_empty());
}

#[test]
fn buffers_partial_trailing_line_across_polls() {
    let mut codec = LogCodec;
    let mut buf = BytesMut::from(r#"{"level":"INFO","type":"log","#.as_bytes());
    assert!(codec.decode(&mut buf).expect("decode ok").is_none());

    buf.extend_from_slice(br#""text":"hi","data":{}}"#);
    buf.extend_from_slice(b"\n");
    let decoded = codec.decode(&mut buf).expect("decode ok").expect("a record");
    assert_eq!(decoded, record("log", "hi"));
}

#[test]
fn multiple_records_in_one_chunk_preserve_order() {
    let mut codec = LogCodec;
    let mut buf = BytesMut::from(
        "{\"level\":\"INFO\",\"type\":\"a\",\"text\":\"1\",\"data\":{}}\n\
         {\"level\":\"INFO\",\"type\":\"b\",\"text\":\"2\",\"data\":{}}\n",
    );

    let first = codec.decode(&mut buf).expect("decode ok").expect("a record");
    let second = codec.decode(&mut buf).expect("decode ok").expect("a record");
    assert_eq!(first, record("a", "1"));
    assert_eq!(second, record("b", "2"));
}

#[test]
fn unparseable_line_becomes_synthetic_system_record() {
    let mut codec = LogCodec;
    let mut buf = BytesMut::from("not json at all\n".as_bytes());
    let decoded = codec.decode(&mut buf).expect("decode ok").expect("a record");
    assert!(decoded.is_system("runtime-parse-error"));
    assert_eq!(decoded.text, "not json at all");
}

#[test]
fn blank_lines_are_skipped_without_emitting_records() {
    let mut codec = LogCodec;
    let mut buf = BytesMut::from(
        "\n\n{\"level\":\"INFO\",\"type\":\"log\",\"text\":\"hi\",\"data\":{}}\n".as_bytes(),
    );
    let decoded = codec.decode(&mut buf).expect("decode ok").expect("a record");
    assert_eq!(decoded, record("log", "hi"));
}

#[test]
fn decode_eof_flushes_line_missing_trailing_newline() {
    let mut codec = LogCodec;
    let mut buf = BytesMut::from(r#"{"level":"INFO","type":"log","text":"hi","data":{}}"#.as_bytes());
    let decoded = codec
        .decode_eof(&mut buf)
        .expect("decode ok")
        .expect("a record");
    assert_eq!(decoded, record("log", "hi"));
}

#[test]
fn decode_eof_on_empty_buffer_yields_none() {
    let mut codec = LogCodec;
    let mut buf = BytesMut::new();
    assert!(codec.decode_eof(&mut buf).expect("decode ok").is_none());
}
