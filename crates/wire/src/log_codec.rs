// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decoder that turns a byte stream from one worker pipe into [`LogRecord`]s.

use std::io;

use bytes::{Buf, BytesMut};
use fxemu_core::LogRecord;
use tokio_util::codec::Decoder;

/// Splits a single pipe (stdout or stderr) on `\n` and parses each complete
/// line as a [`LogRecord`]. Partial trailing bytes stay in `tokio_util`'s
/// internal buffer across polls — nothing here blocks on a consumer.
///
/// A line that fails to parse does not error the stream: it is converted to
/// a synthetic `SYSTEM/runtime-parse-error` record so a bad line from a
/// worker never silently vanishes.
#[derive(Debug, Default)]
pub struct LogCodec;

impl Decoder for LogCodec {
    type Item = LogRecord;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(newline_at) = src.iter().position(|&b| b == b'\n') else {
                return Ok(None);
            };

            let mut line = src.split_to(newline_at);
            src.advance(1); // drop the newline itself
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }

            if line.is_empty() {
                continue; // blank lines between records carry no information
            }

            return Ok(Some(parse_line(&line)));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(record) = self.decode(src)? {
            return Ok(Some(record));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let line = src.split_to(src.len());
        Ok(Some(parse_line(&line)))
    }
}

fn parse_line(line: &[u8]) -> LogRecord {
    match serde_json::from_slice::<LogRecord>(line) {
        Ok(record) => record,
        Err(err) => {
            let text = String::from_utf8_lossy(line).into_owned();
            tracing::debug!(error = %err, line = %text, "failed to parse worker log line");
            LogRecord::parse_error(&text)
        }
    }
}

#[cfg(test)]
#[path = "log_codec_tests.rs"]
mod tests;
