//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use std::time::Duration;

use tokio::time::timeout as tokio_timeout;

use crate::connection::Connection;
use crate::error::{Result, SessionError};
use crate::handler::SessionHandler;

const REPLACEMENT_CHAR: char = '\u{fffd}';

fn utf8_sequence_len(lead: u8) -> usize {
    if lead & 0x80 == 0 {
        1
    } else if lead & 0xe0 == 0xc0 {
        2
    } else if lead & 0xf0 == 0xe0 {
        3
    } else if lead & 0xf8 == 0xf0 {
        4
    } else {
        1
    }
}

/// Decode the next UTF-8 code point from the connection's byte stream.
/// Invalid sequences map to U+FFFD rather than failing the session.
/// Returns `None` at EOF.
async fn read_character(conn: &mut Connection, read_timeout: Option<Duration>) -> Result<Option<char>> {
    let first = read_one_byte(conn, read_timeout).await?;
    let Some(lead) = first else {
        return Ok(None);
    };

    let want = utf8_sequence_len(lead);
    let mut bytes = vec![lead];
    for _ in 1..want {
        match read_one_byte(conn, read_timeout).await? {
            Some(b) => bytes.push(b),
            None => break,
        }
    }

    Ok(Some(
        std::str::from_utf8(&bytes)
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or(REPLACEMENT_CHAR),
    ))
}

async fn read_one_byte(conn: &mut Connection, read_timeout: Option<Duration>) -> Result<Option<u8>> {
    let bytes = match read_timeout {
        Some(d) => match tokio_timeout(d, conn.reader_mut().read(Some(1))).await {
            Ok(r) => r?,
            Err(_) => return Err(SessionError::Timeout),
        },
        None => conn.reader_mut().read(Some(1)).await?,
    };
    Ok(bytes.first().copied())
}

/// Drive a character-at-a-time session: welcome, then read one UTF-8 code
/// point at a time and hand it to [`SessionHandler::process_character`]
/// until it (or EOF) ends the session.
pub async fn run_character_session(
    conn: &mut Connection,
    handler: &mut dyn SessionHandler,
    read_timeout: Option<Duration>,
) -> Result<()> {
    handler.on_connect(conn).await;
    handler.send_welcome(conn, "Welcome to Character Mode").await?;

    while conn.running {
        let c = match read_character(conn, read_timeout).await {
            Ok(Some(c)) => c,
            Ok(None) => break,
            Err(SessionError::Timeout) => continue,
            Err(e) => return Err(e),
        };
        if !handler.process_character(conn, c).await? {
            break;
        }
    }

    handler.on_disconnect(conn).await;
    conn.cleanup().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use telehub_transport::testutil::{FixtureReader, RecordingWriter};

    struct Echo;
    #[async_trait::async_trait]
    impl SessionHandler for Echo {}

    #[tokio::test]
    async fn ctrl_c_ends_session() {
        let reader = Box::new(FixtureReader::new(vec![0x03]));
        let writer = Box::new(RecordingWriter::default());
        let mut conn = Connection::new(reader, writer, "peer:1");
        let mut handler = Echo;

        run_character_session(&mut conn, &mut handler, None).await.unwrap();
        assert!(conn.session_ended);
    }

    #[tokio::test]
    async fn backspace_pops_current_command() {
        let mut conn = Connection::new(
            Box::new(FixtureReader::new(b"ab\x7f".to_vec())),
            Box::new(RecordingWriter::default()),
            "peer:1",
        );
        let mut handler = Echo;
        handler.on_connect(&mut conn).await;
        handler.send_welcome(&mut conn, "").await.unwrap();

        for _ in 0..3 {
            let c = read_character(&mut conn, None).await.unwrap().unwrap();
            handler.process_character(&mut conn, c).await.unwrap();
        }
        assert_eq!(conn.current_command, "a");
    }

    #[tokio::test]
    async fn exit_keyword_via_enter() {
        let mut conn = Connection::new(
            Box::new(FixtureReader::new(b"quit\r".to_vec())),
            Box::new(RecordingWriter::default()),
            "peer:1",
        );
        let mut handler = Echo;
        loop {
            let c = match read_character(&mut conn, None).await.unwrap() {
                Some(c) => c,
                None => break,
            };
            if !handler.process_character(&mut conn, c).await.unwrap() {
                break;
            }
        }
        assert!(conn.session_ended);
    }
}
