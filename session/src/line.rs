//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use std::time::Duration;

use crate::connection::{is_exit_command, Connection};
use crate::error::Result;
use crate::handler::SessionHandler;

/// Drive a plain line-oriented session: welcome, then read-line/dispatch
/// until the handler says to stop or the peer goes away.
///
/// `read_timeout` bounds each individual `readline()`; a timeout is not
/// treated as fatal here — the loop simply tries again, mirroring the
/// base contract that a read timeout is a signal the caller may ignore.
pub async fn run_line_session(
    conn: &mut Connection,
    handler: &mut dyn SessionHandler,
    welcome_message: &str,
    read_timeout: Option<Duration>,
) -> Result<()> {
    handler.on_connect(conn).await;
    handler.send_welcome(conn, welcome_message).await?;

    while conn.running {
        let bytes = match conn.readline(read_timeout).await {
            Ok(bytes) => bytes,
            Err(crate::error::SessionError::Timeout) => continue,
            Err(e) => return Err(e),
        };
        if bytes.is_empty() && conn.at_eof() {
            break;
        }
        let line = String::from_utf8_lossy(&bytes);
        let line = line.trim_end_matches(['\r', '\n']);

        if is_exit_command(line) {
            conn.end_session(Some("Goodbye!")).await;
            break;
        }
        if !handler.process_line(conn, line, true).await? {
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
    async fn echoes_and_exits_on_quit() {
        let reader = Box::new(FixtureReader::new(b"Hello\r\nquit\r\n".to_vec()));
        let writer = Box::new(RecordingWriter::default());
        let mut conn = Connection::new(reader, writer, "peer:1");
        let mut handler = Echo;

        run_line_session(&mut conn, &mut handler, "Welcome", None)
            .await
            .unwrap();

        assert!(conn.session_ended);
        assert!(!conn.running);
    }
}
