//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use async_trait::async_trait;

use crate::connection::{is_exit_command, Connection};
use crate::error::{Result, SessionError};

/// The plug-in surface a concrete session implements.
///
/// Every method has a default matching the behaviour of the stock
/// line/character/telnet loops in this crate; override only what needs to
/// differ. The loop drivers ([`crate::line::run_line_session`],
/// [`crate::character::run_character_session`],
/// [`crate::telnet::run_telnet_session`]) own `handle_client` itself —
/// there is no base `handle_client` to call into here, matching the
/// contract that invoking it directly is an error.
#[async_trait]
pub trait SessionHandler: Send {
    /// Called once the connection is fully initialized, before any loop
    /// iterations run.
    async fn on_connect(&mut self, _conn: &mut Connection) {}

    /// Called after the session has ended and before `cleanup`.
    async fn on_disconnect(&mut self, _conn: &mut Connection) {}

    /// Called for any unhandled error out of the read loop. The default
    /// just logs; the connection is torn down regardless afterward.
    async fn on_error(&mut self, conn: &mut Connection, error: &SessionError) {
        tracing::error!(addr = %conn.addr(), error = %error, "session error");
    }

    /// A non-exit line/command was submitted. Default echoes it back.
    async fn on_command_submitted(&mut self, conn: &mut Connection, line: &str) -> Result<()> {
        conn.send_line(&format!("You entered: {line}")).await
    }

    /// Emit the welcome banner and initial prompt. `welcome_message` empty
    /// means transparent mode: prompt only, no banner line.
    async fn send_welcome(&mut self, conn: &mut Connection, welcome_message: &str) -> Result<()> {
        if !welcome_message.is_empty() {
            conn.send_line(welcome_message).await?;
        }
        self.show_prompt(conn).await
    }

    async fn show_prompt(&mut self, conn: &mut Connection) -> Result<()> {
        conn.send_raw(b"> ").await
    }

    /// One line of input in line mode. Returns `false` to end the session.
    /// Exit keywords are handled by the loop driver before this is called.
    async fn process_line(&mut self, conn: &mut Connection, line: &str, auto_prompt: bool) -> Result<bool> {
        self.on_command_submitted(conn, line).await?;
        if auto_prompt {
            self.show_prompt(conn).await?;
        }
        Ok(true)
    }

    /// One character of input in character mode. Returns `false` to end
    /// the session. Default behaviour matches the stock character handler:
    /// Ctrl-C closes, CR/LF submits `current_command`, backspace edits it,
    /// anything else printable is appended and echoed.
    async fn process_character(&mut self, conn: &mut Connection, c: char) -> Result<bool> {
        match c {
            '\u{3}' => {
                conn.send_line("^C - Closing connection.").await?;
                conn.end_session(None).await;
                Ok(false)
            }
            '\r' | '\n' => self.handle_enter(conn).await,
            '\u{7f}' | '\u{8}' => {
                if !conn.current_command.is_empty() {
                    conn.current_command.pop();
                    conn.send_raw(&telehub_termcodes::erase_char()).await?;
                }
                Ok(true)
            }
            _ => {
                conn.current_command.push(c);
                let mut buf = [0u8; 4];
                conn.send_raw(c.encode_utf8(&mut buf).as_bytes()).await?;
                Ok(true)
            }
        }
    }

    /// Shared enter-key handling for character mode: submit or exit based
    /// on the accumulated `current_command`.
    async fn handle_enter(&mut self, conn: &mut Connection) -> Result<bool> {
        conn.send_raw(b"\r\n").await?;
        let command = std::mem::take(&mut conn.current_command);
        if is_exit_command(&command) {
            conn.end_session(Some("Goodbye!")).await;
            return Ok(false);
        }
        self.on_command_submitted(conn, &command).await?;
        self.show_prompt(conn).await?;
        Ok(true)
    }
}
