//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use std::time::{Duration, Instant};

use telehub_telnet::consts::cmd;
use telehub_telnet::{
    parse_negotiation, parse_subnegotiation, process_negotiation, process_subnegotiation,
    send_initial_negotiations, NegotiationEffect, OptionRegistry, TerminalInfo,
};

use crate::connection::{is_exit_command, Connection};
use crate::error::Result;
use crate::handler::SessionHandler;

/// Whether a connection turned out to speak Telnet or is a plain byte
/// stream. Decided by the server on accept (§4.11) from the first byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    Simple,
    Telnet,
}

#[derive(Clone, Debug)]
pub struct TelnetConfig {
    pub welcome_message: String,
    pub read_timeout: Option<Duration>,
    /// How long the negotiation phase waits for further IAC traffic
    /// before concluding the peer is done negotiating.
    pub negotiation_quiet_interval: Duration,
    /// Hard cap on bytes consumed during negotiation, regardless of quiet
    /// interval, so a chatty or malicious peer can't stall the read phase.
    pub negotiation_byte_budget: usize,
    /// Force line-mode reads even without a confirmed LINEMODE option.
    pub line_mode: bool,
}

impl Default for TelnetConfig {
    fn default() -> Self {
        Self {
            welcome_message: String::new(),
            read_timeout: Some(Duration::from_secs(300)),
            negotiation_quiet_interval: Duration::from_millis(500),
            negotiation_byte_budget: 512,
            line_mode: false,
        }
    }
}

/// Owns the option registry and terminal-info store for one connection and
/// drives the negotiation phase plus the filtered line/mixed-mode reads
/// that follow it.
pub struct TelnetSession {
    mode: Mode,
    registry: OptionRegistry,
    terminal: TerminalInfo,
    /// Bytes already read off the wire (by the server's IAC sniff, or by a
    /// prior read call) that haven't been scanned for IAC yet.
    pending: Vec<u8>,
}

impl TelnetSession {
    pub fn new(mode: Mode, initial_data: Vec<u8>) -> Self {
        Self {
            mode,
            registry: OptionRegistry::new(),
            terminal: TerminalInfo::new(),
            pending: initial_data,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn terminal(&self) -> &TerminalInfo {
        &self.terminal
    }

    pub fn registry(&self) -> &OptionRegistry {
        &self.registry
    }

    fn is_line_mode(&self, config: &TelnetConfig) -> bool {
        config.line_mode || self.registry.is_remote_enabled(telehub_telnet::TelnetOption::Linemode)
    }

    /// Send the fixed opening handshake, then consume inbound bytes,
    /// routing IAC sequences through the negotiation engine and buffering
    /// everything else, until a quiet interval or the byte budget ends the
    /// phase.
    pub async fn negotiate(&mut self, conn: &mut Connection, config: &TelnetConfig) -> Result<()> {
        if self.mode == Mode::Simple {
            return Ok(());
        }

        send_initial_negotiations(conn.writer_mut()).await?;

        let mut consumed_budget = 0usize;
        let mut last_iac_at = Instant::now();
        let tick = Duration::from_millis(50).min(config.negotiation_quiet_interval);

        loop {
            if consumed_budget >= config.negotiation_byte_budget {
                break;
            }
            if last_iac_at.elapsed() >= config.negotiation_quiet_interval && !self.pending_has_iac() {
                break;
            }

            match conn.read_raw(Some(tick)).await {
                Ok(bytes) if !bytes.is_empty() => {
                    consumed_budget += bytes.len();
                    self.pending.extend_from_slice(&bytes);
                }
                Ok(_) => {}
                Err(crate::error::SessionError::Timeout) => {}
                Err(e) => return Err(e),
            }

            let saw_iac = self.drain_commands(conn, true).await?;
            if saw_iac {
                last_iac_at = Instant::now();
            }

            if conn.at_eof() {
                break;
            }
        }

        Ok(())
    }

    fn pending_has_iac(&self) -> bool {
        self.pending.contains(&cmd::IAC)
    }

    /// Scan `self.pending` front-to-back, routing complete IAC negotiations
    /// and subnegotiations through the engine and terminal store. Clean
    /// bytes are moved to `out` (when given) or dropped otherwise (during
    /// the negotiation phase, where any clean bytes found are kept for the
    /// read phase instead of being discarded — see `keep_clean`).
    async fn drain_commands(&mut self, conn: &mut Connection, keep_clean: bool) -> Result<bool> {
        let mut saw_iac = false;
        let mut clean = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i] != cmd::IAC {
                clean.push(self.pending[i]);
                i += 1;
                continue;
            }
            if i + 1 < self.pending.len() && self.pending[i + 1] == cmd::SB {
                let (opt, data, consumed) = parse_subnegotiation(&self.pending[i..]);
                match (opt, data, consumed) {
                    (Some(opt), Some(data), n) if n > 0 => {
                        saw_iac = true;
                        if let Err(e) = process_subnegotiation(opt, &data, &mut self.terminal) {
                            tracing::warn!(option = opt, error = %e, "discarding malformed subnegotiation");
                        }
                        i += n;
                    }
                    _ => break,
                }
            } else {
                let (command, opt, consumed) = parse_negotiation(&self.pending[i..]);
                match (command, opt, consumed) {
                    (Some(command), Some(opt), n) if n > 0 => {
                        saw_iac = true;
                        let effect =
                            process_negotiation(conn.writer_mut(), command, opt, &mut self.registry).await?;
                        if effect == NegotiationEffect::TerminalEnabled {
                            telehub_telnet::request_terminal_type(conn.writer_mut()).await?;
                        }
                        i += n;
                    }
                    _ => break,
                }
            }
        }
        self.pending.drain(..i);
        if keep_clean {
            // Clean bytes found during negotiation belong to the read
            // phase; put them back at the front of what remains.
            let rest = std::mem::take(&mut self.pending);
            self.pending = clean;
            self.pending.extend(rest);
        }
        Ok(saw_iac)
    }

    /// Line-mode read: accumulate bytes until LF, filtering IAC along the
    /// way, and return the line with CR/LF stripped.
    async fn read_line_with_telnet(&mut self, conn: &mut Connection, timeout: Option<Duration>) -> Result<String> {
        loop {
            self.drain_commands(conn, true).await?;
            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.pending.drain(..=pos).collect();
                let text = String::from_utf8_lossy(&line);
                return Ok(text.trim_end_matches(['\r', '\n']).to_string());
            }
            if conn.at_eof() {
                let text = String::from_utf8_lossy(&self.pending).to_string();
                self.pending.clear();
                return Ok(text);
            }
            let bytes = conn.read_raw(timeout).await?;
            self.pending.extend_from_slice(&bytes);
        }
    }

    /// Mixed-mode read: one round of whatever is available, IAC filtered
    /// out, embedded CR LF left untouched (Open Question 1).
    async fn read_mixed_mode(&mut self, conn: &mut Connection, timeout: Option<Duration>) -> Result<String> {
        if self.pending.is_empty() && !conn.at_eof() {
            let bytes = conn.read_raw(timeout).await?;
            self.pending.extend_from_slice(&bytes);
        }
        self.drain_commands(conn, true).await?;
        let text = String::from_utf8_lossy(&self.pending).to_string();
        self.pending.clear();
        Ok(text)
    }
}

/// Drive a full telnet-aware session: negotiate (telnet mode only), emit
/// the welcome, then read lines (line mode matches §4.6 semantics minus
/// the auto-prompt; mixed mode preserves embedded CR LF literally) until
/// the handler or peer ends it.
pub async fn run_telnet_session(
    conn: &mut Connection,
    session: &mut TelnetSession,
    handler: &mut dyn SessionHandler,
    config: &TelnetConfig,
) -> Result<()> {
    handler.on_connect(conn).await;

    session.negotiate(conn, config).await?;
    handler.send_welcome(conn, &config.welcome_message).await?;

    while conn.running {
        let line = if session.is_line_mode(config) {
            session.read_line_with_telnet(conn, config.read_timeout).await?
        } else {
            session.read_mixed_mode(conn, config.read_timeout).await?
        };

        if line.is_empty() && conn.at_eof() {
            break;
        }

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if is_exit_command(trimmed) {
            conn.end_session(Some("Goodbye!")).await;
            break;
        }
        if !handler.process_line(conn, trimmed, false).await? {
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
    async fn simple_mode_skips_negotiation() {
        let mut conn = Connection::new(
            Box::new(FixtureReader::new(b"".to_vec())),
            Box::new(RecordingWriter::default()),
            "peer:1",
        );
        let mut session = TelnetSession::new(Mode::Simple, Vec::new());
        session.negotiate(&mut conn, &TelnetConfig::default()).await.unwrap();
        assert_eq!(session.mode(), Mode::Simple);
    }

    #[tokio::test]
    async fn negotiation_phase_processes_initial_data_and_stops_on_quiet() {
        let bytes = [cmd::IAC, cmd::DO, 3]; // DO SGA
        let mut conn = Connection::new(
            Box::new(FixtureReader::new(Vec::new())),
            Box::new(RecordingWriter::default()),
            "peer:1",
        );
        let mut session = TelnetSession::new(Mode::Telnet, bytes.to_vec());
        let config = TelnetConfig {
            negotiation_quiet_interval: Duration::from_millis(20),
            ..Default::default()
        };
        session.negotiate(&mut conn, &config).await.unwrap();
        assert!(session.registry().is_local_enabled(telehub_telnet::TelnetOption::SuppressGoAhead));
    }

    #[tokio::test]
    async fn line_mode_filters_iac_and_strips_crlf() {
        let mut data = vec![cmd::IAC, cmd::DO, 3];
        data.extend_from_slice(b"hello\r\n");
        let mut conn = Connection::new(
            Box::new(FixtureReader::new(data)),
            Box::new(RecordingWriter::default()),
            "peer:1",
        );
        let mut session = TelnetSession::new(Mode::Telnet, Vec::new());
        let line = session.read_line_with_telnet(&mut conn, None).await.unwrap();
        assert_eq!(line, "hello");
    }

    #[tokio::test]
    async fn mixed_mode_preserves_embedded_crlf() {
        let data = b"ab\r\ncd".to_vec();
        let mut conn = Connection::new(
            Box::new(FixtureReader::new(data)),
            Box::new(RecordingWriter::default()),
            "peer:1",
        );
        let mut session = TelnetSession::new(Mode::Telnet, Vec::new());
        let text = session.read_mixed_mode(&mut conn, None).await.unwrap();
        assert_eq!(text, "ab\r\ncd");
    }
}
