//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use telehub_transport::Writer;

use crate::consts::{cmd, option, TERMINAL_SEND};
use crate::error::{Result, TelnetError};
use crate::option::TelnetOption;
use crate::registry::OptionRegistry;
use crate::terminal::TerminalInfo;

/// Write `data` to `writer` and flush it in one step, mirroring the
/// write-then-drain pattern every negotiation message follows.
pub async fn async_write(writer: &mut dyn Writer, data: &[u8]) -> Result<()> {
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// `IAC <command> <option>`.
pub fn encode_command(command: u8, option: u8) -> Vec<u8> {
    vec![cmd::IAC, command, option]
}

pub async fn send_command(writer: &mut dyn Writer, command: u8, option: u8) -> Result<()> {
    async_write(writer, &encode_command(command, option)).await
}

/// `IAC SB <option> <data> IAC SE`, byte-stuffing any literal `IAC` (0xFF)
/// in `data` as `IAC IAC` so it can't be mistaken for the terminator.
pub fn encode_subnegotiation(option: u8, data: &[u8]) -> Vec<u8> {
    let mut out = vec![cmd::IAC, cmd::SB, option];
    for &b in data {
        out.push(b);
        if b == cmd::IAC {
            out.push(cmd::IAC);
        }
    }
    out.push(cmd::IAC);
    out.push(cmd::SE);
    out
}

pub async fn send_subnegotiation(writer: &mut dyn Writer, option: u8, data: &[u8]) -> Result<()> {
    async_write(writer, &encode_subnegotiation(option, data)).await
}

/// Ask the peer to report its terminal type (`IAC SB TERMINAL TERMINAL_SEND IAC SE`).
pub async fn request_terminal_type(writer: &mut dyn Writer) -> Result<()> {
    send_subnegotiation(writer, option::TERMINAL, &[TERMINAL_SEND]).await
}

/// The fixed opening handshake every session sends once a connection is
/// accepted: announce local echo and suppress-go-ahead, request the peer do
/// the same for go-ahead, ask for terminal type and window size, and refuse
/// linemode so single-character reads stay meaningful.
pub async fn send_initial_negotiations(writer: &mut dyn Writer) -> Result<()> {
    send_command(writer, cmd::WILL, option::ECHO).await?;
    send_command(writer, cmd::WILL, option::SGA).await?;
    send_command(writer, cmd::DO, option::SGA).await?;
    send_command(writer, cmd::DO, option::TERMINAL).await?;
    send_command(writer, cmd::DO, option::NAWS).await?;
    send_command(writer, cmd::WONT, option::LINEMODE).await?;
    Ok(())
}

/// Scan `buf` for a complete three-byte `IAC <command> <option>` negotiation.
/// Returns `(command, option, consumed)`; `consumed` is `0` if `buf` doesn't
/// start with a complete negotiation (too short, or no leading `IAC`).
pub fn parse_negotiation(buf: &[u8]) -> (Option<u8>, Option<u8>, usize) {
    if buf.len() < 3 || buf[0] != cmd::IAC {
        return (None, None, 0);
    }
    (Some(buf[1]), Some(buf[2]), 3)
}

/// Scan `buf` for a complete `IAC SB <option> <data...> IAC SE` subnegotiation,
/// un-stuffing any `IAC IAC` pair in the body back to a literal `IAC` byte.
/// Returns `(option, data, consumed)`; `consumed` is `0` if `buf` doesn't
/// start with `IAC SB` or no terminating `IAC SE` is present yet.
pub fn parse_subnegotiation(buf: &[u8]) -> (Option<u8>, Option<Vec<u8>>, usize) {
    if buf.len() < 3 || buf[0] != cmd::IAC || buf[1] != cmd::SB {
        return (None, None, 0);
    }
    let opt = buf[2];
    let body = &buf[3..];
    let mut data = Vec::new();
    let mut i = 0;
    while i + 1 < body.len() {
        if body[i] == cmd::IAC {
            if body[i + 1] == cmd::SE {
                return (Some(opt), Some(data), 3 + i + 2);
            }
            if body[i + 1] == cmd::IAC {
                data.push(cmd::IAC);
                i += 2;
                continue;
            }
        }
        data.push(body[i]);
        i += 1;
    }
    (None, None, 0)
}

/// The side effects `process_negotiation` decided on, for a caller that
/// wants to react to an option flip (e.g. start sniffing for window size
/// once NAWS is agreed).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NegotiationEffect {
    /// Nothing beyond updating the registry.
    None,
    /// The peer agreed to NAWS; the session should ask for a terminal
    /// type too if it hasn't already gotten one.
    NawsEnabled,
    /// The peer agreed to send its TERMINAL-TYPE; request it now.
    TerminalEnabled,
}

/// Apply one parsed `(command, option)` negotiation to `registry`, writing
/// whatever counter-negotiation is required and returning an effect the
/// caller may act on.
///
/// This mirrors a small, fixed response table rather than a general DFA:
///
/// - `DO`/`DONT` ECHO, SGA: always agree (`WILL`/`WONT` echoed back) and
///   record the local option state.
/// - `DO` NAWS: agree (`WILL`) and record local state; emit
///   [`NegotiationEffect::NawsEnabled`].
/// - `DO` TERMINAL: refuse (`WONT`); the server doesn't support being told
///   to enable TERMINAL-TYPE reporting locally, it only asks the peer to.
/// - `WILL` TERMINAL: the peer agrees to report its terminal type; record
///   remote state and emit [`NegotiationEffect::TerminalEnabled`] so the
///   caller requests it.
/// - `WILL`/`WONT` NAWS, LINEMODE: record remote state with no reply (the
///   peer is announcing, not asking).
/// - Unknown options always get refused (`WONT` for `DO`, `DONT` for `WILL`).
pub async fn process_negotiation(
    writer: &mut dyn Writer,
    command: u8,
    opt_code: u8,
    registry: &mut OptionRegistry,
) -> Result<NegotiationEffect> {
    let opt = TelnetOption::from_code(opt_code);
    match (command, opt) {
        (cmd::DO, TelnetOption::Echo) | (cmd::DO, TelnetOption::SuppressGoAhead) => {
            registry.set_local(opt, true);
            send_command(writer, cmd::WILL, opt_code).await?;
            Ok(NegotiationEffect::None)
        }
        (cmd::DONT, TelnetOption::Echo) | (cmd::DONT, TelnetOption::SuppressGoAhead) => {
            registry.set_local(opt, false);
            send_command(writer, cmd::WONT, opt_code).await?;
            Ok(NegotiationEffect::None)
        }
        (cmd::DO, TelnetOption::Terminal) => {
            registry.set_local(opt, false);
            send_command(writer, cmd::WONT, opt_code).await?;
            Ok(NegotiationEffect::None)
        }
        (cmd::DO, TelnetOption::Naws) => {
            registry.set_local(opt, true);
            send_command(writer, cmd::WILL, opt_code).await?;
            Ok(NegotiationEffect::NawsEnabled)
        }
        (cmd::DONT, _) => {
            registry.set_local(opt, false);
            send_command(writer, cmd::WONT, opt_code).await?;
            Ok(NegotiationEffect::None)
        }
        (cmd::WILL, TelnetOption::Terminal) => {
            registry.set_remote(opt, true);
            Ok(NegotiationEffect::TerminalEnabled)
        }
        (cmd::WILL, TelnetOption::Naws) | (cmd::WILL, TelnetOption::Linemode) => {
            registry.set_remote(opt, true);
            Ok(NegotiationEffect::None)
        }
        (cmd::WONT, _) => {
            registry.set_remote(opt, false);
            Ok(NegotiationEffect::None)
        }
        (cmd::WILL, _) => {
            // Peer volunteers an option we don't recognize or don't offer
            // local handling for beyond bookkeeping: record and refuse.
            registry.set_remote(opt, true);
            send_command(writer, cmd::DONT, opt_code).await?;
            Ok(NegotiationEffect::None)
        }
        (cmd::DO, _) => {
            registry.set_local(opt, false);
            send_command(writer, cmd::WONT, opt_code).await?;
            Ok(NegotiationEffect::None)
        }
        _ => Ok(NegotiationEffect::None),
    }
}

/// Dispatch a parsed subnegotiation payload to the `TerminalInfo` it
/// updates. Only TERMINAL and NAWS carry meaning here; anything else is
/// reported as malformed so the caller can log and move on without
/// treating it as fatal.
pub fn process_subnegotiation(opt_code: u8, data: &[u8], terminal: &mut TerminalInfo) -> Result<()> {
    match TelnetOption::from_code(opt_code) {
        TelnetOption::Terminal => {
            if data.first().copied() != Some(0) {
                return Err(TelnetError::MalformedProtocol {
                    option: opt_code,
                    reason: "TERMINAL-TYPE payload missing leading IS byte".to_string(),
                });
            }
            terminal.process_terminal_type_data(data);
            Ok(())
        }
        TelnetOption::Naws => {
            if data.len() < 4 {
                return Err(TelnetError::MalformedProtocol {
                    option: opt_code,
                    reason: format!("NAWS payload too short ({} bytes)", data.len()),
                });
            }
            terminal.process_window_size_data(data);
            Ok(())
        }
        _ => Err(TelnetError::MalformedProtocol {
            option: opt_code,
            reason: "no subnegotiation handler for this option".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telehub_transport::testutil::RecordingWriter;

    #[test]
    fn command_encoding() {
        assert_eq!(encode_command(cmd::WILL, option::ECHO), vec![cmd::IAC, cmd::WILL, option::ECHO]);
    }

    #[test]
    fn subnegotiation_encoding() {
        let data = b"hello";
        let encoded = encode_subnegotiation(option::TERMINAL, data);
        let mut expected = vec![cmd::IAC, cmd::SB, option::TERMINAL];
        expected.extend_from_slice(data);
        expected.push(cmd::IAC);
        expected.push(cmd::SE);
        assert_eq!(encoded, expected);
    }

    #[tokio::test]
    async fn send_command_writes_bytes() {
        let mut writer = RecordingWriter::default();
        send_command(&mut writer, cmd::WILL, option::ECHO).await.unwrap();
        assert_eq!(writer.written(), vec![cmd::IAC, cmd::WILL, option::ECHO]);
    }

    #[tokio::test]
    async fn request_terminal_type_sends_send_verb() {
        let mut writer = RecordingWriter::default();
        request_terminal_type(&mut writer).await.unwrap();
        assert_eq!(
            writer.written(),
            vec![cmd::IAC, cmd::SB, option::TERMINAL, TERMINAL_SEND, cmd::IAC, cmd::SE]
        );
    }

    #[tokio::test]
    async fn initial_negotiations_order() {
        let mut writer = RecordingWriter::default();
        send_initial_negotiations(&mut writer).await.unwrap();
        let expected = vec![
            cmd::IAC, cmd::WILL, option::ECHO,
            cmd::IAC, cmd::WILL, option::SGA,
            cmd::IAC, cmd::DO, option::SGA,
            cmd::IAC, cmd::DO, option::TERMINAL,
            cmd::IAC, cmd::DO, option::NAWS,
            cmd::IAC, cmd::WONT, option::LINEMODE,
        ];
        assert_eq!(writer.written(), expected);
    }

    #[test]
    fn parse_negotiation_valid() {
        let buf = [&[cmd::IAC, cmd::DO, option::SGA][..], b"extra"].concat();
        let (command, opt, consumed) = parse_negotiation(&buf);
        assert_eq!(command, Some(cmd::DO));
        assert_eq!(opt, Some(option::SGA));
        assert_eq!(consumed, 3);
    }

    #[test]
    fn parse_negotiation_incomplete() {
        let (command, opt, consumed) = parse_negotiation(&[cmd::IAC]);
        assert_eq!((command, opt, consumed), (None, None, 0));
    }

    #[test]
    fn parse_negotiation_requires_iac() {
        let (command, opt, consumed) = parse_negotiation(b"random data");
        assert_eq!((command, opt, consumed), (None, None, 0));
    }

    #[test]
    fn parse_subnegotiation_valid() {
        let data = b"testdata";
        let buf = [&[cmd::IAC, cmd::SB, option::TERMINAL][..], data, &[cmd::IAC, cmd::SE], b"more"].concat();
        let (opt, subdata, consumed) = parse_subnegotiation(&buf);
        assert_eq!(opt, Some(option::TERMINAL));
        assert_eq!(subdata, Some(data.to_vec()));
        assert_eq!(consumed, 3 + data.len() + 2);
    }

    #[test]
    fn parse_subnegotiation_incomplete() {
        let buf = [&[cmd::IAC, cmd::SB, option::TERMINAL][..], b"partial"].concat();
        let (opt, subdata, consumed) = parse_subnegotiation(&buf);
        assert_eq!((opt, subdata, consumed), (None, None, 0));
    }

    #[test]
    fn subnegotiation_round_trips_embedded_iac_byte() {
        let data = [0x00u8, 0xFF, 0x42];
        let encoded = encode_subnegotiation(option::NAWS, &data);
        assert_eq!(
            encoded,
            vec![cmd::IAC, cmd::SB, option::NAWS, 0x00, 0xFF, 0xFF, 0x42, cmd::IAC, cmd::SE]
        );
        let (opt, subdata, consumed) = parse_subnegotiation(&encoded);
        assert_eq!(opt, Some(option::NAWS));
        assert_eq!(subdata, Some(data.to_vec()));
        assert_eq!(consumed, encoded.len());
    }

    #[tokio::test]
    async fn process_negotiation_echo_do_agrees() {
        let mut writer = RecordingWriter::default();
        let mut registry = OptionRegistry::new();
        process_negotiation(&mut writer, cmd::DO, option::ECHO, &mut registry).await.unwrap();
        assert_eq!(writer.written(), vec![cmd::IAC, cmd::WILL, option::ECHO]);
        assert!(registry.is_local_enabled(TelnetOption::Echo));
    }

    #[tokio::test]
    async fn process_negotiation_will_terminal_requests_type() {
        let mut writer = RecordingWriter::default();
        let mut registry = OptionRegistry::new();
        let effect = process_negotiation(&mut writer, cmd::WILL, option::TERMINAL, &mut registry)
            .await
            .unwrap();
        assert_eq!(effect, NegotiationEffect::TerminalEnabled);
        assert!(writer.written().is_empty());
        assert!(registry.is_remote_enabled(TelnetOption::Terminal));
    }

    #[tokio::test]
    async fn process_negotiation_do_terminal_is_refused() {
        let mut writer = RecordingWriter::default();
        let mut registry = OptionRegistry::new();
        let effect = process_negotiation(&mut writer, cmd::DO, option::TERMINAL, &mut registry)
            .await
            .unwrap();
        assert_eq!(effect, NegotiationEffect::None);
        assert_eq!(writer.written(), vec![cmd::IAC, cmd::WONT, option::TERMINAL]);
        assert!(!registry.is_local_enabled(TelnetOption::Terminal));
    }

    #[tokio::test]
    async fn process_negotiation_linemode_will_records_remote_only() {
        let mut writer = RecordingWriter::default();
        let mut registry = OptionRegistry::new();
        process_negotiation(&mut writer, cmd::WILL, option::LINEMODE, &mut registry).await.unwrap();
        assert!(writer.written().is_empty());
        assert!(registry.is_remote_enabled(TelnetOption::Linemode));
    }

    #[tokio::test]
    async fn process_negotiation_unknown_option_do_refuses() {
        let mut writer = RecordingWriter::default();
        let mut registry = OptionRegistry::new();
        process_negotiation(&mut writer, cmd::DO, 99, &mut registry).await.unwrap();
        assert_eq!(writer.written(), vec![cmd::IAC, cmd::WONT, 99]);
    }

    #[test]
    fn process_subnegotiation_terminal_type() {
        let mut terminal = TerminalInfo::new();
        let mut data = vec![0u8];
        data.extend_from_slice(b"xterm");
        process_subnegotiation(option::TERMINAL, &data, &mut terminal).unwrap();
        assert_eq!(terminal.term_type(), "xterm");
    }

    #[test]
    fn process_subnegotiation_naws() {
        let mut terminal = TerminalInfo::new();
        process_subnegotiation(option::NAWS, &[0x00, 0x64, 0x00, 0x32], &mut terminal).unwrap();
        assert_eq!(terminal.window_size(), (100, 50));
    }

    #[test]
    fn process_subnegotiation_unhandled_option_errors() {
        let mut terminal = TerminalInfo::new();
        assert!(process_subnegotiation(99, b"x", &mut terminal).is_err());
    }
}
