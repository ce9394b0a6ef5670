//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use std::fmt;

const DEFAULT_WIDTH: u16 = 80;
const DEFAULT_HEIGHT: u16 = 24;
const MIN_WIDTH: u16 = 10;
const MIN_HEIGHT: u16 = 5;

/// Inferred display capabilities for a connected terminal.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Capabilities {
    pub color: bool,
    pub graphics: bool,
    pub utf8: bool,
}

/// Everything known about the peer's terminal: its reported type, its
/// window size, and capabilities inferred from the type string.
///
/// Window size starts at 80x24 and is only ever updated by a syntactically
/// valid NAWS payload or a direct `set_window_size` call that meets the
/// minimum bounds; an out-of-bounds update is a no-op on whatever value is
/// currently stored, it does not reset to the default.
#[derive(Clone, Debug)]
pub struct TerminalInfo {
    term_type: String,
    width: u16,
    height: u16,
    capabilities: Capabilities,
    terminal_info_received: bool,
}

impl Default for TerminalInfo {
    fn default() -> Self {
        Self {
            term_type: "UNKNOWN".to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            capabilities: Capabilities::default(),
            terminal_info_received: false,
        }
    }
}

impl TerminalInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term_type(&self) -> &str {
        &self.term_type
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn window_size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn terminal_info_received(&self) -> bool {
        self.terminal_info_received
    }

    pub fn has_color(&self) -> bool {
        self.capabilities.color
    }

    pub fn has_graphics(&self) -> bool {
        self.capabilities.graphics
    }

    pub fn has_utf8(&self) -> bool {
        self.capabilities.utf8
    }

    /// Record the peer's reported terminal type and re-infer capabilities
    /// from it. Matching is case-insensitive substring search.
    pub fn set_terminal_type(&mut self, term_type: &str) {
        self.term_type = term_type.to_string();
        self.terminal_info_received = true;
        let lower = term_type.to_lowercase();
        self.capabilities = Capabilities {
            color: ["color", "xterm", "256", "ansi"].iter().any(|n| lower.contains(n)),
            graphics: ["xterm", "vt100", "vt220", "vt3"].iter().any(|n| lower.contains(n)),
            utf8: ["xterm", "utf", "ansi"].iter().any(|n| lower.contains(n)),
        };
    }

    /// Update the window size. Values below the minimum are rejected and
    /// leave the previously stored size untouched.
    pub fn set_window_size(&mut self, width: u16, height: u16) {
        if width < MIN_WIDTH || height < MIN_HEIGHT {
            return;
        }
        self.width = width;
        self.height = height;
    }

    /// Process a raw NAWS (RFC 1073) subnegotiation payload: big-endian
    /// u16 width followed by big-endian u16 height. Anything shorter than
    /// four bytes is ignored.
    pub fn process_window_size_data(&mut self, data: &[u8]) {
        if data.len() < 4 {
            return;
        }
        let width = u16::from_be_bytes([data[0], data[1]]);
        let height = u16::from_be_bytes([data[2], data[3]]);
        self.set_window_size(width, height);
    }

    /// Process a raw TERMINAL-TYPE (RFC 1091) subnegotiation payload: a
    /// leading `TERMINAL_IS` (0) byte followed by the ASCII type string.
    /// Any other leading byte (or an empty payload) is ignored.
    pub fn process_terminal_type_data(&mut self, data: &[u8]) {
        let Some((&lead, rest)) = data.split_first() else {
            return;
        };
        if lead != 0 {
            return;
        }
        let term_type = String::from_utf8_lossy(rest);
        self.set_terminal_type(&term_type);
    }

    pub fn get_terminal_summary(&self) -> String {
        if !self.terminal_info_received {
            return "Terminal information not yet received".to_string();
        }
        format!(
            "Terminal: {}, Size: {}x{}, Color: {}, Graphics: {}, UTF-8: {}",
            self.term_type,
            self.width,
            self.height,
            yes_no(self.capabilities.color),
            yes_no(self.capabilities.graphics),
            yes_no(self.capabilities.utf8),
        )
    }
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "Yes"
    } else {
        "No"
    }
}

impl fmt::Display for TerminalInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TerminalInfo(type={}, size={}x{}, capabilities={:?})",
            self.term_type, self.width, self.height, self.capabilities
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let term = TerminalInfo::new();
        assert_eq!(term.term_type(), "UNKNOWN");
        assert_eq!(term.width(), 80);
        assert_eq!(term.height(), 24);
        assert_eq!(term.capabilities(), Capabilities::default());
        assert!(!term.terminal_info_received());
    }

    #[test]
    fn terminal_type_infers_capabilities() {
        let mut term = TerminalInfo::new();
        term.set_terminal_type("xterm-256color");
        assert_eq!(term.term_type(), "xterm-256color");
        assert!(term.terminal_info_received());
        assert!(term.has_color());
        assert!(term.has_graphics());
        assert!(term.has_utf8());
    }

    #[test]
    fn vt100_implies_graphics_only() {
        let mut term = TerminalInfo::new();
        term.set_terminal_type("vt100");
        assert!(!term.has_color());
        assert!(term.has_graphics());
        assert!(!term.has_utf8());
    }

    #[test]
    fn terminal_type_no_capabilities() {
        let mut term = TerminalInfo::new();
        term.set_terminal_type("dumb");
        assert!(!term.has_color());
        assert!(!term.has_graphics());
        assert!(!term.has_utf8());
    }

    #[test]
    fn ansi_implies_color_and_utf8_but_not_graphics() {
        let mut term = TerminalInfo::new();
        term.set_terminal_type("ansi");
        assert!(term.has_color());
        assert!(!term.has_graphics());
        assert!(term.has_utf8());
    }

    #[test]
    fn window_size_bounds_are_a_no_op_on_reject() {
        let mut term = TerminalInfo::new();
        term.set_window_size(5, 1);
        assert_eq!(term.window_size(), (80, 24));
        term.set_window_size(100, 40);
        assert_eq!(term.window_size(), (100, 40));
    }

    #[test]
    fn window_size_height_boundary() {
        let mut term = TerminalInfo::new();
        term.set_window_size(20, 4);
        assert_eq!(term.window_size(), (80, 24));
        term.set_window_size(20, 5);
        assert_eq!(term.window_size(), (20, 5));
    }

    #[test]
    fn window_size_property() {
        let mut term = TerminalInfo::new();
        term.set_window_size(120, 30);
        assert_eq!(term.window_size(), (120, 30));
    }

    #[test]
    fn terminal_summary_before_and_after() {
        let term = TerminalInfo::new();
        assert_eq!(term.get_terminal_summary(), "Terminal information not yet received");

        let mut term = TerminalInfo::new();
        term.set_terminal_type("xterm");
        term.set_window_size(100, 50);
        assert_eq!(
            term.get_terminal_summary(),
            "Terminal: xterm, Size: 100x50, Color: Yes, Graphics: Yes, UTF-8: Yes"
        );
    }

    #[test]
    fn display_contains_info() {
        let mut term = TerminalInfo::new();
        term.set_terminal_type("vt100");
        term.set_window_size(80, 24);
        let rep = format!("{term}");
        assert!(rep.contains("TerminalInfo("));
        assert!(rep.contains("vt100"));
        assert!(rep.contains("80x24"));
        assert!(rep.contains("capabilities="));
    }

    #[test]
    fn process_terminal_type_data_valid() {
        let mut term = TerminalInfo::new();
        let mut data = vec![0u8];
        data.extend_from_slice(b"xterm");
        term.process_terminal_type_data(&data);
        assert_eq!(term.term_type(), "xterm");
        assert!(term.terminal_info_received());
        assert!(term.has_color());
        assert!(term.has_graphics());
        assert!(term.has_utf8());
    }

    #[test]
    fn process_terminal_type_data_invalid_leading_byte() {
        let mut term = TerminalInfo::new();
        let data = [&[1u8][..], b"xterm"].concat();
        term.process_terminal_type_data(&data);
        assert_eq!(term.term_type(), "UNKNOWN");
    }

    #[test]
    fn process_window_size_data_valid() {
        let mut term = TerminalInfo::new();
        term.process_window_size_data(&[0x00, 0x64, 0x00, 0x32]);
        assert_eq!(term.width(), 100);
        assert_eq!(term.height(), 50);
    }

    #[test]
    fn process_window_size_data_too_short() {
        let mut term = TerminalInfo::new();
        term.process_window_size_data(&[0x00, 0x50]);
        assert_eq!(term.window_size(), (80, 24));
    }
}
