//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

//! Pure byte-sequence builders for ANSI/VT100 terminal control codes.
//!
//! Every function here is a pure, allocation-only transform from arguments
//! to a wire-ready byte sequence: no I/O, no state. Handlers in
//! `telehub-session` call these and write the result straight to a
//! transport.

const ESC: u8 = 0x1b;
const BEL: u8 = 0x07;

/// SGR color and text-effect codes, matching the conventional ANSI numbering.
///
/// These are plain associated constants rather than an enum because the
/// "color" and "effect" code spaces both start at 0 and overlap (e.g.
/// `BLACK` and `RESET` are both 0) — a single discriminant space would be
/// misleading.
pub struct Color;

impl Color {
    pub const BLACK: u8 = 0;
    pub const RED: u8 = 1;
    pub const GREEN: u8 = 2;
    pub const YELLOW: u8 = 3;
    pub const BLUE: u8 = 4;
    pub const MAGENTA: u8 = 5;
    pub const CYAN: u8 = 6;
    pub const WHITE: u8 = 7;

    pub const RESET: u8 = 0;
    pub const BOLD: u8 = 1;
    pub const DIM: u8 = 2;
    pub const ITALIC: u8 = 3;
    pub const UNDERLINE: u8 = 4;
    pub const BLINK: u8 = 5;
    pub const REVERSE: u8 = 7;
    pub const HIDDEN: u8 = 8;
    pub const STRIKE: u8 = 9;
}

/// Backspace-space-backspace: erase the character to the left of the cursor.
pub fn erase_char() -> Vec<u8> {
    b"\x08 \x08".to_vec()
}

/// Erase the entire current line and return the cursor to column 1.
pub fn erase_line() -> Vec<u8> {
    format!("{}[2K\r", ESC as char).into_bytes()
}

/// Erase the entire screen.
pub fn erase_screen() -> Vec<u8> {
    format!("{}[2J", ESC as char).into_bytes()
}

/// Move the cursor to an absolute (col, row) position.
///
/// The wire format is row-first, column-second (`ESC [ row ; col H`) per
/// RFC-adjacent terminal convention, even though the column is the first
/// argument here.
pub fn move_cursor(col: u16, row: u16) -> Vec<u8> {
    format!("{}[{};{}H", ESC as char, row, col).into_bytes()
}

fn move_direction(n: u16, letter: char) -> Vec<u8> {
    format!("{}[{}{}", ESC as char, n, letter).into_bytes()
}

/// Move the cursor up `n` rows (default 1).
pub fn move_up(n: u16) -> Vec<u8> {
    move_direction(n, 'A')
}

/// Move the cursor down `n` rows (default 1).
pub fn move_down(n: u16) -> Vec<u8> {
    move_direction(n, 'B')
}

/// Move the cursor right `n` columns (default 1).
pub fn move_right(n: u16) -> Vec<u8> {
    move_direction(n, 'C')
}

/// Move the cursor left `n` columns (default 1).
pub fn move_left(n: u16) -> Vec<u8> {
    move_direction(n, 'D')
}

/// Build an SGR escape sequence. Effects are emitted first, then the
/// foreground (30 + code), then the background (40 + code). With nothing
/// set, emits the plain reset sequence (`ESC [ 0 m`).
pub fn set_color(fg: Option<u8>, bg: Option<u8>, effects: Option<&[u8]>) -> Vec<u8> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(effects) = effects {
        parts.extend(effects.iter().map(|e| e.to_string()));
    }
    if let Some(fg) = fg {
        parts.push((30 + fg).to_string());
    }
    if let Some(bg) = bg {
        parts.push((40 + bg).to_string());
    }
    if parts.is_empty() {
        parts.push("0".to_string());
    }
    format!("{}[{}m", ESC as char, parts.join(";")).into_bytes()
}

/// Reset all SGR attributes (`ESC [ 0 m`).
pub fn reset_colors() -> Vec<u8> {
    set_color(None, None, None)
}

/// Set the terminal/window title via the OSC 0 sequence.
pub fn set_title(title: &str) -> Vec<u8> {
    let mut out = format!("{}]0;{}", ESC as char, title).into_bytes();
    out.push(BEL);
    out
}

/// Wrap `text` in an SGR sequence and a trailing reset.
pub fn get_colored_text(text: &str, fg: Option<u8>, bg: Option<u8>, effects: Option<&[u8]>) -> Vec<u8> {
    let mut out = set_color(fg, bg, effects);
    out.extend_from_slice(text.as_bytes());
    out.extend_from_slice(&reset_colors());
    out
}

/// Hide the text cursor (`ESC [ ? 25 l`).
pub fn hide_cursor() -> Vec<u8> {
    format!("{}[?25l", ESC as char).into_bytes()
}

/// Show the text cursor (`ESC [ ? 25 h`).
pub fn show_cursor() -> Vec<u8> {
    format!("{}[?25h", ESC as char).into_bytes()
}

/// Save the current cursor position (`ESC [ s`).
pub fn save_cursor_position() -> Vec<u8> {
    format!("{}[s", ESC as char).into_bytes()
}

/// Restore a previously saved cursor position (`ESC [ u`).
pub fn restore_cursor_position() -> Vec<u8> {
    format!("{}[u", ESC as char).into_bytes()
}

/// Render a fixed-width text progress bar, e.g. `[=====     ] 50%`.
///
/// `progress` is clamped to `[0.0, 1.0]` before rendering.
pub fn create_progress_bar(width: u32, progress: f64) -> String {
    let clamped = progress.clamp(0.0, 1.0);
    let filled = (width as f64 * clamped).round() as u32;
    let filled = filled.min(width);
    let empty = width - filled;
    let pct = (clamped * 100.0).round() as u32;
    format!(
        "[{}{}] {}%",
        "=".repeat(filled as usize),
        " ".repeat(empty as usize),
        pct
    )
}
