//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

//! Wire-level Telnet constants (RFC 854 commands, the option subset this
//! engine negotiates, and the TERMINAL-TYPE subnegotiation verb).

/// Telnet command bytes.
pub mod cmd {
    /// Interpret As Command.
    pub const IAC: u8 = 255;
    /// Request peer enable option.
    pub const DO: u8 = 253;
    /// Request peer disable option.
    pub const DONT: u8 = 254;
    /// Announce local intent to enable option.
    pub const WILL: u8 = 251;
    /// Announce local intent to disable option.
    pub const WONT: u8 = 252;
    /// Begin subnegotiation.
    pub const SB: u8 = 250;
    /// End subnegotiation.
    pub const SE: u8 = 240;
}

/// Telnet option codes this engine understands.
pub mod option {
    pub const ECHO: u8 = 1;
    pub const SGA: u8 = 3;
    pub const TERMINAL: u8 = 24;
    pub const NAWS: u8 = 31;
    pub const LINEMODE: u8 = 34;
}

/// TERMINAL-TYPE subnegotiation verb requesting the peer send its type.
pub const TERMINAL_SEND: u8 = 1;
