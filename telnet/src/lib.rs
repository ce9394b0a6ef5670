//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

//! Telnet option negotiation (RFC 854 and friends) and the terminal
//! capability store it feeds.
//!
//! This crate is transport-agnostic: callers hand it bytes and an
//! [`telehub_transport::Writer`] to reply on, and get back parsed commands,
//! registry updates, and terminal state. It knows nothing about sockets,
//! line buffering, or sessions.

pub mod consts;
pub mod error;
pub mod negotiation;
pub mod option;
pub mod registry;
pub mod terminal;

pub use error::{Result, TelnetError};
pub use negotiation::{
    async_write, encode_command, encode_subnegotiation, parse_negotiation, parse_subnegotiation,
    process_negotiation, process_subnegotiation, request_terminal_type, send_command,
    send_initial_negotiations, send_subnegotiation, NegotiationEffect,
};
pub use option::TelnetOption;
pub use registry::OptionRegistry;
pub use terminal::{Capabilities, TerminalInfo};
