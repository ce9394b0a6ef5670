//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

//! Connection state and the three read-loop drivers (line, character,
//! telnet) that turn a transport's byte stream into handler callbacks.
//!
//! This crate doesn't listen on sockets or accept connections; it's handed
//! an already-split [`telehub_transport::Reader`]/[`telehub_transport::Writer`]
//! pair by the server layer and owns everything from there down.

pub mod character;
pub mod connection;
pub mod error;
pub mod handler;
pub mod line;
pub mod telnet;

pub use character::run_character_session;
pub use connection::{is_exit_command, Connection};
pub use error::{Result, SessionError};
pub use handler::SessionHandler;
pub use line::run_line_session;
pub use telnet::{run_telnet_session, Mode, TelnetConfig, TelnetSession};
