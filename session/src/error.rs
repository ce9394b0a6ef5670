//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors raised while driving a connection's read loop.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No data arrived within the configured read timeout. Recoverable:
    /// the loop driver decides whether to retry or end the session.
    #[error("read timed out")]
    Timeout,

    /// The peer closed the connection. Normal termination, not logged as
    /// a failure.
    #[error("peer closed the connection")]
    PeerClosed,

    /// A handler method returned an error that isn't otherwise classified.
    #[error("handler failed: {0}")]
    HandlerFailed(String),

    /// The base handler's `handle_client` was invoked directly instead of
    /// through a concrete mode (line/character/telnet).
    #[error("handle_client is not implemented on the base connection")]
    NotImplemented,

    /// Underlying transport I/O failed.
    #[error("transport error: {0}")]
    Transport(#[from] telehub_transport::TransportError),

    /// Telnet negotiation or terminal-info processing failed.
    #[error("telnet error: {0}")]
    Telnet(#[from] telehub_telnet::TelnetError),
}
