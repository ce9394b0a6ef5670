//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TelnetError>;

/// Errors raised by the negotiation engine and terminal info store.
#[derive(Debug, Error)]
pub enum TelnetError {
    /// A subnegotiation payload didn't match the expected shape for its
    /// option (bad NAWS length, missing leading byte on TERMINAL-TYPE, ...).
    /// The caller logs and discards; the session continues.
    #[error("malformed subnegotiation payload for option {option}: {reason}")]
    MalformedProtocol { option: u8, reason: String },

    /// Writing the negotiation response to the transport failed.
    #[error("transport write failed: {0}")]
    WriterFailed(#[from] telehub_transport::TransportError),
}
