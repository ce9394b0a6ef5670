//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors raised by the reader/writer adapters.
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error from the underlying TCP stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the WebSocket protocol layer.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The transport was closed and no further writes will succeed.
    #[error("transport closed")]
    Closed,
}
