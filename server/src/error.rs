//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Error kinds for the accept/dispatch layer. Per-session errors that
/// occur after a handler is running are [`telehub_session::SessionError`];
/// these are the ones decided before or independent of any handler.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server has no more capacity")]
    CapacityExceeded,

    #[error("origin not permitted: {0}")]
    ForbiddenOrigin(String),

    #[error("no endpoint at path: {0}")]
    EndpointNotFound(String),

    #[error("writer failed: {0}")]
    WriterFailed(#[from] telehub_transport::TransportError),

    #[error("handler failed: {0}")]
    HandlerFailed(#[from] telehub_session::SessionError),

    #[error("server is already running")]
    AlreadyRunning,

    #[error("server is not running")]
    NotRunning,

    #[error("TLS error: {0}")]
    Tls(String),
}
