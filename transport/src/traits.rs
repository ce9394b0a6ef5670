//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use async_trait::async_trait;

use crate::error::Result;

/// The read side of a connection, uniform across TCP and WebSocket.
///
/// `read`/`readline` never return an empty `Vec` unless [`Reader::at_eof`]
/// would also be true afterward; callers loop on `at_eof()` rather than on
/// empty reads.
#[async_trait]
pub trait Reader: Send {
    /// Read up to `n` bytes, or everything currently buffered/available if
    /// `n` is `None`.
    async fn read(&mut self, n: Option<usize>) -> Result<Vec<u8>>;

    /// Read until, and including, the next LF (`\n`). Returns a shorter
    /// (possibly empty) slice with no trailing LF only at EOF.
    async fn readline(&mut self) -> Result<Vec<u8>>;

    /// Whether the peer has closed the connection and all buffered bytes
    /// have been drained by prior reads.
    fn at_eof(&self) -> bool;
}

/// The write side of a connection, uniform across TCP and WebSocket.
#[async_trait]
pub trait Writer: Send {
    /// Queue `data` for writing. May buffer rather than flush immediately.
    async fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Wait for everything queued by `write_all` to actually reach the peer
    /// (or fail trying).
    async fn flush(&mut self) -> Result<()>;

    /// Alias for [`Writer::flush`], named to match the wire-protocol term
    /// used across the session layer.
    async fn drain(&mut self) -> Result<()> {
        self.flush().await
    }

    /// Close the connection. Idempotent.
    async fn close(&mut self) -> Result<()>;

    /// Wait until the connection is fully closed (e.g. after `close()`).
    async fn wait_closed(&mut self) -> Result<()>;

    /// Peer/local address style metadata a handler can surface to a client
    /// (`"peername"`, `"sockname"`). Returns `None` for unknown keys.
    fn get_extra_info(&self, key: &str) -> Option<String>;
}
