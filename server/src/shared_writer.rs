//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use std::sync::Arc;

use async_trait::async_trait;
use telehub_transport::{Result, Writer};
use tokio::sync::Mutex;

/// A [`Writer`] that hands off to a shared, lockable inner writer.
///
/// The session crate's read loops take exclusive ownership of a
/// `Box<dyn Writer>` inside [`telehub_session::Connection`]; wrapping the
/// real transport writer in `Arc<Mutex<_>>` first, and giving the
/// `Connection` a [`SharedWriter`] handle to it, lets the server layer
/// keep its own clone of the same `Arc` to inject global broadcasts or
/// force a close during shutdown without touching the session crate.
#[derive(Clone)]
pub struct SharedWriter(pub Arc<Mutex<Box<dyn Writer>>>);

impl SharedWriter {
    pub fn new(writer: Box<dyn Writer>) -> Self {
        Self(Arc::new(Mutex::new(writer)))
    }

    pub fn handle(&self) -> Arc<Mutex<Box<dyn Writer>>> {
        self.0.clone()
    }
}

#[async_trait]
impl Writer for SharedWriter {
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.0.lock().await.write_all(data).await
    }

    async fn flush(&mut self) -> Result<()> {
        self.0.lock().await.flush().await
    }

    async fn close(&mut self) -> Result<()> {
        self.0.lock().await.close().await
    }

    async fn wait_closed(&mut self) -> Result<()> {
        self.0.lock().await.wait_closed().await
    }

    fn get_extra_info(&self, key: &str) -> Option<String> {
        // Address metadata is static for a connection's lifetime, so a
        // blocking try_lock is fine here; this never contends in practice
        // since it's only called at startup/logging time.
        self.0.try_lock().ok().and_then(|w| w.get_extra_info(key))
    }
}

/// Send a line (with a trailing CRLF) directly to a shared writer, bypassing
/// whatever the owning session loop is doing. Used for global broadcasts
/// and forced shutdown messages.
pub async fn send_line_direct(handle: &Arc<Mutex<Box<dyn Writer>>>, text: &str) -> Result<()> {
    let mut writer = handle.lock().await;
    writer.write_all(text.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    writer.flush().await
}
