//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use telehub_transport::{Reader, Result, Writer};

use crate::registry::Monitor;

/// Wraps a [`Reader`], mirroring every chunk it returns to the monitor bus
/// as a `client_input` event. Whitespace-only chunks are suppressed so
/// idle keepalives and bare newlines don't spam observers.
pub struct MonitoringReader<R> {
    inner: R,
    monitor: Arc<Monitor>,
    session_id: String,
}

impl<R: Reader> MonitoringReader<R> {
    pub fn new(inner: R, monitor: Arc<Monitor>, session_id: impl Into<String>) -> Self {
        Self {
            inner,
            monitor,
            session_id: session_id.into(),
        }
    }

    async fn mirror(&self, bytes: &[u8]) {
        if bytes.is_empty() || crate::is_blank(bytes) {
            return;
        }
        let text = String::from_utf8_lossy(bytes).into_owned();
        self.monitor
            .broadcast_session_event(&self.session_id, "client_input", json!({ "text": text }))
            .await;
    }
}

#[async_trait]
impl<R: Reader> Reader for MonitoringReader<R> {
    async fn read(&mut self, n: Option<usize>) -> Result<Vec<u8>> {
        let bytes = self.inner.read(n).await?;
        self.mirror(&bytes).await;
        Ok(bytes)
    }

    async fn readline(&mut self) -> Result<Vec<u8>> {
        let bytes = self.inner.readline().await?;
        self.mirror(&bytes).await;
        Ok(bytes)
    }

    fn at_eof(&self) -> bool {
        self.inner.at_eof()
    }
}

/// Wraps a [`Writer`], mirroring every `write_all` payload to the monitor
/// bus as a `server_message` event. Unlike the reader side, whitespace-only
/// writes are still mirrored (Open Question 4: the source's behaviour here
/// is untested, so outbound suppression is not assumed).
pub struct MonitoringWriter<W> {
    inner: W,
    monitor: Arc<Monitor>,
    session_id: String,
}

impl<W: Writer> MonitoringWriter<W> {
    pub fn new(inner: W, monitor: Arc<Monitor>, session_id: impl Into<String>) -> Self {
        Self {
            inner,
            monitor,
            session_id: session_id.into(),
        }
    }
}

#[async_trait]
impl<W: Writer> Writer for MonitoringWriter<W> {
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write_all(data).await?;
        if !data.is_empty() {
            let text = String::from_utf8_lossy(data).into_owned();
            self.monitor
                .broadcast_session_event(&self.session_id, "server_message", json!({ "text": text }))
                .await;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.inner.flush().await
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.close().await
    }

    async fn wait_closed(&mut self) -> Result<()> {
        self.inner.wait_closed().await
    }

    fn get_extra_info(&self, key: &str) -> Option<String> {
        self.inner.get_extra_info(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telehub_transport::testutil::{FixtureReader, RecordingWriter};

    #[tokio::test]
    async fn blank_inbound_line_is_not_mirrored() {
        let monitor = Arc::new(Monitor::new());
        monitor.register_session("s1", serde_json::json!({})).await;
        let mut reader = MonitoringReader::new(FixtureReader::new(b"   \n".to_vec()), monitor.clone(), "s1");
        let _ = reader.readline().await.unwrap();
        // No viewers are subscribed, so there's nothing to assert on the
        // wire; this just exercises the suppression path without panicking.
    }

    #[tokio::test]
    async fn outbound_write_is_forwarded_to_inner_writer() {
        let monitor = Arc::new(Monitor::new());
        let mut writer = MonitoringWriter::new(RecordingWriter::default(), monitor, "s1");
        writer.write_all(b"hello").await.unwrap();
        writer.flush().await.unwrap();
    }
}
