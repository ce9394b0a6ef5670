//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

//! In-memory [`Writer`]/[`Reader`] implementations for unit tests in
//! dependent crates. Kept as a plain public module (not `#[cfg(test)]`)
//! since a normal dependency can't see another crate's test-only code.

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::{Reader, Writer};

/// A [`Writer`] that records every byte passed to `write_all` instead of
/// sending it anywhere.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    buffer: Vec<u8>,
    closed: bool,
}

impl RecordingWriter {
    pub fn written(&self) -> Vec<u8> {
        self.buffer.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl Writer for RecordingWriter {
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    async fn wait_closed(&mut self) -> Result<()> {
        Ok(())
    }

    fn get_extra_info(&self, key: &str) -> Option<String> {
        match key {
            "peername" => Some("127.0.0.1:0".to_string()),
            "sockname" => Some("127.0.0.1:0".to_string()),
            _ => None,
        }
    }
}

/// A [`Reader`] that serves reads from a fixed, pre-loaded byte buffer.
#[derive(Debug, Default)]
pub struct FixtureReader {
    remaining: std::collections::VecDeque<u8>,
}

impl FixtureReader {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            remaining: data.into().into(),
        }
    }
}

#[async_trait]
impl Reader for FixtureReader {
    async fn read(&mut self, n: Option<usize>) -> Result<Vec<u8>> {
        let take = n.unwrap_or(self.remaining.len()).min(self.remaining.len());
        Ok(self.remaining.drain(..take).collect())
    }

    async fn readline(&mut self) -> Result<Vec<u8>> {
        if let Some(pos) = self.remaining.iter().position(|&b| b == b'\n') {
            Ok(self.remaining.drain(..=pos).collect())
        } else {
            Ok(self.remaining.drain(..).collect())
        }
    }

    fn at_eof(&self) -> bool {
        self.remaining.is_empty()
    }
}
