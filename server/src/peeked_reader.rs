//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use std::collections::VecDeque;

use async_trait::async_trait;
use telehub_transport::{Reader, Result};

/// Wraps a [`Reader`], replaying a prefix of already-consumed bytes before
/// falling through to the inner stream.
///
/// Used by the telnet-sniffing TCP server: it must consume the first byte
/// to decide simple vs. telnet mode, and when that byte turns out not to
/// be IAC it needs to land back in front of the session's own reads.
pub struct PeekedReader<R> {
    prefix: VecDeque<u8>,
    inner: R,
}

impl<R: Reader> PeekedReader<R> {
    pub fn new(prefix: Vec<u8>, inner: R) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }
}

#[async_trait]
impl<R: Reader> Reader for PeekedReader<R> {
    async fn read(&mut self, n: Option<usize>) -> Result<Vec<u8>> {
        if !self.prefix.is_empty() {
            let take = n.unwrap_or(self.prefix.len()).min(self.prefix.len());
            return Ok(self.prefix.drain(..take).collect());
        }
        self.inner.read(n).await
    }

    async fn readline(&mut self) -> Result<Vec<u8>> {
        if let Some(pos) = self.prefix.iter().position(|&b| b == b'\n') {
            return Ok(self.prefix.drain(..=pos).collect());
        }
        if !self.prefix.is_empty() {
            let mut line: Vec<u8> = self.prefix.drain(..).collect();
            line.extend(self.inner.readline().await?);
            return Ok(line);
        }
        self.inner.readline().await
    }

    fn at_eof(&self) -> bool {
        self.prefix.is_empty() && self.inner.at_eof()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telehub_transport::testutil::FixtureReader;

    #[tokio::test]
    async fn replays_prefix_before_inner_bytes() {
        let mut reader = PeekedReader::new(vec![b'h'], FixtureReader::new(b"i\n".to_vec()));
        let line = reader.readline().await.unwrap();
        assert_eq!(line, b"hi\n");
    }

    #[tokio::test]
    async fn read_drains_prefix_first() {
        let mut reader = PeekedReader::new(vec![0xFF], FixtureReader::new(b"rest".to_vec()));
        assert_eq!(reader.read(Some(1)).await.unwrap(), vec![0xFF]);
        assert_eq!(reader.read(None).await.unwrap(), b"rest".to_vec());
    }
}
