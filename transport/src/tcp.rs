//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::error::Result;
use crate::traits::{Reader, Writer};

const READ_CHUNK: usize = 4096;

/// Split a TCP stream into the uniform reader/writer pair.
pub fn split(stream: TcpStream) -> (TcpReader, TcpWriter) {
    stream.set_nodelay(true).ok();
    let (read_half, write_half) = stream.into_split();
    (TcpReader::new(read_half), TcpWriter::new(write_half))
}

/// Reader side of a TCP connection. Buffers bytes read past a `readline`
/// delimiter so the next call picks up where the last one left off.
pub struct TcpReader {
    inner: OwnedReadHalf,
    buffer: Vec<u8>,
    eof: bool,
}

impl TcpReader {
    fn new(inner: OwnedReadHalf) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            eof: false,
        }
    }

    async fn fill(&mut self) -> Result<()> {
        let mut chunk = vec![0u8; READ_CHUNK];
        let n = self.inner.read(&mut chunk).await?;
        if n == 0 {
            self.eof = true;
        } else {
            self.buffer.extend_from_slice(&chunk[..n]);
        }
        Ok(())
    }
}

#[async_trait]
impl Reader for TcpReader {
    async fn read(&mut self, n: Option<usize>) -> Result<Vec<u8>> {
        if self.buffer.is_empty() && !self.eof {
            self.fill().await?;
        }
        let take = n.unwrap_or(self.buffer.len()).min(self.buffer.len());
        Ok(self.buffer.drain(..take).collect())
    }

    async fn readline(&mut self) -> Result<Vec<u8>> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                return Ok(self.buffer.drain(..=pos).collect());
            }
            if self.eof {
                return Ok(std::mem::take(&mut self.buffer));
            }
            self.fill().await?;
        }
    }

    fn at_eof(&self) -> bool {
        self.eof && self.buffer.is_empty()
    }
}

/// Writer side of a TCP connection.
pub struct TcpWriter {
    inner: OwnedWriteHalf,
    peer: Option<String>,
    local: Option<String>,
    closed: bool,
}

impl TcpWriter {
    fn new(inner: OwnedWriteHalf) -> Self {
        let peer = inner.peer_addr().ok().map(|a| a.to_string());
        let local = inner.local_addr().ok().map(|a| a.to_string());
        Self {
            inner,
            peer,
            local,
            closed: false,
        }
    }
}

#[async_trait]
impl Writer for TcpWriter {
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        AsyncWriteExt::write_all(&mut self.inner, data).await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        AsyncWriteExt::flush(&mut self.inner).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            AsyncWriteExt::shutdown(&mut self.inner).await?;
            self.closed = true;
        }
        Ok(())
    }

    async fn wait_closed(&mut self) -> Result<()> {
        Ok(())
    }

    fn get_extra_info(&self, key: &str) -> Option<String> {
        match key {
            "peername" => self.peer.clone(),
            "sockname" => self.local.clone(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt as _;
    use tokio::net::TcpListener;

    async fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (client, server)
    }

    #[tokio::test]
    async fn readline_accumulates_until_lf() {
        let (mut client, server) = connected_pair().await;
        let (mut reader, _writer) = split(server);

        client.write_all(b"hel").await.unwrap();
        client.write_all(b"lo\nworld").await.unwrap();

        let line = reader.readline().await.unwrap();
        assert_eq!(line, b"hello\n");
    }

    #[tokio::test]
    async fn eof_after_peer_closes() {
        let (client, server) = connected_pair().await;
        let (mut reader, _writer) = split(server);
        drop(client);

        let data = reader.read(None).await.unwrap();
        assert!(data.is_empty());
        assert!(reader.at_eof());
    }

    #[tokio::test]
    async fn writer_reports_extra_info() {
        let (_client, server) = connected_pair().await;
        let (_reader, writer) = split(server);
        assert!(writer.get_extra_info("peername").is_some());
        assert!(writer.get_extra_info("sockname").is_some());
        assert!(writer.get_extra_info("nonsense").is_none());
    }
}
