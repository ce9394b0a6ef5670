//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::error::{Result, TransportError};
use crate::traits::{Reader, Writer};

/// Split a WebSocket stream into the uniform reader/writer pair.
///
/// The writer owns a background task that performs the actual frame sends
/// so `write_all` never blocks on network I/O; `drain` waits for that task
/// to catch up.
pub fn split<S>(ws: WebSocketStream<S>) -> (WsReader<S>, WsWriter)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sink, stream) = ws.split();
    (WsReader::new(stream), WsWriter::new(sink))
}

/// Reader side of a WebSocket connection. Buffers decoded frame bytes so
/// `read`/`readline` can serve partial amounts the same way a TCP stream
/// does.
pub struct WsReader<S> {
    inner: SplitStream<WebSocketStream<S>>,
    buffer: Vec<u8>,
    eof: bool,
}

impl<S> WsReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn new(inner: SplitStream<WebSocketStream<S>>) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            eof: false,
        }
    }

    async fn fill(&mut self) -> Result<()> {
        match self.inner.next().await {
            Some(Ok(Message::Text(text))) => {
                self.buffer.extend_from_slice(text.as_bytes());
            }
            Some(Ok(Message::Binary(bytes))) => {
                self.buffer.extend_from_slice(&bytes);
            }
            Some(Ok(Message::Close(_))) | None => {
                self.eof = true;
            }
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {
                // Handled transparently by tungstenite; nothing to surface.
            }
            Some(Err(e)) => return Err(TransportError::WebSocket(e)),
        }
        Ok(())
    }
}

#[async_trait]
impl<S> Reader for WsReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read(&mut self, n: Option<usize>) -> Result<Vec<u8>> {
        while self.buffer.is_empty() && !self.eof {
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

enum WriteCommand {
    Send(Vec<u8>),
    Flush(oneshot::Sender<Result<()>>),
    Close(oneshot::Sender<Result<()>>),
}

/// Writer side of a WebSocket connection.
///
/// `write_all` enqueues a background send; `flush`/`drain` enqueue a
/// sentinel and wait for the background task to process everything ahead
/// of it, surfacing the first send failure it hit along the way.
pub struct WsWriter {
    tx: mpsc::UnboundedSender<WriteCommand>,
    info: Arc<ConnInfo>,
}

struct ConnInfo {
    peer: Option<String>,
    local: Option<String>,
}

impl WsWriter {
    fn new<S>(sink: SplitSink<WebSocketStream<S>, Message>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let info = Arc::new(ConnInfo {
            peer: None,
            local: None,
        });
        tokio::spawn(run_writer(sink, rx));
        Self { tx, info }
    }
}

async fn run_writer<S>(
    mut sink: SplitSink<WebSocketStream<S>, Message>,
    mut rx: mpsc::UnboundedReceiver<WriteCommand>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let mut last_error: Option<TransportError> = None;
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WriteCommand::Send(bytes) => {
                if last_error.is_none() {
                    if let Err(e) = sink.send(Message::Binary(bytes)).await {
                        last_error = Some(TransportError::WebSocket(e));
                    }
                }
            }
            WriteCommand::Flush(reply) => {
                let result = match &last_error {
                    Some(_) => Err(TransportError::Closed),
                    None => sink.flush().await.map_err(TransportError::WebSocket),
                };
                if result.is_err() && last_error.is_none() {
                    last_error = Some(TransportError::Closed);
                }
                let _ = reply.send(result);
            }
            WriteCommand::Close(reply) => {
                let result = sink.close().await.map_err(TransportError::WebSocket);
                let _ = reply.send(result);
                return;
            }
        }
    }
}

#[async_trait]
impl Writer for WsWriter {
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.tx
            .send(WriteCommand::Send(data.to_vec()))
            .map_err(|_| TransportError::Closed)
    }

    async fn flush(&mut self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(WriteCommand::Flush(reply_tx))
            .map_err(|_| TransportError::Closed)?;
        reply_rx.await.map_err(|_| TransportError::Closed)?
    }

    async fn close(&mut self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(WriteCommand::Close(reply_tx)).is_err() {
            return Ok(());
        }
        reply_rx.await.map_err(|_| TransportError::Closed)?
    }

    async fn wait_closed(&mut self) -> Result<()> {
        // Resolves once `run_writer` drops its receiver, whether that's
        // because the channel emptied out or the writer task returned
        // after a `Close` command.
        self.tx.closed().await;
        Ok(())
    }

    fn get_extra_info(&self, key: &str) -> Option<String> {
        match key {
            "peername" => self.info.peer.clone(),
            "sockname" => self.info.local.clone(),
            _ => None,
        }
    }
}

/// Attach address metadata to a writer built by [`split`]; WebSocket
/// upgrades happen over an already-accepted TCP socket, so the server
/// passes these in separately rather than querying the stream itself.
impl WsWriter {
    pub fn with_addresses(mut self, peer: Option<String>, local: Option<String>) -> Self {
        self.info = Arc::new(ConnInfo { peer, local });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::{TcpListener, TcpStream};
    use tokio_tungstenite::{accept_async, connect_async};

    async fn ws_pair() -> (WebSocketStream<TcpStream>, WebSocketStream<tokio_tungstenite::MaybeTlsStream<TcpStream>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server_task = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            accept_async(stream).await.unwrap()
        });
        let (client, _) = connect_async(format!("ws://{addr}")).await.unwrap();
        let server = server_task.await.unwrap();
        (server, client)
    }

    #[tokio::test]
    async fn round_trips_binary_payload() {
        let (server, client) = ws_pair().await;
        let (mut server_reader, _server_writer) = split(server);
        let (_client_reader, mut client_writer) = split(client);

        client_writer.write_all(b"hello\n").await.unwrap();
        client_writer.flush().await.unwrap();

        let line = server_reader.readline().await.unwrap();
        assert_eq!(line, b"hello\n");
    }

    #[tokio::test]
    async fn eof_after_close_frame() {
        let (server, client) = ws_pair().await;
        let (mut server_reader, _server_writer) = split(server);
        let (_client_reader, mut client_writer) = split(client);

        client_writer.close().await.unwrap();

        let data = server_reader.read(None).await.unwrap();
        assert!(data.is_empty());
        assert!(server_reader.at_eof());
    }
}
