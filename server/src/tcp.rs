//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use telehub_monitor::{Monitor, MonitoringReader, MonitoringWriter};
use telehub_session::{run_character_session, run_line_session, run_telnet_session, Connection, Mode, SessionHandler, TelnetConfig, TelnetSession};
use telehub_transport::tcp as tcp_transport;

use crate::config::{ServerConfig, SessionKind};
use crate::error::{Result, ServerError};
use crate::handler::HandlerFactory;
use crate::peeked_reader::PeekedReader;
use crate::registry::{ActiveConnection, ConnectionRegistry, ServerInfo};
use crate::shared_writer::SharedWriter;
use crate::types::{generate_session_id, ConnectionId, ConnectionIdGenerator};

/// Whether newly-accepted connections are sniffed for a leading IAC byte
/// (telnet TCP server) or always treated as a plain byte stream (TCP
/// server). Both share everything else in this module.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Sniff {
    Off,
    TelnetFirstByte,
}

/// A TCP-based server. With [`Sniff::TelnetFirstByte`] it inspects the
/// first byte of each new connection (waiting at most one second) to
/// decide telnet vs. simple mode, per the mode-switch invariant; with
/// [`Sniff::Off`] every connection is plain ("simple").
pub struct TcpServer {
    config: ServerConfig,
    telnet_config: TelnetConfig,
    sniff: Sniff,
    listener: Arc<Mutex<TcpListener>>,
    bind_address: SocketAddr,
    registry: Arc<ConnectionRegistry>,
    monitor: Arc<Monitor>,
    id_gen: Arc<ConnectionIdGenerator>,
    running: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
    accept_handle: Mutex<Option<JoinHandle<()>>>,
    started_at: Instant,
}

impl TcpServer {
    pub async fn new(config: ServerConfig, sniff: Sniff, monitor: Arc<Monitor>) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_address).await?;
        let bind_address = listener.local_addr()?;
        tracing::info!(%bind_address, ?sniff, "tcp server bound");

        Ok(Self {
            config,
            telnet_config: TelnetConfig::default(),
            sniff,
            listener: Arc::new(Mutex::new(listener)),
            bind_address,
            registry: Arc::new(ConnectionRegistry::new()),
            monitor,
            id_gen: Arc::new(ConnectionIdGenerator::default()),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_notify: Arc::new(Notify::new()),
            accept_handle: Mutex::new(None),
            started_at: Instant::now(),
        })
    }

    pub fn with_telnet_config(mut self, telnet_config: TelnetConfig) -> Self {
        self.telnet_config = telnet_config;
        self
    }

    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn server_info(&self) -> ServerInfo {
        let mut info = self.registry.server_info();
        info.uptime = self.started_at.elapsed();
        info
    }

    pub async fn send_global_message(&self, message: &str) {
        self.registry.send_global_message(message).await;
    }

    pub async fn start(&self, handler_factory: HandlerFactory) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ServerError::AlreadyRunning);
        }

        let listener = self.listener.clone();
        let config = self.config.clone();
        let telnet_config = self.telnet_config.clone();
        let sniff = self.sniff;
        let registry = self.registry.clone();
        let monitor = self.monitor.clone();
        let id_gen = self.id_gen.clone();
        let running = self.running.clone();
        let shutdown_notify = self.shutdown_notify.clone();

        let handle = tokio::spawn(async move {
            loop {
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                let accept_result = tokio::select! {
                    result = async { listener.lock().await.accept().await } => result,
                    _ = shutdown_notify.notified() => break,
                };

                let (socket, peer_addr) = match accept_result {
                    Ok(pair) => pair,
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        continue;
                    }
                };

                if !config.has_capacity(registry.len()) {
                    tracing::warn!(%peer_addr, "rejecting connection, server at capacity");
                    let _ = reject_for_capacity(socket).await;
                    continue;
                }

                let id = id_gen.next();
                let session_id = generate_session_id();
                let config = config.clone();
                let telnet_config = telnet_config.clone();
                let registry = registry.clone();
                let monitor = monitor.clone();
                let handler_factory = handler_factory.clone();

                let (reader, writer) = tcp_transport::split(socket);
                let shared = SharedWriter::new(Box::new(writer));
                registry.insert(
                    id,
                    ActiveConnection {
                        addr: peer_addr.to_string(),
                        writer: shared.handle(),
                        task: None,
                    },
                );

                let task_registry = registry.clone();
                let task = tokio::spawn(async move {
                    if let Err(e) = handle_connection(
                        id,
                        session_id,
                        reader,
                        shared,
                        peer_addr,
                        sniff,
                        config,
                        telnet_config,
                        registry,
                        monitor,
                        handler_factory,
                    )
                    .await
                    {
                        tracing::error!(connection = %id, error = %e, "session ended with error");
                    }
                });
                task_registry.set_task(id, task);
            }
            tracing::info!("tcp accept loop terminated");
        });

        *self.accept_handle.lock().await = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(ServerError::NotRunning);
        }
        self.shutdown_notify.notify_waiters();
        if let Some(handle) = self.accept_handle.lock().await.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }
        self.registry.shutdown(self.config.grace_timeout).await;
        Ok(())
    }
}

impl Drop for TcpServer {
    fn drop(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            tracing::warn!("TcpServer dropped while still running");
            self.running.store(false, Ordering::SeqCst);
            self.shutdown_notify.notify_waiters();
        }
    }
}

async fn reject_for_capacity(socket: TcpStream) -> std::io::Result<()> {
    let (_reader, mut writer) = tcp_transport::split(socket);
    use telehub_transport::Writer;
    writer
        .write_all(b"Server is at maximum capacity. Please try again later.\r\n")
        .await
        .ok();
    writer.flush().await.ok();
    writer.close().await.ok();
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_connection(
    id: ConnectionId,
    session_id: String,
    reader: tcp_transport::TcpReader,
    shared: SharedWriter,
    peer_addr: SocketAddr,
    sniff: Sniff,
    config: ServerConfig,
    telnet_config: TelnetConfig,
    registry: Arc<ConnectionRegistry>,
    monitor: Arc<Monitor>,
    handler_factory: HandlerFactory,
) -> Result<()> {
    monitor
        .register_session(session_id.clone(), serde_json::json!({"peername": peer_addr.to_string()}))
        .await;

    let writer = MonitoringWriter::new(shared, monitor.clone(), session_id.clone());

    let mut handler = handler_factory();
    let result = match sniff {
        Sniff::Off => {
            let reader = MonitoringReader::new(reader, monitor.clone(), session_id.clone());
            let mut conn = Connection::new(Box::new(reader), Box::new(writer), peer_addr.to_string());
            run_for_kind(&mut conn, handler.as_mut(), &config).await
        }
        Sniff::TelnetFirstByte => {
            let mut reader = reader;
            let (mode, prefix) = sniff_telnet_mode(&mut reader).await;
            match mode {
                Mode::Telnet => {
                    let reader = MonitoringReader::new(reader, monitor.clone(), session_id.clone());
                    let mut conn = Connection::new(Box::new(reader), Box::new(writer), peer_addr.to_string());
                    let mut session = TelnetSession::new(Mode::Telnet, prefix);
                    run_telnet_session(&mut conn, &mut session, handler.as_mut(), &telnet_config)
                        .await
                        .map_err(ServerError::from)
                }
                Mode::Simple => {
                    let peeked = PeekedReader::new(prefix, reader);
                    let peeked = MonitoringReader::new(peeked, monitor.clone(), session_id.clone());
                    let mut conn = Connection::new(Box::new(peeked), Box::new(writer), peer_addr.to_string());
                    run_for_kind(&mut conn, handler.as_mut(), &config).await
                }
            }
        }
    };

    monitor.unregister_session(&session_id).await;
    registry.remove(id);
    if let Err(e) = &result {
        tracing::warn!(connection = %id, error = %e, "session loop exited with error");
    }
    result
}

async fn run_for_kind(
    conn: &mut Connection,
    handler: &mut dyn SessionHandler,
    config: &ServerConfig,
) -> Result<()> {
    match config.session_kind {
        SessionKind::Line => run_line_session(conn, handler, &config.welcome_message, config.read_timeout)
            .await
            .map_err(ServerError::from),
        SessionKind::Character => run_character_session(conn, handler, config.read_timeout)
            .await
            .map_err(ServerError::from),
    }
}

/// Read up to one byte with a 1s timeout; IAC means telnet mode, anything
/// else (including a timeout with no bytes at all) means simple mode. The
/// byte read, if any, is returned so the caller can replay it.
async fn sniff_telnet_mode<R: telehub_transport::Reader>(reader: &mut R) -> (Mode, Vec<u8>) {
    match tokio::time::timeout(Duration::from_secs(1), reader.read(Some(1))).await {
        Ok(Ok(bytes)) if bytes.first() == Some(&telehub_telnet::consts::cmd::IAC) => (Mode::Telnet, bytes),
        Ok(Ok(bytes)) if !bytes.is_empty() => (Mode::Simple, bytes),
        _ => (Mode::Simple, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::factory;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream as ClientStream;

    struct EchoHandler;
    impl SessionHandler for EchoHandler {}

    fn test_config() -> ServerConfig {
        ServerConfig::default()
            .with_welcome_message("hi")
            .with_session_kind(SessionKind::Line)
    }

    #[tokio::test]
    async fn lifecycle_start_and_shutdown() {
        let monitor = Arc::new(Monitor::default());
        let server = TcpServer::new(test_config(), Sniff::Off, monitor).await.unwrap();
        assert!(!server.is_running());

        server.start(factory(|| EchoHandler)).await.unwrap();
        assert!(server.is_running());

        tokio::time::sleep(Duration::from_millis(50)).await;

        server.shutdown().await.unwrap();
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn snapshot_starts_empty() {
        let monitor = Arc::new(Monitor::default());
        let server = TcpServer::new(test_config(), Sniff::Off, monitor).await.unwrap();
        let info = server.server_info();
        assert_eq!(info.active_connections, 0);
        assert_eq!(info.total_connections, 0);
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let monitor = Arc::new(Monitor::default());
        let server = TcpServer::new(test_config(), Sniff::Off, monitor).await.unwrap();
        server.start(factory(|| EchoHandler)).await.unwrap();

        let result = server.start(factory(|| EchoHandler)).await;
        assert!(result.is_err());

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn accepted_connection_receives_welcome_and_echoes_line() {
        let monitor = Arc::new(Monitor::default());
        let server = TcpServer::new(test_config(), Sniff::Off, monitor).await.unwrap();
        let addr = server.bind_address();
        server.start(factory(|| EchoHandler)).await.unwrap();

        let mut client = ClientStream::connect(addr).await.unwrap();
        client.write_all(b"hello\r\n").await.unwrap();

        let mut buf = vec![0u8; 256];
        let n = client.read(&mut buf).await.unwrap();
        let received = String::from_utf8_lossy(&buf[..n]);
        assert!(received.contains("hi"));

        server.shutdown().await.unwrap();
    }
}
