//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::WebSocketStream;

use telehub_monitor::{Monitor, MonitoringReader, MonitoringWriter};
use telehub_session::{run_character_session, run_line_session, Connection, SessionHandler};
use telehub_transport::websocket as ws_transport;

use crate::config::{ServerConfig, SessionKind};
use crate::error::{Result, ServerError};
use crate::handler::HandlerFactory;
use crate::registry::{ActiveConnection, ConnectionRegistry, ServerInfo};
use crate::shared_writer::SharedWriter;
use crate::types::{generate_session_id, ConnectionId, ConnectionIdGenerator};

/// Outcome of inspecting the upgrade request's path, `Origin` header, and
/// current load, decided before the handshake completes. Path is checked
/// first (close reason names the offending path, matching a 1003-style
/// "unsupported endpoint" close), then origin (403), then capacity
/// (a 503-style rejection standing in for a 1008 policy-violation close):
/// rejecting at the HTTP handshake avoids ever completing an upgrade this
/// server is just going to tear down again.
enum Admission {
    Session,
    Monitor,
    WrongPath(String),
    ForbiddenOrigin,
    AtCapacity,
}

fn admit(request: &Request, config: &ServerConfig, active_connections: usize) -> Admission {
    let path = request.uri().path();
    let is_monitor = telehub_monitor::is_monitor_path(path, &config.monitor_path);

    if path != config.endpoint_path && !is_monitor {
        return Admission::WrongPath(path.to_string());
    }

    let origin = request
        .headers()
        .get("origin")
        .and_then(|v| v.to_str().ok());
    if !config.origin_allowed(origin) {
        return Admission::ForbiddenOrigin;
    }

    if !config.has_capacity(active_connections) {
        return Admission::AtCapacity;
    }

    if is_monitor {
        Admission::Monitor
    } else {
        Admission::Session
    }
}

/// Either a plain TCP connection or one terminated through a pre-built TLS
/// acceptor, so the accept loop and handshake code below don't need to
/// care which transport kind (`ws-plain` vs. `ws-tls`) they're driving.
enum RawStream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for RawStream {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            RawStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            RawStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for RawStream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            RawStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            RawStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            RawStream::Plain(s) => Pin::new(s).poll_flush(cx),
            RawStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            RawStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            RawStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// A WebSocket server. Session and monitor viewer connections share one
/// listener, routed by request path. Plain by default; call
/// [`WebSocketServer::with_tls_acceptor`] before `start` to terminate TLS
/// on every accepted connection instead (`ws-tls` vs. `ws-plain`).
/// Certificate loading and rotation are the caller's concern — this only
/// ever takes a pre-built acceptor.
pub struct WebSocketServer {
    config: ServerConfig,
    listener: Arc<Mutex<TcpListener>>,
    bind_address: SocketAddr,
    registry: Arc<ConnectionRegistry>,
    monitor: Arc<Monitor>,
    id_gen: Arc<ConnectionIdGenerator>,
    running: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
    accept_handle: Mutex<Option<JoinHandle<()>>>,
    started_at: Instant,
    tls_acceptor: Option<TlsAcceptor>,
}

impl WebSocketServer {
    pub async fn new(config: ServerConfig, monitor: Arc<Monitor>) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_address).await?;
        let bind_address = listener.local_addr()?;
        tracing::info!(%bind_address, "websocket server bound");

        Ok(Self {
            config,
            listener: Arc::new(Mutex::new(listener)),
            bind_address,
            registry: Arc::new(ConnectionRegistry::new()),
            monitor,
            id_gen: Arc::new(ConnectionIdGenerator::default()),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_notify: Arc::new(Notify::new()),
            accept_handle: Mutex::new(None),
            started_at: Instant::now(),
            tls_acceptor: None,
        })
    }

    /// Terminate TLS on every accepted connection using `acceptor`.
    pub fn with_tls_acceptor(mut self, acceptor: TlsAcceptor) -> Self {
        self.tls_acceptor = Some(acceptor);
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
        let registry = self.registry.clone();
        let monitor = self.monitor.clone();
        let id_gen = self.id_gen.clone();
        let running = self.running.clone();
        let shutdown_notify = self.shutdown_notify.clone();
        let tls_acceptor = self.tls_acceptor.clone();

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
                        continue;
                    }
                };

                let config = config.clone();
                let registry = registry.clone();
                let monitor = monitor.clone();
                let id_gen = id_gen.clone();
                let handler_factory = handler_factory.clone();
                let tls_acceptor = tls_acceptor.clone();

                tokio::spawn(async move {
                    let stream = match tls_acceptor {
                        Some(acceptor) => match acceptor.accept(socket).await {
                            Ok(tls) => RawStream::Tls(Box::new(tls)),
                            Err(e) => {
                                tracing::warn!(%peer_addr, error = %e, "tls handshake failed");
                                return;
                            }
                        },
                        None => RawStream::Plain(socket),
                    };
                    if let Err(e) =
                        handle_upgrade(stream, peer_addr, config, registry, monitor, id_gen, handler_factory).await
                    {
                        tracing::warn!(%peer_addr, error = %e, "websocket connection ended with error");
                    }
                });
            }
            tracing::info!("websocket accept loop terminated");
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
            let _ = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
        }
        self.registry.shutdown(self.config.grace_timeout).await;
        Ok(())
    }
}

impl Drop for WebSocketServer {
    fn drop(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            tracing::warn!("WebSocketServer dropped while still running");
            self.running.store(false, Ordering::SeqCst);
            self.shutdown_notify.notify_waiters();
        }
    }
}

async fn handle_upgrade(
    socket: RawStream,
    peer_addr: SocketAddr,
    config: ServerConfig,
    registry: Arc<ConnectionRegistry>,
    monitor: Arc<Monitor>,
    id_gen: Arc<ConnectionIdGenerator>,
    handler_factory: HandlerFactory,
) -> Result<()> {
    let mut admission = None;
    let callback = |request: &Request, response: Response| {
        let decision = admit(request, &config, registry.len());
        let result = match &decision {
            Admission::Session | Admission::Monitor => Ok(response),
            Admission::WrongPath(path) => Err(reject(StatusCode::NOT_FOUND, &format!("Endpoint {path} not found"))),
            Admission::ForbiddenOrigin => Err(reject(StatusCode::FORBIDDEN, "origin not permitted")),
            Admission::AtCapacity => Err(reject(StatusCode::SERVICE_UNAVAILABLE, "server at capacity")),
        };
        admission = Some(decision);
        result
    };

    let ws = match tokio_tungstenite::accept_hdr_async(socket, callback).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::debug!(%peer_addr, error = %e, "websocket handshake rejected");
            return Ok(());
        }
    };

    match admission {
        Some(Admission::Session) => handle_session(ws, peer_addr, config, registry, monitor, id_gen, handler_factory).await,
        Some(Admission::Monitor) => handle_monitor(ws, peer_addr, monitor, id_gen).await,
        _ => Ok(()),
    }
}

fn reject(status: StatusCode, body: &str) -> ErrorResponse {
    Response::builder()
        .status(status)
        .body(Some(body.to_string()))
        .expect("status and body always form a valid response")
}

#[allow(clippy::too_many_arguments)]
async fn handle_session(
    ws: WebSocketStream<RawStream>,
    peer_addr: SocketAddr,
    config: ServerConfig,
    registry: Arc<ConnectionRegistry>,
    monitor: Arc<Monitor>,
    id_gen: Arc<ConnectionIdGenerator>,
    handler_factory: HandlerFactory,
) -> Result<()> {
    let id = id_gen.next();
    let session_id = generate_session_id();
    let (reader, writer) = ws_transport::split(ws);
    let writer = writer.with_addresses(Some(peer_addr.to_string()), None);
    let shared = SharedWriter::new(Box::new(writer));

    registry.insert(
        id,
        ActiveConnection {
            addr: peer_addr.to_string(),
            writer: shared.handle(),
            task: None,
        },
    );
    monitor
        .register_session(session_id.clone(), serde_json::json!({"peername": peer_addr.to_string()}))
        .await;

    let reader = MonitoringReader::new(reader, monitor.clone(), session_id.clone());
    let writer = MonitoringWriter::new(shared, monitor.clone(), session_id.clone());
    let mut conn = Connection::new(Box::new(reader), Box::new(writer), peer_addr.to_string());
    let mut handler = handler_factory();
    let result = run_for_kind(&mut conn, handler.as_mut(), &config).await;

    monitor.unregister_session(&session_id).await;
    registry.remove(id);
    result
}

async fn run_for_kind(conn: &mut Connection, handler: &mut dyn SessionHandler, config: &ServerConfig) -> Result<()> {
    match config.session_kind {
        SessionKind::Line => run_line_session(conn, handler, &config.welcome_message, config.read_timeout)
            .await
            .map_err(ServerError::from),
        SessionKind::Character => run_character_session(conn, handler, config.read_timeout)
            .await
            .map_err(ServerError::from),
    }
}

async fn handle_monitor(
    ws: WebSocketStream<RawStream>,
    peer_addr: SocketAddr,
    monitor: Arc<Monitor>,
    id_gen: Arc<ConnectionIdGenerator>,
) -> Result<()> {
    let viewer_id = format!("viewer-{}", id_gen.next());
    let (reader, writer) = ws_transport::split(ws);
    let writer = writer.with_addresses(Some(peer_addr.to_string()), None);

    telehub_monitor::handle_viewer_connection(&monitor, viewer_id, Box::new(reader), Box::new(writer))
        .await
        .map_err(|e| ServerError::HandlerFailed(telehub_session::SessionError::HandlerFailed(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::factory;
    use telehub_session::SessionHandler;

    struct EchoHandler;
    impl SessionHandler for EchoHandler {}

    fn build_request(path: &str, origin: Option<&str>) -> Request {
        let mut builder = Request::builder().uri(path);
        if let Some(origin) = origin {
            builder = builder.header("origin", origin);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn admits_session_path_with_no_origin_restriction() {
        let config = ServerConfig::default();
        let request = build_request("/ws", Some("http://anywhere"));
        assert!(matches!(admit(&request, &config, 0), Admission::Session));
    }

    #[test]
    fn rejects_forbidden_origin() {
        let config = ServerConfig::default().with_allow_origins(vec!["http://allowed".to_string()]);
        let request = build_request("/ws", Some("http://evil"));
        assert!(matches!(admit(&request, &config, 0), Admission::ForbiddenOrigin));
    }

    #[test]
    fn routes_monitor_path_separately() {
        let config = ServerConfig::default();
        let request = build_request("/monitor", None);
        assert!(matches!(admit(&request, &config, 0), Admission::Monitor));
    }

    #[test]
    fn unknown_path_is_rejected() {
        let config = ServerConfig::default();
        let request = build_request("/nope", None);
        assert!(matches!(admit(&request, &config, 0), Admission::WrongPath(_)));
    }

    #[test]
    fn rejects_when_at_capacity() {
        let config = ServerConfig::default().with_max_connections(1);
        let request = build_request("/ws", None);
        assert!(matches!(admit(&request, &config, 1), Admission::AtCapacity));
    }

    #[tokio::test]
    async fn lifecycle_start_and_shutdown() {
        let monitor = Arc::new(Monitor::default());
        let config = ServerConfig::default();
        let server = WebSocketServer::new(config, monitor).await.unwrap();
        assert!(!server.is_running());

        server.start(factory(|| EchoHandler)).await.unwrap();
        assert!(server.is_running());

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        server.shutdown().await.unwrap();
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let monitor = Arc::new(Monitor::default());
        let config = ServerConfig::default();
        let server = WebSocketServer::new(config, monitor).await.unwrap();
        server.start(factory(|| EchoHandler)).await.unwrap();

        let result = server.start(factory(|| EchoHandler)).await;
        assert!(result.is_err());

        server.shutdown().await.unwrap();
    }
}
