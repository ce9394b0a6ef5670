//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use telehub_transport::Writer;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::shared_writer::send_line_direct;
use crate::types::ConnectionId;

pub struct ActiveConnection {
    pub addr: String,
    pub writer: Arc<Mutex<Box<dyn Writer>>>,
    pub task: Option<JoinHandle<()>>,
}

/// Summary returned by [`ConnectionRegistry::server_info`].
#[derive(Clone, Debug)]
pub struct ServerInfo {
    pub active_connections: usize,
    pub total_connections: u64,
    pub uptime: Duration,
}

/// Active-connection bookkeeping shared by every server flavour.
///
/// Mutated only on accept/close paths, so a concurrent map is sufficient;
/// no invariant here spans more than one entry at a time.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ActiveConnection>,
    total: AtomicU64,
    started_at: Instant,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self {
            connections: DashMap::new(),
            total: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn insert(&self, id: ConnectionId, conn: ActiveConnection) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.connections.insert(id, conn);
    }

    pub fn remove(&self, id: ConnectionId) {
        self.connections.remove(&id);
    }

    pub fn set_task(&self, id: ConnectionId, task: JoinHandle<()>) {
        if let Some(mut entry) = self.connections.get_mut(&id) {
            entry.task = Some(task);
        }
    }

    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            active_connections: self.connections.len(),
            total_connections: self.total.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
        }
    }

    /// Send `message` to every connection currently active, bypassing
    /// whatever each session's own read/write loop is doing.
    pub async fn send_global_message(&self, message: &str) {
        let writers: Vec<_> = self.connections.iter().map(|e| e.writer.clone()).collect();
        for writer in writers {
            if let Err(e) = send_line_direct(&writer, message).await {
                tracing::debug!(error = %e, "global message delivery failed for one connection");
            }
        }
    }

    /// Give every in-flight handler `grace` to finish on its own (observed
    /// via its task handle), then force-close whatever's left. Force-close
    /// is a direct writer close, which causes the handler's next read or
    /// write to fail or see EOF and unwind on its own.
    pub async fn shutdown(&self, grace: Duration) {
        let entries: Vec<(ConnectionId, Arc<Mutex<Box<dyn Writer>>>, Option<JoinHandle<()>>)> = self
            .connections
            .iter_mut()
            .map(|mut e| {
                let id = *e.key();
                let writer = e.writer.clone();
                let task = e.value_mut().task.take();
                (id, writer, task)
            })
            .collect();

        let deadline = tokio::time::sleep(grace);
        tokio::pin!(deadline);

        for (_, _, task) in &entries {
            if let Some(task) = task {
                tokio::select! {
                    _ = task => {}
                    _ = &mut deadline => break,
                }
            }
        }

        for (id, writer, _) in &entries {
            let mut w = writer.lock().await;
            let _ = w.close().await;
            let _ = w.wait_closed().await;
            self.connections.remove(id);
        }
    }
}
