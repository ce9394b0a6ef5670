//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use std::sync::RwLock;

use dashmap::{DashMap, DashSet};
use serde_json::Value;

use crate::events::{OutgoingEvent, SessionRecord};
use crate::viewer::Viewer;

/// Tracks active sessions and who's watching them, and fans out session
/// lifecycle and activity events to subscribed viewers.
///
/// `session_viewers` holds the per-session subscriber set; `all_viewers`
/// holds every connected monitor viewer regardless of subscription (it
/// receives the initial `active_sessions` snapshot and nothing else
/// unless it also subscribes to specific sessions).
#[derive(Default)]
pub struct Monitor {
    sessions: DashMap<String, SessionRecord>,
    newest: RwLock<Option<String>>,
    session_viewers: DashMap<String, DashSet<String>>,
    all_viewers: DashMap<String, Viewer>,
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a monitor viewer and return the snapshot it should be
    /// sent immediately.
    pub fn add_viewer(&self, viewer: Viewer) -> OutgoingEvent {
        let sessions: Vec<SessionRecord> = self.sessions.iter().map(|e| e.value().clone()).collect();
        self.all_viewers.insert(viewer.id().to_string(), viewer);
        OutgoingEvent::ActiveSessions { sessions }
    }

    pub fn remove_viewer(&self, viewer_id: &str) {
        self.all_viewers.remove(viewer_id);
        for mut entry in self.session_viewers.iter_mut() {
            entry.value_mut().remove(viewer_id);
        }
    }

    pub fn watch_session(&self, viewer_id: &str, session_id: &str) {
        self.session_viewers
            .entry(session_id.to_string())
            .or_default()
            .insert(viewer_id.to_string());
    }

    pub fn stop_watching(&self, viewer_id: &str, session_id: &str) {
        if let Some(set) = self.session_viewers.get(session_id) {
            set.remove(viewer_id);
        }
    }

    /// Flip the previous newest session's flag, insert the new record as
    /// newest, and broadcast `session_started` to every connected viewer.
    pub async fn register_session(&self, id: impl Into<String>, client_info: Value) {
        let id = id.into();
        let prev_id = self.newest.write().unwrap().replace(id.clone());
        if let Some(prev_id) = prev_id {
            if let Some(mut prev) = self.sessions.get_mut(&prev_id) {
                prev.is_newest = false;
            }
        }
        let record = SessionRecord {
            id: id.clone(),
            client: client_info,
            status: "active".to_string(),
            is_newest: true,
        };
        self.sessions.insert(id, record.clone());

        self.broadcast_to_all(OutgoingEvent::SessionStarted { session: record }).await;
    }

    /// Broadcast `session_ended` to all viewers and that session's
    /// dedicated viewers, then drop both entries.
    pub async fn unregister_session(&self, id: &str) {
        let Some((_, mut record)) = self.sessions.remove(id) else {
            return;
        };
        record.status = "ended".to_string();
        record.is_newest = false;

        self.broadcast_to_all(OutgoingEvent::SessionEnded { session: record.clone() }).await;
        if let Some((_, viewers)) = self.session_viewers.remove(id) {
            self.broadcast_to(&viewers, OutgoingEvent::SessionEnded { session: record }).await;
        }
    }

    /// Send an arbitrary activity event to `id`'s dedicated viewers.
    pub async fn broadcast_session_event(&self, id: &str, event_type: impl Into<String>, data: Value) {
        let event = OutgoingEvent::Custom {
            event_type: event_type.into(),
            session_id: id.to_string(),
            data,
        };
        if let Some(viewers) = self.session_viewers.get(id) {
            self.broadcast_to(&viewers, event).await;
        }
    }

    /// Send `event` to one specific viewer; failures are swallowed (the
    /// caller's read loop will observe the disconnect independently).
    pub async fn send_to(&self, viewer_id: &str, event: &OutgoingEvent) {
        if let Some(mut viewer) = self.all_viewers.get_mut(viewer_id) {
            if viewer.send(event).await.is_err() {
                drop(viewer);
                self.remove_viewer(viewer_id);
            }
        }
    }

    async fn broadcast_to_all(&self, event: OutgoingEvent) {
        let ids: Vec<String> = self.all_viewers.iter().map(|e| e.key().clone()).collect();
        self.broadcast_to_ids(&ids, event).await;
    }

    async fn broadcast_to(&self, viewer_ids: &DashSet<String>, event: OutgoingEvent) {
        let ids: Vec<String> = viewer_ids.iter().map(|id| id.clone()).collect();
        self.broadcast_to_ids(&ids, event).await;
    }

    /// Send `event` to each listed viewer; a viewer whose send fails is
    /// dropped from every subscription set. The failure itself is
    /// swallowed, matching the fan-out's best-effort contract.
    async fn broadcast_to_ids(&self, ids: &[String], event: OutgoingEvent) {
        let mut dead = Vec::new();
        for id in ids {
            let Some(mut viewer) = self.all_viewers.get_mut(id) else {
                continue;
            };
            if viewer.send(&event).await.is_err() {
                dead.push(id.clone());
            }
        }
        for id in dead {
            tracing::debug!(viewer = %id, "dropping viewer after failed send");
            self.remove_viewer(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::testutil::RecordingViewer;
    use serde_json::json;

    #[tokio::test]
    async fn register_flips_previous_newest() {
        let monitor = Monitor::new();
        monitor.register_session("a", json!({})).await;
        monitor.register_session("b", json!({})).await;

        assert!(!monitor.sessions.get("a").unwrap().is_newest);
        assert!(monitor.sessions.get("b").unwrap().is_newest);
    }

    #[tokio::test]
    async fn unregister_removes_session_and_viewers() {
        let monitor = Monitor::new();
        monitor.register_session("a", json!({})).await;
        monitor.watch_session("viewer-1", "a");
        monitor.unregister_session("a").await;

        assert!(monitor.sessions.get("a").is_none());
        assert!(monitor.session_viewers.get("a").is_none());
    }

    #[tokio::test]
    async fn failed_send_drops_viewer_from_all_sets() {
        let monitor = Monitor::new();
        let (viewer, _rx) = RecordingViewer::failing("v1");
        monitor.add_viewer(viewer);
        monitor.watch_session("v1", "a");
        monitor.register_session("a", json!({})).await;

        assert!(monitor.all_viewers.get("v1").is_none());
    }
}
