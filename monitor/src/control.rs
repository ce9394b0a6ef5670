//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use telehub_transport::{Reader, Writer};

use crate::error::Result;
use crate::events::ViewerCommand;
use crate::registry::Monitor;
use crate::viewer::Viewer;

/// Exact match against the configured monitor endpoint path; no prefix or
/// query-string handling, unlike the session WebSocket path (§4.12 strips
/// the query before comparing, the monitor path never carries one).
pub fn is_monitor_path(path: &str, monitor_path: &str) -> bool {
    path == monitor_path
}

/// Drive one monitor viewer connection: register it, send the initial
/// snapshot, then loop decoding commands until the reader hits EOF.
/// Errors from a single malformed command are logged and the loop
/// continues; only a transport error ends it.
pub async fn handle_viewer_connection(
    monitor: &Monitor,
    viewer_id: impl Into<String>,
    mut reader: Box<dyn Reader>,
    writer: Box<dyn Writer>,
) -> Result<()> {
    let viewer_id = viewer_id.into();
    let snapshot = monitor.add_viewer(Viewer::new(viewer_id.clone(), writer));
    monitor.send_to(&viewer_id, &snapshot).await;

    // Drive the command loop separately so a transport error doesn't skip
    // the registry cleanup below via an early `?` return.
    let result = run_viewer_commands(monitor, &viewer_id, reader.as_mut()).await;

    monitor.remove_viewer(&viewer_id);
    result
}

async fn run_viewer_commands(monitor: &Monitor, viewer_id: &str, reader: &mut dyn Reader) -> Result<()> {
    loop {
        let line = reader
            .readline()
            .await
            .map_err(|_| crate::error::MonitorError::ViewerNotFound(viewer_id.to_string()))?;
        if line.is_empty() && reader.at_eof() {
            break;
        }
        let text = String::from_utf8_lossy(&line);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        match serde_json::from_str::<ViewerCommand>(text) {
            Ok(ViewerCommand::WatchSession { session_id }) => {
                monitor.watch_session(viewer_id, &session_id);
                monitor
                    .send_to(
                        viewer_id,
                        &crate::events::OutgoingEvent::WatchResponse {
                            session_id,
                            status: "success",
                        },
                    )
                    .await;
            }
            Ok(ViewerCommand::StopWatching { session_id }) => {
                monitor.stop_watching(viewer_id, &session_id);
                monitor
                    .send_to(
                        viewer_id,
                        &crate::events::OutgoingEvent::WatchResponse {
                            session_id,
                            status: "stopped",
                        },
                    )
                    .await;
            }
            Err(e) => {
                tracing::warn!(viewer = %viewer_id, error = %e, "discarding malformed viewer command");
            }
        }

        if reader.at_eof() {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_path_is_exact() {
        assert!(is_monitor_path("/monitor", "/monitor"));
        assert!(!is_monitor_path("/monitor/", "/monitor"));
        assert!(!is_monitor_path("/other", "/monitor"));
    }
}
