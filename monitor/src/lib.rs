//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

//! Session registry and JSON-over-WebSocket viewer fan-out.
//!
//! The [`Monitor`] tracks which sessions are active and who's watching
//! them; [`control::handle_viewer_connection`] drives one viewer's command
//! loop against it. Server code calls [`Monitor::register_session`] /
//! [`Monitor::unregister_session`] / [`Monitor::broadcast_session_event`]
//! as sessions come and go.

pub mod control;
pub mod error;
pub mod events;
pub mod interceptor;
pub mod registry;
pub mod viewer;

pub use control::{handle_viewer_connection, is_monitor_path};
pub use error::{MonitorError, Result};
pub use events::{OutgoingEvent, SessionRecord, ViewerCommand};
pub use interceptor::{MonitoringReader, MonitoringWriter};
pub use registry::Monitor;
pub use viewer::Viewer;

/// Whitespace-only inbound data does not produce a `client_input` event.
/// Callers in the server layer should skip `broadcast_session_event` for
/// `client_input` when this returns `true`.
pub fn is_blank(data: &[u8]) -> bool {
    data.iter().all(|b| b.is_ascii_whitespace())
}
