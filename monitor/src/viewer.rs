//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use telehub_transport::Writer;

use crate::error::{MonitorError, Result};
use crate::events::OutgoingEvent;

/// A connected monitor viewer: an id plus the writer half of its
/// WebSocket, used to push JSON events.
pub struct Viewer {
    id: String,
    writer: Box<dyn Writer>,
}

impl Viewer {
    pub fn new(id: impl Into<String>, writer: Box<dyn Writer>) -> Self {
        Self { id: id.into(), writer }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn send(&mut self, event: &OutgoingEvent) -> Result<()> {
        let json = event.to_json().map_err(MonitorError::Encode)?;
        self.writer
            .write_all(json.as_bytes())
            .await
            .map_err(|_| MonitorError::ViewerNotFound(self.id.clone()))?;
        self.writer
            .flush()
            .await
            .map_err(|_| MonitorError::ViewerNotFound(self.id.clone()))
    }
}
