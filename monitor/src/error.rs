//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("session {0} not found")]
    SessionNotFound(String),

    #[error("viewer {0} not found")]
    ViewerNotFound(String),

    #[error("failed to encode monitor event: {0}")]
    Encode(#[from] serde_json::Error),
}
