//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

pub mod config;
pub mod error;
pub mod handler;
pub mod peeked_reader;
pub mod registry;
pub mod shared_writer;
pub mod tcp;
pub mod types;
pub mod websocket;

pub use config::{ServerConfig, SessionKind};
pub use error::{Result, ServerError};
pub use handler::{factory, HandlerFactory};
pub use registry::{ActiveConnection, ConnectionRegistry, ServerInfo};
pub use shared_writer::SharedWriter;
pub use tcp::{Sniff, TcpServer};
pub use types::{ConnectionId, ConnectionIdGenerator};
pub use websocket::WebSocketServer;
