//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

//! Uniform reader/writer abstraction over TCP and WebSocket connections.
//!
//! Handlers in `telehub-session` and `telehub-telnet` are written against
//! [`Reader`]/[`Writer`] alone; they never touch [`tokio::net::TcpStream`]
//! or [`tokio_tungstenite`] directly.

pub mod error;
pub mod tcp;
pub mod testutil;
pub mod traits;
pub mod websocket;

pub use error::{Result, TransportError};
pub use traits::{Reader, Writer};
