//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

//! Minimal WebSocket server, with the monitor viewer endpoint served
//! alongside the session endpoint on the same listener.
//!
//! ```bash
//! cargo run --bin ws-echo
//! ```

use std::sync::Arc;

use telehub_server::{factory, ServerConfig, WebSocketServer};
use telehub_session::SessionHandler;

struct EchoHandler;
impl SessionHandler for EchoHandler {}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::new("127.0.0.1:8080".parse()?).with_welcome_message("Welcome to telehub.");
    let monitor = Arc::new(telehub_monitor::Monitor::new());
    let server = WebSocketServer::new(config, monitor).await?;

    println!("ws-echo listening on {}", server.bind_address());
    println!("Press Ctrl+C to stop");

    server.start(factory(|| EchoHandler)).await?;

    tokio::signal::ctrl_c().await?;
    server.shutdown().await?;
    Ok(())
}
