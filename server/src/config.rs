//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use std::net::SocketAddr;
use std::time::Duration;

/// Which read-loop a session runs under once accepted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionKind {
    Line,
    Character,
}

/// Shared server configuration. TCP, telnet-TCP, and WebSocket servers
/// each hold one of these plus whatever's specific to their transport.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,

    /// 0 means unlimited (Open Question 3: any falsy value is treated as
    /// no cap, not just `None`).
    pub max_connections: usize,

    pub session_kind: SessionKind,
    pub welcome_message: String,
    pub read_timeout: Option<Duration>,

    /// How long `shutdown()` waits for in-flight handlers to finish
    /// gracefully before force-closing them.
    pub grace_timeout: Duration,

    /// Path the monitor viewer endpoint is served on (WebSocket servers
    /// only).
    pub monitor_path: String,

    /// Allowed `Origin` header values for WebSocket connections; empty
    /// means any origin is accepted.
    pub allow_origins: Vec<String>,

    /// Path the session endpoint is served on (WebSocket servers only);
    /// any query string is stripped before comparing.
    pub endpoint_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            max_connections: 0,
            session_kind: SessionKind::Line,
            welcome_message: String::new(),
            read_timeout: Some(Duration::from_secs(300)),
            grace_timeout: Duration::from_secs(5),
            monitor_path: "/monitor".to_string(),
            allow_origins: Vec::new(),
            endpoint_path: "/ws".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_session_kind(mut self, kind: SessionKind) -> Self {
        self.session_kind = kind;
        self
    }

    pub fn with_welcome_message(mut self, message: impl Into<String>) -> Self {
        self.welcome_message = message.into();
        self
    }

    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_grace_timeout(mut self, timeout: Duration) -> Self {
        self.grace_timeout = timeout;
        self
    }

    pub fn with_monitor_path(mut self, path: impl Into<String>) -> Self {
        self.monitor_path = path.into();
        self
    }

    pub fn with_allow_origins(mut self, origins: Vec<String>) -> Self {
        self.allow_origins = origins;
        self
    }

    pub fn with_endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = path.into();
        self
    }

    /// Any falsy value (0) means unlimited, per Open Question 3.
    pub fn has_capacity(&self, active: usize) -> bool {
        self.max_connections == 0 || active < self.max_connections
    }

    /// Empty list or a literal `"*"` entry both mean "accept any origin".
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        if self.allow_origins.is_empty() || self.allow_origins.iter().any(|o| o == "*") {
            return true;
        }
        match origin {
            Some(origin) => self.allow_origins.iter().any(|o| o == origin),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_max_connections_is_unlimited() {
        let config = ServerConfig::default().with_max_connections(0);
        assert!(config.has_capacity(10_000));
    }

    #[test]
    fn capacity_respects_configured_cap() {
        let config = ServerConfig::default().with_max_connections(2);
        assert!(config.has_capacity(1));
        assert!(!config.has_capacity(2));
    }

    #[test]
    fn empty_allow_list_permits_any_origin() {
        let config = ServerConfig::default();
        assert!(config.origin_allowed(Some("http://anything")));
        assert!(config.origin_allowed(None));
    }

    #[test]
    fn nonempty_allow_list_requires_match() {
        let config = ServerConfig::default().with_allow_origins(vec!["http://allowed".to_string()]);
        assert!(config.origin_allowed(Some("http://allowed")));
        assert!(!config.origin_allowed(Some("http://other")));
        assert!(!config.origin_allowed(None));
    }

    #[test]
    fn wildcard_entry_permits_any_origin() {
        let config = ServerConfig::default().with_allow_origins(vec!["*".to_string()]);
        assert!(config.origin_allowed(Some("http://anything")));
        assert!(config.origin_allowed(None));
    }
}
