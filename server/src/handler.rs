//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use std::sync::Arc;

use telehub_session::SessionHandler;

/// Builds one fresh handler per accepted connection. A plain closure
/// suffices here, since the only dynamic field a handler needs injected
/// (the welcome message) already lives on [`crate::config::ServerConfig`]
/// and is threaded through by the session driver, not the handler itself.
pub type HandlerFactory = Arc<dyn Fn() -> Box<dyn SessionHandler> + Send + Sync>;

/// Wrap a `Fn() -> H` returning a concrete handler type as a
/// [`HandlerFactory`].
pub fn factory<H, F>(make: F) -> HandlerFactory
where
    H: SessionHandler + 'static,
    F: Fn() -> H + Send + Sync + 'static,
{
    Arc::new(move || Box::new(make()) as Box<dyn SessionHandler>)
}
