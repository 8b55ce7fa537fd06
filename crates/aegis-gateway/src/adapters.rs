//! Tool-name to adapter-URL routing.
//!
//! The map is fixed at construction; requests read it without locking.

use std::collections::HashMap;

/// Immutable mapping from tool name to the adapter's base URL.
#[derive(Debug, Clone)]
pub struct AdapterRouter {
    routes: HashMap<String, String>,
}

impl AdapterRouter {
    /// Build the router from a tool-name -> base-URL map.
    pub fn new(routes: HashMap<String, String>) -> Self {
        Self { routes }
    }

    /// Look up the base URL for a tool.
    pub fn resolve(&self, tool: &str) -> Option<&str> {
        self.routes.get(tool).map(String::as_str)
    }
}

/// Build the forwarding target `<base>/<action>`, trimming at most one
/// trailing slash from the base.
pub fn target_url(base: &str, action: &str) -> String {
    let base = base.strip_suffix('/').unwrap_or(base);
    format!("{base}/{action}")
}
