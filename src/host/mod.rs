//! Plugin host.
//!
//! Plugins are created once per session from registered [`PluginDescriptor`]s. Each receives a
//! [`Host`] that gives it a logger, its own settings store and the currently inspected window.
//! The inspector's own settings are only handed out read-only.

mod logger;
mod plugin;

use std::sync::Arc;

pub use logger::SessionLogger;
pub use plugin::{CommandPlugin, Plugin, PluginDescriptor, PluginDescriptorRc, PluginManager};

use crate::{config::StoreRc, process::WindowInfo};

/// What the inspector offers to its plugins.
pub trait Host: Send + Sync {
    /// A logger for `name`, tagged with the session id
    fn logger(&self, name: &str) -> SessionLogger;

    /// The settings store of `key`. An empty key or the inspector's own key gives a read-only
    /// view of the inspector settings.
    fn settings(&self, key: &str) -> StoreRc;

    /// The window currently inspected
    fn current_window_info(&self) -> Option<Arc<WindowInfo>>;
}
