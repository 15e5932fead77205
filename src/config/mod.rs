//! Settings persistence.
//!
//! Settings live in one XML file split into independent [`SettingsStore`]s. Plugins get their
//! own writable store through the host; the inspector's own store is only ever handed to them
//! read-only.

mod manager;
mod store;

pub use manager::{
    SettingsManager, DEFAULT_SETTINGS_FILE, HAWKSCOPE_STORE_KEY, LAYOUTS_STORE_KEY,
    SETTINGS_VERSION,
};
pub use store::{MemoryStore, ReadOnlyStore, SettingsStore, StoreRc};
