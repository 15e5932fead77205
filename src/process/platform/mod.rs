//! Native window system abstraction.
//!
//! Everything the inspector needs from the operating system goes through [`WindowSystem`]:
//! mapping a window to its process, listing that process's modules, finding its main window,
//! closing windows, and enumerating screens. The Windows implementation lives behind
//! `cfg(windows)`; `mock::MockWindowSystem` (behind the `testing` feature) drives the same
//! logic in tests on any host.

use std::sync::Arc;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsSystem;

#[cfg(any(test, feature = "testing"))]
pub mod mock;

use crate::{
    layout::Screen,
    process::{Bitness, ModuleInfo, WindowHandle},
    Result,
};

/// Operating system services used by the controller, the navigator and the layout coordinator.
pub trait WindowSystem: Send + Sync {
    /// Id of the inspector's own process
    fn current_process_id(&self) -> u32;

    /// Bitness of the inspector's own process
    fn inspector_bitness(&self) -> Bitness {
        Bitness::current()
    }

    /// Id of the process owning `window`
    ///
    /// # Errors
    /// Returns [`crate::Error::WindowNotFound`] if `window` is not a live window.
    fn process_of(&self, window: WindowHandle) -> Result<u32>;

    /// Modules loaded in `process_id`.
    ///
    /// Processes whose modules cannot be read (for instance a 64-bit process seen from a 32-bit
    /// inspector) yield an empty list; callers rely on that to detect the situation.
    fn modules(&self, process_id: u32) -> Vec<ModuleInfo>;

    /// The first visible, unowned top-level window of `process_id`
    fn main_window(&self, process_id: u32) -> Option<WindowHandle>;

    /// Asks `window` to close
    ///
    /// # Errors
    /// Returns [`crate::Error::WindowNotFound`] if `window` is not a live window.
    fn send_close(&self, window: WindowHandle) -> Result<()>;

    /// Attached screens with their working areas
    fn screens(&self) -> Vec<Screen>;

    /// Draws attention to `window`
    ///
    /// # Errors
    /// Returns [`crate::Error::WindowNotFound`] if `window` is not a live window.
    fn highlight(&self, window: WindowHandle) -> Result<()>;
}

/// The window system of the host operating system.
///
/// # Errors
/// Returns [`crate::Error::Platform`] on hosts without a supported window system.
pub fn native() -> Result<Arc<dyn WindowSystem>> {
    #[cfg(windows)]
    {
        Ok(Arc::new(WindowsSystem::new()))
    }

    #[cfg(not(windows))]
    {
        Err(crate::Error::Platform(
            "No native window system is available on this platform".to_string(),
        ))
    }
}
