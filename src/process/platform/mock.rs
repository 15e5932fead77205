//! In-memory window system and launcher.
//!
//! Both record what they were asked to do into a shared [`Journal`], so tests can assert on the
//! ordering of cross-process side effects.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use crate::{
    layout::{Rect, Screen},
    process::{
        Bitness, LaunchCommand, ModuleInfo, ProcessLauncher, WindowHandle, WindowSystem,
    },
    Error, Result,
};

/// Ordered record of side effects, shared between mocks.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    /// An empty journal
    #[must_use]
    pub fn new() -> Self {
        Journal::default()
    }

    /// Appends an entry
    pub fn record(&self, entry: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.into());
    }

    /// All entries so far, oldest first
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[derive(Debug)]
struct MockState {
    current_process: u32,
    bitness: Bitness,
    windows: HashMap<WindowHandle, u32>,
    modules: HashMap<u32, Vec<ModuleInfo>>,
    main_windows: HashMap<u32, WindowHandle>,
    screens: Vec<Screen>,
}

/// A scripted window system.
#[derive(Debug, Clone)]
pub struct MockWindowSystem {
    state: Arc<RwLock<MockState>>,
    journal: Journal,
}

impl MockWindowSystem {
    /// A system in which the inspector runs as `current_process` with the host's bitness and a
    /// single 1920x1080 primary screen.
    #[must_use]
    pub fn new(current_process: u32) -> Self {
        MockWindowSystem {
            state: Arc::new(RwLock::new(MockState {
                current_process,
                bitness: Bitness::current(),
                windows: HashMap::new(),
                modules: HashMap::new(),
                main_windows: HashMap::new(),
                screens: vec![Screen {
                    device_name: r"\\.\DISPLAY1".to_string(),
                    bounds: Rect::new(0, 0, 1920, 1080),
                    working_area: Rect::new(0, 0, 1920, 1040),
                    primary: true,
                }],
            })),
            journal: Journal::new(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MockState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MockState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records side effects into `journal` instead of a private one
    #[must_use]
    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    /// Pretends the inspector has bitness `bitness`
    #[must_use]
    pub fn with_bitness(self, bitness: Bitness) -> Self {
        self.write().bitness = bitness;
        self
    }

    /// Adds a live window owned by `process_id`
    #[must_use]
    pub fn with_window(self, window: WindowHandle, process_id: u32) -> Self {
        self.write().windows.insert(window, process_id);
        self
    }

    /// Sets the module list of `process_id`
    #[must_use]
    pub fn with_modules(self, process_id: u32, modules: Vec<ModuleInfo>) -> Self {
        self.write().modules.insert(process_id, modules);
        self
    }

    /// Sets the main window of `process_id`, which also becomes a live window
    #[must_use]
    pub fn with_main_window(self, process_id: u32, window: WindowHandle) -> Self {
        {
            let mut state = self.write();
            state.main_windows.insert(process_id, window);
            state.windows.insert(window, process_id);
        }
        self
    }

    /// Replaces the screen list
    #[must_use]
    pub fn with_screens(self, screens: Vec<Screen>) -> Self {
        self.write().screens = screens;
        self
    }

    /// The journal side effects go to
    #[must_use]
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    fn ensure_window(&self, window: WindowHandle) -> Result<()> {
        if self.read().windows.contains_key(&window) {
            Ok(())
        } else {
            Err(Error::WindowNotFound(window))
        }
    }
}

impl WindowSystem for MockWindowSystem {
    fn current_process_id(&self) -> u32 {
        self.read().current_process
    }

    fn inspector_bitness(&self) -> Bitness {
        self.read().bitness
    }

    fn process_of(&self, window: WindowHandle) -> Result<u32> {
        self.read()
            .windows
            .get(&window)
            .copied()
            .ok_or(Error::WindowNotFound(window))
    }

    fn modules(&self, process_id: u32) -> Vec<ModuleInfo> {
        self.read()
            .modules
            .get(&process_id)
            .cloned()
            .unwrap_or_default()
    }

    fn main_window(&self, process_id: u32) -> Option<WindowHandle> {
        self.read().main_windows.get(&process_id).copied()
    }

    fn send_close(&self, window: WindowHandle) -> Result<()> {
        self.ensure_window(window)?;
        self.journal.record(format!("close {window}"));
        self.write().windows.remove(&window);
        Ok(())
    }

    fn screens(&self) -> Vec<Screen> {
        self.read().screens.clone()
    }

    fn highlight(&self, window: WindowHandle) -> Result<()> {
        self.ensure_window(window)?;
        self.journal.record(format!("highlight {window}"));
        Ok(())
    }
}

/// A launcher that records commands instead of spawning them.
#[derive(Debug, Clone, Default)]
pub struct RecordingLauncher {
    journal: Journal,
    failure: Option<String>,
}

impl RecordingLauncher {
    /// A launcher recording into `journal`
    #[must_use]
    pub fn new(journal: &Journal) -> Self {
        RecordingLauncher {
            journal: journal.clone(),
            failure: None,
        }
    }

    /// Makes every launch fail with an I/O error carrying `message`
    #[must_use]
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn launch(&self, command: &LaunchCommand) -> Result<()> {
        if let Some(message) = &self.failure {
            return Err(Error::Launch {
                program: command.program.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, message.clone()),
            });
        }

        self.journal
            .record(format!("launch {}", command.command_line()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_window_system() {
        let system = MockWindowSystem::new(1)
            .with_window(WindowHandle::new(10), 2)
            .with_modules(2, vec![ModuleInfo::named("clr.dll")])
            .with_main_window(2, WindowHandle::new(11));

        assert_eq!(system.process_of(WindowHandle::new(10)).unwrap(), 2);
        assert_eq!(system.process_of(WindowHandle::new(11)).unwrap(), 2);
        assert!(matches!(
            system.process_of(WindowHandle::new(12)),
            Err(Error::WindowNotFound(_))
        ));
        assert_eq!(system.modules(2).len(), 1);
        assert!(system.modules(3).is_empty());
        assert_eq!(system.main_window(2), Some(WindowHandle::new(11)));
        assert_eq!(system.screens().len(), 1);
    }

    #[test]
    fn test_close_is_journaled() {
        let journal = Journal::new();
        let system = MockWindowSystem::new(1)
            .with_window(WindowHandle::new(7), 1)
            .with_journal(&journal);

        system.send_close(WindowHandle::new(7)).unwrap();
        assert_eq!(journal.entries(), ["close 7"]);
        assert!(system.send_close(WindowHandle::new(7)).is_err());
    }
}
