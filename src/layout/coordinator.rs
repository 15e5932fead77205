//! Window placement restore and tracking.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use log::{debug, error};

use crate::{
    config::{MemoryStore, SettingsManager, SettingsStore, LAYOUTS_STORE_KEY},
    layout::{
        primary_screen, read_layouts, screen_of, write_layouts, FormLayoutData, LayoutTable,
        Rect, WindowState,
    },
    process::WindowSystem,
    Result,
};

/// Windows that know their preferred size.
pub trait DefaultLayoutProvider {
    /// Bounds to use when no usable layout was saved
    fn default_bounds(&self) -> Rect;
}

/// Windows that persist extra state along with their placement.
pub trait AdditionalLayoutDataProvider {
    /// The data to save
    fn additional_layout_data(&self) -> String;

    /// Restores saved data. Called on every load, with an empty string when nothing was saved.
    fn set_additional_layout_data(&mut self, data: &str);
}

/// A top-level window whose placement is managed.
pub trait LayoutWindow {
    /// Current bounds
    fn bounds(&self) -> Rect;

    /// Moves and resizes the window
    fn set_bounds(&mut self, bounds: Rect);

    /// Current show state
    fn window_state(&self) -> WindowState;

    /// Changes the show state
    fn set_window_state(&mut self, state: WindowState);

    /// The window's default layout, if it has one
    fn as_default_provider(&self) -> Option<&dyn DefaultLayoutProvider> {
        None
    }

    /// The window's additional data, if it has any
    fn as_additional_data_provider(&mut self) -> Option<&mut dyn AdditionalLayoutDataProvider> {
        None
    }
}

/// Where layout markup is kept between sessions.
pub trait LayoutStore: Send + Sync {
    /// The saved markup
    ///
    /// # Errors
    /// Returns an error if the markup cannot be read.
    fn load_layouts(&self) -> Result<String>;

    /// Replaces the saved markup
    ///
    /// # Errors
    /// Returns an error if the markup cannot be written.
    fn save_layouts(&self, markup: &str) -> Result<()>;
}

impl LayoutStore for MemoryStore {
    fn load_layouts(&self) -> Result<String> {
        Ok(self.content())
    }

    fn save_layouts(&self, markup: &str) -> Result<()> {
        self.set_content(markup)
    }
}

/// Keeps layouts in the settings file and saves the file on every change.
#[derive(Debug, Clone)]
pub struct SettingsLayoutStore {
    settings: Arc<SettingsManager>,
}

impl SettingsLayoutStore {
    /// Layouts stored in `settings`
    #[must_use]
    pub fn new(settings: Arc<SettingsManager>) -> Self {
        SettingsLayoutStore { settings }
    }
}

impl LayoutStore for SettingsLayoutStore {
    fn load_layouts(&self) -> Result<String> {
        Ok(self.settings.store(LAYOUTS_STORE_KEY).content())
    }

    fn save_layouts(&self, markup: &str) -> Result<()> {
        self.settings.store(LAYOUTS_STORE_KEY).set_content(markup)?;
        self.settings.save()
    }
}

/// Suspends layout tracking while alive.
#[must_use = "tracking resumes as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SuspendGuard {
    depth: Arc<AtomicUsize>,
}

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Restores window placement when a window loads and records it as the window moves.
///
/// Placement is restored only if it still fits the working area of the screen it was saved on
/// (or of the primary screen, when that screen is gone). A window saved minimized comes back
/// in its normal state.
pub struct LayoutCoordinator {
    system: Arc<dyn WindowSystem>,
    store: Arc<dyn LayoutStore>,
    layouts: LayoutTable,
    registered: HashSet<String>,
    loaded: HashSet<String>,
    suspended: Arc<AtomicUsize>,
}

impl LayoutCoordinator {
    /// Loads the saved layouts. Unreadable layouts are logged and ignored.
    pub fn new(system: Arc<dyn WindowSystem>, store: Arc<dyn LayoutStore>) -> Self {
        let layouts = match store.load_layouts().and_then(|markup| read_layouts(&markup)) {
            Ok(layouts) => layouts,
            Err(error) => {
                error!("Unable to read saved layouts: {error}");
                LayoutTable::new()
            }
        };

        LayoutCoordinator {
            system,
            store,
            layouts,
            registered: HashSet::new(),
            loaded: HashSet::new(),
            suspended: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The record of `key`
    #[must_use]
    pub fn layout(&self, key: &str) -> Option<&FormLayoutData> {
        self.layouts.get(key)
    }

    /// True once `key` was loaded and until it is closed
    #[must_use]
    pub fn is_loaded(&self, key: &str) -> bool {
        self.loaded.contains(key)
    }

    /// Suspends tracking until the guard is dropped. Guards nest.
    pub fn suspend(&self) -> SuspendGuard {
        self.suspended.fetch_add(1, Ordering::SeqCst);
        SuspendGuard {
            depth: Arc::clone(&self.suspended),
        }
    }

    /// True while a [`SuspendGuard`] is alive
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst) > 0
    }

    /// Starts managing `window` under `key` and restores its layout.
    pub fn register(&mut self, key: &str, window: &mut dyn LayoutWindow) {
        self.registered.insert(key.to_string());
        self.load(key, window);
    }

    fn set_default_layout(window: &mut dyn LayoutWindow) {
        window.set_window_state(WindowState::Normal);
        let bounds = window
            .as_default_provider()
            .map(DefaultLayoutProvider::default_bounds);
        if let Some(bounds) = bounds {
            window.set_bounds(bounds);
        }
    }

    /// Restores the saved layout of `key` onto `window`. Does nothing for unregistered or
    /// already loaded keys.
    pub fn load(&mut self, key: &str, window: &mut dyn LayoutWindow) {
        if self.loaded.contains(key) || !self.registered.contains(key) {
            return;
        }

        let _suspended = self.suspend();
        let screens = self.system.screens();
        let primary = primary_screen(&screens);

        match self.layouts.get(key).cloned() {
            Some(layout) => {
                let screen = layout
                    .screen
                    .as_deref()
                    .filter(|name| !name.is_empty())
                    .and_then(|name| screens.iter().find(|screen| screen.device_name == name))
                    .or(primary);

                match layout.bounds {
                    Some(bounds) => {
                        let fits = screen.map_or(true, |screen| screen.working_area.contains(&bounds));
                        if fits {
                            window.set_bounds(bounds);
                        } else {
                            debug!("Saved bounds of {key} do not fit the screen anymore");
                            Self::set_default_layout(window);
                        }
                    }
                    None => debug!("Could not find a 'bounds' value for layout key {key}"),
                }

                match layout.state {
                    Some(WindowState::Minimized) | None => {
                        window.set_window_state(WindowState::Normal);
                    }
                    Some(state) => window.set_window_state(state),
                }

                if layout.bounds.is_none() && window.window_state() == WindowState::Normal {
                    Self::set_default_layout(window);
                }
            }
            None => {
                Self::set_default_layout(window);
                let additional_data = window
                    .as_additional_data_provider()
                    .map(|provider| provider.additional_layout_data());
                self.layouts.insert(
                    key.to_string(),
                    FormLayoutData {
                        bounds: Some(window.bounds()),
                        state: Some(window.window_state()),
                        screen: primary.map(|screen| screen.device_name.clone()),
                        additional_data,
                    },
                );
            }
        }

        self.loaded.insert(key.to_string());

        let data = self
            .layouts
            .get(key)
            .and_then(|layout| layout.additional_data.clone())
            .unwrap_or_default();
        if let Some(provider) = window.as_additional_data_provider() {
            provider.set_additional_layout_data(&data);
        }
    }

    /// Records the current placement of `window` unless tracking is suspended.
    pub fn on_moved_or_resized(&mut self, key: &str, window: &dyn LayoutWindow) {
        if self.is_suspended() || !self.loaded.contains(key) {
            return;
        }

        let bounds = window.bounds();
        let screens = self.system.screens();
        let screen = screen_of(&screens, &bounds).map(|screen| screen.device_name.clone());

        if let Some(layout) = self.layouts.get_mut(key) {
            layout.state = Some(window.window_state());
            layout.bounds = Some(bounds);
            layout.screen = screen;
        }
    }

    /// Records the final placement and additional data of `window`, then persists all layouts.
    ///
    /// # Errors
    /// Returns the store's error if the layouts cannot be saved.
    pub fn on_closed(&mut self, key: &str, window: &mut dyn LayoutWindow) -> Result<()> {
        self.on_moved_or_resized(key, window);

        if let Some(provider) = window.as_additional_data_provider() {
            let data = provider.additional_layout_data();
            if let Some(layout) = self.layouts.get_mut(key) {
                layout.additional_data = Some(data);
            }
        }

        self.loaded.remove(key);
        self.save()
    }

    /// Persists all layouts.
    ///
    /// # Errors
    /// Returns the store's error if the layouts cannot be saved.
    pub fn save(&self) -> Result<()> {
        self.store.save_layouts(&write_layouts(&self.layouts)?)
    }
}
