//! One inspector session.
//!
//! A [`Session`] owns everything that used to be process-wide state: the settings file, the
//! descriptor registry, the control directory, the plugins and the layout coordinator. Its
//! lifecycle is explicit:
//!
//! 1. [`Session::new`] opens the settings and wires the collaborators together;
//! 2. [`Session::run`] (standalone) or [`Session::attach`] (after an injection) starts the
//!    session and selects the first target;
//! 3. [`Session::navigate`] and [`Session::execute`] move between targets;
//! 4. [`Session::teardown`] saves and releases everything. It also runs on its own right
//!    before a handoff to another process.

use std::{
    collections::hash_map::RandomState,
    hash::{BuildHasher, Hasher},
    path::PathBuf,
    sync::{Arc, PoisonError, RwLock},
};

use crate::{
    config::{SettingsManager, StoreRc},
    descriptor::{CollectorOptions, TypeDescriptorRegistry},
    host::{Host, PluginDescriptorRc, PluginManager, SessionLogger},
    layout::{LayoutCoordinator, SettingsLayoutStore},
    navigation::{NavigationAction, NavigationContext, NavigationOutcome, Navigator},
    process::{
        ControlDirectory, ControllerConfig, InjectionController, ProcessLauncher, SessionState,
        Teardown, WindowHandle, WindowInfo, WindowSystem,
    },
    Result,
};

/// How a session is set up.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Settings file name; relative names are resolved against `data_dir`
    pub settings_file: Option<String>,
    /// Directory holding the settings file
    pub data_dir: PathBuf,
    /// Session id used to tag log messages; random when unset
    pub session_id: Option<u32>,
    /// Installation layout used for injection
    pub controller: ControllerConfig,
    /// Property view options
    pub collector: CollectorOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            settings_file: None,
            data_dir: PathBuf::from("."),
            session_id: None,
            controller: ControllerConfig::default(),
            collector: CollectorOptions::default(),
        }
    }
}

fn random_session_id() -> u32 {
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u32(std::process::id());
    // Zero means "no session" to the logger.
    (hasher.finish() as u32).max(1)
}

/// Resources released on teardown.
pub struct SessionResources {
    settings: Arc<SettingsManager>,
    registry: Arc<TypeDescriptorRegistry>,
    directory: Arc<ControlDirectory>,
    logger: SessionLogger,
}

impl SessionResources {
    /// The settings file
    #[must_use]
    pub fn settings(&self) -> &Arc<SettingsManager> {
        &self.settings
    }

    /// The descriptor cache
    #[must_use]
    pub fn registry(&self) -> &Arc<TypeDescriptorRegistry> {
        &self.registry
    }

    /// Controls known to this process
    #[must_use]
    pub fn directory(&self) -> &Arc<ControlDirectory> {
        &self.directory
    }
}

impl Teardown for SessionResources {
    fn teardown(&mut self) -> Result<()> {
        self.logger.debug(&"-".repeat(80));

        let saved = self.settings.save();
        if let Err(error) = &saved {
            self.logger.error("Could not save settings", Some(error));
        }

        self.registry.clear();
        log::logger().flush();
        saved
    }
}

/// The face a session shows its plugins.
struct SessionHost {
    logger: SessionLogger,
    settings: Arc<SettingsManager>,
    current: RwLock<Option<Arc<WindowInfo>>>,
}

impl SessionHost {
    fn set_current(&self, info: Option<Arc<WindowInfo>>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = info;
    }
}

impl Host for SessionHost {
    fn logger(&self, name: &str) -> SessionLogger {
        self.logger.for_source(name)
    }

    fn settings(&self, key: &str) -> StoreRc {
        self.settings.settings(key)
    }

    fn current_window_info(&self) -> Option<Arc<WindowInfo>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// An inspector session.
pub struct Session {
    resources: SessionResources,
    controller: InjectionController,
    navigator: Navigator,
    plugins: PluginManager,
    layout: LayoutCoordinator,
    host: Arc<SessionHost>,
    options: CollectorOptions,
    started: bool,
}

impl Session {
    /// Opens the settings file and builds a standalone session.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] or [`crate::Error::Xml`] if the settings file cannot
    /// be opened.
    pub fn new(
        config: SessionConfig,
        system: Arc<dyn WindowSystem>,
        launcher: Arc<dyn ProcessLauncher>,
    ) -> Result<Self> {
        let path = SettingsManager::resolve(config.settings_file.as_deref(), &config.data_dir);
        let settings = Arc::new(SettingsManager::open(path)?);
        let session_id = config.session_id.unwrap_or_else(random_session_id);
        let logger = SessionLogger::new(session_id, "hawkscope::session");
        let directory = Arc::new(ControlDirectory::new());

        let layout = LayoutCoordinator::new(
            system.clone(),
            Arc::new(SettingsLayoutStore::new(settings.clone())),
        );
        let controller =
            InjectionController::new(system, launcher, directory.clone(), config.controller);
        let host = Arc::new(SessionHost {
            logger: logger.clone(),
            settings: settings.clone(),
            current: RwLock::new(None),
        });

        Ok(Session {
            resources: SessionResources {
                settings,
                registry: Arc::new(TypeDescriptorRegistry::new()),
                directory,
                logger,
            },
            controller,
            navigator: Navigator::new(),
            plugins: PluginManager::new(),
            layout,
            host,
            options: config.collector,
            started: false,
        })
    }

    /// The session logger
    #[must_use]
    pub fn logger(&self) -> &SessionLogger {
        &self.resources.logger
    }

    /// Settings, registry and directory
    #[must_use]
    pub fn resources(&self) -> &SessionResources {
        &self.resources
    }

    /// The injection controller
    #[must_use]
    pub fn controller(&self) -> &InjectionController {
        &self.controller
    }

    /// Attach state of this session
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.controller.state()
    }

    /// Target history and property view
    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// The loaded plugins
    pub fn plugins_mut(&mut self) -> &mut PluginManager {
        &mut self.plugins
    }

    /// The layout coordinator
    pub fn layout_mut(&mut self) -> &mut LayoutCoordinator {
        &mut self.layout
    }

    /// The host handed to plugins
    #[must_use]
    pub fn host(&self) -> Arc<dyn Host> {
        self.host.clone()
    }

    /// True once [`Session::start`] ran
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Sets the inspector's own window, passed to bootstraps so they can close it
    pub fn set_inspector_window(&mut self, window: WindowHandle) {
        self.controller.set_inspector_window(window);
    }

    /// Adds a plugin to be created by [`Session::start`]
    pub fn register_plugin(&mut self, descriptor: PluginDescriptorRc) {
        self.plugins.register(descriptor);
    }

    /// Loads the plugins. Returns the number of plugins loaded. Later calls do nothing.
    pub fn start(&mut self) -> usize {
        if self.started {
            return self.plugins.loaded();
        }

        let logger = &self.resources.logger;
        logger.debug("Loading plugins.");
        let host: Arc<dyn Host> = self.host.clone();
        let loaded = self.plugins.load_all(&host);
        logger.debug(&format!(
            "{loaded}/{} plugins were successfully loaded.",
            self.plugins.descriptors().len()
        ));

        self.started = true;
        loaded
    }

    /// Runs standalone.
    ///
    /// Closes `window_to_kill` first, the window of an instance that relaunched this one, then
    /// starts and selects `window_to_spy` if one is given.
    ///
    /// # Errors
    /// Returns the errors of [`Session::navigate`].
    pub fn run(
        &mut self,
        window_to_spy: WindowHandle,
        window_to_kill: WindowHandle,
    ) -> Result<NavigationOutcome> {
        if !window_to_kill.is_null() {
            if let Err(error) = self.controller.system().send_close(window_to_kill) {
                self.resources
                    .logger
                    .warn(&format!("Could not close window {window_to_kill}: {error}"));
            }
        }

        let logger = &self.resources.logger;
        logger.info("Running in its own process.");
        logger.debug(&format!("Parameters: {window_to_spy}, {window_to_kill}."));
        self.start();
        self.resources.logger.debug("Initialization is complete");

        if window_to_spy.is_null() {
            self.publish();
            return Ok(NavigationOutcome::Cleared);
        }
        self.navigate(window_to_spy)
    }

    /// Runs inside the target process after an injection: closes `previous`, starts and
    /// selects `target`.
    ///
    /// # Errors
    /// Returns the errors of [`Session::navigate`].
    pub fn attach(
        &mut self,
        target: WindowHandle,
        previous: WindowHandle,
    ) -> Result<NavigationOutcome> {
        let target = self.controller.attach(target, previous);
        self.start();
        self.resources.logger.debug("Initialization is complete");
        self.navigate(target)
    }

    fn step(
        &mut self,
        step: impl FnOnce(&mut Navigator, &mut NavigationContext<'_>) -> Result<NavigationOutcome>,
    ) -> Result<NavigationOutcome> {
        let registry = Arc::clone(&self.resources.registry);
        let mut context = NavigationContext {
            controller: &mut self.controller,
            teardown: &mut self.resources,
            registry: &registry,
            options: self.options,
        };
        let outcome = step(&mut self.navigator, &mut context)?;

        if !matches!(outcome, NavigationOutcome::Injected(_) | NavigationOutcome::Highlighted) {
            self.publish();
        }
        Ok(outcome)
    }

    fn publish(&mut self) {
        let current = self.navigator.current().cloned();
        self.host.set_current(current.clone());
        self.plugins.notify_target_changed(current.as_ref());
    }

    /// Selects `window`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Launch`] if selecting the window started an injection that could
    /// not be launched.
    pub fn navigate(&mut self, window: WindowHandle) -> Result<NavigationOutcome> {
        self.step(|navigator, context| navigator.set_target(window, context))
    }

    /// Runs a toolbar action.
    ///
    /// # Errors
    /// Returns the errors of [`Navigator::execute`].
    pub fn execute(&mut self, action: NavigationAction) -> Result<NavigationOutcome> {
        self.step(|navigator, context| navigator.execute(action, context))
    }

    /// Saves settings, clears the descriptor cache and flushes the logs.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the settings cannot be saved.
    pub fn teardown(&mut self) -> Result<()> {
        let result = self.resources.teardown();
        self.controller.close();
        result
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Mutex};

    use tempfile::TempDir;

    use super::*;
    use crate::{
        config::LAYOUTS_STORE_KEY,
        host::{Plugin, PluginDescriptor},
        layout::{LayoutWindow, Rect, WindowState},
        process::{
            mock::{Journal, MockWindowSystem, RecordingLauncher},
            ControlInfo, ModuleInfo,
        },
        reflection::{MemberAccessor, Object, Value},
        test::widget_hierarchy,
        Error,
    };

    const OWN: u32 = 1;
    const TARGET: u32 = 2;
    const OWN_WINDOW: WindowHandle = WindowHandle::new(10);
    const MANAGED_WINDOW: WindowHandle = WindowHandle::new(20);

    fn system(journal: &Journal) -> MockWindowSystem {
        MockWindowSystem::new(OWN)
            .with_journal(journal)
            .with_window(OWN_WINDOW, OWN)
            .with_window(MANAGED_WINDOW, TARGET)
            .with_modules(TARGET, vec![ModuleInfo::named("clr.dll")])
    }

    fn session(dir: &TempDir, system: MockWindowSystem, launcher: RecordingLauncher) -> Session {
        let config = SessionConfig {
            data_dir: dir.path().to_path_buf(),
            session_id: Some(5),
            ..SessionConfig::default()
        };
        Session::new(config, Arc::new(system), Arc::new(launcher)).unwrap()
    }

    struct Recorder {
        seen: Arc<Mutex<Vec<Option<WindowHandle>>>>,
    }

    impl Plugin for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn on_target_changed(&mut self, target: Option<&Arc<WindowInfo>>) {
            self.seen.lock().unwrap().push(target.map(|info| info.handle()));
        }
    }

    struct RecorderDescriptor {
        seen: Arc<Mutex<Vec<Option<WindowHandle>>>>,
    }

    impl PluginDescriptor for RecorderDescriptor {
        fn name(&self) -> &str {
            "recorder"
        }

        fn version(&self) -> &str {
            "1.0"
        }

        fn create(&self, host: &Arc<dyn Host>) -> Result<Option<Box<dyn Plugin>>> {
            assert!(host.settings("").is_read_only());
            assert!(!host.settings("plugins/recorder").is_read_only());
            Ok(Some(Box::new(Recorder {
                seen: self.seen.clone(),
            })))
        }
    }

    #[test]
    fn test_new_creates_settings_file() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir, system(&Journal::new()), RecordingLauncher::default());

        assert!(dir.path().join("hawkscope.settings").exists());
        assert_eq!(session.state(), SessionState::Standalone);
        assert_eq!(session.logger().session_id(), 5);
        assert!(!session.is_started());
    }

    #[test]
    fn test_run_closes_previous_and_inspects() {
        let dir = TempDir::new().unwrap();
        let journal = Journal::new();
        let mut session = session(&dir, system(&journal), RecordingLauncher::new(&journal));

        let widgets = widget_hierarchy();
        let control = Object::new(&widgets.label);
        MemberAccessor::property_of(&control, "Name")
            .set(None, Value::from("okButton"))
            .unwrap();
        session
            .resources()
            .directory()
            .register(OWN_WINDOW, &control);

        let seen = Arc::new(Mutex::new(Vec::new()));
        session.register_plugin(Arc::new(RecorderDescriptor { seen: seen.clone() }));

        let outcome = session.run(OWN_WINDOW, MANAGED_WINDOW).unwrap();
        assert!(matches!(outcome, NavigationOutcome::Inspected { .. }));
        assert!(session.is_started());
        assert_eq!(journal.entries(), vec!["close 20"]);
        assert_eq!(*seen.lock().unwrap(), vec![Some(OWN_WINDOW)]);

        let current = session.host().current_window_info().unwrap();
        assert_eq!(
            current.control().map(|control| control.name().to_string()),
            Some("okButton".to_string())
        );
        assert!(!session.resources().registry().is_empty());
    }

    #[test]
    fn test_navigate_injects_after_teardown() {
        let dir = TempDir::new().unwrap();
        let journal = Journal::new();
        let mut session = session(&dir, system(&journal), RecordingLauncher::new(&journal));
        session.set_inspector_window(OWN_WINDOW);
        session.start();

        let outcome = session.navigate(MANAGED_WINDOW).unwrap();
        let NavigationOutcome::Injected(command) = outcome else {
            panic!("expected an injection, got {outcome:?}");
        };

        assert_eq!(command.args[0], "20");
        assert_eq!(command.args[1], "10");
        assert_eq!(session.state(), SessionState::Closed);
        // Teardown saved the settings, which leaves a backup of the previous file behind.
        assert!(dir.path().join("hawkscope.settings.bak").exists());
        assert_eq!(
            journal.entries(),
            vec![format!("launch {}", command.command_line())]
        );
        assert!(session.host().current_window_info().is_none());
    }

    #[test]
    fn test_failed_launch_keeps_session() {
        let dir = TempDir::new().unwrap();
        let journal = Journal::new();
        let mut session = session(
            &dir,
            system(&journal),
            RecordingLauncher::new(&journal).failing("missing bootstrap"),
        );

        let result = session.navigate(MANAGED_WINDOW);
        assert!(matches!(result, Err(Error::Launch { .. })));
        assert_eq!(session.state(), SessionState::Standalone);
    }

    #[test]
    fn test_attach_marks_injected() {
        let dir = TempDir::new().unwrap();
        let journal = Journal::new();
        let system = MockWindowSystem::new(TARGET)
            .with_journal(&journal)
            .with_window(MANAGED_WINDOW, TARGET)
            .with_window(OWN_WINDOW, OWN)
            .with_modules(TARGET, vec![ModuleInfo::named("clr.dll")]);
        let mut session = session(&dir, system, RecordingLauncher::new(&journal));

        let outcome = session.attach(MANAGED_WINDOW, OWN_WINDOW).unwrap();
        assert!(matches!(outcome, NavigationOutcome::Native));
        assert_eq!(session.state(), SessionState::Injected);
        assert_eq!(journal.entries(), vec!["close 10"]);
    }

    #[test]
    fn test_history_actions() {
        let dir = TempDir::new().unwrap();
        let journal = Journal::new();
        let system = system(&journal).with_window(WindowHandle::new(30), OWN);
        let mut session = session(&dir, system, RecordingLauncher::new(&journal));

        session.navigate(OWN_WINDOW).unwrap();
        session.navigate(WindowHandle::new(30)).unwrap();
        assert_eq!(session.navigator().target(), WindowHandle::new(30));

        session.execute(NavigationAction::Previous).unwrap();
        assert_eq!(session.navigator().target(), OWN_WINDOW);

        let outcome = session.execute(NavigationAction::Highlight).unwrap();
        assert!(matches!(outcome, NavigationOutcome::Highlighted));
        assert_eq!(journal.entries(), vec!["highlight 10"]);
    }

    struct Form {
        bounds: Rect,
        state: WindowState,
    }

    impl LayoutWindow for Form {
        fn bounds(&self) -> Rect {
            self.bounds
        }

        fn set_bounds(&mut self, bounds: Rect) {
            self.bounds = bounds;
        }

        fn window_state(&self) -> WindowState {
            self.state
        }

        fn set_window_state(&mut self, state: WindowState) {
            self.state = state;
        }
    }

    #[test]
    fn test_layouts_survive_sessions() {
        let dir = TempDir::new().unwrap();
        let mut form = Form {
            bounds: Rect::new(0, 0, 100, 100),
            state: WindowState::Normal,
        };

        {
            let mut session = session(&dir, system(&Journal::new()), RecordingLauncher::default());
            let layout = session.layout_mut();
            layout.register("main", &mut form);
            form.bounds = Rect::new(50, 60, 700, 500);
            layout.on_closed("main", &mut form).unwrap();
            session.teardown().unwrap();
        }

        let text = fs::read_to_string(dir.path().join("hawkscope.settings")).unwrap();
        assert!(text.contains(r#"<bounds value="50, 60, 700, 500"/>"#));

        let mut session = session(&dir, system(&Journal::new()), RecordingLauncher::default());
        assert!(session
            .resources()
            .settings()
            .store(LAYOUTS_STORE_KEY)
            .content()
            .contains("50, 60, 700, 500"));

        let mut restored = Form {
            bounds: Rect::default(),
            state: WindowState::Maximized,
        };
        session.layout_mut().register("main", &mut restored);
        assert_eq!(restored.bounds, Rect::new(50, 60, 700, 500));
        assert_eq!(restored.state, WindowState::Normal);
    }

    #[test]
    fn test_control_info_name_falls_back_to_type() {
        let widgets = widget_hierarchy();
        let control = Object::new(&widgets.control);
        assert_eq!(ControlInfo::new(&control).name(), "Control");
    }
}
