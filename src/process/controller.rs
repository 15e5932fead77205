//! The attach/inject decision and the handoff to a bootstrap.
//!
//! An inspector can only browse objects living in its own process. When the user picks a window
//! owned by another managed process, the controller tears the session down and launches the
//! bootstrap matching the target's runtime and bitness. The bootstrap injects the attach
//! payload, and the inspector starts over inside the target, calling [`InjectionController::attach`]
//! to close the window it was launched from.

use std::{path::PathBuf, sync::Arc};

use log::{debug, error, info, warn};
use strum::Display;

use crate::{
    process::{
        detect_bitness, detect_clr, Bitness, Clr, ControlDirectory, ControlInfo, LaunchCommand,
        LaunchTarget, ProcessLauncher, WindowHandle, WindowInfo, WindowSystem,
    },
    Error, Result,
};

/// Lifecycle of an inspector session relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionState {
    /// Running in its own process
    Standalone,
    /// Tearing down before a bootstrap launch
    AttemptingAttach,
    /// Running inside the target process
    Injected,
    /// Handed off to a bootstrap; this session is over
    Closed,
}

/// Installation layout and attach entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Directory holding the bootstraps and the main executable
    pub install_dir: PathBuf,
    /// Bootstrap file name prefix; the runtime tag, bitness and `.exe` are appended
    pub bootstrap_prefix: String,
    /// File name of the main executable
    pub main_executable: String,
    /// Assembly loaded into the target
    pub attach_assembly: PathBuf,
    /// Type exposing the attach method
    pub attach_type: String,
    /// Attach method name
    pub attach_method: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            install_dir: PathBuf::from("."),
            bootstrap_prefix: "HawkscopeBootstrap".to_string(),
            main_executable: "Hawkscope.exe".to_string(),
            attach_assembly: PathBuf::from("Hawkscope.Core.dll"),
            attach_type: "Hawkscope.HawkscopeAttacher".to_string(),
            attach_method: "Attach".to_string(),
        }
    }
}

/// Releases session resources before the process hands over to a bootstrap.
///
/// The bootstrap's new inspector instance opens the same settings and log files, so they must
/// be flushed and released first.
pub trait Teardown {
    /// Saves and releases everything the session holds
    ///
    /// # Errors
    /// Returns the first failure. The handoff continues regardless.
    fn teardown(&mut self) -> Result<()>;
}

/// Decides whether and how to move the inspector into a target process.
pub struct InjectionController {
    system: Arc<dyn WindowSystem>,
    launcher: Arc<dyn ProcessLauncher>,
    directory: Arc<ControlDirectory>,
    config: ControllerConfig,
    state: SessionState,
    inspector_window: WindowHandle,
}

impl InjectionController {
    /// A standalone controller
    pub fn new(
        system: Arc<dyn WindowSystem>,
        launcher: Arc<dyn ProcessLauncher>,
        directory: Arc<ControlDirectory>,
        config: ControllerConfig,
    ) -> Self {
        InjectionController {
            system,
            launcher,
            directory,
            config,
            state: SessionState::Standalone,
            inspector_window: WindowHandle::NULL,
        }
    }

    /// Current session state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The installation layout
    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// The window system in use
    #[must_use]
    pub fn system(&self) -> &Arc<dyn WindowSystem> {
        &self.system
    }

    /// The directory of live controls in this process
    #[must_use]
    pub fn directory(&self) -> &Arc<ControlDirectory> {
        &self.directory
    }

    /// Sets the inspector's own window, passed to bootstraps so the next instance can close it
    pub fn set_inspector_window(&mut self, window: WindowHandle) {
        self.inspector_window = window;
    }

    /// The inspector's own window
    #[must_use]
    pub fn inspector_window(&self) -> WindowHandle {
        self.inspector_window
    }

    /// Whether picking `info` should move the inspector into its process.
    ///
    /// Managed targets in another process qualify. A 32-bit inspector cannot read the modules of
    /// a 64-bit process, so an [`Clr::Undefined`] x64 target also qualifies: the main executable
    /// is relaunched as 64-bit to look again.
    #[must_use]
    pub fn can_inject(&self, info: Option<&WindowInfo>) -> bool {
        let Some(info) = info else {
            return false;
        };

        if info.process_id() == self.system.current_process_id() {
            return false;
        }

        match info.clr() {
            Clr::None | Clr::Unsupported => false,
            Clr::Undefined => {
                self.system.inspector_bitness() == Bitness::X86 && info.bitness() == Bitness::X64
            }
            Clr::Net2 | Clr::Net4 => true,
        }
    }

    /// The executable that handles a target with runtime `clr` and bitness `bitness`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] for runtimes no bootstrap exists for.
    pub fn bootstrap_for(&self, clr: Clr, bitness: Bitness) -> Result<LaunchTarget> {
        if clr == Clr::Undefined
            && self.system.inspector_bitness() == Bitness::X86
            && bitness == Bitness::X64
        {
            return Ok(LaunchTarget::MainExecutable);
        }

        match clr.tag() {
            Some(tag) => Ok(LaunchTarget::Bootstrap(format!(
                "{}{tag}{bitness}.exe",
                self.config.bootstrap_prefix
            ))),
            None => Err(Error::InvalidArgument(format!("Clr Value {clr} is invalid."))),
        }
    }

    /// The command an injection into `info`'s process would run.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if no executable handles `info`.
    pub fn launch_command(&self, info: &WindowInfo) -> Result<LaunchCommand> {
        let target = self.bootstrap_for(info.clr(), info.bitness())?;
        let program = match &target {
            LaunchTarget::Bootstrap(name) => self.config.install_dir.join(name),
            LaunchTarget::MainExecutable => {
                self.config.install_dir.join(&self.config.main_executable)
            }
        };

        Ok(LaunchCommand {
            target,
            program,
            args: vec![
                info.handle().to_string(),
                self.inspector_window.to_string(),
                self.config.attach_assembly.display().to_string(),
                self.config.attach_type.clone(),
                self.config.attach_method.clone(),
            ],
        })
    }

    /// Tears the session down and launches the executable that takes over `info`.
    ///
    /// On success the session is [`SessionState::Closed`]. A failed launch leaves the session in
    /// the state it was in before the attempt.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if `info` does not qualify for injection and
    /// [`Error::Launch`] if the executable could not be started.
    pub fn inject(
        &mut self,
        info: &WindowInfo,
        teardown: &mut dyn Teardown,
    ) -> Result<LaunchCommand> {
        if !self.can_inject(Some(info)) {
            return Err(Error::InvalidState(format!(
                "Window {} cannot be injected",
                info.handle()
            )));
        }

        let prior = self.state;
        self.state = SessionState::AttemptingAttach;

        let command = match self.launch_command(info) {
            Ok(command) => command,
            Err(error) => {
                self.state = prior;
                return Err(error);
            }
        };

        info!("Starting a new instance: {}", command.program.display());
        debug!("Command is: {}", command.command_line());

        if let Err(error) = teardown.teardown() {
            warn!("Teardown before injection was incomplete: {error}");
        }

        match self.launcher.launch(&command) {
            Ok(()) => {
                self.state = SessionState::Closed;
                Ok(command)
            }
            Err(error) => {
                error!("Could not launch {}: {error}", command.program.display());
                self.state = prior;
                Err(error)
            }
        }
    }

    /// Completes a handoff inside the target process.
    ///
    /// Closes `previous`, the window of the instance that launched the bootstrap, and returns
    /// the window the new session should inspect.
    pub fn attach(&mut self, target: WindowHandle, previous: WindowHandle) -> WindowHandle {
        self.state = SessionState::Injected;

        if !previous.is_null() {
            if let Err(error) = self.system.send_close(previous) {
                warn!("Could not close the previous instance window {previous}: {error}");
            }
        }

        match self.system.process_of(target) {
            Ok(process_id) => info!("Running attached to process {process_id}"),
            Err(error) => warn!("Attached to an unknown window: {error}"),
        }

        target
    }

    /// Marks the session as over
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    /// Gathers what is known about `window`. Failures are logged and yield `None`.
    #[must_use]
    pub fn build_window_info(&self, window: WindowHandle) -> Option<Arc<WindowInfo>> {
        if window.is_null() {
            return None;
        }

        let process_id = match self.system.process_of(window) {
            Ok(process_id) => process_id,
            Err(error) => {
                error!("Cannot inspect window {window}: {error}");
                return None;
            }
        };

        let modules = self.system.modules(process_id);
        let clr = detect_clr(&modules);
        let bitness = detect_bitness(self.system.inspector_bitness(), &modules);
        let control = if process_id == self.system.current_process_id() {
            ControlInfo::from_handle(&self.directory, window)
        } else {
            None
        };

        debug!("Window {window}: process {process_id}, {clr}, {bitness}");
        Some(Arc::new(WindowInfo::new(
            window, process_id, clr, bitness, modules, control,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{
        mock::{Journal, MockWindowSystem, RecordingLauncher},
        ModuleInfo,
    };

    const OWN: u32 = 1;
    const TARGET: u32 = 2;

    struct JournalTeardown(Journal);

    impl Teardown for JournalTeardown {
        fn teardown(&mut self) -> Result<()> {
            self.0.record("teardown");
            Ok(())
        }
    }

    fn controller(
        system: MockWindowSystem,
        launcher: RecordingLauncher,
    ) -> InjectionController {
        let mut controller = InjectionController::new(
            Arc::new(system),
            Arc::new(launcher),
            Arc::new(ControlDirectory::new()),
            ControllerConfig::default(),
        );
        controller.set_inspector_window(WindowHandle::new(900));
        controller
    }

    fn info(process_id: u32, clr: Clr, bitness: Bitness) -> WindowInfo {
        WindowInfo::new(WindowHandle::new(10), process_id, clr, bitness, Vec::new(), None)
    }

    #[test]
    fn test_can_inject() {
        let journal = Journal::new();
        let x64 = controller(
            MockWindowSystem::new(OWN).with_bitness(Bitness::X64),
            RecordingLauncher::new(&journal),
        );
        let x86 = controller(
            MockWindowSystem::new(OWN).with_bitness(Bitness::X86),
            RecordingLauncher::new(&journal),
        );

        assert!(!x64.can_inject(None));
        assert!(!x64.can_inject(Some(&info(OWN, Clr::Net4, Bitness::X64))));
        assert!(!x64.can_inject(Some(&info(TARGET, Clr::None, Bitness::X64))));
        assert!(!x64.can_inject(Some(&info(TARGET, Clr::Unsupported, Bitness::X64))));
        assert!(x64.can_inject(Some(&info(TARGET, Clr::Net2, Bitness::X86))));
        assert!(x64.can_inject(Some(&info(TARGET, Clr::Net4, Bitness::X64))));

        assert!(!x64.can_inject(Some(&info(TARGET, Clr::Undefined, Bitness::X64))));
        assert!(x86.can_inject(Some(&info(TARGET, Clr::Undefined, Bitness::X64))));
        assert!(!x86.can_inject(Some(&info(TARGET, Clr::Undefined, Bitness::X86))));
    }

    #[test]
    fn test_bootstrap_for() {
        let journal = Journal::new();
        let x86 = controller(
            MockWindowSystem::new(OWN).with_bitness(Bitness::X86),
            RecordingLauncher::new(&journal),
        );

        assert_eq!(
            x86.bootstrap_for(Clr::Net4, Bitness::X86).unwrap(),
            LaunchTarget::Bootstrap("HawkscopeBootstrapN4x86.exe".to_string())
        );
        assert_eq!(
            x86.bootstrap_for(Clr::Net2, Bitness::X64).unwrap(),
            LaunchTarget::Bootstrap("HawkscopeBootstrapN2x64.exe".to_string())
        );
        assert_eq!(
            x86.bootstrap_for(Clr::Undefined, Bitness::X64).unwrap(),
            LaunchTarget::MainExecutable
        );
        assert!(matches!(
            x86.bootstrap_for(Clr::None, Bitness::X86),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_inject_tears_down_before_launch() {
        let journal = Journal::new();
        let mut controller = controller(
            MockWindowSystem::new(OWN).with_bitness(Bitness::X64),
            RecordingLauncher::new(&journal),
        );
        let mut teardown = JournalTeardown(journal.clone());

        let command = controller
            .inject(&info(TARGET, Clr::Net4, Bitness::X64), &mut teardown)
            .unwrap();

        assert_eq!(controller.state(), SessionState::Closed);
        assert_eq!(
            command.args,
            [
                "10",
                "900",
                "Hawkscope.Core.dll",
                "Hawkscope.HawkscopeAttacher",
                "Attach"
            ]
        );
        let entries = journal.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], "teardown");
        assert!(entries[1].starts_with("launch ") && entries[1].contains("HawkscopeBootstrapN4x64.exe"));
    }

    #[test]
    fn test_failed_launch_restores_state() {
        let journal = Journal::new();
        let mut controller = controller(
            MockWindowSystem::new(OWN).with_bitness(Bitness::X64),
            RecordingLauncher::new(&journal).failing("no such file"),
        );
        let mut teardown = JournalTeardown(journal.clone());

        let result = controller.inject(&info(TARGET, Clr::Net2, Bitness::X86), &mut teardown);
        assert!(matches!(result, Err(Error::Launch { .. })));
        assert_eq!(controller.state(), SessionState::Standalone);
    }

    #[test]
    fn test_inject_rejects_own_process() {
        let journal = Journal::new();
        let mut controller = controller(
            MockWindowSystem::new(OWN),
            RecordingLauncher::new(&journal),
        );
        let mut teardown = JournalTeardown(journal.clone());

        let result = controller.inject(&info(OWN, Clr::Net4, Bitness::X64), &mut teardown);
        assert!(matches!(result, Err(Error::InvalidState(_))));
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn test_attach_closes_previous() {
        let journal = Journal::new();
        let system = MockWindowSystem::new(TARGET)
            .with_window(WindowHandle::new(10), TARGET)
            .with_window(WindowHandle::new(900), OWN)
            .with_journal(&journal);
        let mut controller = controller(system, RecordingLauncher::new(&journal));

        let target = controller.attach(WindowHandle::new(10), WindowHandle::new(900));
        assert_eq!(target, WindowHandle::new(10));
        assert_eq!(controller.state(), SessionState::Injected);
        assert_eq!(journal.entries(), ["close 900"]);
    }

    #[test]
    fn test_build_window_info() {
        let journal = Journal::new();
        let system = MockWindowSystem::new(OWN)
            .with_bitness(Bitness::X64)
            .with_window(WindowHandle::new(10), TARGET)
            .with_modules(
                TARGET,
                vec![ModuleInfo::named("app.exe"), ModuleInfo::named("clr.dll")],
            );
        let controller = controller(system, RecordingLauncher::new(&journal));

        let info = controller.build_window_info(WindowHandle::new(10)).unwrap();
        assert_eq!(info.process_id(), TARGET);
        assert_eq!(info.clr(), Clr::Net4);
        assert_eq!(info.bitness(), Bitness::X64);
        assert!(info.control().is_none());

        assert!(controller.build_window_info(WindowHandle::new(11)).is_none());
        assert!(controller.build_window_info(WindowHandle::NULL).is_none());
    }
}
