//! Target windows, their processes, and moving the inspector into them.
//!
//! # Architecture
//!
//! - [`window`] - handles and the [`WindowInfo`] snapshot of a candidate target
//! - [`detect`] - runtime and bitness detection from module lists
//! - [`image`] - PE probing used to read the runtime version of `mscorlib`
//! - [`directory`] - the handle to live object map of the inspector's own process
//! - [`platform`] - the [`WindowSystem`] seam, its Windows implementation and the mock behind
//!   the `testing` feature
//! - [`launcher`] - the [`ProcessLauncher`] seam
//! - [`controller`] - the inject/attach decision and handoff
//! - [`bootstrap`] - the protocol the launched bootstrap runs
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use hawkscope::process::{
//!     mock::{Journal, MockWindowSystem, RecordingLauncher},
//!     Bitness, Clr, ControlDirectory, ControllerConfig, InjectionController, ModuleInfo,
//!     WindowHandle,
//! };
//!
//! let journal = Journal::new();
//! let system = MockWindowSystem::new(1)
//!     .with_bitness(Bitness::X64)
//!     .with_window(WindowHandle::new(42), 7)
//!     .with_modules(7, vec![ModuleInfo::named("clr.dll")]);
//! let controller = InjectionController::new(
//!     Arc::new(system),
//!     Arc::new(RecordingLauncher::new(&journal)),
//!     Arc::new(ControlDirectory::new()),
//!     ControllerConfig::default(),
//! );
//!
//! let info = controller.build_window_info(WindowHandle::new(42)).unwrap();
//! assert_eq!(info.clr(), Clr::Net4);
//! assert!(controller.can_inject(Some(&info)));
//! ```

pub mod bootstrap;
mod controller;
mod detect;
mod directory;
pub mod image;
mod launcher;
pub mod platform;
mod window;

pub use controller::{ControllerConfig, InjectionController, SessionState, Teardown};
pub use detect::{detect_bitness, detect_clr};
pub use directory::ControlDirectory;
pub use launcher::{LaunchCommand, LaunchTarget, ProcessLauncher, StdLauncher};
#[cfg(any(test, feature = "testing"))]
pub use platform::mock;
pub use platform::WindowSystem;
pub use window::{Bitness, Clr, ControlInfo, ModuleInfo, WindowHandle, WindowInfo};
