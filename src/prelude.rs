//! # hawkscope Prelude
//!
//! This module re-exports the most commonly used types and traits of the hawkscope library.
//! Import it to get quick access to the runtime type model, descriptors and the session.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all hawkscope operations
pub use crate::Error;

/// The result type used throughout hawkscope
pub use crate::Result;

/// Failures raised by invoked members
pub use crate::reflection::InvokeError;

// ================================================================================================
// Runtime Type Model
// ================================================================================================

/// Types and their construction
pub use crate::reflection::{
    EventDef, FieldDef, MemberDef, MethodDef, ParameterInfo, PropertyDef, RuntimeType,
    TypeBuilder, TypeRc,
};

/// Instances and values
pub use crate::reflection::{Object, ObjectRef, Unwrappable, Value};

/// Members and binding criteria
pub use crate::reflection::{BindingFlags, Member, MemberAttributes, MemberKind, Visibility};

// ================================================================================================
// Member Access and Inspection
// ================================================================================================

/// Resolved member handles
pub use crate::reflection::{AccessorKind, MemberAccessor};

/// Point-in-time listings and dotted path resolution
pub use crate::reflection::{inspect, resolve_path};

// ================================================================================================
// Property Descriptors
// ================================================================================================

/// The descriptor contract and its shared reference
pub use crate::descriptor::{DescriptorRc, PropertyDescriptor};

/// Row collection, filtering and the per-session cache
pub use crate::descriptor::{filter, CollectorOptions, PropertyCollector, TypeDescriptorRegistry};

// ================================================================================================
// Processes and Injection
// ================================================================================================

/// Window information
pub use crate::process::{Bitness, Clr, ControlInfo, ModuleInfo, WindowHandle, WindowInfo};

/// Injection decisions and the platform seam
pub use crate::process::{
    ControlDirectory, InjectionController, LaunchCommand, ProcessLauncher, SessionState,
    WindowSystem,
};

// ================================================================================================
// Navigation, Layout and Session
// ================================================================================================

/// History and the navigator
pub use crate::navigation::{History, NavigationAction, NavigationOutcome, Navigator};

/// Window layouts
pub use crate::layout::{FormLayoutData, LayoutCoordinator, LayoutWindow, Rect, WindowState};

/// Settings
pub use crate::config::{SettingsManager, SettingsStore};

/// Plugins and the host surface
pub use crate::host::{Host, Plugin, PluginDescriptor, SessionLogger};

/// The session
pub use crate::session::{Session, SessionConfig};
