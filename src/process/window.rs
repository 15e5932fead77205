//! Window handles and what is known about a candidate target window.

use std::{
    fmt,
    path::PathBuf,
    str::FromStr,
    sync::{Arc, Weak},
};

use log::warn;
use strum::{Display, EnumIter, EnumString};

use crate::{
    process::ControlDirectory,
    reflection::{MemberAccessor, Object, ObjectRef, Unwrappable, Value},
    Error, Result,
};

/// A native window handle.
///
/// Formats as a decimal integer, which is also how handles travel on command lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct WindowHandle(isize);

impl WindowHandle {
    /// The null handle
    pub const NULL: WindowHandle = WindowHandle(0);

    /// Wraps a raw handle value
    #[must_use]
    pub const fn new(raw: isize) -> Self {
        WindowHandle(raw)
    }

    /// The raw handle value
    #[must_use]
    pub const fn raw(self) -> isize {
        self.0
    }

    /// True for the null handle
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WindowHandle {
    type Err = Error;

    /// Accepts decimal (`4325634`) and hexadecimal (`0x420202`) handles.
    fn from_str(text: &str) -> Result<Self> {
        let text = text.trim();
        let parsed = match text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
        {
            Some(hex) => isize::from_str_radix(hex, 16),
            None => text.parse::<isize>(),
        };

        parsed
            .map(WindowHandle)
            .map_err(|_| Error::InvalidArgument(format!("'{text}' is not a window handle")))
    }
}

/// Managed runtime detected in a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum Clr {
    /// No managed runtime is loaded
    None,
    /// A managed runtime no bootstrap exists for
    Unsupported,
    /// The modules could not be examined, usually across a bitness boundary
    Undefined,
    /// CLR 2.0 (.NET 2.0 to 3.5)
    Net2,
    /// CLR 4.0 (.NET 4.x)
    Net4,
}

impl Clr {
    /// Bootstrap name tag, for the runtimes a bootstrap exists for
    #[must_use]
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Clr::Net2 => Some("N2"),
            Clr::Net4 => Some("N4"),
            Clr::None | Clr::Unsupported | Clr::Undefined => None,
        }
    }
}

/// Process bitness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum Bitness {
    /// 32-bit
    #[strum(serialize = "x86")]
    X86,
    /// 64-bit
    #[strum(serialize = "x64")]
    X64,
}

impl Bitness {
    /// Bitness of the running inspector
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_pointer_width = "64") {
            Bitness::X64
        } else {
            Bitness::X86
        }
    }
}

/// A module loaded in a process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleInfo {
    /// File name, e.g. `mscorlib.ni.dll`
    pub name: String,
    /// Full path, when known
    pub path: Option<PathBuf>,
    /// Major runtime version recorded in the module's metadata, when it is a managed image
    pub runtime_major: Option<u32>,
}

impl ModuleInfo {
    /// A module known only by name
    #[must_use]
    pub fn named(name: &str) -> Self {
        ModuleInfo {
            name: name.to_string(),
            ..ModuleInfo::default()
        }
    }

    /// Sets the runtime major version
    #[must_use]
    pub fn with_runtime(mut self, major: u32) -> Self {
        self.runtime_major = Some(major);
        self
    }
}

/// Non-owning view of the live object behind a window.
///
/// The object belongs to the inspected application; once it is gone the info keeps its name but
/// [`ControlInfo::object`] returns `None`.
#[derive(Debug, Clone)]
pub struct ControlInfo {
    object: Weak<Object>,
    name: String,
    type_name: String,
}

impl ControlInfo {
    /// Describes `object`. The display name is its `Name` property when that is a non-empty
    /// string, its type name otherwise.
    #[must_use]
    pub fn new(object: &ObjectRef) -> Self {
        let type_name = object.runtime_type().name().to_string();
        let own_name = MemberAccessor::property_of(object, "Name")
            .get(None)
            .ok()
            .and_then(|value| value.as_str().map(str::to_string))
            .filter(|name| !name.is_empty());

        ControlInfo {
            object: Arc::downgrade(object),
            name: own_name.unwrap_or_else(|| type_name.clone()),
            type_name,
        }
    }

    /// Looks up the object registered for `handle`, logging when there is none.
    #[must_use]
    pub fn from_handle(directory: &ControlDirectory, handle: WindowHandle) -> Option<Self> {
        match directory.lookup(handle) {
            Some(object) => Some(ControlInfo::new(&object)),
            None => {
                warn!("No control is associated with window {handle}");
                None
            }
        }
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short type name of the object
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The object, while it is alive
    #[must_use]
    pub fn object(&self) -> Option<ObjectRef> {
        self.object.upgrade()
    }
}

impl Unwrappable for ControlInfo {
    fn inner_value(&self) -> Value {
        self.object().map_or(Value::Null, Value::Object)
    }
}

/// Everything known about a candidate target window. Immutable once built.
#[derive(Debug, Clone)]
pub struct WindowInfo {
    handle: WindowHandle,
    process_id: u32,
    clr: Clr,
    bitness: Bitness,
    modules: Vec<ModuleInfo>,
    control: Option<Arc<ControlInfo>>,
}

impl WindowInfo {
    /// Assembles a window info
    #[must_use]
    pub fn new(
        handle: WindowHandle,
        process_id: u32,
        clr: Clr,
        bitness: Bitness,
        modules: Vec<ModuleInfo>,
        control: Option<ControlInfo>,
    ) -> Self {
        WindowInfo {
            handle,
            process_id,
            clr,
            bitness,
            modules,
            control: control.map(Arc::new),
        }
    }

    /// The window
    #[must_use]
    pub fn handle(&self) -> WindowHandle {
        self.handle
    }

    /// Owning process
    #[must_use]
    pub fn process_id(&self) -> u32 {
        self.process_id
    }

    /// Detected managed runtime
    #[must_use]
    pub fn clr(&self) -> Clr {
        self.clr
    }

    /// Detected bitness of the owning process
    #[must_use]
    pub fn bitness(&self) -> Bitness {
        self.bitness
    }

    /// Modules seen in the owning process
    #[must_use]
    pub fn modules(&self) -> &[ModuleInfo] {
        &self.modules
    }

    /// The live object behind the window, when running inside the owning process
    #[must_use]
    pub fn control(&self) -> Option<&Arc<ControlInfo>> {
        self.control.as_ref()
    }

    /// A multi-line description for the dump view.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut text = format!(
            "Handle:     {}\nProcess:    {}\nCLR:        {}\nBitness:    {}\n",
            self.handle, self.process_id, self.clr, self.bitness
        );
        match &self.control {
            Some(control) => {
                text.push_str(&format!(
                    "Control:    {} ({})\n",
                    control.name(),
                    control.type_name()
                ));
            }
            None => text.push_str("Control:    (none)\n"),
        }
        text.push_str(&format!("Modules:    {}\n", self.modules.len()));
        for module in &self.modules {
            match module.runtime_major {
                Some(major) => text.push_str(&format!("  {} (runtime v{major})\n", module.name)),
                None => text.push_str(&format!("  {}\n", module.name)),
            }
        }
        text
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.control {
            Some(control) => write!(f, "{} [{}]", control.name(), self.handle),
            None => write!(
                f,
                "[{}] pid {} ({}, {})",
                self.handle, self.process_id, self.clr, self.bitness
            ),
        }
    }
}
