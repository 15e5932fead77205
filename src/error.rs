use thiserror::Error;

use crate::{process::WindowHandle, reflection::InvokeError};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Member Errors
/// - [`Error::InvalidAccessor`] - A member could not be resolved anywhere in the hierarchy
/// - [`Error::Invoke`] - Reading, writing or invoking a resolved member failed
///
/// ## Session Errors
/// - [`Error::InvalidState`] - An operation is not allowed in the current state
/// - [`Error::InvalidArgument`] - An argument was rejected
/// - [`Error::ReadOnly`] - A write was attempted on a read-only settings store
/// - [`Error::Plugin`] - A plugin failed to load
///
/// ## Process and Window Errors
/// - [`Error::WindowNotFound`] - The handle does not identify a live window
/// - [`Error::Platform`] - The native window system reported a failure
/// - [`Error::Launch`] - Spawning the bootstrap or main executable failed
///
/// ## I/O and Format Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::GoblinErr`] - PE parsing errors from the goblin crate
/// - [`Error::Xml`] - Settings or layout XML could not be read or written
/// - [`Error::Malformed`] - Structurally invalid input
#[derive(Error, Debug)]
pub enum Error {
    /// The input is damaged or does not follow the expected structure.
    ///
    /// Carries the source location that detected the problem.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Error from the goblin crate while probing a PE image.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// The accessor could not resolve its member on the target type or any base type.
    ///
    /// Returned by `get`, `set` and `invoke` on an accessor for which `is_valid` is false.
    #[error("Invalid {kind} accessor - '{member}' was not found on '{type_name}'")]
    InvalidAccessor {
        /// Field, Property or Method
        kind: String,
        /// The requested member name
        member: String,
        /// The full name of the type the search started from
        type_name: String,
    },

    /// A resolved member failed while being read, written or invoked.
    #[error(transparent)]
    Invoke(#[from] InvokeError),

    /// The operation is not valid in the current state.
    #[error("Invalid state - {0}")]
    InvalidState(String),

    /// An argument was rejected.
    #[error("Invalid argument - {0}")]
    InvalidArgument(String),

    /// Writing to a read-only settings store.
    #[error("This Settings Store is Read-Only.")]
    ReadOnly,

    /// The handle does not identify a live window.
    #[error("Window not found - {0}")]
    WindowNotFound(WindowHandle),

    /// The native window system reported a failure.
    #[error("Platform error - {0}")]
    Platform(String),

    /// Spawning a process failed.
    #[error("Failed to launch '{program}' - {source}")]
    Launch {
        /// The executable that was started
        program: String,
        /// The underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Settings or layout XML could not be processed.
    #[error("Xml error - {0}")]
    Xml(String),

    /// A plugin could not be created.
    #[error("Plugin error - {0}")]
    Plugin(String),

    /// A proxy chain or path walk exceeded its iteration cap.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),
}

impl From<quick_xml::Error> for Error {
    fn from(error: quick_xml::Error) -> Self {
        Error::Xml(error.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(error: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(error.to_string())
    }
}
