//! Failures raised while reading, writing or invoking a resolved member.

use thiserror::Error;

/// A member invocation failure.
///
/// Descriptors never propagate these; they turn them into a display message through
/// [`InvokeError::display_message`] and keep that message as their sticky error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    /// The caller is not allowed to access the member.
    #[error("{0}")]
    Security(String),

    /// The target object is not an instance of the member's declaring type.
    #[error("Object does not match target type. Expected '{expected}', got '{actual}'.")]
    TargetMismatch {
        /// Full name of the declaring type
        expected: String,
        /// Full name of the object's runtime type
        actual: String,
    },

    /// A method was invoked with the wrong number of arguments.
    #[error("Parameter count mismatch. Expected {expected}, got {actual}.")]
    ParameterCount {
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// The member body itself failed; the inner message is what users care about.
    #[error("Exception has been thrown by the target of an invocation.")]
    TargetInvocation(String),

    /// An instance member was used without an instance.
    #[error("Non-static member requires a target.")]
    NullTarget,

    /// The property has no getter.
    #[error("No Get Method.")]
    NoGetMethod,

    /// The property has no setter.
    #[error("No Set Method.")]
    NoSetMethod,

    /// The supplied value cannot be stored in the member.
    #[error("{0}")]
    Argument(String),
}

impl InvokeError {
    /// The message shown to users, unwrapping target invocation failures to their inner message.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            InvokeError::TargetInvocation(inner) => inner.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_message_unwraps_inner() {
        let error = InvokeError::TargetInvocation("Handle is not created.".to_string());
        assert_eq!(error.display_message(), "Handle is not created.");
        assert_eq!(
            error.to_string(),
            "Exception has been thrown by the target of an invocation."
        );
        assert_eq!(InvokeError::NoSetMethod.display_message(), "No Set Method.");
    }
}
