//! Dynamic runtime type model and member resolution.
//!
//! Live objects of types nobody compiled against are described by [`RuntimeType`]s and reached
//! through [`MemberAccessor`]s. The accessor engine resolves members with ordered,
//! widening [`BindingFlags`] search plans, and the [`inspect`] function renders a flat listing
//! of an object's public surface.

mod accessor;
pub mod binding;
mod flags;
mod inspector;
mod invoke;
mod object;
mod types;
mod value;

pub use accessor::{AccessorKind, MemberAccessor};
pub use binding::{Lookup, MemberMatch};
pub use flags::{
    BindingFlags, MemberAttributes, SearchStep, Visibility, FIELD_SEARCH_ORDER,
    METHOD_SEARCH_ORDER, PROPERTY_SEARCH_ORDER,
};
pub use inspector::{inspect, resolve_path};
pub(crate) use inspector::short_type_name;
pub use invoke::InvokeError;
pub use object::{Object, ObjectRef};
pub use types::{
    EventDef, FieldDef, Getter, Invoker, Member, MemberBody, MemberDef, MemberKind, MemberRc,
    MethodDef, ParameterInfo, PropertyDef, RuntimeType, Setter, TypeBuilder, TypeRc,
};
pub use value::{ProxyRef, Unwrappable, Value, MAX_UNWRAP_DEPTH};

use crate::Error;

/// The message a user should see for a failed member operation.
///
/// Invocation failures show their inner message; everything else its display form.
#[must_use]
pub fn failure_message(error: &Error) -> String {
    match error {
        Error::Invoke(invoke) => invoke.display_message(),
        other => other.to_string(),
    }
}
