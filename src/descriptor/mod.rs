//! Property descriptors over resolved members.
//!
//! A property grid does not care whether a row is an instance property, a static property, an
//! event or the synthetic type row: it only needs a name, a category, a type, a read-only flag
//! and get/set. [`PropertyDescriptor`] is that contract.
//!
//! # Error semantics
//!
//! `get_value` and `set_value` never fail. Property descriptors keep the message of the first
//! failure in a [`StickyError`]. While an error is recorded, `get_value` returns it as
//! [`Value::Str`] without touching the member again, so a grid refresh cannot hammer a getter
//! that keeps throwing. `set_value` always attempts the write; a successful write clears the
//! recorded error and a failed one replaces it. [`PropertyDescriptor::clear_error`] resets it
//! explicitly.
//!
//! # Key Components
//!
//! - [`InstancePropertyDescriptor`] / [`StaticPropertyDescriptor`] - field and property rows
//! - [`EventDescriptor`] - read-only event rows
//! - [`TypePropertyDescriptor`] - the `(Type)` row
//! - [`PropertyCollector`] - builds all rows for a component
//! - [`TypeDescriptorRegistry`] - per-type member cache owned by the session

mod collection;
mod event;
mod property;
mod registry;
mod typedesc;

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

pub use collection::{
    collect_events, collect_properties, filter, CollectorOptions, PropertyCollector,
    EXCLUDED_PROPERTIES,
};
pub use event::EventDescriptor;
pub use property::{InstancePropertyDescriptor, StaticPropertyDescriptor};
pub use registry::{CachedMember, TypeDescriptorEntry, TypeDescriptorRegistry};
pub use typedesc::{TypePropertyDescriptor, TYPE_DESCRIPTOR_NAME};

use crate::reflection::{Member, Value};

/// Category used when a member has none of its own
pub const MISC_CATEGORY: &str = "Misc";

/// Uniform view over one browsable row.
pub trait PropertyDescriptor: fmt::Debug + Send + Sync {
    /// Row name
    fn name(&self) -> &str;

    /// Full name of the type that declares the member
    fn declaring_type_label(&self) -> String;

    /// Whether the grid may offer editing
    fn is_read_only(&self) -> bool;

    /// Current value for `target`. Never fails; see the module documentation.
    fn get_value(&self, target: &Value) -> Value;

    /// Assigns `value` on `target`. Never fails; see the module documentation.
    fn set_value(&self, target: &Value, value: Value);

    /// Grouping label
    fn category(&self) -> String;

    /// Full name of the value type
    fn property_type(&self) -> String;

    /// The recorded failure message, if any
    fn last_error(&self) -> Option<String> {
        None
    }

    /// Forgets the recorded failure
    fn clear_error(&self) {}
}

/// A shared descriptor
pub type DescriptorRc = Arc<dyn PropertyDescriptor>;

/// First-failure error cell of a descriptor.
#[derive(Debug, Default)]
pub struct StickyError(Mutex<Option<String>>);

impl StickyError {
    /// The recorded message
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Records `message`, replacing any previous one
    pub fn record(&self, message: String) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(message);
    }

    /// Forgets the recorded message
    pub fn clear(&self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Category of a member row.
///
/// With `keep_original` the member's own category (or [`MISC_CATEGORY`]) is used, otherwise a
/// label naming the binding and the declaring type, such as `(static: Control)`.
pub(crate) fn category_label(
    member: &Member,
    declaring_name: &str,
    keep_original: bool,
) -> String {
    if keep_original {
        return member
            .category
            .clone()
            .unwrap_or_else(|| MISC_CATEGORY.to_string());
    }

    let binding = if member.is_static() {
        "static"
    } else {
        "instance"
    };
    format!("({binding}: {declaring_name})")
}
