use log::warn;

use crate::{
    descriptor::{category_label, PropertyDescriptor},
    reflection::{MemberBody, MemberMatch, Value},
};

/// Read-only row for an instance or static event.
///
/// Events can be enumerated but not read, so the value is always [`Value::Null`]; the row's
/// type is the handler type.
#[derive(Debug)]
pub struct EventDescriptor {
    event: MemberMatch,
    keep_original_category: bool,
}

impl EventDescriptor {
    /// Wraps an event found by a lookup
    #[must_use]
    pub fn new(event: MemberMatch, keep_original_category: bool) -> Self {
        EventDescriptor {
            event,
            keep_original_category,
        }
    }

    /// True for static events
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.event.member.is_static()
    }
}

impl PropertyDescriptor for EventDescriptor {
    fn name(&self) -> &str {
        &self.event.member.name
    }

    fn declaring_type_label(&self) -> String {
        self.event.declaring.full_name()
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn get_value(&self, _target: &Value) -> Value {
        Value::Null
    }

    fn set_value(&self, _target: &Value, _value: Value) {
        warn!("Event '{}' is read-only", self.event.qualified_name());
    }

    fn category(&self) -> String {
        category_label(
            &self.event.member,
            self.event.declaring.name(),
            self.keep_original_category,
        )
    }

    fn property_type(&self) -> String {
        match &self.event.member.body {
            MemberBody::Event { handler_type } => handler_type.clone(),
            _ => self.event.member.value_type.clone(),
        }
    }
}
