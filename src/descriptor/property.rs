use log::debug;

use crate::{
    descriptor::{category_label, PropertyDescriptor, StickyError},
    reflection::{failure_message, MemberAccessor, Value},
    Error,
};

/// Descriptor for an instance field or property.
///
/// Targets and assigned values are unwrapped through [`crate::reflection::Unwrappable`] before
/// the member is touched.
#[derive(Debug)]
pub struct InstancePropertyDescriptor {
    accessor: MemberAccessor,
    keep_original_category: bool,
    error: StickyError,
}

impl InstancePropertyDescriptor {
    /// Wraps an accessor, usually one produced by the collector or by a lookup.
    #[must_use]
    pub fn new(accessor: MemberAccessor, keep_original_category: bool) -> Self {
        InstancePropertyDescriptor {
            accessor,
            keep_original_category,
            error: StickyError::default(),
        }
    }

    /// The underlying accessor
    #[must_use]
    pub fn accessor(&self) -> &MemberAccessor {
        &self.accessor
    }
}

impl PropertyDescriptor for InstancePropertyDescriptor {
    fn name(&self) -> &str {
        self.accessor.name()
    }

    fn declaring_type_label(&self) -> String {
        declaring_label(&self.accessor)
    }

    fn is_read_only(&self) -> bool {
        !self.accessor.can_write()
    }

    fn get_value(&self, target: &Value) -> Value {
        if let Some(message) = self.error.get() {
            return Value::Str(message);
        }

        let result = target
            .clone()
            .unwrap_proxies()
            .and_then(|target| self.accessor.get(Some(&target)));
        settle_read(&self.accessor, &self.error, result)
    }

    fn set_value(&self, target: &Value, value: Value) {
        let result = target.clone().unwrap_proxies().and_then(|target| {
            let value = value.unwrap_proxies()?;
            self.accessor.set(Some(&target), value)
        });
        settle_write(&self.accessor, &self.error, result);
    }

    fn category(&self) -> String {
        category_of(&self.accessor, self.keep_original_category)
    }

    fn property_type(&self) -> String {
        property_type_of(&self.accessor)
    }

    fn last_error(&self) -> Option<String> {
        self.error.get()
    }

    fn clear_error(&self) {
        self.error.clear();
    }
}

/// Descriptor for a static field or property.
///
/// The target passed to `get_value`/`set_value` is ignored; the member is always used on its
/// owning type.
#[derive(Debug)]
pub struct StaticPropertyDescriptor {
    accessor: MemberAccessor,
    keep_original_category: bool,
    error: StickyError,
}

impl StaticPropertyDescriptor {
    /// Wraps an accessor for a static member.
    #[must_use]
    pub fn new(accessor: MemberAccessor, keep_original_category: bool) -> Self {
        StaticPropertyDescriptor {
            accessor,
            keep_original_category,
            error: StickyError::default(),
        }
    }
}

impl PropertyDescriptor for StaticPropertyDescriptor {
    fn name(&self) -> &str {
        self.accessor.name()
    }

    fn declaring_type_label(&self) -> String {
        declaring_label(&self.accessor)
    }

    fn is_read_only(&self) -> bool {
        !self.accessor.can_write()
    }

    fn get_value(&self, _target: &Value) -> Value {
        if let Some(message) = self.error.get() {
            return Value::Str(message);
        }

        settle_read(&self.accessor, &self.error, self.accessor.get(None))
    }

    fn set_value(&self, _target: &Value, value: Value) {
        let result = value
            .unwrap_proxies()
            .and_then(|value| self.accessor.set(None, value));
        settle_write(&self.accessor, &self.error, result);
    }

    fn category(&self) -> String {
        category_of(&self.accessor, self.keep_original_category)
    }

    fn property_type(&self) -> String {
        property_type_of(&self.accessor)
    }

    fn last_error(&self) -> Option<String> {
        self.error.get()
    }

    fn clear_error(&self) {
        self.error.clear();
    }
}

fn settle_read(
    accessor: &MemberAccessor,
    error: &StickyError,
    result: Result<Value, Error>,
) -> Value {
    match result {
        Ok(value) => value,
        Err(failure) => {
            let message = failure_message(&failure);
            debug!("Reading '{}' failed: {}", accessor.name(), message);
            error.record(message.clone());
            Value::Str(message)
        }
    }
}

fn settle_write(accessor: &MemberAccessor, error: &StickyError, result: Result<(), Error>) {
    match result {
        Ok(()) => error.clear(),
        Err(failure) => {
            let message = failure_message(&failure);
            debug!("Writing '{}' failed: {}", accessor.name(), message);
            error.record(message);
        }
    }
}

fn declaring_label(accessor: &MemberAccessor) -> String {
    accessor.resolved().map_or_else(
        || accessor.target_type().full_name(),
        |found| found.declaring.full_name(),
    )
}

fn category_of(accessor: &MemberAccessor, keep_original: bool) -> String {
    match accessor.resolved() {
        Some(found) => category_label(&found.member, found.declaring.name(), keep_original),
        None => crate::descriptor::MISC_CATEGORY.to_string(),
    }
}

fn property_type_of(accessor: &MemberAccessor) -> String {
    accessor
        .resolved()
        .map_or_else(|| "System.Object".to_string(), |found| found.member.value_type.clone())
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::{
        reflection::{
            InvokeError, MemberDef, Object, PropertyDef, TypeBuilder, Unwrappable,
        },
        test::{control_with_handle, widget_hierarchy},
    };

    #[derive(Debug)]
    struct Wrapper(Value);

    impl Unwrappable for Wrapper {
        fn inner_value(&self) -> Value {
            self.0.clone()
        }
    }

    #[test]
    fn test_instance_descriptor_reads_and_writes_through_proxy() {
        let widgets = widget_hierarchy();
        let label = Object::new(&widgets.label);
        let proxy = Value::Proxy(Arc::new(Wrapper(Value::Object(label.clone()))));

        let text = InstancePropertyDescriptor::new(
            MemberAccessor::property(&widgets.label, "Text"),
            true,
        );
        let new_text = Value::Proxy(Arc::new(Wrapper(Value::from("caption"))));
        text.set_value(&proxy, new_text);

        assert_eq!(text.get_value(&proxy), Value::from("caption"));
        assert_eq!(
            text.get_value(&Value::Object(label)),
            Value::from("caption")
        );
        assert!(text.last_error().is_none());
        assert!(!text.is_read_only());
        assert_eq!(text.property_type(), "System.String");
        assert_eq!(text.declaring_type_label(), "Demo.Forms.Label");
    }

    #[test]
    fn test_get_value_is_idempotent() {
        let widgets = widget_hierarchy();
        let control = control_with_handle(&widgets, 0x1234);
        let handle = InstancePropertyDescriptor::new(
            MemberAccessor::property(&widgets.control, "Handle"),
            true,
        );
        let target = Value::Object(control);
        let first = handle.get_value(&target);
        assert_eq!(first, Value::Int(0x1234));
        assert_eq!(handle.get_value(&target), first);
        assert!(handle.is_read_only());
    }

    #[test]
    fn test_failed_get_becomes_sticky() {
        let widgets = widget_hierarchy();
        let control = Object::new(&widgets.control);
        let handle = InstancePropertyDescriptor::new(
            MemberAccessor::property(&widgets.control, "Handle"),
            true,
        );
        let target = Value::Object(control.clone());

        assert_eq!(handle.get_value(&target), Value::from("Handle is not created."));

        control.set_slot("Demo.Forms.Control", "handle", Value::Int(7));
        assert_eq!(handle.get_value(&target), Value::from("Handle is not created."));

        handle.clear_error();
        assert_eq!(handle.get_value(&target), Value::Int(7));
    }

    #[test]
    fn test_failed_set_is_returned_until_a_set_succeeds() {
        let fail = Arc::new(AtomicBool::new(true));
        let reads = Arc::new(AtomicUsize::new(0));
        let fail_in_setter = fail.clone();
        let reads_in_getter = reads.clone();

        let ty = TypeBuilder::new("", "Guarded")
            .property(
                PropertyDef::new("Level", "System.Int32")
                    .getter(move |_| {
                        reads_in_getter.fetch_add(1, Ordering::SeqCst);
                        Ok(Value::Int(1))
                    })
                    .setter(move |_, _| {
                        if fail_in_setter.load(Ordering::SeqCst) {
                            Err(InvokeError::Security("Request for permission failed.".into()))
                        } else {
                            Ok(())
                        }
                    }),
            )
            .build();
        let target = Value::Object(Object::new(&ty));
        let level = InstancePropertyDescriptor::new(MemberAccessor::property(&ty, "Level"), true);

        level.set_value(&target, Value::Int(5));
        fail.store(false, Ordering::SeqCst);

        for _ in 0..3 {
            assert_eq!(
                level.get_value(&target),
                Value::from("Request for permission failed.")
            );
        }
        assert_eq!(reads.load(Ordering::SeqCst), 0);

        level.set_value(&target, Value::Int(5));
        assert!(level.last_error().is_none());
        assert_eq!(level.get_value(&target), Value::Int(1));
    }

    #[test]
    fn test_missing_set_method_message() {
        let ty = TypeBuilder::new("", "Clock")
            .property(PropertyDef::auto("Ticks", "System.Int64").read_only())
            .build();
        let target = Value::Object(Object::new(&ty));
        let ticks = InstancePropertyDescriptor::new(MemberAccessor::property(&ty, "Ticks"), true);

        ticks.set_value(&target, Value::Int(1));
        assert_eq!(ticks.last_error().as_deref(), Some("No Set Method."));
        assert_eq!(ticks.get_value(&target), Value::from("No Set Method."));
    }

    #[test]
    fn test_invalid_accessor_never_panics() {
        let widgets = widget_hierarchy();
        let missing = InstancePropertyDescriptor::new(
            MemberAccessor::property(&widgets.label, "Nope"),
            false,
        );
        let target = Value::Object(Object::new(&widgets.label));
        assert!(missing.get_value(&target).as_str().is_some());
        assert!(missing.last_error().is_some());
        assert!(missing.is_read_only());
        assert_eq!(missing.declaring_type_label(), "Demo.Forms.Label");
    }

    #[test]
    fn test_static_descriptor_ignores_target() {
        let widgets = widget_hierarchy();
        let font = StaticPropertyDescriptor::new(
            MemberAccessor::property(&widgets.control, "DefaultFont"),
            false,
        );

        assert_eq!(font.get_value(&Value::Null), Value::from("Microsoft Sans Serif"));
        font.set_value(&Value::from("ignored"), Value::from("Tahoma"));
        assert_eq!(font.get_value(&Value::Int(3)), Value::from("Tahoma"));
        assert_eq!(font.category(), "(static: Control)");
    }

    #[test]
    fn test_category_labels() {
        let widgets = widget_hierarchy();
        let enabled = MemberAccessor::property(&widgets.control, "Enabled");

        let original = InstancePropertyDescriptor::new(enabled.clone(), true);
        assert_eq!(original.category(), "Behavior");

        let synthesized = InstancePropertyDescriptor::new(enabled, false);
        assert_eq!(synthesized.category(), "(instance: Control)");

        let name = InstancePropertyDescriptor::new(
            MemberAccessor::property(&widgets.control, "Name"),
            true,
        );
        assert_eq!(name.category(), "Misc");
    }
}
