//! Builds the rows of a property grid for one component.

use std::{collections::HashSet, sync::Arc};

use log::warn;

use crate::{
    descriptor::{
        CachedMember, DescriptorRc, EventDescriptor, InstancePropertyDescriptor,
        StaticPropertyDescriptor, TypeDescriptorRegistry, TypePropertyDescriptor,
    },
    reflection::{AccessorKind, MemberAccessor, ObjectRef, Value},
};

/// Properties that are never shown. Reading them has side effects on live controls.
pub const EXCLUDED_PROPERTIES: &[&str] = &[
    "System.Windows.Forms.Control.ShowParams",
    "System.Windows.Forms.Control.ActiveXAmbientBackColor",
    "System.Windows.Forms.Control.ActiveXAmbientFont",
    "System.Windows.Forms.Control.ActiveXAmbientForeColor",
    "System.Windows.Forms.Control.ActiveXEventsFrozen",
    "System.Windows.Forms.Control.ActiveXHWNDParent",
    "System.Windows.Forms.Control.ActiveXInstance",
    "System.Windows.Forms.Form.ShowParams",
];

/// What the collector includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorOptions {
    /// Keep each member's own category instead of `(instance: T)` / `(static: T)` labels
    pub keep_original_category: bool,
    /// Include static members
    pub retrieve_static_members: bool,
    /// Include members declared on base types
    pub inspect_base_classes: bool,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        CollectorOptions {
            keep_original_category: true,
            retrieve_static_members: true,
            inspect_base_classes: true,
        }
    }
}

/// Produces descriptor rows for components, using a session's registry.
pub struct PropertyCollector<'a> {
    registry: &'a TypeDescriptorRegistry,
    options: CollectorOptions,
}

impl<'a> PropertyCollector<'a> {
    /// A collector over `registry`
    #[must_use]
    pub fn new(registry: &'a TypeDescriptorRegistry, options: CollectorOptions) -> Self {
        PropertyCollector { registry, options }
    }

    /// The `(Type)` row followed by one row per property name.
    ///
    /// The component is unwrapped first; nulls, primitives and strings have no rows. When a
    /// name appears at several levels the most derived one wins.
    #[must_use]
    pub fn properties(&self, component: &Value) -> Vec<DescriptorRc> {
        let Some(object) = self.component_object(component) else {
            return Vec::new();
        };
        let ty = object.runtime_type();
        let entry = self.registry.register(ty);

        let mut rows: Vec<DescriptorRc> = vec![Arc::new(TypePropertyDescriptor::new(ty))];
        let keep = self.options.keep_original_category;
        for cached in self.visible(&entry.properties) {
            let accessor =
                MemberAccessor::from_match(AccessorKind::Property, ty, cached.found.clone());
            if cached.is_static {
                rows.push(Arc::new(StaticPropertyDescriptor::new(accessor, keep)));
            } else {
                rows.push(Arc::new(InstancePropertyDescriptor::new(accessor, keep)));
            }
        }
        rows
    }

    /// One row per event name, most derived first.
    #[must_use]
    pub fn events(&self, component: &Value) -> Vec<DescriptorRc> {
        let Some(object) = self.component_object(component) else {
            return Vec::new();
        };
        let entry = self.registry.register(object.runtime_type());

        self.visible(&entry.events)
            .into_iter()
            .map(|cached| {
                Arc::new(EventDescriptor::new(
                    cached.found.clone(),
                    self.options.keep_original_category,
                )) as DescriptorRc
            })
            .collect()
    }

    fn component_object(&self, component: &Value) -> Option<ObjectRef> {
        if component.is_null() || component.is_primitive() {
            return None;
        }

        match component.clone().unwrap_proxies() {
            Ok(Value::Object(object)) => Some(object),
            Ok(_) => None,
            Err(error) => {
                warn!("Could not unwrap the inspected component: {error}");
                None
            }
        }
    }

    fn visible<'e>(&self, walk: &'e [CachedMember]) -> Vec<&'e CachedMember> {
        let mut seen = HashSet::new();
        walk.iter()
            .filter(|cached| self.options.inspect_base_classes || cached.level == 0)
            .filter(|cached| self.options.retrieve_static_members || !cached.is_static)
            .filter(|cached| !EXCLUDED_PROPERTIES.contains(&cached.found.qualified_name().as_str()))
            .filter(|cached| seen.insert(cached.found.member.name.clone()))
            .collect()
    }
}

/// Property rows of `component`. See [`PropertyCollector::properties`].
#[must_use]
pub fn collect_properties(
    registry: &TypeDescriptorRegistry,
    component: &Value,
    options: CollectorOptions,
) -> Vec<DescriptorRc> {
    PropertyCollector::new(registry, options).properties(component)
}

/// Event rows of `component`. See [`PropertyCollector::events`].
#[must_use]
pub fn collect_events(
    registry: &TypeDescriptorRegistry,
    component: &Value,
    options: CollectorOptions,
) -> Vec<DescriptorRc> {
    PropertyCollector::new(registry, options).events(component)
}

/// Rows whose name or category contains `query`, ignoring case. An empty query keeps all rows.
#[must_use]
pub fn filter(rows: &[DescriptorRc], query: &str) -> Vec<DescriptorRc> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return rows.to_vec();
    }

    rows.iter()
        .filter(|row| {
            row.name().to_lowercase().contains(&query)
                || row.category().to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        reflection::{Object, PropertyDef, TypeBuilder, Unwrappable},
        test::widget_hierarchy,
    };

    #[derive(Debug)]
    struct Wrapper(Value);

    impl Unwrappable for Wrapper {
        fn inner_value(&self) -> Value {
            self.0.clone()
        }
    }

    fn names(rows: &[DescriptorRc]) -> Vec<String> {
        rows.iter().map(|row| row.name().to_string()).collect()
    }

    #[test]
    fn test_collect_properties_most_derived_wins() {
        let widgets = widget_hierarchy();
        let registry = TypeDescriptorRegistry::new();
        let collector = PropertyCollector::new(&registry, CollectorOptions::default());
        let label = Value::Object(Object::new(&widgets.label));

        let rows = collector.properties(&label);
        assert_eq!(
            names(&rows),
            ["(Type)", "Text", "Enabled", "Name", "Parent", "Handle", "DefaultFont"]
        );
        assert_eq!(rows[2].declaring_type_label(), "Demo.Forms.Label");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_collect_options() {
        let widgets = widget_hierarchy();
        let registry = TypeDescriptorRegistry::new();
        let label = Value::Object(Object::new(&widgets.label));

        let own_only = PropertyCollector::new(
            &registry,
            CollectorOptions {
                inspect_base_classes: false,
                ..CollectorOptions::default()
            },
        );
        assert_eq!(names(&own_only.properties(&label)), ["(Type)", "Text", "Enabled"]);

        let no_statics = PropertyCollector::new(
            &registry,
            CollectorOptions {
                retrieve_static_members: false,
                ..CollectorOptions::default()
            },
        );
        assert!(!names(&no_statics.properties(&label)).contains(&"DefaultFont".to_string()));
    }

    #[test]
    fn test_primitives_and_proxies() {
        let widgets = widget_hierarchy();
        let registry = TypeDescriptorRegistry::new();
        let collector = PropertyCollector::new(&registry, CollectorOptions::default());

        assert!(collector.properties(&Value::from("text")).is_empty());
        assert!(collector.properties(&Value::Int(1)).is_empty());
        assert!(collector.properties(&Value::Null).is_empty());

        let proxy = Value::Proxy(Arc::new(Wrapper(Value::Object(Object::new(&widgets.control)))));
        let rows = collector.properties(&proxy);
        assert_eq!(rows[0].get_value(&proxy).to_string(), "Demo.Forms.Control");
    }

    #[test]
    fn test_excluded_properties_are_skipped() {
        let control = TypeBuilder::new("System.Windows.Forms", "Control")
            .property(PropertyDef::auto("ShowParams", "System.Int32"))
            .property(PropertyDef::auto("Visible", "System.Boolean"))
            .build();
        let registry = TypeDescriptorRegistry::new();
        let collector = PropertyCollector::new(&registry, CollectorOptions::default());

        let rows = collector.properties(&Value::Object(Object::new(&control)));
        assert_eq!(names(&rows), ["(Type)", "Visible"]);
    }

    #[test]
    fn test_collect_events() {
        let widgets = widget_hierarchy();
        let registry = TypeDescriptorRegistry::new();
        let label = Value::Object(Object::new(&widgets.label));

        let rows = collect_events(&registry, &label, CollectorOptions::default());
        assert_eq!(names(&rows), ["TextChanged", "Click"]);
        assert_eq!(
            collect_properties(&registry, &label, CollectorOptions::default()).len(),
            7
        );
        assert!(rows.iter().all(|row| row.is_read_only()));
    }

    #[test]
    fn test_filter() {
        let widgets = widget_hierarchy();
        let registry = TypeDescriptorRegistry::new();
        let collector = PropertyCollector::new(&registry, CollectorOptions::default());
        let rows = collector.properties(&Value::Object(Object::new(&widgets.label)));

        assert_eq!(filter(&rows, "").len(), rows.len());
        assert_eq!(names(&filter(&rows, "TEXT")), ["Text"]);
        assert_eq!(names(&filter(&rows, "appearance")), ["Text", "DefaultFont"]);
        assert!(filter(&rows, "zzz").is_empty());
    }
}
