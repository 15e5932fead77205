//! Per-type cache of browsable members.
//!
//! Computing the property and event rows of a type walks its whole hierarchy twice per level.
//! The registry does that once per type and hands out the cached walk. It is an explicit object
//! owned by the session: created at session start, shared with the components that need it and
//! cleared at teardown.

use std::sync::Arc;

use dashmap::DashMap;
use log::debug;

use crate::reflection::{binding::get_members, BindingFlags, MemberKind, MemberMatch, RuntimeType, TypeRc};

/// One member of the cached walk.
#[derive(Debug, Clone)]
pub struct CachedMember {
    /// The member and its declaring type
    pub found: MemberMatch,
    /// Hierarchy level the member was collected at; 0 is the registered type
    pub level: usize,
    /// True if collected by the static pass
    pub is_static: bool,
}

/// Cached walk of one type: properties and events, most derived level first, instance members
/// before static members within a level.
#[derive(Debug)]
pub struct TypeDescriptorEntry {
    /// The registered type
    pub ty: TypeRc,
    /// Property walk
    pub properties: Vec<CachedMember>,
    /// Event walk
    pub events: Vec<CachedMember>,
}

impl TypeDescriptorEntry {
    fn build(ty: &TypeRc) -> Self {
        TypeDescriptorEntry {
            ty: ty.clone(),
            properties: walk(ty, MemberKind::Property),
            events: walk(ty, MemberKind::Event),
        }
    }
}

fn walk(ty: &TypeRc, kind: MemberKind) -> Vec<CachedMember> {
    let declared = BindingFlags::DECLARED_ONLY | BindingFlags::PUBLIC | BindingFlags::NON_PUBLIC;
    let mut members = Vec::new();

    for (level, current) in RuntimeType::hierarchy(ty).enumerate() {
        for (binding, is_static) in [(BindingFlags::INSTANCE, false), (BindingFlags::STATIC, true)] {
            members.extend(
                get_members(&current, kind, declared | binding)
                    .into_iter()
                    .map(|found| CachedMember {
                        found,
                        level,
                        is_static,
                    }),
            );
        }
    }

    members
}

/// Session owned registry of [`TypeDescriptorEntry`] keyed by type full name.
#[derive(Debug, Default)]
pub struct TypeDescriptorRegistry {
    entries: DashMap<String, Arc<TypeDescriptorEntry>>,
}

impl TypeDescriptorRegistry {
    /// An empty registry
    #[must_use]
    pub fn new() -> Self {
        TypeDescriptorRegistry::default()
    }

    /// Returns the entry for `ty`, building it on first use. Registering twice is a no-op.
    pub fn register(&self, ty: &TypeRc) -> Arc<TypeDescriptorEntry> {
        let key = ty.full_name();
        if let Some(entry) = self.entries.get(&key) {
            if Arc::ptr_eq(&entry.ty, ty) {
                return entry.clone();
            }
        }

        debug!("Registering type descriptor for '{key}'");
        let entry = Arc::new(TypeDescriptorEntry::build(ty));
        self.entries.insert(key, entry.clone());
        entry
    }

    /// The entry registered under `full_name`
    #[must_use]
    pub fn get(&self, full_name: &str) -> Option<Arc<TypeDescriptorEntry>> {
        self.entries.get(full_name).map(|entry| entry.clone())
    }

    /// Number of registered types
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry. Called when the owning session tears down.
    pub fn clear(&self) {
        debug!("Clearing {} type descriptor(s)", self.entries.len());
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::widget_hierarchy;

    #[test]
    fn test_register_is_idempotent() {
        let widgets = widget_hierarchy();
        let registry = TypeDescriptorRegistry::new();

        let first = registry.register(&widgets.label);
        let second = registry.register(&widgets.label);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("Demo.Forms.Label").is_some());

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_walk_order() {
        let widgets = widget_hierarchy();
        let registry = TypeDescriptorRegistry::new();
        let entry = registry.register(&widgets.label);

        let walk: Vec<(usize, bool, &str)> = entry
            .properties
            .iter()
            .map(|cached| (cached.level, cached.is_static, cached.found.member.name.as_str()))
            .collect();
        assert_eq!(
            walk,
            [
                (0, false, "Text"),
                (0, false, "Enabled"),
                (1, false, "Name"),
                (1, false, "Enabled"),
                (1, false, "Parent"),
                (1, false, "Handle"),
                (1, true, "DefaultFont"),
            ]
        );
        assert_eq!(entry.events.len(), 2);
    }
}
