//! Maps native window handles to the live objects behind them.
//!
//! The inspected application registers its windows here; it is how a handle picked with the
//! mouse becomes something the descriptor engine can browse. Entries are weak, so the directory
//! never keeps a closed window alive.

use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::{
    process::WindowHandle,
    reflection::{Object, ObjectRef},
};

/// Handle to object registry.
#[derive(Debug, Default)]
pub struct ControlDirectory {
    controls: DashMap<WindowHandle, Weak<Object>>,
}

impl ControlDirectory {
    /// An empty directory
    #[must_use]
    pub fn new() -> Self {
        ControlDirectory::default()
    }

    /// Associates `handle` with `object`, replacing any previous association
    pub fn register(&self, handle: WindowHandle, object: &ObjectRef) {
        self.controls.insert(handle, Arc::downgrade(object));
    }

    /// Removes the association of `handle`
    pub fn unregister(&self, handle: WindowHandle) {
        self.controls.remove(&handle);
    }

    /// The live object behind `handle`. Dead entries are dropped on the way.
    #[must_use]
    pub fn lookup(&self, handle: WindowHandle) -> Option<ObjectRef> {
        let object = self.controls.get(&handle)?.upgrade();
        if object.is_none() {
            self.controls.remove(&handle);
        }
        object
    }

    /// The handle `object` is registered under
    #[must_use]
    pub fn handle_of(&self, object: &ObjectRef) -> Option<WindowHandle> {
        self.controls
            .iter()
            .find(|entry| {
                entry
                    .value()
                    .upgrade()
                    .is_some_and(|live| Arc::ptr_eq(&live, object))
            })
            .map(|entry| *entry.key())
    }

    /// Number of entries, including ones whose object may have died
    #[must_use]
    pub fn len(&self) -> usize {
        self.controls.len()
    }

    /// True if nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Drops every entry
    pub fn clear(&self) {
        self.controls.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::widget_hierarchy;

    #[test]
    fn test_lookup_and_reverse_lookup() {
        let widgets = widget_hierarchy();
        let directory = ControlDirectory::new();
        let form = Object::new(&widgets.control);
        let label = Object::new(&widgets.label);

        directory.register(WindowHandle::new(1), &form);
        directory.register(WindowHandle::new(2), &label);

        assert!(Arc::ptr_eq(&directory.lookup(WindowHandle::new(2)).unwrap(), &label));
        assert_eq!(directory.handle_of(&form), Some(WindowHandle::new(1)));
        assert!(directory.lookup(WindowHandle::new(3)).is_none());

        directory.unregister(WindowHandle::new(1));
        assert_eq!(directory.handle_of(&form), None);
    }

    #[test]
    fn test_dead_entries_are_dropped() {
        let widgets = widget_hierarchy();
        let directory = ControlDirectory::new();
        let label = Object::new(&widgets.label);
        directory.register(WindowHandle::new(5), &label);
        drop(label);

        assert!(directory.lookup(WindowHandle::new(5)).is_none());
        assert!(directory.is_empty());
    }
}
