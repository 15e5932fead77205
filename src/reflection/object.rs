//! Live instances of runtime types.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use crate::reflection::{MemberBody, MemberKind, RuntimeType, TypeRc, Value};

/// A reference to an `Object`
pub type ObjectRef = Arc<Object>;

/// A live instance.
///
/// Instance fields live in slots keyed by the declaring type's full name and the field name, so
/// fields hidden by a derived type keep their own storage.
pub struct Object {
    ty: TypeRc,
    slots: RwLock<HashMap<(String, String), Value>>,
}

impl Object {
    /// Creates an instance with every instance field of the hierarchy set to its initial value.
    pub fn new(ty: &TypeRc) -> ObjectRef {
        let mut slots = HashMap::new();
        for level in RuntimeType::hierarchy(ty) {
            let owner = level.full_name();
            for field in level.declared(MemberKind::Field) {
                if field.is_static() {
                    continue;
                }
                if let MemberBody::Field { initial } = &field.body {
                    slots.insert((owner.clone(), field.name.clone()), initial.clone());
                }
            }
        }

        Arc::new(Object {
            ty: ty.clone(),
            slots: RwLock::new(slots),
        })
    }

    /// The type this object was created from
    #[must_use]
    pub fn runtime_type(&self) -> &TypeRc {
        &self.ty
    }

    /// Reads a slot; unset slots read as [`Value::Null`]
    #[must_use]
    pub fn slot(&self, owner: &str, name: &str) -> Value {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(owner.to_string(), name.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Writes a slot
    pub fn set_slot(&self, owner: &str, name: &str, value: Value) {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((owner.to_string(), name.to_string()), value);
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("type", &self.ty.full_name())
            .finish_non_exhaustive()
    }
}
