use log::warn;

use crate::{
    descriptor::{PropertyDescriptor, MISC_CATEGORY},
    reflection::{TypeRc, Value},
};

/// Name of the synthetic type row
pub const TYPE_DESCRIPTOR_NAME: &str = "(Type)";

/// Synthetic read-only row whose value is the runtime type of the inspected instance.
#[derive(Debug)]
pub struct TypePropertyDescriptor {
    ty: TypeRc,
}

impl TypePropertyDescriptor {
    /// Row for an instance of `ty`
    #[must_use]
    pub fn new(ty: &TypeRc) -> Self {
        TypePropertyDescriptor { ty: ty.clone() }
    }
}

impl PropertyDescriptor for TypePropertyDescriptor {
    fn name(&self) -> &str {
        TYPE_DESCRIPTOR_NAME
    }

    fn declaring_type_label(&self) -> String {
        self.ty.full_name()
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn get_value(&self, _target: &Value) -> Value {
        Value::Type(self.ty.clone())
    }

    fn set_value(&self, _target: &Value, _value: Value) {
        warn!("The type of '{}' cannot be changed", self.ty.full_name());
    }

    fn category(&self) -> String {
        MISC_CATEGORY.to_string()
    }

    fn property_type(&self) -> String {
        "System.Type".to_string()
    }
}
