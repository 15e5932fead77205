//! Dynamically typed values flowing through accessors and descriptors.

use std::{fmt, sync::Arc};

use crate::{
    reflection::{ObjectRef, TypeRc},
    Error, Result,
};

/// Upper bound on proxy chain length followed by [`Value::unwrap_proxies`].
pub const MAX_UNWRAP_DEPTH: usize = 32;

/// Capability of objects that stand in for another value.
///
/// Descriptors unwrap both targets and assigned values through this trait before they touch the
/// underlying member, so a row shown for a wrapper operates on the real object.
pub trait Unwrappable: fmt::Debug + Send + Sync {
    /// The wrapped value. May itself be a [`Value::Proxy`].
    fn inner_value(&self) -> Value;
}

/// Shared handle to a proxy
pub type ProxyRef = Arc<dyn Unwrappable>;

/// A dynamically typed value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value
    #[default]
    Null,
    /// `System.Boolean`
    Bool(bool),
    /// Any integral value, stored widened
    Int(i64),
    /// Any floating point value, stored widened
    Float(f64),
    /// `System.String`
    Str(String),
    /// A live object
    Object(ObjectRef),
    /// A runtime type used as a value
    Type(TypeRc),
    /// A wrapper around another value
    Proxy(ProxyRef),
}

impl Value {
    /// Returns true for [`Value::Null`]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Primitive values and strings. These never expose browsable members.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_)
        )
    }

    /// The wrapped object, if this is an object value
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The string content, if this is a string value
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(text) => Some(text),
            _ => None,
        }
    }

    /// The integral content, if this is an integer value
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Full name of the value's type as it would appear in a listing.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "(null)".to_string(),
            Value::Bool(_) => "System.Boolean".to_string(),
            Value::Int(_) => "System.Int64".to_string(),
            Value::Float(_) => "System.Double".to_string(),
            Value::Str(_) => "System.String".to_string(),
            Value::Object(object) => object.runtime_type().full_name(),
            Value::Type(_) => "System.Type".to_string(),
            Value::Proxy(proxy) => format!("{proxy:?}"),
        }
    }

    /// Follows [`Unwrappable`] wrappers until a non-proxy value is reached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecursionLimit`] when the chain is longer than [`MAX_UNWRAP_DEPTH`],
    /// which also catches cyclic wrappers.
    pub fn unwrap_proxies(self) -> Result<Value> {
        let mut current = self;
        for _ in 0..MAX_UNWRAP_DEPTH {
            match current {
                Value::Proxy(proxy) => current = proxy.inner_value(),
                other => return Ok(other),
            }
        }

        match current {
            Value::Proxy(_) => Err(Error::RecursionLimit(MAX_UNWRAP_DEPTH)),
            other => Ok(other),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => Arc::ptr_eq(a, b),
            (Value::Proxy(a), Value::Proxy(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "(null)"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Str(text) => write!(f, "{text}"),
            Value::Object(object) => write!(f, "{}", object.runtime_type().full_name()),
            Value::Type(ty) => write!(f, "{}", ty.full_name()),
            Value::Proxy(proxy) => write!(f, "{proxy:?}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

impl From<TypeRc> for Value {
    fn from(value: TypeRc) -> Self {
        Value::Type(value)
    }
}
