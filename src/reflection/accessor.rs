//! Widening member resolution.
//!
//! A [`MemberAccessor`] resolves a field, property or method by name once, at construction,
//! and keeps the result. Resolution walks the kind's search plan (see
//! [`crate::reflection::FIELD_SEARCH_ORDER`] and friends) on the target type; for every step it
//! tries a named lookup and, when that does not produce a single match, an enumeration pass that
//! takes the first member with exactly the requested name. If no step matches, the base type is
//! searched the same way. The walk ends before the universal root type.
//!
//! An accessor that found nothing is not an error until it is used: check
//! [`MemberAccessor::is_valid`], or expect [`crate::Error::InvalidAccessor`] from `get`, `set`
//! and `invoke`.
//!
//! # Examples
//!
//! ```rust
//! use hawkscope::reflection::{
//!     FieldDef, MemberAccessor, MemberDef, Object, TypeBuilder, Value, Visibility,
//! };
//!
//! let ty = TypeBuilder::new("Demo", "Counter")
//!     .field(FieldDef::new("count", "System.Int32").visibility(Visibility::Private).initial(1))
//!     .build();
//! let counter = Object::new(&ty);
//!
//! let count = MemberAccessor::field_of(&counter, "count");
//! assert!(count.is_valid());
//! count.set(None, Value::from(2))?;
//! assert_eq!(count.get(None)?, Value::Int(2));
//! # Ok::<(), hawkscope::Error>(())
//! ```

use log::trace;
use strum::{Display, EnumIter};

use crate::{
    reflection::{
        binding::{find_by_enumeration, get_member, Lookup, MemberMatch},
        InvokeError, MemberBody, MemberKind, ObjectRef, RuntimeType, SearchStep, TypeRc, Value,
        FIELD_SEARCH_ORDER, METHOD_SEARCH_ORDER, PROPERTY_SEARCH_ORDER,
    },
    Error, Result,
};

/// Kind of member an accessor looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum AccessorKind {
    /// Field accessor
    Field,
    /// Property accessor
    Property,
    /// Method accessor
    Method,
}

impl AccessorKind {
    /// The ordered search plan of this kind
    #[must_use]
    pub fn search_order(self) -> &'static [SearchStep] {
        match self {
            AccessorKind::Field => FIELD_SEARCH_ORDER,
            AccessorKind::Property => PROPERTY_SEARCH_ORDER,
            AccessorKind::Method => METHOD_SEARCH_ORDER,
        }
    }

    fn member_kind(self) -> MemberKind {
        match self {
            AccessorKind::Field => MemberKind::Field,
            AccessorKind::Property => MemberKind::Property,
            AccessorKind::Method => MemberKind::Method,
        }
    }
}

/// A resolved handle to a field, property or method.
#[derive(Debug, Clone)]
pub struct MemberAccessor {
    kind: AccessorKind,
    target_type: TypeRc,
    target: Option<Value>,
    name: String,
    resolved: Option<MemberMatch>,
}

impl MemberAccessor {
    /// Resolves `name` as a member of `kind` on `ty`.
    #[must_use]
    pub fn new(kind: AccessorKind, ty: &TypeRc, name: &str) -> Self {
        let resolved = resolve(ty, name, &[kind]);
        if resolved.is_none() {
            trace!("{} '{}' not found on '{}'", kind, name, ty.full_name());
        }

        MemberAccessor {
            kind,
            target_type: ty.clone(),
            target: None,
            name: name.to_string(),
            resolved,
        }
    }

    /// Field accessor on a type
    #[must_use]
    pub fn field(ty: &TypeRc, name: &str) -> Self {
        MemberAccessor::new(AccessorKind::Field, ty, name)
    }

    /// Property accessor on a type
    #[must_use]
    pub fn property(ty: &TypeRc, name: &str) -> Self {
        MemberAccessor::new(AccessorKind::Property, ty, name)
    }

    /// Method accessor on a type
    #[must_use]
    pub fn method(ty: &TypeRc, name: &str) -> Self {
        MemberAccessor::new(AccessorKind::Method, ty, name)
    }

    /// Field accessor bound to an instance
    #[must_use]
    pub fn field_of(object: &ObjectRef, name: &str) -> Self {
        MemberAccessor::field(object.runtime_type(), name).bind(object)
    }

    /// Property accessor bound to an instance
    #[must_use]
    pub fn property_of(object: &ObjectRef, name: &str) -> Self {
        MemberAccessor::property(object.runtime_type(), name).bind(object)
    }

    /// Method accessor bound to an instance
    #[must_use]
    pub fn method_of(object: &ObjectRef, name: &str) -> Self {
        MemberAccessor::method(object.runtime_type(), name).bind(object)
    }

    /// Resolves `name` trying property, then field, then method at every hierarchy level.
    ///
    /// A property declared on a derived type therefore wins over a same-named field of a base
    /// type.
    #[must_use]
    pub fn resolve_any(ty: &TypeRc, name: &str) -> Self {
        let order = [
            AccessorKind::Property,
            AccessorKind::Field,
            AccessorKind::Method,
        ];
        let resolved = resolve(ty, name, &order);
        let kind = resolved
            .as_ref()
            .map_or(AccessorKind::Property, |found| match found.member.kind() {
                MemberKind::Field => AccessorKind::Field,
                MemberKind::Method => AccessorKind::Method,
                MemberKind::Property | MemberKind::Event => AccessorKind::Property,
            });

        MemberAccessor {
            kind,
            target_type: ty.clone(),
            target: None,
            name: name.to_string(),
            resolved,
        }
    }

    /// Wraps a member already found by a lookup, skipping resolution.
    #[must_use]
    pub fn from_match(kind: AccessorKind, ty: &TypeRc, found: MemberMatch) -> Self {
        MemberAccessor {
            kind,
            target_type: ty.clone(),
            target: None,
            name: found.member.name.clone(),
            resolved: Some(found),
        }
    }

    /// Binds a default instance used when `get`/`set`/`invoke` get no explicit target.
    #[must_use]
    pub fn bind(mut self, object: &ObjectRef) -> Self {
        self.target = Some(Value::Object(object.clone()));
        self
    }

    /// Returns true if a member was found
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.resolved.is_some()
    }

    /// The accessor kind. For [`MemberAccessor::resolve_any`] this is the kind that matched.
    #[must_use]
    pub fn kind(&self) -> AccessorKind {
        self.kind
    }

    /// The requested member name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type the search started from
    #[must_use]
    pub fn target_type(&self) -> &TypeRc {
        &self.target_type
    }

    /// The resolved member, if any
    #[must_use]
    pub fn resolved(&self) -> Option<&MemberMatch> {
        self.resolved.as_ref()
    }

    /// True if the resolved member is static
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.resolved
            .as_ref()
            .is_some_and(|found| found.member.is_static())
    }

    /// True if the resolved member can be read
    #[must_use]
    pub fn can_read(&self) -> bool {
        self.resolved
            .as_ref()
            .is_some_and(|found| found.member.can_read())
    }

    /// True if the resolved member can be written
    #[must_use]
    pub fn can_write(&self) -> bool {
        self.resolved
            .as_ref()
            .is_some_and(|found| found.member.can_write())
    }

    /// Reads the field or property.
    ///
    /// `target` overrides the bound instance; it is ignored for static members.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAccessor`] if nothing was resolved
    /// - [`Error::InvalidArgument`] for method accessors
    /// - [`Error::Invoke`] for missing getters, missing or mismatched targets and getter failures
    pub fn get(&self, target: Option<&Value>) -> Result<Value> {
        let found = self.require()?;
        let receiver = self.receiver(found, target)?;

        match &found.member.body {
            MemberBody::Field { .. } => Ok(match receiver {
                Some(object) => object.slot(&found.declaring.full_name(), &found.member.name),
                None => found.declaring.static_value(&found.member.name),
            }),
            MemberBody::Property { getter, .. } => {
                let getter = getter.as_ref().ok_or(InvokeError::NoGetMethod)?;
                Ok(getter(receiver.as_ref())?)
            }
            MemberBody::Method { .. } | MemberBody::Event { .. } => Err(Error::InvalidArgument(
                format!("'{}' cannot be read", found.qualified_name()),
            )),
        }
    }

    /// Writes the field or property.
    ///
    /// # Errors
    ///
    /// Same conditions as [`MemberAccessor::get`], with missing setters reported as
    /// [`InvokeError::NoSetMethod`].
    pub fn set(&self, target: Option<&Value>, value: Value) -> Result<()> {
        let found = self.require()?;
        let receiver = self.receiver(found, target)?;

        match &found.member.body {
            MemberBody::Field { .. } => {
                match receiver {
                    Some(object) => {
                        object.set_slot(&found.declaring.full_name(), &found.member.name, value);
                    }
                    None => found.declaring.set_static_value(&found.member.name, value),
                }
                Ok(())
            }
            MemberBody::Property { setter, .. } => {
                let setter = setter.as_ref().ok_or(InvokeError::NoSetMethod)?;
                Ok(setter(receiver.as_ref(), value)?)
            }
            MemberBody::Method { .. } | MemberBody::Event { .. } => Err(Error::InvalidArgument(
                format!("'{}' cannot be written", found.qualified_name()),
            )),
        }
    }

    /// Invokes the method.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAccessor`] if nothing was resolved
    /// - [`Error::InvalidArgument`] for field and property accessors
    /// - [`Error::Invoke`] for argument count mismatches, target problems and method failures
    pub fn invoke(&self, target: Option<&Value>, args: &[Value]) -> Result<Value> {
        let found = self.require()?;
        let MemberBody::Method {
            parameters,
            invoker,
        } = &found.member.body
        else {
            return Err(Error::InvalidArgument(format!(
                "'{}' is not a method",
                found.qualified_name()
            )));
        };

        if parameters.len() != args.len() {
            return Err(InvokeError::ParameterCount {
                expected: parameters.len(),
                actual: args.len(),
            }
            .into());
        }

        let receiver = self.receiver(found, target)?;
        Ok(invoker(receiver.as_ref(), args)?)
    }

    fn require(&self) -> Result<&MemberMatch> {
        self.resolved.as_ref().ok_or_else(|| Error::InvalidAccessor {
            kind: self.kind.to_string(),
            member: self.name.clone(),
            type_name: self.target_type.full_name(),
        })
    }

    fn receiver(
        &self,
        found: &MemberMatch,
        target: Option<&Value>,
    ) -> std::result::Result<Option<ObjectRef>, InvokeError> {
        if found.member.is_static() {
            return Ok(None);
        }

        match target.or(self.target.as_ref()) {
            Some(Value::Object(object)) => {
                if object.runtime_type().is_assignable_to(&found.declaring) {
                    Ok(Some(object.clone()))
                } else {
                    Err(InvokeError::TargetMismatch {
                        expected: found.declaring.full_name(),
                        actual: object.runtime_type().full_name(),
                    })
                }
            }
            Some(Value::Null) | None => Err(InvokeError::NullTarget),
            Some(other) => Err(InvokeError::TargetMismatch {
                expected: found.declaring.full_name(),
                actual: other.type_name(),
            }),
        }
    }
}

fn resolve(ty: &TypeRc, name: &str, kinds: &[AccessorKind]) -> Option<MemberMatch> {
    for level in RuntimeType::hierarchy(ty) {
        if level.is_root() {
            break;
        }

        // Across kinds, every kind must get its chance on this level before an inherited
        // member of an earlier kind can win.
        let declared_only = kinds.len() > 1;
        for kind in kinds {
            let plan = kind.search_order();
            if let Some(found) = resolve_on(&level, kind.member_kind(), name, plan, declared_only)
            {
                return Some(found);
            }
        }
    }
    None
}

fn resolve_on(
    level: &TypeRc,
    kind: MemberKind,
    name: &str,
    plan: &[SearchStep],
    declared_only: bool,
) -> Option<MemberMatch> {
    for step in plan {
        match get_member(level, kind, name, step.flags) {
            Lookup::Found(found) if declared_only && found.depth > 0 => {}
            Lookup::Found(found) => {
                trace!(
                    "{} '{}' resolved on '{}' by step '{}'",
                    kind,
                    name,
                    found.declaring.full_name(),
                    step.label
                );
                return Some(found);
            }
            Lookup::Ambiguous(count) => {
                trace!("{count} candidates for {kind} '{name}' with step '{}'", step.label);
            }
            Lookup::NotFound => {}
        }

        if let Some(found) = find_by_enumeration(level, kind, name, step.flags)
            .filter(|found| !declared_only || found.depth == 0)
        {
            return Some(found);
        }
    }
    None
}
