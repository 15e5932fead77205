//! The runtime type model.
//!
//! A [`RuntimeType`] is an immutable description of a type: namespace, name, base type and
//! declared members. Every hierarchy ends at [`RuntimeType::object_root`]. Members carry their
//! behaviour as shared closures, so a type can describe objects living anywhere as long as the
//! closures know how to reach them.
//!
//! # Key Components
//!
//! - [`RuntimeType`] / [`TypeRc`] - a type and its shared handle
//! - [`Member`] / [`MemberBody`] - declared fields, properties, methods and events
//! - [`TypeBuilder`] - assembles a type from member definitions
//! - [`FieldDef`], [`PropertyDef`], [`MethodDef`], [`EventDef`] with the [`MemberDef`] modifiers
//!
//! # Examples
//!
//! ```rust
//! use hawkscope::reflection::{MemberDef, MethodDef, PropertyDef, TypeBuilder, Value, Visibility};
//!
//! let control = TypeBuilder::new("Demo", "Control")
//!     .property(PropertyDef::auto("Name", "System.String"))
//!     .property(PropertyDef::auto("Secret", "System.String").visibility(Visibility::Private))
//!     .method(MethodDef::new("Refresh", "System.Void", |_, _| Ok(Value::Null)))
//!     .build();
//!
//! assert_eq!(control.full_name(), "Demo.Control");
//! assert_eq!(control.members().len(), 3);
//! assert!(control.base().is_some_and(|base| base.is_root()));
//! ```

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

use strum::{Display, EnumIter};

use crate::reflection::{InvokeError, MemberAttributes, ObjectRef, Value, Visibility};

/// A reference to a `RuntimeType`
pub type TypeRc = Arc<RuntimeType>;
/// A reference to a declared `Member`
pub type MemberRc = Arc<Member>;

/// Reads a property. Receives the instance, or `None` for static properties.
pub type Getter = Arc<dyn Fn(Option<&ObjectRef>) -> Result<Value, InvokeError> + Send + Sync>;
/// Writes a property. Receives the instance, or `None` for static properties.
pub type Setter = Arc<dyn Fn(Option<&ObjectRef>, Value) -> Result<(), InvokeError> + Send + Sync>;
/// Invokes a method. Receives the instance, or `None` for static methods.
pub type Invoker =
    Arc<dyn Fn(Option<&ObjectRef>, &[Value]) -> Result<Value, InvokeError> + Send + Sync>;

/// Namespace of the universal root type
pub const ROOT_NAMESPACE: &str = "System";
/// Name of the universal root type
pub const ROOT_NAME: &str = "Object";

/// The kind of a declared member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum MemberKind {
    /// Storage slot
    Field,
    /// Getter/setter pair
    Property,
    /// Invocable member
    Method,
    /// Subscribable notification
    Event,
}

/// A named, typed method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    /// Parameter name
    pub name: String,
    /// Full name of the parameter type
    pub type_name: String,
}

/// Kind specific part of a [`Member`].
#[derive(Clone)]
pub enum MemberBody {
    /// Field with the value new instances (or the type, for statics) start with
    Field {
        /// Initial value
        initial: Value,
    },
    /// Property with optional accessors
    Property {
        /// Read accessor
        getter: Option<Getter>,
        /// Write accessor
        setter: Option<Setter>,
    },
    /// Method with its parameter list
    Method {
        /// Declared parameters
        parameters: Vec<ParameterInfo>,
        /// Body
        invoker: Invoker,
    },
    /// Event with the full name of its handler type
    Event {
        /// Full name of the delegate type
        handler_type: String,
    },
}

/// A declared member of a [`RuntimeType`].
#[derive(Clone)]
pub struct Member {
    /// Member name
    pub name: String,
    /// Accessibility
    pub visibility: Visibility,
    /// Static and special-name markers
    pub attributes: MemberAttributes,
    /// Field/property type, method return type, or event handler type
    pub value_type: String,
    /// Semantic grouping label shown by property grids
    pub category: Option<String>,
    /// Kind specific data
    pub body: MemberBody,
}

impl Member {
    fn with_body(name: &str, value_type: &str, body: MemberBody) -> Self {
        Member {
            name: name.to_string(),
            visibility: Visibility::Public,
            attributes: MemberAttributes::empty(),
            value_type: value_type.to_string(),
            category: None,
            body,
        }
    }

    /// The kind of this member
    #[must_use]
    pub fn kind(&self) -> MemberKind {
        match self.body {
            MemberBody::Field { .. } => MemberKind::Field,
            MemberBody::Property { .. } => MemberKind::Property,
            MemberBody::Method { .. } => MemberKind::Method,
            MemberBody::Event { .. } => MemberKind::Event,
        }
    }

    /// Returns true for static members
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.attributes.contains(MemberAttributes::STATIC)
    }

    /// Returns true for compiler generated accessor methods
    #[must_use]
    pub fn is_special_name(&self) -> bool {
        self.attributes.contains(MemberAttributes::SPECIAL_NAME)
    }

    /// Fields are always readable; properties only with a getter.
    #[must_use]
    pub fn can_read(&self) -> bool {
        match &self.body {
            MemberBody::Field { .. } => true,
            MemberBody::Property { getter, .. } => getter.is_some(),
            MemberBody::Method { .. } | MemberBody::Event { .. } => false,
        }
    }

    /// Fields are always writable; properties only with a setter.
    #[must_use]
    pub fn can_write(&self) -> bool {
        match &self.body {
            MemberBody::Field { .. } => true,
            MemberBody::Property { setter, .. } => setter.is_some(),
            MemberBody::Method { .. } | MemberBody::Event { .. } => false,
        }
    }

    /// Method parameters; empty for every other kind
    #[must_use]
    pub fn parameters(&self) -> &[ParameterInfo] {
        match &self.body {
            MemberBody::Method { parameters, .. } => parameters,
            _ => &[],
        }
    }

    /// Key under which this member hides same-named members of base types.
    ///
    /// Methods hide by name and parameter types, every other kind by name alone.
    pub(crate) fn hide_key(&self) -> String {
        match &self.body {
            MemberBody::Method { parameters, .. } => {
                let signature: Vec<&str> = parameters.iter().map(|p| p.type_name.as_str()).collect();
                format!("{}({})", self.name, signature.join(","))
            }
            _ => self.name.clone(),
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("visibility", &self.visibility)
            .field("attributes", &self.attributes)
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}

/// A type in the runtime type model.
pub struct RuntimeType {
    namespace: String,
    name: String,
    base: Option<TypeRc>,
    members: Vec<MemberRc>,
    statics: RwLock<HashMap<String, Value>>,
}

impl RuntimeType {
    /// The universal root type `System.Object`.
    ///
    /// It declares no members and is the only type without a base.
    pub fn object_root() -> TypeRc {
        static ROOT: OnceLock<TypeRc> = OnceLock::new();
        ROOT.get_or_init(|| {
            Arc::new(RuntimeType {
                namespace: ROOT_NAMESPACE.to_string(),
                name: ROOT_NAME.to_string(),
                base: None,
                members: Vec::new(),
                statics: RwLock::new(HashMap::new()),
            })
        })
        .clone()
    }

    /// Type name without namespace
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace, possibly empty
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// `Namespace.Name`, or `Name` for types without a namespace
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// The base type; `None` only for the root
    #[must_use]
    pub fn base(&self) -> Option<&TypeRc> {
        self.base.as_ref()
    }

    /// Returns true for the universal root type
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.base.is_none()
    }

    /// Members declared directly on this type, in declaration order
    #[must_use]
    pub fn members(&self) -> &[MemberRc] {
        &self.members
    }

    /// Members of one kind declared directly on this type
    pub fn declared(&self, kind: MemberKind) -> impl Iterator<Item = &MemberRc> {
        self.members.iter().filter(move |member| member.kind() == kind)
    }

    /// Returns true if `self` is `other` or derives from it.
    #[must_use]
    pub fn is_assignable_to(&self, other: &RuntimeType) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }

        let mut current = self.base.as_ref();
        while let Some(ty) = current {
            if std::ptr::eq(ty.as_ref(), other) {
                return true;
            }
            current = ty.base.as_ref();
        }
        false
    }

    /// Iterates from `ty` up to and including the root.
    pub fn hierarchy(ty: &TypeRc) -> impl Iterator<Item = TypeRc> {
        std::iter::successors(Some(ty.clone()), |current| current.base.clone())
    }

    /// Current value of a static field declared on this type
    #[must_use]
    pub fn static_value(&self, name: &str) -> Value {
        self.statics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Replaces the value of a static field declared on this type
    pub fn set_static_value(&self, name: &str, value: Value) {
        self.statics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value);
    }
}

impl fmt::Debug for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeType")
            .field("full_name", &self.full_name())
            .field("base", &self.base.as_ref().map(|base| base.full_name()))
            .field("members", &self.members.len())
            .finish()
    }
}

/// Common modifiers of the member definitions.
pub trait MemberDef: Sized {
    /// Access to the member under construction
    fn member_mut(&mut self) -> &mut Member;

    /// Sets the accessibility
    #[must_use]
    fn visibility(mut self, visibility: Visibility) -> Self {
        self.member_mut().visibility = visibility;
        self
    }

    /// Marks the member static
    #[must_use]
    fn as_static(mut self) -> Self {
        self.member_mut().attributes |= MemberAttributes::STATIC;
        self
    }

    /// Marks the member as compiler generated
    #[must_use]
    fn special_name(mut self) -> Self {
        self.member_mut().attributes |= MemberAttributes::SPECIAL_NAME;
        self
    }

    /// Sets the semantic grouping label
    #[must_use]
    fn category(mut self, category: &str) -> Self {
        self.member_mut().category = Some(category.to_string());
        self
    }
}

/// Definition of a field.
pub struct FieldDef(Member);

impl FieldDef {
    /// A public instance field starting out as [`Value::Null`]
    #[must_use]
    pub fn new(name: &str, type_name: &str) -> Self {
        FieldDef(Member::with_body(
            name,
            type_name,
            MemberBody::Field {
                initial: Value::Null,
            },
        ))
    }

    /// Sets the initial value
    #[must_use]
    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.0.body = MemberBody::Field {
            initial: value.into(),
        };
        self
    }
}

impl MemberDef for FieldDef {
    fn member_mut(&mut self) -> &mut Member {
        &mut self.0
    }
}

/// Definition of a property.
pub struct PropertyDef {
    member: Member,
    auto: bool,
    auto_read_only: bool,
    initial: Value,
}

impl PropertyDef {
    /// A public instance property without accessors
    #[must_use]
    pub fn new(name: &str, type_name: &str) -> Self {
        PropertyDef {
            member: Member::with_body(
                name,
                type_name,
                MemberBody::Property {
                    getter: None,
                    setter: None,
                },
            ),
            auto: false,
            auto_read_only: false,
            initial: Value::Null,
        }
    }

    /// A public property with compiler style storage.
    ///
    /// Instance auto properties are backed by a private field of the declaring type, so a derived
    /// type redeclaring the same name gets its own storage. Static ones keep a single shared cell.
    #[must_use]
    pub fn auto(name: &str, type_name: &str) -> Self {
        let mut def = PropertyDef::new(name, type_name);
        def.auto = true;
        def
    }

    /// Drops the setter of an auto property
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.auto_read_only = true;
        if let MemberBody::Property { setter, .. } = &mut self.member.body {
            *setter = None;
        }
        self
    }

    /// Initial value of an auto property
    #[must_use]
    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = value.into();
        self
    }

    /// Sets the read accessor
    #[must_use]
    pub fn getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(Option<&ObjectRef>) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        if let MemberBody::Property { getter: slot, .. } = &mut self.member.body {
            *slot = Some(Arc::new(getter));
        }
        self
    }

    /// Sets the write accessor
    #[must_use]
    pub fn setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(Option<&ObjectRef>, Value) -> Result<(), InvokeError> + Send + Sync + 'static,
    {
        if let MemberBody::Property { setter: slot, .. } = &mut self.member.body {
            *slot = Some(Arc::new(setter));
        }
        self
    }

    fn finish(mut self, declaring: &str) -> (Member, Option<(String, Value)>) {
        if !self.auto {
            return (self.member, None);
        }

        if self.member.is_static() {
            let cell = Arc::new(RwLock::new(self.initial));
            let read_cell = cell.clone();
            let getter: Getter = Arc::new(move |_: Option<&ObjectRef>| {
                Ok(read_cell
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone())
            });
            let setter: Option<Setter> = if self.auto_read_only {
                None
            } else {
                Some(Arc::new(move |_: Option<&ObjectRef>, value: Value| {
                    *cell.write().unwrap_or_else(PoisonError::into_inner) = value;
                    Ok(())
                }))
            };
            self.member.body = MemberBody::Property {
                getter: Some(getter),
                setter,
            };
            return (self.member, None);
        }

        let key = auto_slot_name(&self.member.name);
        let owner = declaring.to_string();
        let read_key = key.clone();
        let read_owner = owner.clone();
        let getter: Getter = Arc::new(move |instance: Option<&ObjectRef>| match instance {
            Some(object) => Ok(object.slot(&read_owner, &read_key)),
            None => Err(InvokeError::NullTarget),
        });
        let setter: Option<Setter> = if self.auto_read_only {
            None
        } else {
            let write_key = key.clone();
            Some(Arc::new(
                move |instance: Option<&ObjectRef>, value: Value| match instance {
                    Some(object) => {
                        object.set_slot(&owner, &write_key, value);
                        Ok(())
                    }
                    None => Err(InvokeError::NullTarget),
                },
            ))
        };
        self.member.body = MemberBody::Property {
            getter: Some(getter),
            setter,
        };
        (self.member, Some((key, self.initial)))
    }
}

impl MemberDef for PropertyDef {
    fn member_mut(&mut self) -> &mut Member {
        &mut self.member
    }
}

/// Slot name backing an auto property
pub(crate) fn auto_slot_name(property: &str) -> String {
    format!("<{property}>k__BackingField")
}

/// Definition of a method.
pub struct MethodDef(Member);

impl MethodDef {
    /// A public instance method
    pub fn new<F>(name: &str, return_type: &str, invoker: F) -> Self
    where
        F: Fn(Option<&ObjectRef>, &[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        MethodDef(Member::with_body(
            name,
            return_type,
            MemberBody::Method {
                parameters: Vec::new(),
                invoker: Arc::new(invoker),
            },
        ))
    }

    /// Appends a parameter
    #[must_use]
    pub fn parameter(mut self, name: &str, type_name: &str) -> Self {
        if let MemberBody::Method { parameters, .. } = &mut self.0.body {
            parameters.push(ParameterInfo {
                name: name.to_string(),
                type_name: type_name.to_string(),
            });
        }
        self
    }
}

impl MemberDef for MethodDef {
    fn member_mut(&mut self) -> &mut Member {
        &mut self.0
    }
}

/// Definition of an event.
pub struct EventDef(Member);

impl EventDef {
    /// A public instance event
    #[must_use]
    pub fn new(name: &str, handler_type: &str) -> Self {
        EventDef(Member::with_body(
            name,
            handler_type,
            MemberBody::Event {
                handler_type: handler_type.to_string(),
            },
        ))
    }
}

impl MemberDef for EventDef {
    fn member_mut(&mut self) -> &mut Member {
        &mut self.0
    }
}

/// Assembles a [`RuntimeType`].
pub struct TypeBuilder {
    namespace: String,
    name: String,
    base: Option<TypeRc>,
    fields: Vec<Member>,
    properties: Vec<PropertyDef>,
    methods: Vec<Member>,
    events: Vec<Member>,
}

impl TypeBuilder {
    /// Starts a type deriving directly from the root
    #[must_use]
    pub fn new(namespace: &str, name: &str) -> Self {
        TypeBuilder {
            namespace: namespace.to_string(),
            name: name.to_string(),
            base: None,
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Sets the base type
    #[must_use]
    pub fn base(mut self, base: &TypeRc) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Declares a field
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field.0);
        self
    }

    /// Declares a property
    #[must_use]
    pub fn property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    /// Declares a method
    #[must_use]
    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method.0);
        self
    }

    /// Declares an event
    #[must_use]
    pub fn event(mut self, event: EventDef) -> Self {
        self.events.push(event.0);
        self
    }

    /// Finishes the type.
    ///
    /// Static fields and static auto properties get their initial value stored on the type.
    #[must_use]
    pub fn build(self) -> TypeRc {
        let full_name = if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        };

        let mut statics = HashMap::new();
        let mut members = Vec::new();

        for field in self.fields {
            if field.is_static() {
                if let MemberBody::Field { initial } = &field.body {
                    statics.insert(field.name.clone(), initial.clone());
                }
            }
            members.push(Arc::new(field));
        }

        for property in self.properties {
            let (member, slot) = property.finish(&full_name);
            if let Some((key, initial)) = slot {
                members.push(Arc::new(Member::with_body(
                    &key,
                    &member.value_type,
                    MemberBody::Field { initial },
                )
                .hidden_backing_field()));
            }
            members.push(Arc::new(member));
        }

        members.extend(self.methods.into_iter().map(Arc::new));
        members.extend(self.events.into_iter().map(Arc::new));

        Arc::new(RuntimeType {
            namespace: self.namespace,
            name: self.name,
            base: Some(self.base.unwrap_or_else(RuntimeType::object_root)),
            members,
            statics: RwLock::new(statics),
        })
    }
}

impl Member {
    fn hidden_backing_field(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::Object;

    #[test]
    fn test_root_is_shared() {
        let a = RuntimeType::object_root();
        let b = RuntimeType::object_root();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.is_root());
        assert_eq!(a.full_name(), "System.Object");
    }

    #[test]
    fn test_hierarchy_ends_at_root() {
        let control = TypeBuilder::new("Demo", "Control").build();
        let button = TypeBuilder::new("Demo", "Button").base(&control).build();

        let names: Vec<String> = RuntimeType::hierarchy(&button)
            .map(|ty| ty.full_name())
            .collect();
        assert_eq!(names, ["Demo.Button", "Demo.Control", "System.Object"]);
        assert!(button.is_assignable_to(&control));
        assert!(!control.is_assignable_to(&button));
    }

    #[test]
    fn test_auto_property_gets_private_backing_field() {
        let ty = TypeBuilder::new("", "Bag")
            .property(PropertyDef::auto("Count", "System.Int32").initial(3))
            .build();

        let backing: Vec<&MemberRc> = ty.declared(MemberKind::Field).collect();
        assert_eq!(backing.len(), 1);
        assert_eq!(backing[0].name, "<Count>k__BackingField");
        assert_eq!(backing[0].visibility, Visibility::Private);

        let bag = Object::new(&ty);
        assert_eq!(bag.slot("Bag", "<Count>k__BackingField"), Value::Int(3));
    }

    #[test]
    fn test_static_field_initial_value() {
        let ty = TypeBuilder::new("Demo", "Counter")
            .field(FieldDef::new("Instances", "System.Int32").as_static().initial(5))
            .build();
        assert_eq!(ty.static_value("Instances"), Value::Int(5));
        ty.set_static_value("Instances", Value::Int(6));
        assert_eq!(ty.static_value("Instances"), Value::Int(6));
    }

    #[test]
    fn test_method_hide_key_includes_signature() {
        let ty = TypeBuilder::new("", "Calc")
            .method(
                MethodDef::new("Add", "System.Int32", |_, _| Ok(Value::Null))
                    .parameter("a", "System.Int32")
                    .parameter("b", "System.Int32"),
            )
            .build();
        let add = ty.declared(MemberKind::Method).next().unwrap();
        assert_eq!(add.hide_key(), "Add(System.Int32,System.Int32)");
        assert_eq!(add.parameters().len(), 2);
    }
}
