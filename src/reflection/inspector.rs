//! Point-in-time member listings and dotted path resolution.
//!
//! [`inspect`] produces one line per public instance member of an object: properties first,
//! then methods, then events, each group sorted by name. Property lines show the current value,
//! method lines expand every overload with its full parameter list, and the compiler generated
//! accessor methods (`get_`, `set_`, `add_`, `remove_`) are left out.
//!
//! ```text
//!  [p] Name = hello
//!  [m] Greet()
//!  [e] Changed<EventHandler>
//! ```

use crate::{
    reflection::{
        binding::get_members, failure_message, AccessorKind, BindingFlags, MemberAccessor,
        MemberKind, Value,
    },
    Error, Result,
};

const ACCESSOR_PREFIXES: [&str; 4] = ["get_", "set_", "add_", "remove_"];

/// Lists the public instance members of `target`.
///
/// Proxies are unwrapped first. Values without members (null, primitives, strings, types)
/// produce an empty listing. Property getters that fail show their failure message instead of a
/// value.
///
/// # Errors
///
/// Returns [`Error::RecursionLimit`] if `target` is a proxy chain that never ends.
///
/// # Examples
///
/// ```rust
/// use hawkscope::reflection::{inspect, EventDef, MethodDef, Object, PropertyDef, TypeBuilder, Value};
///
/// let ty = TypeBuilder::new("Demo", "Greeter")
///     .property(PropertyDef::auto("Name", "System.String").initial("hello"))
///     .method(MethodDef::new("Greet", "System.Void", |_, _| Ok(Value::Null)))
///     .event(EventDef::new("Changed", "System.EventHandler"))
///     .build();
///
/// let lines = inspect(&Value::Object(Object::new(&ty)))?;
/// assert_eq!(lines, [" [p] Name = hello", " [m] Greet()", " [e] Changed<EventHandler>"]);
/// # Ok::<(), hawkscope::Error>(())
/// ```
pub fn inspect(target: &Value) -> Result<Vec<String>> {
    let target = target.clone().unwrap_proxies()?;
    let Some(object) = target.as_object() else {
        return Ok(Vec::new());
    };
    let ty = object.runtime_type();
    let flags = BindingFlags::PUBLIC | BindingFlags::INSTANCE;
    let mut lines = Vec::new();

    let mut properties = get_members(ty, MemberKind::Property, flags);
    properties.sort_by(|a, b| a.member.name.cmp(&b.member.name));
    for property in properties {
        let name = property.member.name.clone();
        let accessor = MemberAccessor::from_match(AccessorKind::Property, ty, property);
        let shown = match accessor.get(Some(&target)) {
            Ok(value) => value.to_string(),
            Err(error) => failure_message(&error),
        };
        lines.push(format!(" [p] {name} = {shown}"));
    }

    let mut methods: Vec<_> = get_members(ty, MemberKind::Method, flags)
        .into_iter()
        .filter(|method| {
            !method.member.is_special_name()
                && !ACCESSOR_PREFIXES
                    .iter()
                    .any(|prefix| method.member.name.starts_with(prefix))
        })
        .collect();
    methods.sort_by(|a, b| a.member.name.cmp(&b.member.name));
    for method in methods {
        let parameters: Vec<String> = method
            .member
            .parameters()
            .iter()
            .map(|parameter| format!("{} {}", short_type_name(&parameter.type_name), parameter.name))
            .collect();
        lines.push(format!(
            " [m] {}({})",
            method.member.name,
            parameters.join(", ")
        ));
    }

    let mut events = get_members(ty, MemberKind::Event, flags);
    events.sort_by(|a, b| a.member.name.cmp(&b.member.name));
    for event in events {
        lines.push(format!(
            " [e] {}<{}>",
            event.member.name,
            short_type_name(&event.member.value_type)
        ));
    }

    Ok(lines)
}

/// Walks a dotted member path such as `Parent.Controls.Count` or `Form.Focus()`.
///
/// Each segment is resolved as a property first, then as a field; a segment ending in `()`
/// invokes a parameterless method. Starting from a [`Value::Type`] resolves the first segment
/// as a static member. A null intermediate value or a missing member yields [`Value::Null`].
///
/// # Errors
///
/// - [`Error::InvalidArgument`] if the path has an empty segment
/// - any error raised by a getter or method along the way
pub fn resolve_path(root: &Value, path: &str) -> Result<Value> {
    let mut current = root.clone();

    for segment in path.split('.') {
        if segment.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "empty segment in member path '{path}'"
            )));
        }

        current = current.unwrap_proxies()?;
        let (ty, target) = match &current {
            Value::Object(object) => (object.runtime_type().clone(), Some(current.clone())),
            Value::Type(ty) => (ty.clone(), None),
            _ => return Ok(Value::Null),
        };

        current = if let Some(method) = segment.strip_suffix("()") {
            let accessor = MemberAccessor::method(&ty, method);
            if !accessor.is_valid() {
                return Ok(Value::Null);
            }
            accessor.invoke(target.as_ref(), &[])?
        } else {
            let mut accessor = MemberAccessor::property(&ty, segment);
            if !accessor.is_valid() {
                accessor = MemberAccessor::field(&ty, segment);
            }
            if !accessor.is_valid() {
                return Ok(Value::Null);
            }
            accessor.get(target.as_ref())?
        };
    }

    Ok(current)
}

/// `System.EventHandler` becomes `EventHandler`
pub(crate) fn short_type_name(full_name: &str) -> &str {
    full_name.rsplit('.').next().unwrap_or(full_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        reflection::{
            EventDef, InvokeError, MemberDef, MethodDef, Object, PropertyDef, TypeBuilder,
            Visibility,
        },
        test::widget_hierarchy,
    };

    #[test]
    fn test_three_member_listing() {
        let ty = TypeBuilder::new("Demo", "Greeter")
            .property(PropertyDef::auto("Name", "System.String").initial("hello"))
            .method(MethodDef::new("Greet", "System.Void", |_, _| Ok(Value::Null)))
            .event(EventDef::new("Changed", "System.EventHandler"))
            .build();

        let lines = inspect(&Value::Object(Object::new(&ty))).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], " [p] Name = hello");
        assert_eq!(lines[1], " [m] Greet()");
        assert_eq!(lines[2], " [e] Changed<EventHandler>");
    }

    #[test]
    fn test_accessor_methods_and_non_public_members_filtered() {
        let ty = TypeBuilder::new("", "Box")
            .property(PropertyDef::auto("Size", "System.Int32").initial(4))
            .property(PropertyDef::auto("Hidden", "System.Int32").visibility(Visibility::Private))
            .method(MethodDef::new("get_Size", "System.Int32", |_, _| Ok(Value::Null)))
            .method(
                MethodDef::new("Resize", "System.Void", |_, _| Ok(Value::Null)).special_name(),
            )
            .method(MethodDef::new("remove_Click", "System.Void", |_, _| Ok(Value::Null)))
            .build();

        let lines = inspect(&Value::Object(Object::new(&ty))).unwrap();
        assert_eq!(lines, [" [p] Size = 4"]);
    }

    #[test]
    fn test_overloads_list_all_parameters() {
        let ty = TypeBuilder::new("", "Printer")
            .method(
                MethodDef::new("Print", "System.Void", |_, _| Ok(Value::Null))
                    .parameter("text", "System.String")
                    .parameter("copies", "System.Int32"),
            )
            .method(MethodDef::new("Print", "System.Void", |_, _| Ok(Value::Null)))
            .method(MethodDef::new("Abort", "System.Void", |_, _| Ok(Value::Null)))
            .build();

        let lines = inspect(&Value::Object(Object::new(&ty))).unwrap();
        assert_eq!(
            lines,
            [
                " [m] Abort()",
                " [m] Print(String text, Int32 copies)",
                " [m] Print()",
            ]
        );
    }

    #[test]
    fn test_inherited_members_and_failures() {
        let widgets = widget_hierarchy();
        let label = Object::new(&widgets.label);
        let lines = inspect(&Value::Object(label)).unwrap();

        assert!(lines.contains(&" [p] Handle = Handle is not created.".to_string()));
        assert!(lines.contains(&" [p] Parent = (null)".to_string()));
        assert!(lines.contains(&" [e] Click<EventHandler>".to_string()));
        assert_eq!(
            lines.iter().filter(|line| line.starts_with(" [p] Text")).count(),
            1
        );

        let properties: Vec<&String> = lines.iter().filter(|l| l.starts_with(" [p]")).collect();
        let mut sorted = properties.clone();
        sorted.sort();
        assert_eq!(properties, sorted);
    }

    #[test]
    fn test_primitives_have_no_listing() {
        assert!(inspect(&Value::from("text")).unwrap().is_empty());
        assert!(inspect(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_path() {
        let widgets = widget_hierarchy();
        let parent = Object::new(&widgets.control);
        let child = Object::new(&widgets.label);
        MemberAccessor::property_of(&parent, "Name")
            .set(None, Value::from("form1"))
            .unwrap();
        MemberAccessor::property_of(&child, "Parent")
            .set(None, Value::Object(parent))
            .unwrap();

        let root = Value::Object(child);
        assert_eq!(
            resolve_path(&root, "Parent.Name").unwrap(),
            Value::from("form1")
        );
        assert_eq!(resolve_path(&root, "Focus()").unwrap(), Value::Bool(true));
        assert!(resolve_path(&root, "Parent.Parent.Name").unwrap().is_null());
        assert!(resolve_path(&root, "Missing").unwrap().is_null());
        assert!(matches!(
            resolve_path(&root, "Parent..Name"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            resolve_path(&root, "Handle"),
            Err(Error::Invoke(InvokeError::TargetInvocation(_)))
        ));
    }

    #[test]
    fn test_resolve_static_path() {
        let widgets = widget_hierarchy();
        let value = resolve_path(&Value::Type(widgets.control.clone()), "DefaultFont").unwrap();
        assert_eq!(value, Value::from("Microsoft Sans Serif"));
    }
}
