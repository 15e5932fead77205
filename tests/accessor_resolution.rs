//! Integration tests for member resolution and the descriptor rows built on top of it.
//!
//! The hierarchy mimics a forms toolkit: a `Component` base with a private field and a family
//! field, and a `Button` that hides the family field behind a property of the same name.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use hawkscope::{
    descriptor::{InstancePropertyDescriptor, TYPE_DESCRIPTOR_NAME},
    prelude::*,
};

struct Toolkit {
    component: TypeRc,
    button: TypeRc,
    reads: Arc<AtomicUsize>,
}

fn toolkit() -> Toolkit {
    let reads = Arc::new(AtomicUsize::new(0));
    let counted = reads.clone();

    let component = TypeBuilder::new("Toolkit", "Component")
        .field(FieldDef::new("site", "System.Object").visibility(Visibility::Private))
        .field(
            FieldDef::new("Caption", "System.String")
                .visibility(Visibility::Family)
                .initial("component"),
        )
        .property(PropertyDef::auto("Name", "System.String").initial(""))
        .property(
            PropertyDef::auto("Theme", "System.String")
                .as_static()
                .initial("Classic")
                .category("Appearance"),
        )
        .property(PropertyDef::new("Site", "System.Object").getter(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
            Err(InvokeError::TargetInvocation("Site is not available.".to_string()))
        }))
        .build();

    let button = TypeBuilder::new("Toolkit", "Button")
        .base(&component)
        .property(
            PropertyDef::auto("Caption", "System.String")
                .initial("OK")
                .category("Appearance"),
        )
        .method(
            MethodDef::new("Click", "System.Void", |_, _| Ok(Value::Null))
                .parameter("times", "System.Int32"),
        )
        .event(EventDef::new("Clicked", "System.EventHandler"))
        .build();

    Toolkit {
        component,
        button,
        reads,
    }
}

#[test]
fn test_derived_property_hides_base_field() -> Result<()> {
    let toolkit = toolkit();
    let button = Object::new(&toolkit.button);

    let caption = MemberAccessor::resolve_any(&toolkit.button, "Caption");
    assert_eq!(caption.kind(), AccessorKind::Property);
    assert_eq!(caption.get(Some(&Value::Object(button.clone())))?, Value::from("OK"));

    // The base field is still there, and still reachable on its declaring type.
    let field = MemberAccessor::field(&toolkit.component, "Caption").bind(&button);
    assert!(field.is_valid());
    assert_eq!(field.get(None)?, Value::from("component"));
    Ok(())
}

#[test]
fn test_resolution_climbs_to_base_types() {
    let toolkit = toolkit();

    assert!(MemberAccessor::field(&toolkit.component, "site").is_valid());
    // Resolution climbs to the base and searches it with non-public flags.
    assert!(MemberAccessor::field(&toolkit.button, "site").is_valid());
    assert!(!MemberAccessor::field(&toolkit.button, "nothing").is_valid());

    let missing = MemberAccessor::property(&toolkit.button, "nothing");
    assert!(matches!(
        missing.get(None),
        Err(Error::InvalidAccessor { .. })
    ));
}

#[test]
fn test_static_property_ignores_target() -> Result<()> {
    let toolkit = toolkit();
    let theme = MemberAccessor::property(&toolkit.button, "Theme");
    assert!(theme.is_static());

    theme.set(None, Value::from("Dark"))?;
    let other = Value::Object(Object::new(&toolkit.component));
    assert_eq!(theme.get(Some(&other))?, Value::from("Dark"));
    Ok(())
}

#[test]
fn test_method_parameter_count_is_checked() {
    let toolkit = toolkit();
    let button = Object::new(&toolkit.button);
    let click = MemberAccessor::method_of(&button, "Click");

    assert!(click.invoke(None, &[Value::Int(1)]).is_ok());
    assert!(matches!(
        click.invoke(None, &[]),
        Err(Error::Invoke(InvokeError::ParameterCount {
            expected: 1,
            actual: 0
        }))
    ));
}

#[test]
fn test_failed_read_is_sticky() {
    let toolkit = toolkit();
    let target = Value::Object(Object::new(&toolkit.button));
    let site = InstancePropertyDescriptor::new(
        MemberAccessor::property(&toolkit.button, "Site"),
        true,
    );

    assert_eq!(site.get_value(&target), Value::from("Site is not available."));
    assert_eq!(site.get_value(&target), Value::from("Site is not available."));
    assert_eq!(toolkit.reads.load(Ordering::SeqCst), 1);

    site.clear_error();
    site.get_value(&target);
    assert_eq!(toolkit.reads.load(Ordering::SeqCst), 2);
}

#[test]
fn test_collected_rows() {
    let toolkit = toolkit();
    let registry = TypeDescriptorRegistry::new();
    let component = Value::Object(Object::new(&toolkit.button));

    let collector = PropertyCollector::new(&registry, CollectorOptions::default());
    let rows = collector.properties(&component);
    let names: Vec<&str> = rows.iter().map(|row| row.name()).collect();

    assert_eq!(names[0], TYPE_DESCRIPTOR_NAME);
    assert_eq!(names.iter().filter(|name| **name == "Caption").count(), 1);
    assert!(names.contains(&"Theme"));
    assert!(names.contains(&"Site"));

    let caption = rows.iter().find(|row| row.name() == "Caption").unwrap();
    assert_eq!(caption.get_value(&component), Value::from("OK"));

    let events = collector.events(&component);
    assert_eq!(events.len(), 1);
    assert!(events[0].is_read_only());
    assert_eq!(events[0].get_value(&component), Value::Null);

    let appearance = filter(&rows, "appear");
    let names: Vec<&str> = appearance.iter().map(|row| row.name()).collect();
    assert!(names.contains(&"Caption"));
    assert!(names.contains(&"Theme"));
    assert!(!names.contains(&"Name"));
    assert_eq!(filter(&rows, "  ").len(), rows.len());
}

#[test]
fn test_without_statics_or_base_classes() {
    let toolkit = toolkit();
    let registry = TypeDescriptorRegistry::new();
    let component = Value::Object(Object::new(&toolkit.button));

    let options = CollectorOptions {
        keep_original_category: false,
        retrieve_static_members: false,
        inspect_base_classes: false,
    };
    let rows = PropertyCollector::new(&registry, options).properties(&component);
    let names: Vec<&str> = rows.iter().map(|row| row.name()).collect();

    assert_eq!(names, [TYPE_DESCRIPTOR_NAME, "Caption"]);
    assert_eq!(rows[1].category(), "(instance: Button)");
}

#[test]
fn test_primitives_have_no_rows() {
    let registry = TypeDescriptorRegistry::new();
    let collector = PropertyCollector::new(&registry, CollectorOptions::default());
    assert!(collector.properties(&Value::Int(3)).is_empty());
    assert!(collector.properties(&Value::from("text")).is_empty());
    assert!(collector.properties(&Value::Null).is_empty());
}

#[test]
fn test_inspect_listing() -> Result<()> {
    let toolkit = toolkit();
    let button = Object::new(&toolkit.button);
    MemberAccessor::property_of(&button, "Name").set(None, Value::from("ok"))?;

    let lines = inspect(&Value::Object(button.clone()))?;
    assert!(lines.contains(&" [p] Caption = OK".to_string()));
    assert!(lines.contains(&" [p] Name = ok".to_string()));
    assert!(lines.contains(&" [p] Site = Site is not available.".to_string()));
    assert!(lines.contains(&" [m] Click(Int32 times)".to_string()));
    assert!(lines.contains(&" [e] Clicked<EventHandler>".to_string()));

    assert_eq!(
        resolve_path(&Value::Object(button), "Caption")?,
        Value::from("OK")
    );
    Ok(())
}
