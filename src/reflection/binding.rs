//! Member lookup on a single type for a given set of binding flags.
//!
//! The rules follow the usual managed reflection semantics:
//! - a member is a candidate only if its visibility bit and its instance/static bit are present
//!   in the flags, so flags lacking either group match nothing
//! - unless [`BindingFlags::DECLARED_ONLY`] is set, inherited members are visible: non-private
//!   instance members always, static members only with [`BindingFlags::FLATTEN_HIERARCHY`]
//! - private members of base types are never visible
//! - a member declared on a more derived type hides base members with the same name (same name
//!   and parameter types for methods), whether or not the hiding member itself matches
//! - [`BindingFlags::IGNORE_CASE`] makes name comparison case-insensitive
//!
//! A named lookup that finds more than one candidate reports [`Lookup::Ambiguous`] instead of
//! picking one; callers fall back to [`find_by_enumeration`].

use std::collections::HashSet;

use crate::reflection::{BindingFlags, MemberKind, MemberRc, RuntimeType, TypeRc, Visibility};

/// A member found by a lookup, together with the type that declares it.
#[derive(Debug, Clone)]
pub struct MemberMatch {
    /// The declaring type
    pub declaring: TypeRc,
    /// The member
    pub member: MemberRc,
    /// Distance from the searched type to the declaring type
    pub depth: usize,
}

impl MemberMatch {
    /// `Declaring.Type.Member`
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring.full_name(), self.member.name)
    }
}

/// Outcome of a named lookup.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// Exactly one candidate
    Found(MemberMatch),
    /// More than one candidate; carries the candidate count
    Ambiguous(usize),
    /// No candidate
    NotFound,
}

/// Every member of `kind` visible on `ty` under `flags`, most derived first, in declaration order.
#[must_use]
pub fn get_members(ty: &TypeRc, kind: MemberKind, flags: BindingFlags) -> Vec<MemberMatch> {
    let mut found = Vec::new();
    if !flags.can_match() {
        return found;
    }

    let mut hidden: HashSet<String> = HashSet::new();
    for (depth, level) in RuntimeType::hierarchy(ty).enumerate() {
        if depth > 0 && flags.contains(BindingFlags::DECLARED_ONLY) {
            break;
        }

        let mut declared_here = Vec::new();
        for member in level.declared(kind) {
            let key = member.hide_key();
            if hidden.contains(&key) {
                continue;
            }
            declared_here.push(key);

            if !flags.contains(member.visibility.binding_flag()) {
                continue;
            }

            let binding = if member.is_static() {
                BindingFlags::STATIC
            } else {
                BindingFlags::INSTANCE
            };
            if !flags.contains(binding) {
                continue;
            }

            if depth > 0 {
                if member.visibility == Visibility::Private {
                    continue;
                }
                if member.is_static() && !flags.contains(BindingFlags::FLATTEN_HIERARCHY) {
                    continue;
                }
            }

            found.push(MemberMatch {
                declaring: level.clone(),
                member: member.clone(),
                depth,
            });
        }
        hidden.extend(declared_here);
    }

    found
}

/// Named lookup of a member of `kind` on `ty`.
#[must_use]
pub fn get_member(ty: &TypeRc, kind: MemberKind, name: &str, flags: BindingFlags) -> Lookup {
    let ignore_case = flags.contains(BindingFlags::IGNORE_CASE);
    let mut candidates: Vec<MemberMatch> = get_members(ty, kind, flags)
        .into_iter()
        .filter(|candidate| names_match(&candidate.member.name, name, ignore_case))
        .collect();

    match candidates.len() {
        0 => Lookup::NotFound,
        1 => candidates.pop().map_or(Lookup::NotFound, Lookup::Found),
        count => Lookup::Ambiguous(count),
    }
}

/// Enumerates all members of `kind` on `ty` and returns the first whose name matches exactly.
///
/// Unlike [`get_member`] this never reports ambiguity, and the comparison is always
/// case-sensitive.
#[must_use]
pub fn find_by_enumeration(
    ty: &TypeRc,
    kind: MemberKind,
    name: &str,
    flags: BindingFlags,
) -> Option<MemberMatch> {
    get_members(ty, kind, flags)
        .into_iter()
        .find(|candidate| candidate.member.name == name)
}

fn names_match(member: &str, requested: &str, ignore_case: bool) -> bool {
    if ignore_case {
        member.to_lowercase() == requested.to_lowercase()
    } else {
        member == requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::{FieldDef, MemberDef, MethodDef, PropertyDef, TypeBuilder, Value};

    fn public_instance() -> BindingFlags {
        BindingFlags::PUBLIC | BindingFlags::INSTANCE
    }

    #[test]
    fn test_default_matches_nothing() {
        let ty = TypeBuilder::new("", "A")
            .field(FieldDef::new("x", "System.Int32"))
            .build();
        assert!(get_members(&ty, MemberKind::Field, BindingFlags::DEFAULT).is_empty());
        assert!(get_members(
            &ty,
            MemberKind::Field,
            BindingFlags::INSTANCE | BindingFlags::FLATTEN_HIERARCHY
        )
        .is_empty());
        assert_eq!(get_members(&ty, MemberKind::Field, public_instance()).len(), 1);
    }

    #[test]
    fn test_private_base_members_are_invisible() {
        let base = TypeBuilder::new("", "Base")
            .field(FieldDef::new("secret", "System.Int32").visibility(Visibility::Private))
            .field(FieldDef::new("shared", "System.Int32").visibility(Visibility::Family))
            .build();
        let derived = TypeBuilder::new("", "Derived").base(&base).build();

        let flags = BindingFlags::NON_PUBLIC | BindingFlags::INSTANCE;
        let names: Vec<String> = get_members(&derived, MemberKind::Field, flags)
            .into_iter()
            .map(|m| m.member.name.clone())
            .collect();
        assert_eq!(names, ["shared"]);

        let on_base = get_members(&base, MemberKind::Field, flags);
        assert_eq!(on_base.len(), 2);
    }

    #[test]
    fn test_inherited_statics_need_flatten() {
        let base = TypeBuilder::new("", "Base")
            .field(FieldDef::new("Count", "System.Int32").as_static())
            .build();
        let derived = TypeBuilder::new("", "Derived").base(&base).build();

        let statics = BindingFlags::PUBLIC | BindingFlags::STATIC;
        assert!(matches!(
            get_member(&derived, MemberKind::Field, "Count", statics),
            Lookup::NotFound
        ));
        match get_member(
            &derived,
            MemberKind::Field,
            "Count",
            statics | BindingFlags::FLATTEN_HIERARCHY,
        ) {
            Lookup::Found(found) => {
                assert_eq!(found.declaring.name(), "Base");
                assert_eq!(found.depth, 1);
            }
            other => panic!("Expected Found, got {other:?}"),
        }
    }

    #[test]
    fn test_declared_only_skips_base() {
        let base = TypeBuilder::new("", "Base")
            .property(PropertyDef::auto("Text", "System.String"))
            .build();
        let derived = TypeBuilder::new("", "Derived").base(&base).build();

        let flags = public_instance() | BindingFlags::DECLARED_ONLY;
        assert!(get_members(&derived, MemberKind::Property, flags).is_empty());
        assert_eq!(get_members(&base, MemberKind::Property, flags).len(), 1);
    }

    #[test]
    fn test_derived_member_hides_base() {
        let base = TypeBuilder::new("", "Base")
            .property(PropertyDef::auto("Text", "System.String"))
            .build();
        let derived = TypeBuilder::new("", "Derived")
            .base(&base)
            .property(PropertyDef::auto("Text", "System.String"))
            .build();

        match get_member(&derived, MemberKind::Property, "Text", public_instance()) {
            Lookup::Found(found) => assert_eq!(found.declaring.name(), "Derived"),
            other => panic!("Expected Found, got {other:?}"),
        }
    }

    #[test]
    fn test_hiding_ignores_flags_of_the_hiding_member() {
        let base = TypeBuilder::new("", "Base")
            .property(PropertyDef::auto("Text", "System.String"))
            .build();
        let derived = TypeBuilder::new("", "Derived")
            .base(&base)
            .property(PropertyDef::auto("Text", "System.String").visibility(Visibility::Family))
            .build();

        assert!(matches!(
            get_member(&derived, MemberKind::Property, "Text", public_instance()),
            Lookup::NotFound
        ));
    }

    #[test]
    fn test_overloads_are_ambiguous() {
        let ty = TypeBuilder::new("", "Printer")
            .method(MethodDef::new("Print", "System.Void", |_, _| Ok(Value::Null)))
            .method(
                MethodDef::new("Print", "System.Void", |_, _| Ok(Value::Null))
                    .parameter("text", "System.String"),
            )
            .build();

        assert!(matches!(
            get_member(&ty, MemberKind::Method, "Print", public_instance()),
            Lookup::Ambiguous(2)
        ));
        let first = find_by_enumeration(&ty, MemberKind::Method, "Print", public_instance());
        assert!(first.is_some_and(|m| m.member.parameters().is_empty()));
    }

    #[test]
    fn test_ignore_case() {
        let ty = TypeBuilder::new("", "A")
            .property(PropertyDef::auto("Caption", "System.String"))
            .build();
        assert!(matches!(
            get_member(&ty, MemberKind::Property, "caption", public_instance()),
            Lookup::NotFound
        ));
        assert!(matches!(
            get_member(
                &ty,
                MemberKind::Property,
                "caption",
                public_instance() | BindingFlags::IGNORE_CASE
            ),
            Lookup::Found(_)
        ));
        assert!(find_by_enumeration(
            &ty,
            MemberKind::Property,
            "caption",
            public_instance() | BindingFlags::IGNORE_CASE
        )
        .is_none());
    }
}
