//! Binding flags, member attributes and the ordered accessor search plans.
//!
//! The search plans are plain data: each accessor kind walks its plan front to back at every
//! level of the type hierarchy and stops at the first hit. Keeping the plans as tables makes the
//! resolution order observable and testable on its own.

use bitflags::bitflags;
use strum::{Display, EnumIter, EnumString};

bitflags! {
    #[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
    /// Criteria controlling which members a lookup considers
    pub struct BindingFlags: u32 {
        /// No criteria; matches nothing
        const DEFAULT = 0x0000_0000;
        /// Compare member names case-insensitively
        const IGNORE_CASE = 0x0000_0001;
        /// Only members declared on the searched type, nothing inherited
        const DECLARED_ONLY = 0x0000_0002;
        /// Include instance members
        const INSTANCE = 0x0000_0004;
        /// Include static members
        const STATIC = 0x0000_0008;
        /// Include public members
        const PUBLIC = 0x0000_0010;
        /// Include non-public members
        const NON_PUBLIC = 0x0000_0020;
        /// Include inherited static members
        const FLATTEN_HIERARCHY = 0x0000_0040;
        /// Field read intent
        const GET_FIELD = 0x0000_0400;
        /// Field write intent
        const SET_FIELD = 0x0000_0800;
        /// Property read intent
        const GET_PROPERTY = 0x0000_1000;
        /// Property write intent
        const SET_PROPERTY = 0x0000_2000;
        /// COM put intent
        const PUT_DISP_PROPERTY = 0x0000_4000;
        /// COM put-by-reference intent
        const PUT_REF_DISP_PROPERTY = 0x0000_8000;
        /// Ignore the return value of an invocation
        const IGNORE_RETURN = 0x0100_0000;
    }
}

impl BindingFlags {
    /// Returns true when these flags can match anything at all.
    ///
    /// A lookup needs at least one visibility bit and at least one binding bit, otherwise the
    /// candidate set is empty.
    #[must_use]
    pub fn can_match(self) -> bool {
        self.intersects(BindingFlags::PUBLIC | BindingFlags::NON_PUBLIC)
            && self.intersects(BindingFlags::INSTANCE | BindingFlags::STATIC)
    }
}

bitflags! {
    #[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, Default)]
    /// Attributes of a declared member
    pub struct MemberAttributes: u32 {
        /// Member belongs to the type rather than to instances
        const STATIC = 0x0001;
        /// Compiler generated accessor such as `get_Text` or `add_Click`
        const SPECIAL_NAME = 0x0002;
        /// Field can only be assigned during construction
        const INIT_ONLY = 0x0004;
    }
}

/// Accessibility of a declared member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Default)]
pub enum Visibility {
    /// Accessible by anyone
    #[default]
    Public,
    /// Accessible by the declaring type and its subtypes
    Family,
    /// Accessible within the declaring assembly
    Assembly,
    /// Accessible only by the declaring type; never inherited
    Private,
}

impl Visibility {
    /// The binding flag a lookup must carry to see a member with this visibility.
    #[must_use]
    pub fn binding_flag(self) -> BindingFlags {
        match self {
            Visibility::Public => BindingFlags::PUBLIC,
            _ => BindingFlags::NON_PUBLIC,
        }
    }
}

/// One entry of an accessor search plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchStep {
    /// Short name used in logs and diagnostics
    pub label: &'static str,
    /// Flags passed to the named lookup and the enumeration fallback
    pub flags: BindingFlags,
}

impl SearchStep {
    const fn new(label: &'static str, flags: BindingFlags) -> Self {
        SearchStep { label, flags }
    }
}

const NON_PUBLIC_INSTANCE: BindingFlags = BindingFlags::NON_PUBLIC.union(BindingFlags::INSTANCE);
const NON_PUBLIC_STATIC: BindingFlags = BindingFlags::NON_PUBLIC.union(BindingFlags::STATIC);

const BROAD_COMMON: BindingFlags = BindingFlags::NON_PUBLIC
    .union(BindingFlags::PUBLIC)
    .union(BindingFlags::FLATTEN_HIERARCHY)
    .union(BindingFlags::GET_FIELD)
    .union(BindingFlags::GET_PROPERTY)
    .union(BindingFlags::IGNORE_CASE)
    .union(BindingFlags::IGNORE_RETURN)
    .union(BindingFlags::INSTANCE)
    .union(BindingFlags::PUT_DISP_PROPERTY)
    .union(BindingFlags::PUT_REF_DISP_PROPERTY)
    .union(BindingFlags::STATIC);

/// Field resolution order.
pub const FIELD_SEARCH_ORDER: &[SearchStep] = &[
    SearchStep::new("default", BindingFlags::DEFAULT),
    SearchStep::new(
        "instance+flatten",
        BindingFlags::INSTANCE.union(BindingFlags::FLATTEN_HIERARCHY),
    ),
    SearchStep::new(
        "static+flatten",
        BindingFlags::STATIC.union(BindingFlags::FLATTEN_HIERARCHY),
    ),
    SearchStep::new("non-public instance", NON_PUBLIC_INSTANCE),
    SearchStep::new(
        "non-public instance+flatten",
        NON_PUBLIC_INSTANCE.union(BindingFlags::FLATTEN_HIERARCHY),
    ),
    SearchStep::new(
        "non-public instance+flatten+get",
        NON_PUBLIC_INSTANCE
            .union(BindingFlags::FLATTEN_HIERARCHY)
            .union(BindingFlags::GET_FIELD),
    ),
    SearchStep::new(
        "non-public instance+get",
        NON_PUBLIC_INSTANCE.union(BindingFlags::GET_FIELD),
    ),
    SearchStep::new("broad", BROAD_COMMON.union(BindingFlags::SET_FIELD)),
    SearchStep::new("non-public static", NON_PUBLIC_STATIC),
    SearchStep::new(
        "non-public static+flatten+get",
        NON_PUBLIC_STATIC
            .union(BindingFlags::FLATTEN_HIERARCHY)
            .union(BindingFlags::GET_FIELD),
    ),
    SearchStep::new(
        "non-public static+get",
        NON_PUBLIC_STATIC.union(BindingFlags::GET_FIELD),
    ),
];

/// Property resolution order.
pub const PROPERTY_SEARCH_ORDER: &[SearchStep] = &[
    SearchStep::new("default", BindingFlags::DEFAULT),
    SearchStep::new(
        "instance+flatten",
        BindingFlags::INSTANCE.union(BindingFlags::FLATTEN_HIERARCHY),
    ),
    SearchStep::new(
        "static+flatten",
        BindingFlags::STATIC.union(BindingFlags::FLATTEN_HIERARCHY),
    ),
    SearchStep::new("non-public instance", NON_PUBLIC_INSTANCE),
    SearchStep::new(
        "non-public instance+flatten",
        NON_PUBLIC_INSTANCE.union(BindingFlags::FLATTEN_HIERARCHY),
    ),
    SearchStep::new(
        "non-public instance+flatten+get",
        NON_PUBLIC_INSTANCE
            .union(BindingFlags::FLATTEN_HIERARCHY)
            .union(BindingFlags::GET_PROPERTY),
    ),
    SearchStep::new(
        "non-public instance+get",
        NON_PUBLIC_INSTANCE.union(BindingFlags::GET_PROPERTY),
    ),
    SearchStep::new("broad", BROAD_COMMON.union(BindingFlags::SET_PROPERTY)),
    SearchStep::new("non-public static", NON_PUBLIC_STATIC),
    SearchStep::new(
        "non-public static+flatten+get",
        NON_PUBLIC_STATIC
            .union(BindingFlags::FLATTEN_HIERARCHY)
            .union(BindingFlags::GET_PROPERTY),
    ),
    SearchStep::new(
        "non-public static+get",
        NON_PUBLIC_STATIC.union(BindingFlags::GET_PROPERTY),
    ),
];

/// Method resolution order.
pub const METHOD_SEARCH_ORDER: &[SearchStep] = &[
    SearchStep::new("non-public instance", NON_PUBLIC_INSTANCE),
    SearchStep::new(
        "public instance",
        BindingFlags::PUBLIC.union(BindingFlags::INSTANCE),
    ),
    SearchStep::new(
        "non-public instance+flatten",
        NON_PUBLIC_INSTANCE.union(BindingFlags::FLATTEN_HIERARCHY),
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags_match_nothing() {
        assert!(!BindingFlags::DEFAULT.can_match());
        assert!(!BindingFlags::INSTANCE.union(BindingFlags::FLATTEN_HIERARCHY).can_match());
        assert!(!BindingFlags::PUBLIC.can_match());
        assert!(BindingFlags::PUBLIC.union(BindingFlags::STATIC).can_match());
    }

    #[test]
    fn test_field_and_property_plans_share_shape() {
        assert_eq!(FIELD_SEARCH_ORDER.len(), 11);
        assert_eq!(PROPERTY_SEARCH_ORDER.len(), 11);
        for (field, property) in FIELD_SEARCH_ORDER.iter().zip(PROPERTY_SEARCH_ORDER) {
            assert_eq!(field.label, property.label);
        }

        let broad = FIELD_SEARCH_ORDER[7];
        assert_eq!(broad.label, "broad");
        assert!(broad.flags.contains(BindingFlags::SET_FIELD));
        assert!(!broad.flags.contains(BindingFlags::SET_PROPERTY));
        assert!(PROPERTY_SEARCH_ORDER[7]
            .flags
            .contains(BindingFlags::SET_PROPERTY));
    }

    #[test]
    fn test_property_plan_uses_property_access_only() {
        let field_access = BindingFlags::GET_FIELD | BindingFlags::SET_FIELD;
        assert!(PROPERTY_SEARCH_ORDER
            .iter()
            .filter(|step| step.label != "broad")
            .all(|step| !step.flags.intersects(field_access)));
        assert!(PROPERTY_SEARCH_ORDER[10]
            .flags
            .contains(BindingFlags::GET_PROPERTY));
    }

    #[test]
    fn test_plan_order_starts_narrow() {
        assert_eq!(FIELD_SEARCH_ORDER[0].flags, BindingFlags::DEFAULT);
        assert_eq!(FIELD_SEARCH_ORDER[3].flags, NON_PUBLIC_INSTANCE);
        assert_eq!(FIELD_SEARCH_ORDER[8].flags, NON_PUBLIC_STATIC);
        assert_eq!(METHOD_SEARCH_ORDER[0].flags, NON_PUBLIC_INSTANCE);
        assert_eq!(
            METHOD_SEARCH_ORDER[1].flags,
            BindingFlags::PUBLIC | BindingFlags::INSTANCE
        );
    }

    #[test]
    fn test_visibility_binding_flag() {
        assert_eq!(Visibility::Public.binding_flag(), BindingFlags::PUBLIC);
        assert_eq!(Visibility::Private.binding_flag(), BindingFlags::NON_PUBLIC);
        assert_eq!(Visibility::Family.binding_flag(), BindingFlags::NON_PUBLIC);
    }
}
