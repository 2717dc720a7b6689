//! Field descriptors
//!
//! A [`Schema`] is the per-type accessor table the walker runs on: an
//! ordered list of named fields, each backed by a monomorphized projection
//! that turns `&mut dyn Any` back into a typed view of one field. Schemas
//! are built once per type in [`Scrub::schema`](crate::Scrub::schema) and
//! memoized by the registry, so the downcast-and-project cost is a handful
//! of pointer operations per field per visit, not reflective lookup.
//!
//! # Building a schema
//!
//! Each builder arm corresponds to one field shape the walk understands:
//!
//! - [`char_field`](Schema::char_field): a `char` slot, rewritten in place
//!   when it holds the sentinel
//! - [`chars`](Schema::chars): contiguous `char` storage, scanned
//!   element-by-element
//! - [`child`](Schema::child) / [`optional`](Schema::optional) /
//!   [`child_dyn`](Schema::child_dyn): a nested node, visited
//!   recursively (`None` is skipped)
//! - [`children`](Schema::children) / [`map_values`](Schema::map_values):
//!   element-yielding fields; map keys are never yielded
//! - [`shared`](Schema::shared): `Rc`/`Arc` edges, deduplicated by
//!   identity and walked off the work-list
//!
//! Projections are plain function pointers, so a schema never captures
//! state and is `Send + Sync` by construction.

use std::any::Any;

use crate::shared::SharedHandle;
use crate::Scrub;

// ── Projections ───────────────────────────────────────────

/// A typed view of one projected field.
pub(crate) enum Projection<'a> {
    /// A character slot eligible for sentinel replacement.
    Char(&'a mut char),
    /// Contiguous character storage, scanned in place.
    Chars(&'a mut [char]),
    /// A nested node to visit.
    Node(&'a mut dyn Scrub),
    /// The field is empty (`None`); skipped, not an access failure.
    Absent,
    /// The receiver was not of the type the projection was built for.
    Blocked,
}

type ScalarFn = Box<dyn for<'a> Fn(&'a mut dyn Any) -> Projection<'a> + Send + Sync>;
type EachFn = Box<dyn Fn(&mut dyn Any, &mut dyn FnMut(&mut dyn Scrub)) -> bool + Send + Sync>;
type SharedFn = Box<dyn Fn(&mut dyn Any, &mut dyn FnMut(SharedHandle)) -> bool + Send + Sync>;

/// How the walker reaches into a field.
pub(crate) enum Access {
    /// One projected value (char, char storage, or a single node).
    Scalar(ScalarFn),
    /// Yields each element node; returns false if the receiver mismatched.
    Each(EachFn),
    /// Yields shared handles; returns false if the receiver mismatched.
    SharedEach(SharedFn),
}

// ── Fields ────────────────────────────────────────────────

/// The declared shape of a field, driving per-field dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A `char` slot.
    Char,
    /// Contiguous `char` storage.
    Chars,
    /// A single nested node (possibly optional).
    Child,
    /// A sequence of nested nodes.
    Children,
    /// The values of a key-value mapping; keys are not traversed.
    MapValues,
    /// Shared-ownership edges.
    Shared,
}

/// One named, typed field accessor.
pub struct Field {
    name: &'static str,
    kind: FieldKind,
    access: Access,
}

impl Field {
    /// Declared field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared field shape.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub(crate) fn access(&self) -> &Access {
        &self.access
    }
}

// ── Schema ────────────────────────────────────────────────

/// The accessor table for one type: its name, leaf flag, and ordered
/// fields.
///
/// Only fields listed here are ever touched. A type that projects nothing
/// is walked as an empty branch: visited, counted, left unchanged.
pub struct Schema {
    type_name: &'static str,
    leaf: bool,
    fields: Vec<Field>,
}

impl Schema {
    /// A type with fields to project. Chain builder arms onto this.
    pub fn branch(type_name: &'static str) -> Self {
        Schema {
            type_name,
            leaf: false,
            fields: Vec::new(),
        }
    }

    /// An atomic type: visited for identity, never projected into.
    /// Fieldless enums and other value-like user types declare this.
    pub fn leaf(type_name: &'static str) -> Self {
        Schema {
            type_name,
            leaf: true,
            fields: Vec::new(),
        }
    }

    /// A type that declines introspection.
    ///
    /// Equivalent to a branch with no fields: the node is visited but none
    /// of its contents are reachable, so its character data is never
    /// normalized.
    pub fn opaque(type_name: &'static str) -> Self {
        Schema::branch(type_name)
    }

    /// Declared type name, used in reports and logs.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether instances are atomic.
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    /// The ordered accessor list.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    // ── Builder arms ──────────────────────────────────────

    /// A `char` field, rewritten when it holds the sentinel.
    pub fn char_field<T: Scrub>(
        mut self,
        name: &'static str,
        project: fn(&mut T) -> &mut char,
    ) -> Self {
        self.fields.push(Field {
            name,
            kind: FieldKind::Char,
            access: Access::Scalar(Box::new(move |target| match target.downcast_mut::<T>() {
                Some(typed) => Projection::Char(project(typed)),
                None => Projection::Blocked,
            })),
        });
        self
    }

    /// Contiguous `char` storage (`Vec<char>`, `[char; N]`, slices),
    /// scanned and rewritten element-by-element without recursion.
    pub fn chars<T: Scrub>(
        mut self,
        name: &'static str,
        project: fn(&mut T) -> &mut [char],
    ) -> Self {
        self.fields.push(Field {
            name,
            kind: FieldKind::Chars,
            access: Access::Scalar(Box::new(move |target| match target.downcast_mut::<T>() {
                Some(typed) => Projection::Chars(project(typed)),
                None => Projection::Blocked,
            })),
        });
        self
    }

    /// A nested node, visited recursively. Leaf-typed children return
    /// immediately from their own visit, so projecting a leaf field is
    /// harmless.
    pub fn child<T: Scrub, C: Scrub>(
        mut self,
        name: &'static str,
        project: fn(&mut T) -> &mut C,
    ) -> Self {
        self.fields.push(Field {
            name,
            kind: FieldKind::Child,
            access: Access::Scalar(Box::new(move |target| match target.downcast_mut::<T>() {
                Some(typed) => Projection::Node(project(typed) as &mut dyn Scrub),
                None => Projection::Blocked,
            })),
        });
        self
    }

    /// A nested node that may be absent. `None` is skipped silently, the
    /// empty-field semantics rather than an access failure.
    pub fn optional<T: Scrub, C: Scrub>(
        mut self,
        name: &'static str,
        project: fn(&mut T) -> Option<&mut C>,
    ) -> Self {
        self.fields.push(Field {
            name,
            kind: FieldKind::Child,
            access: Access::Scalar(Box::new(move |target| match target.downcast_mut::<T>() {
                Some(typed) => match project(typed) {
                    Some(inner) => Projection::Node(inner as &mut dyn Scrub),
                    None => Projection::Absent,
                },
                None => Projection::Blocked,
            })),
        });
        self
    }

    /// A nested node reached through a type-erased reference, such as the
    /// contents of a `Box<dyn Scrub>`.
    pub fn child_dyn<T: Scrub>(
        mut self,
        name: &'static str,
        project: fn(&mut T) -> &mut dyn Scrub,
    ) -> Self {
        self.fields.push(Field {
            name,
            kind: FieldKind::Child,
            access: Access::Scalar(Box::new(move |target| match target.downcast_mut::<T>() {
                Some(typed) => Projection::Node(project(typed)),
                None => Projection::Blocked,
            })),
        });
        self
    }

    /// A field yielding a sequence of nodes, each visited recursively.
    pub fn children<T: Scrub>(
        mut self,
        name: &'static str,
        each: fn(&mut T, &mut dyn FnMut(&mut dyn Scrub)),
    ) -> Self {
        self.fields.push(Field {
            name,
            kind: FieldKind::Children,
            access: Access::Each(Box::new(move |target, visit| {
                match target.downcast_mut::<T>() {
                    Some(typed) => {
                        each(typed, visit);
                        true
                    }
                    None => false,
                }
            })),
        });
        self
    }

    /// A key-value mapping: yields each value. Keys are never yielded.
    pub fn map_values<T: Scrub>(
        mut self,
        name: &'static str,
        each: fn(&mut T, &mut dyn FnMut(&mut dyn Scrub)),
    ) -> Self {
        self.fields.push(Field {
            name,
            kind: FieldKind::MapValues,
            access: Access::Each(Box::new(move |target, visit| {
                match target.downcast_mut::<T>() {
                    Some(typed) => {
                        each(typed, visit);
                        true
                    }
                    None => false,
                }
            })),
        });
        self
    }

    /// A field yielding shared-ownership handles. Each handle is
    /// deduplicated by identity and drained off the walk's work-list after
    /// the borrow that discovered it is released.
    pub fn shared<T: Scrub>(
        mut self,
        name: &'static str,
        each: fn(&mut T, &mut dyn FnMut(SharedHandle)),
    ) -> Self {
        self.fields.push(Field {
            name,
            kind: FieldKind::Shared,
            access: Access::SharedEach(Box::new(move |target, enqueue| {
                match target.downcast_mut::<T>() {
                    Some(typed) => {
                        each(typed, enqueue);
                        true
                    }
                    None => false,
                }
            })),
        });
        self
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let fields: Vec<(&str, FieldKind)> =
            self.fields.iter().map(|field| (field.name, field.kind)).collect();
        f.debug_struct("Schema")
            .field("type_name", &self.type_name)
            .field("leaf", &self.leaf)
            .field("fields", &fields)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pager {
        code: char,
        digits: Vec<char>,
    }

    impl Scrub for Pager {
        fn schema(&self) -> Schema {
            Schema::branch("Pager")
                .char_field("code", |p: &mut Self| &mut p.code)
                .chars("digits", |p: &mut Self| &mut p.digits)
        }
    }

    #[test]
    fn test_builder_records_declaration_order() {
        let pager = Pager { code: 'a', digits: vec![] };
        let schema = pager.schema();
        let listed: Vec<(&str, FieldKind)> = schema
            .fields()
            .iter()
            .map(|field| (field.name(), field.kind()))
            .collect();
        assert_eq!(
            listed,
            vec![("code", FieldKind::Char), ("digits", FieldKind::Chars)]
        );
        assert!(!schema.is_leaf());
        assert_eq!(schema.type_name(), "Pager");
    }

    #[test]
    fn test_char_projection_reads_and_writes() {
        let mut pager = Pager { code: 'x', digits: vec![] };
        let schema = pager.schema();
        let target: &mut dyn Any = &mut pager;
        match schema.fields()[0].access() {
            Access::Scalar(project) => match project(target) {
                Projection::Char(slot) => {
                    assert_eq!(*slot, 'x');
                    *slot = 'y';
                }
                _ => panic!("expected a char projection"),
            },
            _ => panic!("expected a scalar access"),
        }
        assert_eq!(pager.code, 'y');
    }

    #[test]
    fn test_wrong_receiver_is_blocked() {
        struct Other;
        impl Scrub for Other {
            fn schema(&self) -> Schema {
                Schema::leaf("Other")
            }
        }

        let pager = Pager { code: 'x', digits: vec![] };
        let schema = pager.schema();
        let mut other = Other;
        let target: &mut dyn Any = &mut other;
        match schema.fields()[0].access() {
            Access::Scalar(project) => {
                assert!(matches!(project(target), Projection::Blocked));
            }
            _ => panic!("expected a scalar access"),
        }
    }

    #[test]
    fn test_leaf_and_opaque_have_no_fields() {
        assert!(Schema::leaf("u32").is_leaf());
        assert!(Schema::leaf("u32").fields().is_empty());
        let opaque = Schema::opaque("Sealed");
        assert!(!opaque.is_leaf());
        assert!(opaque.fields().is_empty());
    }

    #[test]
    fn test_schema_debug_lists_fields() {
        let pager = Pager { code: 'a', digits: vec![] };
        let rendered = format!("{:?}", pager.schema());
        assert!(rendered.contains("Pager"));
        assert!(rendered.contains("code"));
        assert!(rendered.contains("digits"));
    }
}
