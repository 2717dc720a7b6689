//! Walk engine
//!
//! The walker owns everything one normalization pass needs: the options
//! in force, the identity set that makes cycles terminate, the work-list
//! of shared handles discovered but not yet drained, and the running
//! [`Report`].
//!
//! Traversal is hybrid. Inline edges (`Box`, `Option`, container
//! elements, plain nested structs) recurse; shared edges (`Rc`, `Arc`)
//! are enqueued by identity and drained at the top level once the borrow
//! that discovered them has been released. Long shared chains therefore
//! walk in constant stack, and a well-formed graph never trips over its
//! own borrows: a `RefCell` borrow or `Mutex` lock that fails mid-walk
//! was taken by the caller, not by the walk itself.
//!
//! # Guarantees
//!
//! - Every reachable node is visited at most once per pass.
//! - Character slots equal to the sentinel are rewritten; nothing else
//!   is modified.
//! - Under [`AccessPolicy::Ignore`] a pass always completes, recording
//!   what it could not reach. Under [`AccessPolicy::Surface`] the first
//!   inaccessible field aborts the pass with an error; replacements made
//!   before the abort remain.

use std::any::{Any, TypeId};
use std::collections::{HashSet, VecDeque};
use std::mem;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Result, SkipReason};
use crate::registry;
use crate::schema::{Access, Field, FieldKind, Projection};
use crate::shared::SharedHandle;
use crate::Scrub;
use crate::{REPLACEMENT, SENTINEL};

// ── Options ───────────────────────────────────────────────

/// What a scrubbing pass cannot reach: ignore and record, or fail fast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessPolicy {
    /// Record the skip in the report and keep walking.
    #[default]
    Ignore,
    /// Return an error on the first inaccessible field or shared node.
    Surface,
}

/// Knobs for one scrubbing pass.
///
/// The defaults rewrite NUL (`'\u{0}'`) to a plain space and never fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// The character slot value to replace.
    pub sentinel: char,
    /// The value written over matched slots.
    pub replacement: char,
    /// How inaccessible fields are handled.
    pub access_policy: AccessPolicy,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            sentinel: SENTINEL,
            replacement: REPLACEMENT,
            access_policy: AccessPolicy::Ignore,
        }
    }
}

// ── Report ────────────────────────────────────────────────

/// One field (or shared node) a pass could not reach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    /// Type name of the node that declared the field.
    pub type_name: &'static str,
    /// Declared field name.
    pub field: &'static str,
    /// Why the field was skipped.
    pub reason: SkipReason,
}

/// What one scrubbing pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Distinct nodes visited, containers and wrappers included.
    pub visited: usize,
    /// Character slots rewritten.
    pub replaced: usize,
    /// Fields and shared nodes the pass could not reach.
    pub skipped: Vec<Skipped>,
}

impl Report {
    /// True when the pass reached everything it projected.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "visited {} node(s), replaced {} char(s), skipped {} field(s)",
            self.visited,
            self.replaced,
            self.skipped.len()
        )
    }
}

// ── Walker ────────────────────────────────────────────────

fn as_any_mut(node: &mut dyn Scrub) -> &mut dyn Any {
    node
}

pub(crate) struct Walker<'a> {
    options: &'a Options,
    /// Nodes already visited this pass, keyed by address and concrete
    /// type. A projected child can sit at offset zero of its parent
    /// (a niche-packed option's payload, an array's first element), so
    /// the address alone does not identify a node. The pair does: a
    /// type cannot contain itself by value, so two distinct nodes of
    /// one type never share an address.
    visited: HashSet<(usize, TypeId)>,
    /// Allocation identities of shared handles already queued. Kept
    /// apart from `visited`: a handle's allocation address and the
    /// address of the value inside it are distinct spaces.
    enqueued: HashSet<usize>,
    pending: VecDeque<SharedHandle>,
    report: Report,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(options: &'a Options) -> Self {
        Walker {
            options,
            visited: HashSet::new(),
            enqueued: HashSet::new(),
            pending: VecDeque::new(),
            report: Report::default(),
        }
    }

    pub(crate) fn into_report(self) -> Report {
        self.report
    }

    /// Visit the root, then drain shared handles until none remain.
    pub(crate) fn run(&mut self, root: &mut dyn Scrub) -> Result<()> {
        self.visit(root)?;
        while let Some(handle) = self.pending.pop_front() {
            self.visit_shared(&handle)?;
        }
        debug!(
            visited = self.report.visited,
            replaced = self.report.replaced,
            skipped = self.report.skipped.len(),
            "walk complete"
        );
        Ok(())
    }

    fn visit(&mut self, node: &mut dyn Scrub) -> Result<()> {
        // Zero-sized nodes all share an address, so identity de-dup
        // only applies to sized ones.
        if mem::size_of_val(&*node) > 0 {
            let address = &mut *node as *mut dyn Scrub as *const () as usize;
            let any: &dyn Any = &*node;
            if !self.visited.insert((address, any.type_id())) {
                return Ok(());
            }
        }

        let schema = registry::schema_of(&*node);
        self.report.visited += 1;
        trace!(type_name = schema.type_name(), "visiting");
        if schema.is_leaf() {
            return Ok(());
        }

        // Character slots first, then everything else, each in
        // declaration order.
        for field in schema.fields() {
            if field.kind() == FieldKind::Char {
                self.walk_field(schema.type_name(), field, &mut *node)?;
            }
        }
        for field in schema.fields() {
            if field.kind() != FieldKind::Char {
                self.walk_field(schema.type_name(), field, &mut *node)?;
            }
        }
        Ok(())
    }

    fn walk_field(
        &mut self,
        type_name: &'static str,
        field: &Field,
        node: &mut dyn Scrub,
    ) -> Result<()> {
        match field.access() {
            Access::Scalar(project) => match project(as_any_mut(node)) {
                Projection::Char(slot) => {
                    if *slot == self.options.sentinel {
                        *slot = self.options.replacement;
                        self.report.replaced += 1;
                    }
                    Ok(())
                }
                Projection::Chars(slice) => {
                    for slot in slice.iter_mut() {
                        if *slot == self.options.sentinel {
                            *slot = self.options.replacement;
                            self.report.replaced += 1;
                        }
                    }
                    Ok(())
                }
                Projection::Node(child) => self.visit(child),
                Projection::Absent => Ok(()),
                Projection::Blocked => {
                    self.field_blocked(type_name, field.name(), SkipReason::TypeMismatch)
                }
            },
            Access::Each(each) => {
                let mut deferred: Result<()> = Ok(());
                let matched = each(as_any_mut(node), &mut |child| {
                    if deferred.is_ok() {
                        deferred = self.visit(child);
                    }
                });
                if !matched {
                    self.field_blocked(type_name, field.name(), SkipReason::TypeMismatch)?;
                }
                deferred
            }
            Access::SharedEach(each) => {
                let matched = each(as_any_mut(node), &mut |handle| {
                    if self.enqueued.insert(handle.identity()) {
                        self.pending.push_back(handle);
                    }
                });
                if !matched {
                    self.field_blocked(type_name, field.name(), SkipReason::TypeMismatch)?;
                }
                Ok(())
            }
        }
    }

    /// Walk one drained handle. By the time a handle is drained the
    /// borrow that discovered it is gone, so a failed borrow or lock
    /// here means the caller is still holding the node.
    fn visit_shared(&mut self, handle: &SharedHandle) -> Result<()> {
        let mut deferred: Result<()> = Ok(());
        match handle.with_inner(|inner| deferred = self.visit(inner)) {
            Ok(()) => deferred,
            Err(reason) => self.shared_blocked(handle.kind_name(), reason),
        }
    }

    fn field_blocked(
        &mut self,
        type_name: &'static str,
        field: &'static str,
        reason: SkipReason,
    ) -> Result<()> {
        debug!(type_name, field, %reason, "field inaccessible");
        match self.options.access_policy {
            AccessPolicy::Ignore => {
                self.report.skipped.push(Skipped { type_name, field, reason });
                Ok(())
            }
            AccessPolicy::Surface => Err(Error::FieldInaccessible { type_name, field, reason }),
        }
    }

    fn shared_blocked(&mut self, handle: &'static str, reason: SkipReason) -> Result<()> {
        debug!(handle, %reason, "shared node inaccessible");
        match self.options.access_policy {
            AccessPolicy::Ignore => {
                self.report.skipped.push(Skipped {
                    type_name: handle,
                    field: "target",
                    reason,
                });
                Ok(())
            }
            AccessPolicy::Surface => Err(Error::SharedInaccessible { handle, reason }),
        }
    }
}
