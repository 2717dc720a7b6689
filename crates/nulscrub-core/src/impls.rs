//! Container impls
//!
//! Standard containers participate in a walk without user code: sequences
//! yield their elements, maps yield their values (keys are never touched),
//! `Option` treats `None` as an absent field, and the shared-ownership
//! wrappers hand the walk a [`SharedHandle`] so aliased nodes are visited
//! once through the work-list.
//!
//! `Vec<char>` and `[char; N]` are character storage, not element
//! sequences: their schemas use the scan-in-place arm, so every sentinel
//! element is rewritten without per-element visits.
//!
//! `HashSet` and `BTreeSet` have no impls here. Set elements are
//! hash/order bearing and only reachable immutably, so a walk could not
//! rewrite them in place. Wrap set-like data in a sequence if its
//! characters need scrubbing.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use crate::schema::Schema;
use crate::shared::SharedHandle;
use crate::Scrub;

// ── Sequences ─────────────────────────────────────────────

impl<T: Scrub> Scrub for Vec<T> {
    fn schema(&self) -> Schema {
        Schema::branch("Vec").children("items", |v: &mut Self, visit| {
            for item in v.iter_mut() {
                visit(item);
            }
        })
    }
}

impl<T: Scrub> Scrub for VecDeque<T> {
    fn schema(&self) -> Schema {
        Schema::branch("VecDeque").children("items", |q: &mut Self, visit| {
            for item in q.iter_mut() {
                visit(item);
            }
        })
    }
}

impl<T: Scrub, const N: usize> Scrub for [T; N] {
    fn schema(&self) -> Schema {
        Schema::branch("array").children("items", |a: &mut Self, visit| {
            for item in a.iter_mut() {
                visit(item);
            }
        })
    }
}

// ── Character storage ─────────────────────────────────────

impl Scrub for Vec<char> {
    fn schema(&self) -> Schema {
        Schema::branch("Vec<char>").chars("chars", |v: &mut Self| v.as_mut_slice())
    }
}

impl<const N: usize> Scrub for [char; N] {
    fn schema(&self) -> Schema {
        Schema::branch("[char; N]").chars("chars", |a: &mut Self| &mut a[..])
    }
}

// ── Wrappers ──────────────────────────────────────────────

impl<T: Scrub> Scrub for Box<T> {
    fn schema(&self) -> Schema {
        Schema::branch("Box").child("inner", |b: &mut Self| &mut **b)
    }
}

impl Scrub for Box<dyn Scrub> {
    fn schema(&self) -> Schema {
        Schema::branch("Box<dyn Scrub>").child_dyn("inner", |b: &mut Self| &mut **b)
    }
}

impl<T: Scrub> Scrub for Option<T> {
    fn schema(&self) -> Schema {
        Schema::branch("Option").optional("inner", |o: &mut Self| o.as_mut())
    }
}

// ── Maps ──────────────────────────────────────────────────

impl<K: 'static, V: Scrub, S: 'static> Scrub for HashMap<K, V, S> {
    fn schema(&self) -> Schema {
        Schema::branch("HashMap").map_values("values", |m: &mut Self, visit| {
            for value in m.values_mut() {
                visit(value);
            }
        })
    }
}

impl<K: 'static, V: Scrub> Scrub for BTreeMap<K, V> {
    fn schema(&self) -> Schema {
        Schema::branch("BTreeMap").map_values("values", |m: &mut Self, visit| {
            for value in m.values_mut() {
                visit(value);
            }
        })
    }
}

// ── Shared ownership ──────────────────────────────────────

impl<T: Scrub> Scrub for Rc<RefCell<T>> {
    fn schema(&self) -> Schema {
        Schema::branch("Rc<RefCell>").shared("target", |rc: &mut Self, enqueue| {
            enqueue(SharedHandle::cell(rc));
        })
    }
}

impl Scrub for Rc<RefCell<dyn Scrub>> {
    fn schema(&self) -> Schema {
        Schema::branch("Rc<RefCell<dyn Scrub>>").shared("target", |rc: &mut Self, enqueue| {
            enqueue(SharedHandle::Cell(rc.clone()));
        })
    }
}

impl<T: Scrub> Scrub for Arc<Mutex<T>> {
    fn schema(&self) -> Schema {
        Schema::branch("Arc<Mutex>").shared("target", |arc: &mut Self, enqueue| {
            enqueue(SharedHandle::locked(arc));
        })
    }
}

impl Scrub for Arc<Mutex<dyn Scrub>> {
    fn schema(&self) -> Schema {
        Schema::branch("Arc<Mutex<dyn Scrub>>").shared("target", |arc: &mut Self, enqueue| {
            enqueue(SharedHandle::Locked(arc.clone()));
        })
    }
}
