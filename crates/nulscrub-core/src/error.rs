//! Error types for the scrub walk
//!
//! Under default options a walk cannot fail: blocked fields are recorded in
//! the report and skipped. Errors exist only for callers that opt into
//! [`AccessPolicy::Surface`](crate::AccessPolicy), which turns the first
//! blocked access into a typed error.

use serde::Serialize;
use thiserror::Error;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced when the access policy demands it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A declared field could not be projected out of its owner.
    #[error("field `{field}` of `{type_name}` is inaccessible: {reason}")]
    FieldInaccessible {
        type_name: &'static str,
        field: &'static str,
        reason: SkipReason,
    },

    /// A shared node could not be entered for scrubbing.
    #[error("shared `{handle}` node is inaccessible: {reason}")]
    SharedInaccessible {
        handle: &'static str,
        reason: SkipReason,
    },
}

/// Why a field or shared node was left untouched.
///
/// These are the runtime access failures a walk can actually hit: borrow
/// and lock contention, lock poisoning, and a schema projecting a receiver
/// of the wrong concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// A `RefCell` borrow of the node is still held elsewhere.
    BorrowHeld,
    /// A `Mutex` guarding the node is locked elsewhere.
    LockHeld,
    /// A `Mutex` guarding the node was poisoned by a panic.
    Poisoned,
    /// The projection did not match the receiver's concrete type.
    TypeMismatch,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SkipReason::BorrowHeld => write!(f, "a borrow is still held"),
            SkipReason::LockHeld => write!(f, "the lock is held elsewhere"),
            SkipReason::Poisoned => write!(f, "the lock is poisoned"),
            SkipReason::TypeMismatch => write!(f, "the receiver type did not match"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_display() {
        let err = Error::FieldInaccessible {
            type_name: "Employee",
            field: "grade",
            reason: SkipReason::TypeMismatch,
        };
        assert_eq!(
            err.to_string(),
            "field `grade` of `Employee` is inaccessible: the receiver type did not match"
        );
    }

    #[test]
    fn test_shared_error_display() {
        let err = Error::SharedInaccessible {
            handle: "Rc<RefCell<_>>",
            reason: SkipReason::BorrowHeld,
        };
        assert_eq!(
            err.to_string(),
            "shared `Rc<RefCell<_>>` node is inaccessible: a borrow is still held"
        );
    }
}
