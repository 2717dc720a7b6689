//! Shared-ownership edges
//!
//! Cycles in a graph of mutable nodes can only arise through shared
//! ownership, so shared edges are the ones the walker must deduplicate by
//! identity. [`SharedHandle`] wraps the two standard shared-mutability
//! shapes, exposes the pointer identity of the underlying allocation, and
//! enters the node through the non-blocking accessors so that contention
//! becomes a per-field skip instead of a deadlock or panic.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex, TryLockError};

use crate::error::SkipReason;
use crate::Scrub;

/// An owned handle to a shared node discovered during a walk.
///
/// Handles are cheap clones of the underlying `Rc`/`Arc`; holding one does
/// not borrow the node. The walker queues handles and enters each at most
/// once per top-level call, keyed by [`identity`](SharedHandle::identity).
#[derive(Clone)]
pub enum SharedHandle {
    /// Single-threaded shared node: `Rc<RefCell<T>>`.
    Cell(Rc<RefCell<dyn Scrub>>),
    /// Thread-safe shared node: `Arc<Mutex<T>>`.
    Locked(Arc<Mutex<dyn Scrub>>),
}

impl SharedHandle {
    /// Wrap an `Rc<RefCell<T>>` edge.
    pub fn cell<T: Scrub>(node: &Rc<RefCell<T>>) -> Self {
        SharedHandle::Cell(node.clone())
    }

    /// Wrap an `Arc<Mutex<T>>` edge.
    pub fn locked<T: Scrub>(node: &Arc<Mutex<T>>) -> Self {
        SharedHandle::Locked(node.clone())
    }

    /// Address of the shared allocation.
    ///
    /// Stable for the lifetime of the allocation and shared by every clone
    /// of the same `Rc`/`Arc`, which is exactly the identity the visited
    /// set needs.
    pub fn identity(&self) -> usize {
        match self {
            SharedHandle::Cell(cell) => Rc::as_ptr(cell) as *const () as usize,
            SharedHandle::Locked(lock) => Arc::as_ptr(lock) as *const () as usize,
        }
    }

    /// Name of the wrapper shape, for reports and errors.
    ///
    /// When access is blocked the inner type cannot be inspected, so the
    /// wrapper shape is the most precise name available.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SharedHandle::Cell(_) => "Rc<RefCell<_>>",
            SharedHandle::Locked(_) => "Arc<Mutex<_>>",
        }
    }

    /// Enter the node mutably, without blocking.
    ///
    /// Contention and poisoning come back as the [`SkipReason`] the walker
    /// feeds into its access policy.
    pub(crate) fn with_inner(
        &self,
        f: impl FnOnce(&mut dyn Scrub),
    ) -> std::result::Result<(), SkipReason> {
        match self {
            SharedHandle::Cell(cell) => match cell.try_borrow_mut() {
                Ok(mut inner) => {
                    f(&mut *inner);
                    Ok(())
                }
                Err(_) => Err(SkipReason::BorrowHeld),
            },
            SharedHandle::Locked(lock) => match lock.try_lock() {
                Ok(mut inner) => {
                    f(&mut *inner);
                    Ok(())
                }
                Err(TryLockError::WouldBlock) => Err(SkipReason::LockHeld),
                Err(TryLockError::Poisoned(_)) => Err(SkipReason::Poisoned),
            },
        }
    }
}

impl std::fmt::Debug for SharedHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("SharedHandle")
            .field("kind", &self.kind_name())
            .field("identity", &self.identity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    struct Cog {
        mark: char,
    }

    impl Scrub for Cog {
        fn schema(&self) -> Schema {
            Schema::branch("Cog").char_field("mark", |c: &mut Self| &mut c.mark)
        }
    }

    #[test]
    fn test_clones_share_identity() {
        let node = Rc::new(RefCell::new(Cog { mark: 'a' }));
        let first = SharedHandle::cell(&node);
        let second = SharedHandle::cell(&node.clone());
        assert_eq!(first.identity(), second.identity());
    }

    #[test]
    fn test_distinct_allocations_differ() {
        let a = SharedHandle::cell(&Rc::new(RefCell::new(Cog { mark: 'a' })));
        let b = SharedHandle::cell(&Rc::new(RefCell::new(Cog { mark: 'b' })));
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn test_with_inner_mutates() {
        let node = Rc::new(RefCell::new(Cog { mark: 'a' }));
        let handle = SharedHandle::cell(&node);
        let outcome = handle.with_inner(|inner| {
            let any: &mut dyn std::any::Any = inner;
            if let Some(cog) = any.downcast_mut::<Cog>() {
                cog.mark = 'z';
            }
        });
        assert!(outcome.is_ok());
        assert_eq!(node.borrow().mark, 'z');
    }

    #[test]
    fn test_held_borrow_reports_skip() {
        let node = Rc::new(RefCell::new(Cog { mark: 'a' }));
        let handle = SharedHandle::cell(&node);
        let guard = node.borrow_mut();
        assert_eq!(handle.with_inner(|_| {}), Err(SkipReason::BorrowHeld));
        drop(guard);
        assert!(handle.with_inner(|_| {}).is_ok());
    }

    #[test]
    fn test_poisoned_lock_reports_skip() {
        let node = Arc::new(Mutex::new(Cog { mark: 'a' }));
        let poisoner = Arc::clone(&node);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();
        let handle = SharedHandle::locked(&node);
        assert_eq!(handle.with_inner(|_| {}), Err(SkipReason::Poisoned));
    }
}
