//! Reference-counted object handles.
//!
//! A [`Handle`] is a counted accessor to a manager-owned object. The
//! manager's store holds one strong reference per object; every other
//! holder (a UI panel, a merge in progress, a test) holds a handle.
//! Acquiring clones the handle, releasing drops it. The payload is
//! destroyed when the last reference goes away, which can only happen
//! after the store entry has been removed.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tessera_core::Identifier;

use crate::manager::{Manager, ManagerInner};

/// Shared state behind every handle to one object.
pub(crate) struct ObjectCell<K, T> {
    pub(crate) identifier: RefCell<K>,
    pub(crate) payload: RefCell<T>,
    /// Cleared when the object leaves its store.
    pub(crate) managed: Cell<bool>,
    /// Routes removal back to the owner; never keeps the manager alive.
    pub(crate) owner: Weak<ManagerInner<K, T>>,
}

/// Counted accessor to a managed object.
///
/// Handles are read-mostly: the payload can be borrowed through
/// [`payload`](Handle::payload), but changes go through the owning
/// manager's [`modify`](Manager::modify) so subscribers hear about them.
///
/// Releasing more often than acquiring is impossible: [`release`]
/// consumes the handle, and every other handle is an independent count.
///
/// [`release`]: Handle::release
pub struct Handle<K, T> {
    pub(crate) cell: Rc<ObjectCell<K, T>>,
}

impl<K: Identifier, T: 'static> Handle<K, T> {
    pub(crate) fn from_cell(cell: Rc<ObjectCell<K, T>>) -> Self {
        Self { cell }
    }

    /// Take an additional counted reference to the same object.
    pub fn acquire(&self) -> Self {
        self.clone()
    }

    /// Give this reference back. Equivalent to dropping the handle.
    pub fn release(self) {}

    /// Current identifier of the object.
    pub fn identifier(&self) -> K {
        self.cell.identifier.borrow().clone()
    }

    /// Borrow the payload.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a [`Manager::modify`] mutator running
    /// on the same object.
    pub fn payload(&self) -> Ref<'_, T> {
        self.cell.payload.borrow()
    }

    /// Number of live references, including the store entry if the
    /// object is still managed.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.cell)
    }

    /// Whether the object is still held by its manager's store.
    pub fn is_managed(&self) -> bool {
        self.cell.managed.get()
    }

    /// The owning manager, if it still exists.
    pub fn owner(&self) -> Option<Manager<K, T>> {
        self.cell.owner.upgrade().map(Manager::from_inner)
    }

    /// Whether two handles refer to the same object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<K, T> Clone for Handle<K, T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<K: Identifier, T: 'static> fmt::Debug for Handle<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("identifier", &*self.cell.identifier.borrow())
            .field("ref_count", &self.ref_count())
            .field("managed", &self.is_managed())
            .finish()
    }
}
