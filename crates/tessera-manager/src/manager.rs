//! The generic object manager.
//!
//! [`Manager`] composes an [`IdentifierStore`] of reference-counted
//! objects with a change log and a notification [`Channel`]. It is the
//! only mutator of its store: creation, removal, modification and
//! re-keying all go through it so that every change reaches subscribers.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tessera_core::{Identifier, ObjectError, SequentialIdentifier, SubscriptionId};

use crate::change::{ChangeLog, ChangeMessage};
use crate::channel::Channel;
use crate::config::ManagerConfig;
use crate::handle::{Handle, ObjectCell};
use crate::store::IdentifierStore;

/// Mutable state guarded by the manager's `RefCell`.
///
/// Never borrowed across a subscriber callback or a caller-supplied
/// mutator.
struct ManagerState<K, T> {
    store: IdentifierStore<K, Rc<ObjectCell<K, T>>>,
    scope_depth: usize,
    pending: ChangeLog<K>,
}

pub(crate) struct ManagerInner<K, T> {
    config: ManagerConfig,
    state: RefCell<ManagerState<K, T>>,
    channel: Channel<ChangeMessage<K>>,
}

/// Owning, identifier-indexed, notification-emitting container for one
/// object type.
///
/// `Manager` is a shared handle: cloning it yields another reference to
/// the same manager, which is how subscribers and containers reach it.
/// All methods take `&self`; the manager is single-threaded and not
/// `Send`.
///
/// Each elementary operation runs in its own change scope. Wrap a batch
/// in [`begin_change_scope`](Manager::begin_change_scope) /
/// [`end_change_scope`](Manager::end_change_scope) (or hold a
/// [`ChangeScope`] guard) to deliver a single coalesced message.
pub struct Manager<K, T> {
    inner: Rc<ManagerInner<K, T>>,
}

impl<K: Identifier, T: 'static> Manager<K, T> {
    /// Create an empty manager with default configuration.
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    /// Create an empty manager.
    pub fn with_config(config: ManagerConfig) -> Self {
        Self {
            inner: Rc::new(ManagerInner {
                config,
                state: RefCell::new(ManagerState {
                    store: IdentifierStore::new(),
                    scope_depth: 0,
                    pending: ChangeLog::new(),
                }),
                channel: Channel::new(),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<ManagerInner<K, T>>) -> Self {
        Self { inner }
    }

    /// The configured log label.
    pub fn label(&self) -> &str {
        &self.inner.config.label
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    /// Whether two values refer to the same manager.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ── creation ───────────────────────────────────────────────

    /// Create an object under a caller-chosen identifier.
    ///
    /// Fails with [`ObjectError::DuplicateIdentifier`] if `id` is taken.
    pub fn create(&self, id: K, payload: T) -> Result<Handle<K, T>, ObjectError> {
        self.scoped(|state, inner| Self::insert_object(state, inner, id, payload))
    }

    fn insert_object(
        state: &mut ManagerState<K, T>,
        inner: &Rc<ManagerInner<K, T>>,
        id: K,
        payload: T,
    ) -> Result<Handle<K, T>, ObjectError> {
        if state.store.contains(&id) {
            return Err(ObjectError::duplicate(&id));
        }
        let cell = Rc::new(ObjectCell {
            identifier: RefCell::new(id.clone()),
            payload: RefCell::new(payload),
            managed: Cell::new(true),
            owner: Rc::downgrade(inner),
        });
        state.store.insert(id.clone(), Rc::clone(&cell))?;
        tracing::trace!(manager = %inner.config.label, identifier = %id, "object created");
        state.pending.record_added(id);
        Ok(Handle::from_cell(cell))
    }

    // ── lookup ─────────────────────────────────────────────────

    /// Acquire a handle to the object stored under `id`.
    pub fn find_by_identifier(&self, id: &K) -> Option<Handle<K, T>> {
        let state = self.inner.state.borrow();
        state
            .store
            .find(id)
            .map(|cell| Handle::from_cell(Rc::clone(cell)))
    }

    /// Whether an object is stored under `id`.
    pub fn contains(&self, id: &K) -> bool {
        self.inner.state.borrow().store.contains(id)
    }

    /// Number of managed objects.
    pub fn len(&self) -> usize {
        self.inner.state.borrow().store.len()
    }

    /// Whether the manager holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifiers of all managed objects, in identifier order.
    pub fn identifiers(&self) -> Vec<K> {
        self.inner.state.borrow().store.keys().cloned().collect()
    }

    /// Handles to all managed objects, in identifier order.
    ///
    /// Each returned handle counts as an outstanding reference until it
    /// is dropped.
    pub fn handles(&self) -> Vec<Handle<K, T>> {
        self.inner
            .state
            .borrow()
            .store
            .values()
            .map(|cell| Handle::from_cell(Rc::clone(cell)))
            .collect()
    }

    /// Whether `handle` refers to an object currently stored here.
    pub fn owns(&self, handle: &Handle<K, T>) -> bool {
        handle.is_managed() && std::ptr::eq(handle.cell.owner.as_ptr(), Rc::as_ptr(&self.inner))
    }

    fn check_owned(&self, handle: &Handle<K, T>) -> Result<(), ObjectError> {
        if self.owns(handle) {
            Ok(())
        } else {
            Err(ObjectError::not_found(handle.identifier()))
        }
    }

    // ── destruction ────────────────────────────────────────────

    /// Remove the object behind `handle` from the store.
    ///
    /// The caller's own handle is allowed; any further outstanding handle
    /// makes this fail with [`ObjectError::InUse`] so that no observer's
    /// reference is silently invalidated. There is no forcing variant.
    ///
    /// The payload itself is dropped once the caller releases `handle`.
    pub fn destroy(&self, handle: &Handle<K, T>) -> Result<(), ObjectError> {
        self.check_owned(handle)?;
        // store entry + caller
        self.remove_if_unshared(&handle.identifier(), 2)
    }

    /// Remove the object stored under `id`.
    ///
    /// Fails with [`ObjectError::InUse`] if any handle to it is
    /// outstanding.
    pub fn destroy_by_identifier(&self, id: &K) -> Result<(), ObjectError> {
        self.remove_if_unshared(id, 1)
    }

    fn remove_if_unshared(&self, id: &K, allowed: usize) -> Result<(), ObjectError> {
        self.scoped(|state, inner| {
            let count = match state.store.find(id) {
                Some(cell) => Rc::strong_count(cell),
                None => return Err(ObjectError::not_found(id)),
            };
            if count > allowed {
                return Err(ObjectError::InUse {
                    identifier: id.to_string(),
                    outstanding: count - allowed,
                });
            }
            let cell = state.store.remove(id)?;
            cell.managed.set(false);
            tracing::trace!(manager = %inner.config.label, identifier = %id, "object destroyed");
            state.pending.record_removed(id.clone());
            Ok(())
        })
    }

    // ── modification ───────────────────────────────────────────

    /// Apply `mutator` to the payload in place and mark it modified.
    ///
    /// The mutator runs with no manager borrow held, so it may look up
    /// other objects; it must not borrow the payload of `handle` itself.
    pub fn modify<R>(
        &self,
        handle: &Handle<K, T>,
        mutator: impl FnOnce(&mut T) -> R,
    ) -> Result<R, ObjectError> {
        self.check_owned(handle)?;
        self.begin_change_scope();
        let result = {
            let mut payload = handle.cell.payload.borrow_mut();
            mutator(&mut payload)
        };
        let id = handle.identifier();
        tracing::trace!(manager = %self.label(), identifier = %id, "object modified");
        self.inner.state.borrow_mut().pending.record_modified(id);
        self.end_change_scope();
        Ok(result)
    }

    /// Re-key the object behind `handle` under `new_id`.
    ///
    /// Recorded as removal of the old identifier and addition of the new
    /// one. Fails with [`ObjectError::DuplicateIdentifier`] if `new_id`
    /// is taken by another object.
    pub fn rename(&self, handle: &Handle<K, T>, new_id: K) -> Result<(), ObjectError> {
        self.check_owned(handle)?;
        let old_id = handle.identifier();
        if old_id == new_id {
            return Ok(());
        }
        self.scoped(|state, inner| {
            if state.store.contains(&new_id) {
                return Err(ObjectError::duplicate(&new_id));
            }
            let cell = state.store.remove(&old_id)?;
            *cell.identifier.borrow_mut() = new_id.clone();
            state.store.insert(new_id.clone(), cell)?;
            tracing::trace!(
                manager = %inner.config.label,
                from = %old_id,
                to = %new_id,
                "object renamed"
            );
            state.pending.record_removed(old_id);
            state.pending.record_added(new_id);
            Ok(())
        })
    }

    // ── change scopes ──────────────────────────────────────────

    /// Open (or nest) a change scope.
    pub fn begin_change_scope(&self) {
        self.inner.state.borrow_mut().scope_depth += 1;
    }

    /// Close a change scope. Closing the outermost scope delivers the
    /// accumulated message, if non-empty, to every subscriber.
    ///
    /// An unbalanced call is logged and ignored.
    pub fn end_change_scope(&self) {
        let message = {
            let mut state = self.inner.state.borrow_mut();
            if state.scope_depth == 0 {
                tracing::warn!(manager = %self.label(), "end_change_scope without open scope");
                return;
            }
            state.scope_depth -= 1;
            if state.scope_depth > 0 || state.pending.is_empty() {
                return;
            }
            state.pending.take_message()
        };

        tracing::debug!(
            manager = %self.label(),
            added = message.added().len(),
            removed = message.removed().len(),
            modified = message.modified().len(),
            subscribers = self.inner.channel.subscriber_count(),
            "flushing change message"
        );
        self.inner.channel.deliver(&message);
    }

    /// Open a change scope closed when the returned guard drops.
    pub fn change_scope(&self) -> ChangeScope<'_, K, T> {
        self.begin_change_scope();
        ChangeScope { manager: self }
    }

    /// Current scope nesting depth.
    pub fn scope_depth(&self) -> usize {
        self.inner.state.borrow().scope_depth
    }

    fn scoped<R>(
        &self,
        f: impl FnOnce(&mut ManagerState<K, T>, &Rc<ManagerInner<K, T>>) -> R,
    ) -> R {
        self.begin_change_scope();
        let result = {
            let mut state = self.inner.state.borrow_mut();
            f(&mut state, &self.inner)
        };
        self.end_change_scope();
        result
    }

    // ── subscriptions ──────────────────────────────────────────

    /// Register a callback for change messages.
    ///
    /// Callbacks run synchronously, in subscription order, when the
    /// outermost scope closes. A callback that mutates this manager starts
    /// a new scope; its changes arrive as a separate message, never folded
    /// into the one being delivered.
    ///
    /// That second message is delivered at once, nested inside the first
    /// delivery. Subscribers registered after the mutating callback
    /// therefore receive the second message before the first, and nothing
    /// in either message marks the inversion. A subscriber that needs
    /// causal order must not rely on arrival order when another
    /// subscriber edits the manager.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeMessage<K>) + 'static,
    {
        self.inner.channel.subscribe(callback)
    }

    /// Remove a callback. Returns `false` if the token was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.channel.unsubscribe(id)
    }

    /// Number of registered callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.inner.channel.subscriber_count()
    }
}

impl<K: SequentialIdentifier, T: 'static> Manager<K, T> {
    /// Create an object under the smallest unused identifier at or above
    /// the configured floor.
    pub fn create_next(&self, payload: T) -> Result<Handle<K, T>, ObjectError> {
        let floor = self.inner.config.first_identifier;
        self.scoped(|state, inner| {
            let id = state
                .store
                .first_free_from(floor)
                .ok_or_else(|| ObjectError::duplicate(K::from_index(u32::MAX)))?;
            Self::insert_object(state, inner, id, payload)
        })
    }

    /// The identifier [`create_next`](Manager::create_next) would assign.
    pub fn next_free_identifier(&self) -> Option<K> {
        self.inner
            .state
            .borrow()
            .store
            .first_free_from(self.inner.config.first_identifier)
    }
}

impl<K, T> Clone for Manager<K, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K: Identifier, T: 'static> Default for Manager<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Identifier, T: 'static> fmt::Debug for Manager<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("label", &self.label())
            .field("len", &self.len())
            .field("scope_depth", &self.scope_depth())
            .finish()
    }
}

/// Guard that closes a change scope when dropped.
#[must_use = "the scope closes as soon as the guard is dropped"]
pub struct ChangeScope<'a, K: Identifier, T: 'static> {
    manager: &'a Manager<K, T>,
}

impl<K: Identifier, T: 'static> Drop for ChangeScope<'_, K, T> {
    fn drop(&mut self) {
        self.manager.end_change_scope();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeKind;
    use tessera_core::NodeId;

    fn recorder(manager: &Manager<NodeId, u32>) -> Rc<RefCell<Vec<ChangeMessage<NodeId>>>> {
        let messages = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&messages);
        manager.subscribe(move |m| sink.borrow_mut().push(m.clone()));
        messages
    }

    #[test]
    fn create_rejects_duplicate_identifier() {
        let manager = Manager::new();
        manager.create(NodeId(1), 1u32).unwrap();
        let err = manager.create(NodeId(1), 2).unwrap_err();
        assert_eq!(err, ObjectError::duplicate(NodeId(1)));
        assert_eq!(*manager.find_by_identifier(&NodeId(1)).unwrap().payload(), 1);
    }

    #[test]
    fn auto_identifier_reuses_smallest_gap() {
        let manager: Manager<NodeId, u32> = Manager::new();
        let a = manager.create_next(0).unwrap();
        let b = manager.create_next(0).unwrap();
        let c = manager.create_next(0).unwrap();
        assert_eq!(
            [a.identifier(), b.identifier(), c.identifier()],
            [NodeId(0), NodeId(1), NodeId(2)]
        );
        manager.destroy(&b).unwrap();
        let d = manager.create_next(0).unwrap();
        assert_eq!(d.identifier(), NodeId(1));
    }

    #[test]
    fn auto_identifier_respects_floor() {
        let manager: Manager<NodeId, ()> =
            Manager::with_config(ManagerConfig::labelled("nodes").with_first_identifier(1));
        assert_eq!(manager.create_next(()).unwrap().identifier(), NodeId(1));
        manager.create(NodeId(2), ()).unwrap();
        assert_eq!(manager.next_free_identifier(), Some(NodeId(3)));
    }

    #[test]
    fn destroy_with_outstanding_handle_is_in_use() {
        let manager = Manager::new();
        let handle = manager.create(NodeId(1), 5u32).unwrap();
        let observer = handle.acquire();

        let err = manager.destroy(&handle).unwrap_err();
        assert_eq!(
            err,
            ObjectError::InUse {
                identifier: "1".into(),
                outstanding: 1
            }
        );
        assert!(manager.contains(&NodeId(1)));

        observer.release();
        manager.destroy(&handle).unwrap();
        assert!(!manager.contains(&NodeId(1)));
        assert!(!handle.is_managed());
    }

    #[test]
    fn destroy_by_identifier_requires_no_handles() {
        let manager = Manager::new();
        let handle = manager.create(NodeId(4), 0u32).unwrap();
        assert!(matches!(
            manager.destroy_by_identifier(&NodeId(4)),
            Err(ObjectError::InUse { .. })
        ));
        drop(handle);
        manager.destroy_by_identifier(&NodeId(4)).unwrap();
        assert!(matches!(
            manager.destroy_by_identifier(&NodeId(4)),
            Err(ObjectError::NotFound { .. })
        ));
    }

    #[test]
    fn foreign_handle_is_not_found() {
        let a: Manager<NodeId, u32> = Manager::new();
        let b: Manager<NodeId, u32> = Manager::new();
        let handle = a.create(NodeId(1), 0).unwrap();
        b.create(NodeId(1), 0).unwrap();
        assert!(matches!(b.destroy(&handle), Err(ObjectError::NotFound { .. })));
        assert!(matches!(
            b.modify(&handle, |v| *v = 9),
            Err(ObjectError::NotFound { .. })
        ));
        assert_eq!(*handle.payload(), 0);
    }

    #[test]
    fn modify_updates_in_place_and_notifies() {
        let manager = Manager::new();
        let messages = recorder(&manager);
        let handle = manager.create(NodeId(1), 1u32).unwrap();
        let doubled = manager.modify(&handle, |v| {
            *v *= 2;
            *v
        });
        assert_eq!(doubled, Ok(2));
        assert_eq!(*handle.payload(), 2);

        let messages = messages.borrow();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[1].change_kind(&NodeId(1)),
            Some(ChangeKind::Modified)
        );
    }

    #[test]
    fn rename_rekeys_consistently() {
        let manager = Manager::new();
        let handle = manager.create(NodeId(1), 7u32).unwrap();
        manager.create(NodeId(2), 8).unwrap();

        assert!(matches!(
            manager.rename(&handle, NodeId(2)),
            Err(ObjectError::DuplicateIdentifier { .. })
        ));
        manager.rename(&handle, NodeId(10)).unwrap();

        assert_eq!(handle.identifier(), NodeId(10));
        assert!(manager.find_by_identifier(&NodeId(1)).is_none());
        let found = manager.find_by_identifier(&NodeId(10)).unwrap();
        assert!(found.ptr_eq(&handle));
        assert_eq!(manager.identifiers(), vec![NodeId(2), NodeId(10)]);
    }

    #[test]
    fn scope_coalesces_into_one_message() {
        let manager: Manager<NodeId, u32> = Manager::new();
        let messages = recorder(&manager);

        manager.begin_change_scope();
        for i in 1..=5 {
            manager.begin_change_scope();
            manager.create(NodeId(i), i).unwrap();
            manager.end_change_scope();
        }
        for i in [1, 3, 5] {
            manager.destroy_by_identifier(&NodeId(i)).unwrap();
        }
        assert!(messages.borrow().is_empty());
        manager.end_change_scope();

        let messages = messages.borrow();
        assert_eq!(messages.len(), 1);
        let ids: Vec<_> = messages[0].added().iter().copied().collect();
        assert_eq!(ids, vec![NodeId(2), NodeId(4)]);
        assert!(messages[0].removed().is_empty());
    }

    #[test]
    fn pre_existing_objects_show_up_as_removed() {
        let manager: Manager<NodeId, u32> = Manager::new();
        manager.create(NodeId(1), 0).unwrap();
        let messages = recorder(&manager);
        {
            let _scope = manager.change_scope();
            manager.destroy_by_identifier(&NodeId(1)).unwrap();
            manager.create(NodeId(2), 0).unwrap();
        }
        let messages = messages.borrow();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].removed().contains(&NodeId(1)));
        assert!(messages[0].added().contains(&NodeId(2)));
    }

    #[test]
    fn empty_scope_delivers_nothing() {
        let manager: Manager<NodeId, u32> = Manager::new();
        let messages = recorder(&manager);
        manager.begin_change_scope();
        assert!(manager.create(NodeId(1), 0).is_ok());
        manager.destroy_by_identifier(&NodeId(1)).unwrap();
        let _ = manager.create(NodeId(1), 0).map(|h| manager.destroy(&h));
        manager.end_change_scope();
        assert!(messages.borrow().is_empty());
    }

    #[test]
    fn failed_operations_deliver_nothing() {
        let manager: Manager<NodeId, u32> = Manager::new();
        manager.create(NodeId(1), 0).unwrap();
        let messages = recorder(&manager);
        assert!(manager.create(NodeId(1), 0).is_err());
        assert!(manager.destroy_by_identifier(&NodeId(9)).is_err());
        assert!(messages.borrow().is_empty());
        assert_eq!(manager.scope_depth(), 0);
    }

    #[test]
    fn unbalanced_end_is_ignored() {
        let manager: Manager<NodeId, u32> = Manager::new();
        manager.end_change_scope();
        assert_eq!(manager.scope_depth(), 0);
        manager.create(NodeId(1), 0).unwrap();
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn reentrant_mutation_is_delivered_separately() {
        let manager: Manager<NodeId, u32> = Manager::new();
        let messages = recorder(&manager);
        {
            let inner = manager.clone();
            manager.subscribe(move |m: &ChangeMessage<NodeId>| {
                if m.added().contains(&NodeId(1)) {
                    inner.create(NodeId(100), 0).unwrap();
                }
            });
        }

        manager.begin_change_scope();
        manager.create(NodeId(1), 0).unwrap();
        manager.create(NodeId(2), 0).unwrap();
        manager.end_change_scope();

        let messages = messages.borrow();
        assert_eq!(messages.len(), 2);
        let first: Vec<_> = messages[0].added().iter().copied().collect();
        assert_eq!(first, vec![NodeId(1), NodeId(2)]);
        let second: Vec<_> = messages[1].added().iter().copied().collect();
        assert_eq!(second, vec![NodeId(100)]);
        assert!(manager.contains(&NodeId(100)));
    }

    #[test]
    fn later_subscriber_sees_nested_message_first() {
        let manager: Manager<NodeId, u32> = Manager::new();
        {
            let inner = manager.clone();
            manager.subscribe(move |m: &ChangeMessage<NodeId>| {
                if m.added().contains(&NodeId(1)) {
                    inner.create(NodeId(100), 0).unwrap();
                }
            });
        }
        let messages = recorder(&manager);

        manager.create(NodeId(1), 0).unwrap();

        let messages = messages.borrow();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].added().contains(&NodeId(100)));
        assert!(messages[1].added().contains(&NodeId(1)));
    }
}
