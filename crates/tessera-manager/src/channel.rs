//! Synchronous publish/subscribe channel.
//!
//! A [`Channel`] keeps its subscribers in subscription order and calls
//! each of them in turn from [`Channel::deliver`]. There is no queue: a
//! message is delivered before `deliver` returns.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;
use tessera_core::SubscriptionId;

type Callback<M> = Rc<dyn Fn(&M)>;

/// Ordered list of subscriber callbacks for one message type.
///
/// Subscribing or unsubscribing from inside a callback is allowed. The
/// subscriber list is snapshotted when a delivery starts: subscribers
/// added during a delivery first see the next message, and subscribers
/// removed during a delivery are skipped for the rest of it.
pub struct Channel<M> {
    subscribers: RefCell<IndexMap<SubscriptionId, Callback<M>>>,
    next_id: Cell<u64>,
}

impl<M> Channel<M> {
    /// Create a channel with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: RefCell::new(IndexMap::new()),
            next_id: Cell::new(1),
        }
    }

    /// Register a callback. Delivery order is subscription order.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&M) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers.borrow_mut().insert(id, Rc::new(callback));
        id
    }

    /// Remove a callback. Returns `false` if the token was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.borrow_mut().shift_remove(&id).is_some()
    }

    /// Whether the token is currently subscribed.
    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.subscribers.borrow().contains_key(&id)
    }

    /// Number of current subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Call every subscriber with `message`. Returns how many were called.
    pub fn deliver(&self, message: &M) -> usize {
        let snapshot: Vec<(SubscriptionId, Callback<M>)> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(id, callback)| (*id, Rc::clone(callback)))
            .collect();

        let mut delivered = 0;
        for (id, callback) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }
            callback(message);
            delivered += 1;
        }
        delivered
    }
}

impl<M> Default for Channel<M> {
    fn default() -> Self {
        Self::new()
    }
}
