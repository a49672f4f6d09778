//! Test utilities for Tessera development.
//!
//! [`fixtures`] builds standard definitions, grid meshes and import
//! trees; [`RecordingSubscriber`] and [`MeshRecorder`] capture change
//! messages for assertions.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::cell::RefCell;
use std::rc::Rc;

use tessera_core::{ElementId, Identifier, NodeId, SubscriptionId};
use tessera_manager::{ChangeMessage, Manager};
use tessera_mesh::Mesh;
use tessera_region::{Region, RegionChange};

/// Records every change message a manager delivers.
pub struct RecordingSubscriber<K> {
    messages: Rc<RefCell<Vec<ChangeMessage<K>>>>,
    subscription: SubscriptionId,
}

impl<K: Identifier> RecordingSubscriber<K> {
    /// Subscribe to `manager`.
    pub fn attach<T: 'static>(manager: &Manager<K, T>) -> Self {
        let messages = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&messages);
        let subscription = manager.subscribe(move |m: &ChangeMessage<K>| {
            sink.borrow_mut().push(m.clone());
        });
        Self {
            messages,
            subscription,
        }
    }

    /// Copies of the messages received so far.
    pub fn messages(&self) -> Vec<ChangeMessage<K>> {
        self.messages.borrow().clone()
    }

    /// Number of messages received.
    pub fn count(&self) -> usize {
        self.messages.borrow().len()
    }

    /// The most recent message.
    pub fn last(&self) -> Option<ChangeMessage<K>> {
        self.messages.borrow().last().cloned()
    }

    /// Forget everything received so far.
    pub fn clear(&self) {
        self.messages.borrow_mut().clear();
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }
}

/// Records the node and element messages of one mesh.
pub struct MeshRecorder {
    pub nodes: RecordingSubscriber<NodeId>,
    pub elements: RecordingSubscriber<ElementId>,
}

impl MeshRecorder {
    pub fn attach(mesh: &Mesh) -> Self {
        Self {
            nodes: RecordingSubscriber::attach(mesh.nodes()),
            elements: RecordingSubscriber::attach(mesh.elements()),
        }
    }

    /// Messages received across both managers.
    pub fn total(&self) -> usize {
        self.nodes.count() + self.elements.count()
    }
}

/// Records structural changes to one region.
pub struct RegionRecorder {
    changes: Rc<RefCell<Vec<RegionChange>>>,
}

impl RegionRecorder {
    pub fn attach(region: &Region) -> Self {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        region.subscribe(move |change| sink.borrow_mut().push(change.clone()));
        Self { changes }
    }

    pub fn changes(&self) -> Vec<RegionChange> {
        self.changes.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.changes.borrow().len()
    }
}
