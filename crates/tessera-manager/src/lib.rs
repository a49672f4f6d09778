//! Identifier-keyed, reference-counted object managers.
//!
//! Every domain entity (basis, shape, node, element, material) lives in a
//! typed [`Manager`] that owns it, hands out counted [`Handle`]s, and
//! broadcasts coalesced [`ChangeMessage`]s to subscribers.
//!
//! # Architecture
//!
//! ```text
//! Manager<K, T> (shared, single-threaded)
//! ├── IdentifierStore<K, Rc<ObjectCell>>   (ordered, O(log n) lookup)
//! ├── ChangeLog<K>                         (net effect of the open scope)
//! ├── scope depth                          (only the outermost end flushes)
//! └── Channel<ChangeMessage<K>>            (subscription-ordered delivery)
//!
//! Handle<K, T> ──strong──▶ ObjectCell ──weak──▶ Manager
//! ```
//!
//! # Notification contract
//!
//! Delivery is synchronous inside the outermost `end_change_scope()`.
//! The pending message is detached before delivery, so a subscriber that
//! mutates the manager from its callback opens a fresh scope whose message
//! is delivered on its own; it never extends the message being flushed.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod change;
pub mod channel;
pub mod config;
pub mod handle;
pub mod manager;
pub mod store;

pub use change::{ChangeKind, ChangeMessage};
pub use channel::Channel;
pub use config::ManagerConfig;
pub use handle::Handle;
pub use manager::{ChangeScope, Manager};
pub use store::IdentifierStore;
