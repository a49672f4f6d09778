//! Core types and traits for the Tessera object model.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions shared by every layer of the workspace:
//! typed identifiers, the identifier traits managers are generic over,
//! and the object-level error type.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod traits;

pub use error::ObjectError;
pub use id::{BasisId, ElementId, MeshObjectKey, NodeId, ShapeId, SubscriptionId};
pub use traits::{Identifier, SequentialIdentifier};
