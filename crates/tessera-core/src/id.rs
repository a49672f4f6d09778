//! Strongly-typed identifiers for managed objects.

use std::fmt;

use crate::traits::SequentialIdentifier;

/// Declares a `u32` newtype identifier with `Display`, `From<u32>` and a
/// [`SequentialIdentifier`] impl so managers can auto-assign it.
macro_rules! sequential_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }

        impl SequentialIdentifier for $name {
            fn from_index(index: u32) -> Self {
                Self(index)
            }

            fn index(&self) -> u32 {
                self.0
            }
        }
    };
}

sequential_id! {
    /// Identifies a node within one mesh container.
    ///
    /// Node identifiers are positive integers scoped to the container's
    /// node manager; two containers may both hold a `NodeId(1)`.
    NodeId
}

sequential_id! {
    /// Identifies an element within one mesh container.
    ElementId
}

sequential_id! {
    /// Identifies a basis definition within a region tree's basis manager.
    ///
    /// Two trees share a basis identifier space only if every identifier
    /// used by one resolves to an equal definition in the other.
    BasisId
}

sequential_id! {
    /// Identifies an element shape within a region tree's shape manager.
    ShapeId
}

/// Token returned by a subscription, used to unsubscribe.
///
/// Allocated per channel from a monotonic counter; tokens are never
/// reused within one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A mesh object identifier tagged with its object type.
///
/// Nodes and elements live in separate identifier spaces; the tag keeps
/// `node 3` and `element 3` apart in reports that mix both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeshObjectKey {
    /// A node identifier.
    Node(NodeId),
    /// An element identifier.
    Element(ElementId),
}

impl fmt::Display for MeshObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(id) => write!(f, "node {id}"),
            Self::Element(id) => write!(f, "element {id}"),
        }
    }
}

impl From<NodeId> for MeshObjectKey {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<ElementId> for MeshObjectKey {
    fn from(id: ElementId) -> Self {
        Self::Element(id)
    }
}
