//! Mesh nodes.

use smallvec::SmallVec;
use tessera_core::NodeId;
use tessera_manager::Handle;

/// A point in the mesh's coordinate space.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// One value per mesh dimension.
    pub coordinates: SmallVec<[f64; 3]>,
}

impl Node {
    /// Node at the given coordinates.
    pub fn at(coordinates: &[f64]) -> Self {
        Self {
            coordinates: SmallVec::from_slice(coordinates),
        }
    }

    /// Number of coordinates.
    pub fn dimension(&self) -> usize {
        self.coordinates.len()
    }
}

/// Counted handle to a managed node.
pub type NodeHandle = Handle<NodeId, Node>;
