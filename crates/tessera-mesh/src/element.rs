//! Mesh elements.

use smallvec::SmallVec;
use tessera_core::{BasisId, ElementId, NodeId, ShapeId};
use tessera_manager::Handle;

/// A finite element: a shape, a basis, and the nodes it interpolates.
///
/// Node links are identifiers resolved against the owning mesh's node
/// manager, never ownership edges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    /// Reference geometry.
    pub shape: ShapeId,
    /// Interpolation basis.
    pub basis: BasisId,
    /// Local-to-global node map, in basis order.
    pub nodes: SmallVec<[NodeId; 8]>,
}

impl Element {
    /// Element over `nodes`.
    pub fn new(shape: ShapeId, basis: BasisId, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            shape,
            basis,
            nodes: nodes.into_iter().collect(),
        }
    }

    /// Whether `node` appears in the local-to-global map.
    pub fn references(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }
}

/// Counted handle to a managed element.
pub type ElementHandle = Handle<ElementId, Element>;
