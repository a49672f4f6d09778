//! Node resolution beyond a mesh's own node manager.

use tessera_core::{ElementId, NodeId};

/// Nodes a mesh can reach outside itself.
///
/// A mesh attached to a region tree resolves element links first in its
/// own node manager, then through the meshes of enclosing regions. The
/// tree installs an implementation with [`Mesh::set_scope`](crate::Mesh::set_scope).
pub trait NodeScope {
    /// Whether an enclosing mesh holds `node`.
    fn resolves(&self, node: NodeId) -> bool;

    /// Elements of enclosed meshes whose link to `node` resolves through
    /// the mesh this scope belongs to.
    fn dependents(&self, node: NodeId) -> Vec<ElementId>;
}
