//! Mesh-specific error types.

use std::error::Error;
use std::fmt;

use tessera_core::{BasisId, ElementId, MeshObjectKey, NodeId, ObjectError, ShapeId};

/// Errors from mesh container operations.
#[derive(Clone, Debug, PartialEq)]
pub enum MeshError {
    /// The underlying manager rejected the operation.
    Object(ObjectError),
    /// Node and element identifiers start at 1.
    InvalidIdentifier {
        /// The rejected key.
        key: MeshObjectKey,
    },
    /// Coordinate dimension outside `1..=3`.
    InvalidDimension {
        /// The rejected dimension.
        dimension: usize,
    },
    /// A basis definition is malformed.
    InvalidBasis {
        /// What went wrong.
        reason: String,
    },
    /// A node payload does not fit the mesh.
    InvalidNode {
        /// What went wrong.
        reason: String,
    },
    /// An element payload does not fit the mesh or its definitions.
    InvalidElement {
        /// What went wrong.
        reason: String,
    },
    /// An element names a basis the tree does not define.
    UnknownBasis {
        /// The unresolved basis.
        basis: BasisId,
    },
    /// An element names a shape the tree does not define.
    UnknownShape {
        /// The unresolved shape.
        shape: ShapeId,
    },
    /// An element names a node absent from the mesh.
    DanglingReference {
        /// The referencing element, if it already has an identifier.
        element: Option<ElementId>,
        /// The node that failed to resolve.
        node: NodeId,
    },
    /// A node cannot be destroyed while elements reference it.
    NodeInUse {
        /// The node.
        node: NodeId,
        /// Elements that still reference it.
        elements: Vec<ElementId>,
    },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(e) => write!(f, "{e}"),
            Self::InvalidIdentifier { key } => {
                write!(f, "invalid identifier for {key}: identifiers start at 1")
            }
            Self::InvalidDimension { dimension } => {
                write!(f, "mesh dimension must be 1, 2 or 3, got {dimension}")
            }
            Self::InvalidBasis { reason } => write!(f, "invalid basis: {reason}"),
            Self::InvalidNode { reason } => write!(f, "invalid node: {reason}"),
            Self::InvalidElement { reason } => write!(f, "invalid element: {reason}"),
            Self::UnknownBasis { basis } => write!(f, "unknown basis {basis}"),
            Self::UnknownShape { shape } => write!(f, "unknown shape {shape}"),
            Self::DanglingReference { element, node } => match element {
                Some(element) => write!(f, "element {element} references missing node {node}"),
                None => write!(f, "element references missing node {node}"),
            },
            Self::NodeInUse { node, elements } => {
                write!(f, "node {node} is referenced by {} element(s)", elements.len())
            }
        }
    }
}

impl Error for MeshError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Object(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ObjectError> for MeshError {
    fn from(e: ObjectError) -> Self {
        Self::Object(e)
    }
}
