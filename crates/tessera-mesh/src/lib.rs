//! Finite-element mesh containers.
//!
//! A [`Mesh`] is the domain container a region can carry: a node manager
//! and an element manager, validated against the basis and shape
//! definitions of the region tree it belongs to ([`TreeManagers`]).
//!
//! Elements refer to nodes by identifier. Those links are checked on
//! every write, against the mesh's own nodes and, once the mesh sits in a
//! region tree, against the meshes of enclosing regions ([`NodeScope`]).
//! They are not ownership edges: the mesh refuses to destroy a node while
//! an element still names it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod basis;
pub mod element;
pub mod error;
pub mod managers;
pub mod mesh;
pub mod node;
pub mod scope;
pub mod shape;

pub use basis::{Basis, BasisFunction, BasisManager};
pub use element::{Element, ElementHandle};
pub use error::MeshError;
pub use managers::TreeManagers;
pub use mesh::{Mesh, MeshChangeScope, NodeReferences};
pub use node::{Node, NodeHandle};
pub use scope::NodeScope;
pub use shape::{Shape, ShapeKind, ShapeManager};
