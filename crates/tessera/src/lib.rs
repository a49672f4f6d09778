//! Tessera: the model core of a finite-element visualisation application.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Tessera sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use tessera::prelude::*;
//!
//! let context = Context::new(ContextConfig::default()).unwrap();
//! context
//!     .managers()
//!     .define_basis(Some(BasisId(0)), Basis::uniform(BasisFunction::LinearLagrange, 1).unwrap())
//!     .unwrap();
//! context
//!     .managers()
//!     .define_shape(Some(ShapeId(0)), Shape::new(ShapeKind::Line))
//!     .unwrap();
//!
//! // Build an import tree off to the side.
//! let import = context.create_import_root("import").unwrap();
//! let wire = import.create_child("wire").unwrap();
//! let mesh = context.create_mesh(1).unwrap();
//! for x in [0.0, 1.0, 2.0] {
//!     mesh.create_node(None, Node::at(&[x])).unwrap();
//! }
//! mesh.create_element(None, Element::new(ShapeId(0), BasisId(0), [NodeId(1), NodeId(2)]))
//!     .unwrap();
//! mesh.create_element(None, Element::new(ShapeId(0), BasisId(0), [NodeId(2), NodeId(3)]))
//!     .unwrap();
//! wire.attach_domain_container(mesh).unwrap();
//!
//! // Fold it into the live tree.
//! let report = context.import(import, "/").unwrap();
//! assert_eq!(report.nodes_created, 3);
//!
//! let wire = context.find_region("wire").unwrap();
//! assert_eq!(wire.container().unwrap().element_count(), 2);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tessera-core` | identifiers, identifier traits, `ObjectError` |
//! | [`manager`] | `tessera-manager` | store, handles, change messages, `Manager` |
//! | [`mesh`] | `tessera-mesh` | bases, shapes, nodes, elements, `Mesh` |
//! | [`region`] | `tessera-region` | region tree, paths, merge, `Context` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Identifiers and core errors (`tessera-core`).
pub use tessera_core as types;

/// Generic object managers (`tessera-manager`).
///
/// [`manager::Manager`] owns objects, hands out [`manager::Handle`]s and
/// broadcasts coalesced [`manager::ChangeMessage`]s.
pub use tessera_manager as manager;

/// Finite-element mesh containers (`tessera-mesh`).
pub use tessera_mesh as mesh;

/// Region trees and the merge engine (`tessera-region`).
pub use tessera_region as region;

/// Common imports for typical Tessera usage.
pub mod prelude {
    // Identifiers
    pub use tessera_core::{BasisId, ElementId, MeshObjectKey, NodeId, ShapeId, SubscriptionId};

    // Managers
    pub use tessera_manager::{ChangeKind, ChangeMessage, Handle, Manager, ManagerConfig};

    // Mesh
    pub use tessera_mesh::{
        Basis, BasisFunction, Element, ElementHandle, Mesh, Node, NodeHandle, Shape, ShapeKind,
        TreeManagers,
    };

    // Regions
    pub use tessera_region::{
        merge, Context, ContextConfig, Material, MergeConfig, MergePolicy, MergeReport, Region,
        RegionChange,
    };

    // Errors
    pub use tessera_core::ObjectError;
    pub use tessera_mesh::MeshError;
    pub use tessera_region::{ConfigError, MergeError, RegionError};
}
