//! Definition managers shared by every mesh of one region tree.

use tessera_core::{BasisId, ShapeId};
use tessera_manager::{Handle, Manager, ManagerConfig};

use crate::basis::{Basis, BasisManager};
use crate::error::MeshError;
use crate::shape::{Shape, ShapeManager};

/// The basis and shape managers of one region tree.
///
/// Cloning shares the underlying managers. Two values are the "same
/// definitions" only when both managers are shared.
///
/// A definition used by a mesh element is held by that mesh and cannot
/// be destroyed until no element uses it.
#[derive(Clone, Debug)]
pub struct TreeManagers {
    bases: BasisManager,
    shapes: ShapeManager,
}

impl TreeManagers {
    /// Fresh, empty definition managers.
    pub fn new() -> Self {
        Self {
            bases: Manager::with_config(ManagerConfig::labelled("bases")),
            shapes: Manager::with_config(ManagerConfig::labelled("shapes")),
        }
    }

    /// Basis definitions.
    pub fn bases(&self) -> &BasisManager {
        &self.bases
    }

    /// Shape definitions.
    pub fn shapes(&self) -> &ShapeManager {
        &self.shapes
    }

    /// Whether both values share the same managers.
    pub fn same_as(&self, other: &Self) -> bool {
        self.bases.ptr_eq(&other.bases) && self.shapes.ptr_eq(&other.shapes)
    }

    /// Define a basis, under `id` or the next free identifier.
    pub fn define_basis(
        &self,
        id: Option<BasisId>,
        basis: Basis,
    ) -> Result<Handle<BasisId, Basis>, MeshError> {
        let handle = match id {
            Some(id) => self.bases.create(id, basis)?,
            None => self.bases.create_next(basis)?,
        };
        Ok(handle)
    }

    /// Define a shape, under `id` or the next free identifier.
    pub fn define_shape(
        &self,
        id: Option<ShapeId>,
        shape: Shape,
    ) -> Result<Handle<ShapeId, Shape>, MeshError> {
        let handle = match id {
            Some(id) => self.shapes.create(id, shape)?,
            None => self.shapes.create_next(shape)?,
        };
        Ok(handle)
    }

    /// Copy of the basis stored under `id`.
    pub fn basis(&self, id: BasisId) -> Option<Basis> {
        self.bases.find_by_identifier(&id).map(|h| h.payload().clone())
    }

    /// Copy of the shape stored under `id`.
    pub fn shape(&self, id: ShapeId) -> Option<Shape> {
        self.shapes.find_by_identifier(&id).map(|h| *h.payload())
    }
}

impl Default for TreeManagers {
    fn default() -> Self {
        Self::new()
    }
}
