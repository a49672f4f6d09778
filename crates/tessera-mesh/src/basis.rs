//! Tensor-product basis definitions.

use smallvec::SmallVec;
use tessera_core::BasisId;
use tessera_manager::Manager;

use crate::error::MeshError;

/// One-dimensional interpolation family used along one element direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BasisFunction {
    /// A single value over the element.
    Constant,
    /// Linear Lagrange: two nodes.
    LinearLagrange,
    /// Quadratic Lagrange: three nodes.
    QuadraticLagrange,
    /// Cubic Lagrange: four nodes.
    CubicLagrange,
    /// Cubic Hermite: two nodes carrying value and derivative.
    CubicHermite,
}

impl BasisFunction {
    /// Number of nodes this family needs along its direction.
    pub fn nodes_per_direction(&self) -> usize {
        match self {
            Self::Constant => 1,
            Self::LinearLagrange | Self::CubicHermite => 2,
            Self::QuadraticLagrange => 3,
            Self::CubicLagrange => 4,
        }
    }
}

/// A tensor-product basis: one function family per element direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Basis {
    functions: SmallVec<[BasisFunction; 3]>,
}

impl Basis {
    /// Build a basis from per-direction function families.
    ///
    /// Fails with [`MeshError::InvalidBasis`] unless there are one to
    /// three directions.
    pub fn new(functions: impl IntoIterator<Item = BasisFunction>) -> Result<Self, MeshError> {
        let functions: SmallVec<[BasisFunction; 3]> = functions.into_iter().collect();
        if functions.is_empty() || functions.len() > 3 {
            return Err(MeshError::InvalidBasis {
                reason: format!("expected 1 to 3 directions, got {}", functions.len()),
            });
        }
        Ok(Self { functions })
    }

    /// The same family along `dimension` directions.
    pub fn uniform(function: BasisFunction, dimension: usize) -> Result<Self, MeshError> {
        Self::new(std::iter::repeat(function).take(dimension))
    }

    /// Per-direction function families.
    pub fn functions(&self) -> &[BasisFunction] {
        &self.functions
    }

    /// Number of element directions.
    pub fn dimension(&self) -> usize {
        self.functions.len()
    }

    /// Number of nodes an element using this basis must list.
    pub fn node_count(&self) -> usize {
        self.functions
            .iter()
            .map(BasisFunction::nodes_per_direction)
            .product()
    }
}

/// Manager of basis definitions for one region tree.
pub type BasisManager = Manager<BasisId, Basis>;
