//! Element shape definitions.

use tessera_core::ShapeId;
use tessera_manager::Manager;

/// Reference geometry of an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Unit interval.
    Line,
    /// Unit square.
    Square,
    /// Unit right triangle.
    Triangle,
    /// Unit cube.
    Cube,
    /// Unit tetrahedron.
    Tetrahedron,
}

/// An element shape definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shape {
    /// Reference geometry.
    pub kind: ShapeKind,
}

impl Shape {
    /// Shape with the given reference geometry.
    pub fn new(kind: ShapeKind) -> Self {
        Self { kind }
    }

    /// Number of reference coordinates.
    pub fn dimension(&self) -> usize {
        match self.kind {
            ShapeKind::Line => 1,
            ShapeKind::Square | ShapeKind::Triangle => 2,
            ShapeKind::Cube | ShapeKind::Tetrahedron => 3,
        }
    }
}

/// Manager of shape definitions for one region tree.
pub type ShapeManager = Manager<ShapeId, Shape>;
