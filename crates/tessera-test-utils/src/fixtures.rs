//! Reusable definitions, meshes and region trees.
//!
//! Standard identifiers:
//!
//! | id | basis | shape |
//! |----|-------|-------|
//! | 0 | bilinear Lagrange (4 nodes) | square |
//! | 1 | linear Lagrange (2 nodes) | line |
//! | 2 | biquadratic Lagrange (9 nodes) | |

use tessera_core::{BasisId, ElementId, NodeId, ShapeId};
use tessera_mesh::{Basis, BasisFunction, Element, Mesh, Node, Shape, ShapeKind, TreeManagers};
use tessera_region::Region;

pub const BILINEAR: BasisId = BasisId(0);
pub const LINEAR: BasisId = BasisId(1);
pub const BIQUADRATIC: BasisId = BasisId(2);
pub const SQUARE: ShapeId = ShapeId(0);
pub const LINE: ShapeId = ShapeId(1);

/// Define the standard bases and shapes in `definitions`.
///
/// # Panics
///
/// Panics if any standard identifier is already taken.
pub fn define_standard(definitions: &TreeManagers) {
    let bases = [
        (BILINEAR, BasisFunction::LinearLagrange, 2),
        (LINEAR, BasisFunction::LinearLagrange, 1),
        (BIQUADRATIC, BasisFunction::QuadraticLagrange, 2),
    ];
    for (id, function, dimension) in bases {
        let basis = Basis::uniform(function, dimension).expect("standard basis");
        definitions
            .define_basis(Some(id), basis)
            .expect("standard basis id free");
    }
    for (id, kind) in [(SQUARE, ShapeKind::Square), (LINE, ShapeKind::Line)] {
        definitions
            .define_shape(Some(id), Shape::new(kind))
            .expect("standard shape id free");
    }
}

/// Fresh managers holding the standard definitions.
pub fn standard_definitions() -> TreeManagers {
    let definitions = TreeManagers::new();
    define_standard(&definitions);
    definitions
}

/// Identifier of grid node `(i, j)` in an `nx` by `ny` cell grid.
pub fn grid_node(nx: u32, i: u32, j: u32) -> NodeId {
    NodeId(j * (nx + 1) + i + 1)
}

/// Identifier of grid cell `(i, j)` in an `nx` by `ny` cell grid.
pub fn grid_element(nx: u32, i: u32, j: u32) -> ElementId {
    ElementId(j * nx + i + 1)
}

/// Fill `mesh` with an `nx` by `ny` grid of unit bilinear squares.
///
/// Nodes and elements are numbered row by row from 1, so two grids of
/// the same size share identifiers.
pub fn fill_grid(mesh: &Mesh, nx: u32, ny: u32) {
    let _scope = mesh.change_scope();
    for j in 0..=ny {
        for i in 0..=nx {
            mesh.create_node(
                Some(grid_node(nx, i, j)),
                Node::at(&[f64::from(i), f64::from(j)]),
            )
            .expect("grid node");
        }
    }
    for j in 0..ny {
        for i in 0..nx {
            let nodes = [
                grid_node(nx, i, j),
                grid_node(nx, i + 1, j),
                grid_node(nx, i, j + 1),
                grid_node(nx, i + 1, j + 1),
            ];
            mesh.create_element(
                Some(grid_element(nx, i, j)),
                Element::new(SQUARE, BILINEAR, nodes),
            )
            .expect("grid element");
        }
    }
}

/// A strict 2-D grid mesh over `definitions`.
pub fn grid_mesh(definitions: &TreeManagers, nx: u32, ny: u32) -> Mesh {
    let mesh = Mesh::new(2, definitions).expect("2-D mesh");
    fill_grid(&mesh, nx, ny);
    mesh
}

/// A 1-D polyline mesh: nodes `1..=count`, one line element per segment.
pub fn polyline_mesh(definitions: &TreeManagers, count: u32) -> Mesh {
    let mesh = Mesh::new(1, definitions).expect("1-D mesh");
    for n in 1..=count {
        mesh.create_node(Some(NodeId(n)), Node::at(&[f64::from(n)]))
            .expect("polyline node");
    }
    for n in 1..count {
        mesh.create_element(
            Some(ElementId(n)),
            Element::new(LINE, LINEAR, [NodeId(n), NodeId(n + 1)]),
        )
        .expect("polyline element");
    }
    mesh
}

/// A free-standing import tree over `definitions`:
///
/// ```text
/// import      2x1 grid
/// └── skin    4-node polyline
///     └── hair   (no mesh)
/// ```
///
/// Built deterministically, so two calls produce identical content.
pub fn import_tree(definitions: &TreeManagers) -> Region {
    let root = Region::new_root("import", definitions).expect("import root");
    root.attach_domain_container(grid_mesh(definitions, 2, 1))
        .expect("import grid");
    let skin = root.create_child("skin").expect("skin region");
    skin.attach_domain_container(polyline_mesh(definitions, 4))
        .expect("skin polyline");
    skin.create_child("hair").expect("hair region");
    root
}

/// A staging import whose single bilinear element names node `missing`,
/// which the staging mesh does not hold.
pub fn dangling_import(definitions: &TreeManagers, missing: NodeId) -> Region {
    let root = Region::new_root("import", definitions).expect("import root");
    let mesh = Mesh::staging(2, definitions).expect("staging mesh");
    for (n, x, y) in [(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 0.0, 1.0)] {
        mesh.create_node(Some(NodeId(n)), Node::at(&[x, y]))
            .expect("staging node");
    }
    mesh.create_element(
        Some(ElementId(1)),
        Element::new(SQUARE, BILINEAR, [NodeId(1), NodeId(2), NodeId(3), missing]),
    )
    .expect("staging element");
    root.attach_domain_container(mesh).expect("staging mesh");
    root
}
