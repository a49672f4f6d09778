//! The mesh container: node and element managers plus reference checks.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tessera_core::{BasisId, ElementId, Identifier, NodeId, ShapeId};
use tessera_manager::{Handle, Manager, ManagerConfig};

use crate::basis::Basis;
use crate::element::{Element, ElementHandle};
use crate::error::MeshError;
use crate::managers::TreeManagers;
use crate::node::{Node, NodeHandle};
use crate::scope::NodeScope;
use crate::shape::Shape;

/// How element-to-node links are checked on write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodeReferences {
    /// Every node an element names must resolve in this mesh or through
    /// its scope.
    #[default]
    Strict,
    /// Elements may name nodes this mesh does not hold yet. Used for
    /// import staging, where the nodes are expected in the merge target.
    Deferred,
}

/// A finite-element mesh: positive-integer keyed node and element
/// managers validated against one tree's basis and shape definitions.
///
/// Every basis and shape its elements use stays held by the mesh, so the
/// definition managers refuse to destroy them with
/// [`ObjectError::InUse`](tessera_core::ObjectError::InUse).
///
/// Cloning shares the managers; a clone is another view of the same mesh.
#[derive(Clone)]
pub struct Mesh {
    dimension: usize,
    references: NodeReferences,
    definitions: TreeManagers,
    nodes: Manager<NodeId, Node>,
    elements: Manager<ElementId, Element>,
    pins: Rc<RefCell<Pins>>,
    scope: Rc<RefCell<Option<Rc<dyn NodeScope>>>>,
}

/// Definition handles held for the mesh's elements, with the number of
/// elements using each.
#[derive(Default)]
struct Pins {
    bases: BTreeMap<BasisId, (Handle<BasisId, Basis>, usize)>,
    shapes: BTreeMap<ShapeId, (Handle<ShapeId, Shape>, usize)>,
}

/// The definitions one element uses.
struct Used {
    basis: Handle<BasisId, Basis>,
    shape: Handle<ShapeId, Shape>,
}

impl Pins {
    fn hold(&mut self, used: Used) {
        hold(&mut self.bases, used.basis);
        hold(&mut self.shapes, used.shape);
    }

    fn release(&mut self, basis: BasisId, shape: ShapeId) {
        release(&mut self.bases, basis);
        release(&mut self.shapes, shape);
    }
}

fn hold<K: Identifier, T: 'static>(
    pins: &mut BTreeMap<K, (Handle<K, T>, usize)>,
    handle: Handle<K, T>,
) {
    pins.entry(handle.identifier()).or_insert((handle, 0)).1 += 1;
}

fn release<K: Identifier, T>(pins: &mut BTreeMap<K, (Handle<K, T>, usize)>, id: K) {
    if let Some(pin) = pins.get_mut(&id) {
        pin.1 -= 1;
        if pin.1 == 0 {
            pins.remove(&id);
        }
    }
}

impl Mesh {
    /// Empty mesh with strict reference checking.
    pub fn new(dimension: usize, definitions: &TreeManagers) -> Result<Self, MeshError> {
        Self::with_references(dimension, definitions, NodeReferences::Strict)
    }

    /// Empty mesh whose elements may name nodes it does not hold.
    pub fn staging(dimension: usize, definitions: &TreeManagers) -> Result<Self, MeshError> {
        Self::with_references(dimension, definitions, NodeReferences::Deferred)
    }

    /// Empty mesh with the given reference policy.
    pub fn with_references(
        dimension: usize,
        definitions: &TreeManagers,
        references: NodeReferences,
    ) -> Result<Self, MeshError> {
        if !(1..=3).contains(&dimension) {
            return Err(MeshError::InvalidDimension { dimension });
        }
        Ok(Self {
            dimension,
            references,
            definitions: definitions.clone(),
            nodes: Manager::with_config(ManagerConfig::labelled("nodes").with_first_identifier(1)),
            elements: Manager::with_config(
                ManagerConfig::labelled("elements").with_first_identifier(1),
            ),
            pins: Rc::default(),
            scope: Rc::default(),
        })
    }

    /// Coordinate dimension of every node.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The reference policy.
    pub fn references(&self) -> NodeReferences {
        self.references
    }

    /// The basis and shape definitions this mesh validates against.
    pub fn definitions(&self) -> &TreeManagers {
        &self.definitions
    }

    /// Whether this mesh was built from `definitions`.
    pub fn uses_definitions(&self, definitions: &TreeManagers) -> bool {
        self.definitions.same_as(definitions)
    }

    /// The node manager, for lookup and subscription.
    ///
    /// Mutate through the mesh so that element references stay checked.
    pub fn nodes(&self) -> &Manager<NodeId, Node> {
        &self.nodes
    }

    /// The element manager, for lookup and subscription.
    pub fn elements(&self) -> &Manager<ElementId, Element> {
        &self.elements
    }

    /// Whether two values are views of the same mesh.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.nodes.ptr_eq(&other.nodes)
    }

    /// Install, or clear with `None`, the resolver for nodes held outside
    /// this mesh.
    pub fn set_scope(&self, scope: Option<Rc<dyn NodeScope>>) {
        *self.scope.borrow_mut() = scope;
    }

    /// Whether a resolver is installed.
    pub fn has_scope(&self) -> bool {
        self.scope.borrow().is_some()
    }

    /// Whether `node` resolves in this mesh or through its scope.
    pub fn resolves(&self, node: NodeId) -> bool {
        if self.nodes.contains(&node) {
            return true;
        }
        let scope = self.scope.borrow().clone();
        scope.is_some_and(|scope| scope.resolves(node))
    }

    // ── validation ─────────────────────────────────────────────

    /// Check a node payload against this mesh.
    pub fn validate_node(&self, node: &Node) -> Result<(), MeshError> {
        if node.dimension() != self.dimension {
            return Err(MeshError::InvalidNode {
                reason: format!(
                    "expected {} coordinates, got {}",
                    self.dimension,
                    node.dimension()
                ),
            });
        }
        if let Some(c) = node.coordinates.iter().find(|c| !c.is_finite()) {
            return Err(MeshError::InvalidNode {
                reason: format!("coordinate {c} is not finite"),
            });
        }
        Ok(())
    }

    /// Check an element payload against the definitions and, under
    /// [`NodeReferences::Strict`], against the nodes this mesh
    /// [resolves](Mesh::resolves).
    pub fn validate_element(
        &self,
        id: Option<ElementId>,
        element: &Element,
    ) -> Result<(), MeshError> {
        self.check_element(id, element).map(drop)
    }

    fn check_element(&self, id: Option<ElementId>, element: &Element) -> Result<Used, MeshError> {
        let shape = self
            .definitions
            .shapes()
            .find_by_identifier(&element.shape)
            .ok_or(MeshError::UnknownShape {
                shape: element.shape,
            })?;
        let basis = self
            .definitions
            .bases()
            .find_by_identifier(&element.basis)
            .ok_or(MeshError::UnknownBasis {
                basis: element.basis,
            })?;
        let shape_dimension = shape.payload().dimension();
        let basis_dimension = basis.payload().dimension();
        let node_count = basis.payload().node_count();
        if shape_dimension != basis_dimension {
            return Err(MeshError::InvalidElement {
                reason: format!(
                    "shape {} is {shape_dimension}-dimensional but basis {} is \
                     {basis_dimension}-dimensional",
                    element.shape, element.basis
                ),
            });
        }
        if shape_dimension > self.dimension {
            return Err(MeshError::InvalidElement {
                reason: format!(
                    "{shape_dimension}-dimensional element in a {}-dimensional mesh",
                    self.dimension
                ),
            });
        }
        if element.nodes.len() != node_count {
            return Err(MeshError::InvalidElement {
                reason: format!(
                    "basis {} needs {node_count} nodes, got {}",
                    element.basis,
                    element.nodes.len()
                ),
            });
        }
        if self.references == NodeReferences::Strict {
            if let Some(&node) = element.nodes.iter().find(|n| !self.resolves(**n)) {
                return Err(MeshError::DanglingReference { element: id, node });
            }
        }
        Ok(Used { basis, shape })
    }

    // ── creation ───────────────────────────────────────────────

    /// Add a node under `id`, or the next free identifier. Identifiers
    /// start at 1.
    pub fn create_node(&self, id: Option<NodeId>, node: Node) -> Result<NodeHandle, MeshError> {
        if let Some(id @ NodeId(0)) = id {
            return Err(MeshError::InvalidIdentifier { key: id.into() });
        }
        self.validate_node(&node)?;
        let handle = match id {
            Some(id) => self.nodes.create(id, node)?,
            None => self.nodes.create_next(node)?,
        };
        Ok(handle)
    }

    /// Add an element under `id`, or the next free identifier.
    /// Identifiers start at 1.
    pub fn create_element(
        &self,
        id: Option<ElementId>,
        element: Element,
    ) -> Result<ElementHandle, MeshError> {
        if let Some(id) = id {
            if id == ElementId(0) {
                return Err(MeshError::InvalidIdentifier { key: id.into() });
            }
            if self.elements.contains(&id) {
                return Err(tessera_core::ObjectError::duplicate(id).into());
            }
        }
        let used = self.check_element(id, &element)?;
        let handle = match id {
            Some(id) => self.elements.create(id, element)?,
            None => self.elements.create_next(element)?,
        };
        self.pins.borrow_mut().hold(used);
        Ok(handle)
    }

    // ── modification ───────────────────────────────────────────

    /// Edit a node. The edited payload is validated before it is stored;
    /// on failure the node is unchanged and nothing is notified.
    pub fn modify_node(
        &self,
        handle: &NodeHandle,
        edit: impl FnOnce(&mut Node),
    ) -> Result<(), MeshError> {
        let mut candidate = handle.payload().clone();
        edit(&mut candidate);
        self.validate_node(&candidate)?;
        self.nodes.modify(handle, move |node| *node = candidate)?;
        Ok(())
    }

    /// Replace a node's payload.
    pub fn replace_node(&self, handle: &NodeHandle, node: Node) -> Result<(), MeshError> {
        self.modify_node(handle, move |current| *current = node)
    }

    /// Edit an element, validated like [`modify_node`](Mesh::modify_node).
    pub fn modify_element(
        &self,
        handle: &ElementHandle,
        edit: impl FnOnce(&mut Element),
    ) -> Result<(), MeshError> {
        let mut candidate = handle.payload().clone();
        let (basis, shape) = (candidate.basis, candidate.shape);
        edit(&mut candidate);
        let used = self.check_element(Some(handle.identifier()), &candidate)?;
        self.elements
            .modify(handle, move |element| *element = candidate)?;
        let mut pins = self.pins.borrow_mut();
        pins.hold(used);
        pins.release(basis, shape);
        Ok(())
    }

    /// Replace an element's payload.
    pub fn replace_element(
        &self,
        handle: &ElementHandle,
        element: Element,
    ) -> Result<(), MeshError> {
        self.modify_element(handle, move |current| *current = element)
    }

    // ── destruction ────────────────────────────────────────────

    /// Remove a node. Fails with [`MeshError::NodeInUse`] while any
    /// element names it, here or in a mesh that resolves it through this
    /// one.
    pub fn destroy_node(&self, handle: &NodeHandle) -> Result<(), MeshError> {
        let node = handle.identifier();
        let mut elements = self.elements_referencing(node);
        let scope = self.scope.borrow().clone();
        if let Some(scope) = scope {
            elements.extend(scope.dependents(node));
        }
        if !elements.is_empty() {
            tracing::debug!(%node, referencing = elements.len(), "node still referenced");
            return Err(MeshError::NodeInUse { node, elements });
        }
        self.nodes.destroy(handle)?;
        Ok(())
    }

    /// Remove an element.
    pub fn destroy_element(&self, handle: &ElementHandle) -> Result<(), MeshError> {
        let (basis, shape) = {
            let element = handle.payload();
            (element.basis, element.shape)
        };
        self.elements.destroy(handle)?;
        self.pins.borrow_mut().release(basis, shape);
        Ok(())
    }

    // ── lookup ─────────────────────────────────────────────────

    /// Acquire the node stored under `id`.
    pub fn find_node(&self, id: NodeId) -> Option<NodeHandle> {
        self.nodes.find_by_identifier(&id)
    }

    /// Acquire the element stored under `id`.
    pub fn find_element(&self, id: ElementId) -> Option<ElementHandle> {
        self.elements.find_by_identifier(&id)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of elements.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Elements whose node map contains `node`, in identifier order.
    pub fn elements_referencing(&self, node: NodeId) -> Vec<ElementId> {
        self.elements
            .handles()
            .iter()
            .filter(|h| h.payload().references(node))
            .map(|h| h.identifier())
            .collect()
    }

    /// Element links that resolve neither in this mesh nor through its
    /// scope.
    pub fn unresolved_references(&self) -> Vec<(ElementId, NodeId)> {
        let mut unresolved = Vec::new();
        for handle in self.elements.handles() {
            let element = handle.payload();
            for &node in &element.nodes {
                if !self.resolves(node) {
                    unresolved.push((handle.identifier(), node));
                }
            }
        }
        unresolved
    }

    // ── change scopes ──────────────────────────────────────────

    /// Open a change scope on both managers.
    pub fn begin_change(&self) {
        self.nodes.begin_change_scope();
        self.elements.begin_change_scope();
    }

    /// Close the scope on both managers. Node changes are delivered
    /// before element changes.
    pub fn end_change(&self) {
        self.nodes.end_change_scope();
        self.elements.end_change_scope();
    }

    /// Open a change scope on both managers, closed when the guard drops.
    pub fn change_scope(&self) -> MeshChangeScope<'_> {
        self.begin_change();
        MeshChangeScope { mesh: self }
    }
}

impl fmt::Debug for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mesh")
            .field("dimension", &self.dimension)
            .field("references", &self.references)
            .field("nodes", &self.node_count())
            .field("elements", &self.element_count())
            .finish()
    }
}

/// Guard closing a [`Mesh`] change scope on drop.
#[must_use = "the scope closes as soon as the guard is dropped"]
pub struct MeshChangeScope<'a> {
    mesh: &'a Mesh,
}

impl Drop for MeshChangeScope<'_> {
    fn drop(&mut self) {
        self.mesh.end_change();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::basis::{Basis, BasisFunction};
    use crate::shape::{Shape, ShapeKind};
    use tessera_core::{BasisId, ObjectError, ShapeId};

    const SQUARE: ShapeId = ShapeId(0);
    const LINE: ShapeId = ShapeId(1);
    const BILINEAR: BasisId = BasisId(0);
    const LINEAR: BasisId = BasisId(1);

    fn definitions() -> TreeManagers {
        let d = TreeManagers::new();
        d.define_basis(
            Some(BILINEAR),
            Basis::uniform(BasisFunction::LinearLagrange, 2).unwrap(),
        )
        .unwrap();
        d.define_basis(
            Some(LINEAR),
            Basis::uniform(BasisFunction::LinearLagrange, 1).unwrap(),
        )
        .unwrap();
        d.define_shape(Some(SQUARE), Shape::new(ShapeKind::Square))
            .unwrap();
        d.define_shape(Some(LINE), Shape::new(ShapeKind::Line))
            .unwrap();
        d
    }

    /// 2x2 node square with one element.
    fn unit_square() -> Mesh {
        let mesh = Mesh::new(2, &definitions()).unwrap();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
            mesh.create_node(None, Node::at(&[x, y])).unwrap();
        }
        mesh.create_element(None, Element::new(SQUARE, BILINEAR, [1, 2, 3, 4].map(NodeId)))
            .unwrap();
        mesh
    }

    #[test]
    fn rejects_out_of_range_dimension() {
        assert_eq!(
            Mesh::new(0, &definitions()).unwrap_err(),
            MeshError::InvalidDimension { dimension: 0 }
        );
        assert!(Mesh::new(4, &definitions()).is_err());
    }

    #[test]
    fn identifiers_start_at_one() {
        let mesh = unit_square();
        assert_eq!(
            mesh.nodes().identifiers(),
            [1, 2, 3, 4].map(NodeId).to_vec()
        );
        assert_eq!(mesh.elements().identifiers(), vec![ElementId(1)]);
    }

    #[test]
    fn node_must_match_dimension_and_be_finite() {
        let mesh = Mesh::new(2, &definitions()).unwrap();
        assert!(matches!(
            mesh.create_node(None, Node::at(&[1.0])),
            Err(MeshError::InvalidNode { .. })
        ));
        assert!(matches!(
            mesh.create_node(None, Node::at(&[f64::NAN, 0.0])),
            Err(MeshError::InvalidNode { .. })
        ));
        assert_eq!(mesh.node_count(), 0);
    }

    #[test]
    fn element_checks_definitions() {
        let mesh = unit_square();
        let nodes = [1, 2, 3, 4].map(NodeId);
        assert_eq!(
            mesh.create_element(None, Element::new(ShapeId(9), BILINEAR, nodes))
                .unwrap_err(),
            MeshError::UnknownShape { shape: ShapeId(9) }
        );
        assert_eq!(
            mesh.create_element(None, Element::new(SQUARE, BasisId(9), nodes))
                .unwrap_err(),
            MeshError::UnknownBasis { basis: BasisId(9) }
        );
        assert!(matches!(
            mesh.create_element(None, Element::new(SQUARE, LINEAR, nodes)),
            Err(MeshError::InvalidElement { .. })
        ));
        assert!(matches!(
            mesh.create_element(None, Element::new(SQUARE, BILINEAR, [1, 2, 3].map(NodeId))),
            Err(MeshError::InvalidElement { .. })
        ));
        assert_eq!(mesh.element_count(), 1);
    }

    #[test]
    fn lower_dimensional_elements_are_allowed() {
        let mesh = unit_square();
        let edge = mesh
            .create_element(None, Element::new(LINE, LINEAR, [1, 2].map(NodeId)))
            .unwrap();
        assert_eq!(edge.identifier(), ElementId(2));
    }

    #[test]
    fn strict_mesh_rejects_dangling_node() {
        let mesh = unit_square();
        let err = mesh
            .create_element(
                Some(ElementId(7)),
                Element::new(SQUARE, BILINEAR, [1, 2, 3, 99].map(NodeId)),
            )
            .unwrap_err();
        assert_eq!(
            err,
            MeshError::DanglingReference {
                element: Some(ElementId(7)),
                node: NodeId(99)
            }
        );
    }

    #[test]
    fn staging_mesh_defers_references() {
        let mesh = Mesh::staging(2, &definitions()).unwrap();
        mesh.create_node(Some(NodeId(1)), Node::at(&[0.0, 0.0]))
            .unwrap();
        mesh.create_element(
            Some(ElementId(5)),
            Element::new(SQUARE, BILINEAR, [1, 2, 3, 4].map(NodeId)),
        )
        .unwrap();
        assert_eq!(
            mesh.unresolved_references(),
            vec![
                (ElementId(5), NodeId(2)),
                (ElementId(5), NodeId(3)),
                (ElementId(5), NodeId(4))
            ]
        );
        assert!(unit_square().unresolved_references().is_empty());
    }

    #[test]
    fn duplicate_element_identifier_is_reported_first() {
        let mesh = unit_square();
        let err = mesh
            .create_element(
                Some(ElementId(1)),
                Element::new(SQUARE, BILINEAR, [1, 2, 3, 99].map(NodeId)),
            )
            .unwrap_err();
        assert_eq!(err, MeshError::Object(ObjectError::duplicate(ElementId(1))));
    }

    #[test]
    fn referenced_node_cannot_be_destroyed() {
        let mesh = unit_square();
        let node = mesh.find_node(NodeId(2)).unwrap();
        assert_eq!(
            mesh.destroy_node(&node).unwrap_err(),
            MeshError::NodeInUse {
                node: NodeId(2),
                elements: vec![ElementId(1)]
            }
        );

        let element = mesh.find_element(ElementId(1)).unwrap();
        mesh.destroy_element(&element).unwrap();
        mesh.destroy_node(&node).unwrap();
        assert_eq!(mesh.node_count(), 3);
        assert!(mesh.elements_referencing(NodeId(1)).is_empty());
    }

    #[test]
    fn invalid_edit_leaves_payload_unchanged() {
        let mesh = unit_square();
        let element = mesh.find_element(ElementId(1)).unwrap();
        let err = mesh
            .modify_element(&element, |e| e.nodes[0] = NodeId(42))
            .unwrap_err();
        assert!(matches!(err, MeshError::DanglingReference { .. }));
        assert_eq!(element.payload().nodes[0], NodeId(1));

        let node = mesh.find_node(NodeId(4)).unwrap();
        mesh.replace_node(&node, Node::at(&[2.0, 2.0])).unwrap();
        assert_eq!(node.payload().coordinates.as_slice(), &[2.0, 2.0]);
        assert!(mesh.replace_node(&node, Node::at(&[2.0])).is_err());
    }

    #[test]
    fn scope_flushes_nodes_before_elements() {
        let mesh = Mesh::new(1, &definitions()).unwrap();
        let order = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&order);
        mesh.nodes()
            .subscribe(move |m| sink.borrow_mut().push(("nodes", m.len())));
        let sink = Rc::clone(&order);
        mesh.elements()
            .subscribe(move |m| sink.borrow_mut().push(("elements", m.len())));

        {
            let _scope = mesh.change_scope();
            mesh.create_node(None, Node::at(&[0.0])).unwrap();
            mesh.create_node(None, Node::at(&[1.0])).unwrap();
            mesh.create_element(None, Element::new(LINE, LINEAR, [1, 2].map(NodeId)))
                .unwrap();
            assert!(order.borrow().is_empty());
        }

        assert_eq!(*order.borrow(), vec![("nodes", 2), ("elements", 1)]);
    }

    #[test]
    fn clones_are_views_of_one_mesh() {
        let mesh = unit_square();
        let view = mesh.clone();
        assert!(view.ptr_eq(&mesh));
        view.create_node(None, Node::at(&[5.0, 5.0])).unwrap();
        assert_eq!(mesh.node_count(), 5);
        assert!(!mesh.ptr_eq(&unit_square()));
    }

    #[test]
    fn zero_identifiers_are_rejected() {
        let mesh = unit_square();
        assert_eq!(
            mesh.create_node(Some(NodeId(0)), Node::at(&[0.5, 0.5]))
                .unwrap_err(),
            MeshError::InvalidIdentifier {
                key: NodeId(0).into()
            }
        );
        assert_eq!(
            mesh.create_element(
                Some(ElementId(0)),
                Element::new(SQUARE, BILINEAR, [1, 2, 3, 4].map(NodeId)),
            )
            .unwrap_err(),
            MeshError::InvalidIdentifier {
                key: ElementId(0).into()
            }
        );
        assert_eq!(mesh.node_count(), 4);
        assert_eq!(mesh.element_count(), 1);
    }

    #[test]
    fn definitions_in_use_cannot_be_destroyed() {
        let mesh = unit_square();
        let bases = mesh.definitions().bases();
        assert!(matches!(
            bases.destroy_by_identifier(&BILINEAR),
            Err(ObjectError::InUse { .. })
        ));
        assert!(matches!(
            mesh.definitions().shapes().destroy_by_identifier(&SQUARE),
            Err(ObjectError::InUse { .. })
        ));
        let element = mesh.find_element(ElementId(1)).unwrap();
        mesh.modify_element(&element, |_| {}).unwrap();

        // Switching the element to a line releases the bilinear basis.
        mesh.replace_element(&element, Element::new(LINE, LINEAR, [1, 2].map(NodeId)))
            .unwrap();
        bases.destroy_by_identifier(&BILINEAR).unwrap();
        assert!(bases.destroy_by_identifier(&LINEAR).is_err());

        mesh.destroy_element(&element).unwrap();
        bases.destroy_by_identifier(&LINEAR).unwrap();
        mesh.definitions()
            .shapes()
            .destroy_by_identifier(&SQUARE)
            .unwrap();
    }

    #[test]
    fn failed_write_holds_no_definition() {
        let mesh = unit_square();
        mesh.create_element(None, Element::new(LINE, LINEAR, [1, 99].map(NodeId)))
            .unwrap_err();
        mesh.definitions()
            .bases()
            .destroy_by_identifier(&LINEAR)
            .unwrap();
    }

    /// Nodes held by a surrounding mesh, and elements relying on them.
    struct Enclosing {
        nodes: Vec<NodeId>,
        dependents: Vec<ElementId>,
    }

    impl NodeScope for Enclosing {
        fn resolves(&self, node: NodeId) -> bool {
            self.nodes.contains(&node)
        }

        fn dependents(&self, _node: NodeId) -> Vec<ElementId> {
            self.dependents.clone()
        }
    }

    #[test]
    fn scope_extends_node_resolution() {
        let mesh = Mesh::new(1, &definitions()).unwrap();
        let node = mesh.create_node(Some(NodeId(1)), Node::at(&[0.0])).unwrap();
        let edge = Element::new(LINE, LINEAR, [1, 7].map(NodeId));
        assert!(matches!(
            mesh.create_element(None, edge.clone()),
            Err(MeshError::DanglingReference { node: NodeId(7), .. })
        ));

        mesh.set_scope(Some(Rc::new(Enclosing {
            nodes: vec![NodeId(7)],
            dependents: vec![ElementId(40)],
        })));
        assert!(mesh.has_scope());
        assert!(mesh.resolves(NodeId(7)));
        mesh.create_element(None, edge).unwrap();
        assert!(mesh.unresolved_references().is_empty());
        assert_eq!(
            mesh.destroy_node(&node).unwrap_err(),
            MeshError::NodeInUse {
                node: NodeId(1),
                elements: vec![ElementId(1), ElementId(40)]
            }
        );

        mesh.set_scope(None);
        assert_eq!(
            mesh.unresolved_references(),
            vec![(ElementId(1), NodeId(7))]
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            AddNode(u32),
            AddEdge(u32, u32),
            DropNode(u32),
            DropElement(u32),
        }

        fn arb_op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1u32..12).prop_map(Op::AddNode),
                (1u32..12, 1u32..12).prop_map(|(a, b)| Op::AddEdge(a, b)),
                (1u32..12).prop_map(Op::DropNode),
                (1u32..8).prop_map(Op::DropElement),
            ]
        }

        proptest! {
            #[test]
            fn strict_mesh_never_dangles(ops in prop::collection::vec(arb_op(), 0..64)) {
                let mesh = Mesh::new(1, &definitions()).unwrap();
                for op in ops {
                    match op {
                        Op::AddNode(id) => {
                            let _ = mesh.create_node(Some(NodeId(id)), Node::at(&[id as f64]));
                        }
                        Op::AddEdge(a, b) => {
                            let _ = mesh.create_element(
                                None,
                                Element::new(LINE, LINEAR, [NodeId(a), NodeId(b)]),
                            );
                        }
                        Op::DropNode(id) => {
                            if let Some(node) = mesh.find_node(NodeId(id)) {
                                let _ = mesh.destroy_node(&node);
                            }
                        }
                        Op::DropElement(id) => {
                            if let Some(element) = mesh.find_element(ElementId(id)) {
                                mesh.destroy_element(&element).unwrap();
                            }
                        }
                    }
                    prop_assert!(mesh.unresolved_references().is_empty());
                }
            }
        }
    }
}
