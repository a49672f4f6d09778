//! Element links that resolve through the meshes of enclosing regions.

use tessera_core::{ElementId, NodeId};
use tessera_mesh::{Element, Mesh, MeshError, Node};
use tessera_region::{Context, ContextConfig, MergeError, RegionError};
use tessera_test_utils::fixtures::{define_standard, grid_mesh, LINE, LINEAR};

fn context() -> Context {
    let context = Context::new(ContextConfig::default()).unwrap();
    define_standard(context.managers());
    context
}

fn edge(a: u32, b: u32) -> Element {
    Element::new(LINE, LINEAR, [NodeId(a), NodeId(b)])
}

/// Root carries a 1x1 grid (nodes 1..=4, element 1); `body` carries a
/// mesh with node 10 and element 5 linking root node 2 to node 10.
fn linked_tree(context: &Context) -> Mesh {
    let root = context.root();
    root.attach_domain_container(grid_mesh(context.managers(), 1, 1))
        .unwrap();
    let body = root.create_child("body").unwrap();
    let mesh = context.create_mesh(2).unwrap();
    body.attach_domain_container(mesh.clone()).unwrap();
    mesh.create_node(Some(NodeId(10)), Node::at(&[2.0, 0.0]))
        .unwrap();
    mesh.create_element(Some(ElementId(5)), edge(2, 10)).unwrap();
    mesh
}

#[test]
fn child_mesh_resolves_enclosing_nodes() {
    let context = context();
    let mesh = linked_tree(&context);
    let body = context.find_region("body").unwrap();
    let skin = body.create_child("skin").unwrap();

    assert!(mesh.unresolved_references().is_empty());
    assert!(mesh.resolves(NodeId(2)));
    assert!(skin.find_node_holder(NodeId(2)).unwrap().ptr_eq(context.root()));
    assert!(skin.find_node_holder(NodeId(10)).unwrap().ptr_eq(&body));
    assert!(skin.find_node_holder(NodeId(99)).is_none());
    assert!(skin.is_within(context.root()));
    assert!(matches!(
        mesh.create_element(None, edge(10, 99)),
        Err(MeshError::DanglingReference { node: NodeId(99), .. })
    ));
}

#[test]
fn standalone_mesh_does_not_see_the_tree() {
    let context = context();
    linked_tree(&context);
    let loose = context.create_mesh(2).unwrap();
    loose
        .create_node(Some(NodeId(10)), Node::at(&[0.0, 0.0]))
        .unwrap();
    assert!(matches!(
        loose.create_element(None, edge(2, 10)),
        Err(MeshError::DanglingReference { node: NodeId(2), .. })
    ));
}

#[test]
fn enclosing_node_cannot_be_destroyed_while_linked() {
    let context = context();
    let mesh = linked_tree(&context);
    let root_mesh = context.root().container().unwrap();
    let node = root_mesh.find_node(NodeId(2)).unwrap();
    assert_eq!(
        root_mesh.destroy_node(&node).unwrap_err(),
        MeshError::NodeInUse {
            node: NodeId(2),
            elements: vec![ElementId(1), ElementId(5)]
        }
    );

    let cell = root_mesh.find_element(ElementId(1)).unwrap();
    root_mesh.destroy_element(&cell).unwrap();
    let linked = mesh.find_element(ElementId(5)).unwrap();
    mesh.destroy_element(&linked).unwrap();
    root_mesh.destroy_node(&node).unwrap();
}

#[test]
fn detach_and_take_refuse_to_strand_links() {
    let context = context();
    let mesh = linked_tree(&context);
    let root = context.root();
    let body = context.find_region("body").unwrap();
    let links = vec![("/body".to_string(), ElementId(5), NodeId(2))];

    assert_eq!(
        body.detach().unwrap_err(),
        RegionError::NodesInUse {
            region: "/body".into(),
            links: links.clone()
        }
    );
    assert_eq!(
        root.take_container().unwrap_err(),
        RegionError::NodesInUse {
            region: "/".into(),
            links
        }
    );
    assert!(root.has_container());
    assert!(!body.is_root());

    // Links held inside the subtree do not pin it.
    let linked = mesh.find_element(ElementId(5)).unwrap();
    mesh.destroy_element(&linked).unwrap();
    let skin = body.create_child("skin").unwrap();
    let inner = context.create_mesh(2).unwrap();
    skin.attach_domain_container(inner.clone()).unwrap();
    inner.create_element(None, edge(10, 10)).unwrap();
    assert!(body.detach().unwrap());
    assert!(inner.unresolved_references().is_empty());
}

#[test]
fn mesh_attaches_to_one_region_at_a_time() {
    let context = context();
    let mesh = context.create_mesh(2).unwrap();
    let body = context.root().create_child("body").unwrap();
    let bone = context.root().create_child("bone").unwrap();
    body.attach_domain_container(mesh.clone()).unwrap();
    assert!(matches!(
        bone.attach_domain_container(mesh.clone()),
        Err(RegionError::AlreadyAttached { .. })
    ));

    let taken = body.take_container().unwrap().unwrap();
    assert!(!taken.has_scope());
    bone.attach_domain_container(taken).unwrap();
    assert!(mesh.has_scope());
}

#[test]
fn import_resolves_through_source_ancestors() {
    let context = context();
    let source = context.create_import_root("import").unwrap();
    source
        .attach_domain_container(grid_mesh(context.managers(), 1, 1))
        .unwrap();
    let skin = source.create_child("skin").unwrap();
    let outline = Mesh::new(2, context.managers()).unwrap();
    skin.attach_domain_container(outline.clone()).unwrap();
    outline.create_element(Some(ElementId(1)), edge(1, 2)).unwrap();

    let report = context.import(source, "/").unwrap();
    assert_eq!(report.elements_created, 2);
    let merged = context.find_region("skin").unwrap().container().unwrap();
    assert_eq!(merged.node_count(), 0);
    assert_eq!(merged.element_count(), 1);
    assert!(merged.unresolved_references().is_empty());
}

#[test]
fn import_resolves_through_regions_above_destination() {
    let context = context();
    linked_tree(&context);
    let source = context.create_import_root("import").unwrap();
    let staged = Mesh::staging(2, context.managers()).unwrap();
    staged
        .create_node(Some(NodeId(7)), Node::at(&[3.0, 3.0]))
        .unwrap();
    staged.create_element(Some(ElementId(9)), edge(3, 7)).unwrap();
    source.attach_domain_container(staged).unwrap();

    let report = context.import(source, "body").unwrap();
    assert_eq!(report.nodes_created, 1);
    assert_eq!(report.elements_created, 1);
    let body = context.find_region("body").unwrap().container().unwrap();
    assert!(body.unresolved_references().is_empty());
}

#[test]
fn link_resolving_nowhere_is_still_dangling() {
    let context = context();
    linked_tree(&context);
    let source = context.create_import_root("import").unwrap();
    let staged = Mesh::staging(2, context.managers()).unwrap();
    staged.create_element(Some(ElementId(9)), edge(3, 70)).unwrap();
    source.attach_domain_container(staged).unwrap();

    let report = match context.import(source, "body").unwrap_err() {
        MergeError::DanglingReference(report) => report,
        other => panic!("expected DanglingReference, got {other:?}"),
    };
    assert_eq!(report.dangling.len(), 1);
    assert_eq!(report.dangling[0].node, NodeId(70));
    assert!(report.rolled_back);
}
