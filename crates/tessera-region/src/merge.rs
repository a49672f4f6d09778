//! Folding a free-standing region tree into a live one.
//!
//! [`merge`] reconciles a detached source tree `S` with a destination
//! region `D` in three phases:
//!
//! 1. **Check.** Walk `S` alongside `D` and verify, before any write,
//!    that matching meshes have the same dimension and that every basis
//!    and shape `S` uses is defined identically in `D`'s tree. Then look
//!    for element links that resolve in neither side. A link resolves in
//!    the element's own region or in any enclosing one, on either side,
//!    including the regions above `D`.
//! 2. **Apply.** Open a change scope on every destination mesh touched,
//!    create missing regions and meshes, and reconcile each region's
//!    nodes before its elements: identifiers `D` already holds are
//!    modified in place (external handles stay valid), new identifiers
//!    are created under the source identifier. Objects only `D` holds
//!    are never touched.
//! 3. **Flush.** Close every scope, so each destination manager delivers
//!    one coalesced message, and drop `S`.
//!
//! Dangling links are handled per [`MergePolicy`].

use std::collections::{BTreeSet, HashSet};

use tessera_core::{BasisId, ElementId, MeshObjectKey, NodeId, ShapeId};
use tessera_mesh::{Mesh, MeshError, TreeManagers};

use crate::config::{MergeConfig, MergePolicy};
use crate::error::{DanglingLink, DanglingReferenceReport, MergeError, MergedKey};
use crate::path::{self, CURRENT};
use crate::region::Region;

/// Counts of what a merge wrote.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Source regions walked.
    pub regions_visited: usize,
    /// Destination regions created for source regions `D` lacked.
    pub regions_created: usize,
    /// Destination meshes created for source meshes `D` lacked.
    pub containers_created: usize,
    /// Nodes created in the destination.
    pub nodes_created: usize,
    /// Existing destination nodes overwritten.
    pub nodes_modified: usize,
    /// Elements created in the destination.
    pub elements_created: usize,
    /// Existing destination elements overwritten.
    pub elements_modified: usize,
}

impl MergeReport {
    /// Total objects written.
    pub fn objects_written(&self) -> usize {
        self.nodes_created + self.nodes_modified + self.elements_created + self.elements_modified
    }
}

/// Merge the detached tree `source` into `destination`.
///
/// The source is consumed. On [`MergeError::IncompatibleRegions`],
/// [`MergeError::SourceAttached`] and [`MergeError::SameTree`] nothing
/// was written. On [`MergeError::DanglingReference`] the report says
/// what was.
pub fn merge(
    destination: &Region,
    source: Region,
    config: &MergeConfig,
) -> Result<MergeReport, MergeError> {
    if !source.is_root() {
        return Err(MergeError::SourceAttached {
            source: source.path(),
        });
    }
    if destination.root().ptr_eq(&source) {
        return Err(MergeError::SameTree);
    }

    tracing::info!(
        destination = %destination.path(),
        source = %source.name(),
        policy = ?config.policy,
        regions = source.subtree_len(),
        "merge started"
    );

    let mut pairs = Vec::new();
    collect_pairs(
        CURRENT,
        None,
        Some(destination),
        &source,
        config.include_subregions,
        &mut pairs,
    );
    for pair in &pairs {
        check_compatible(pair, destination.managers())?;
    }

    let enclosing = destination.parent();
    let dangling: Vec<DanglingLink> = (0..pairs.len())
        .flat_map(|index| find_dangling(&pairs, index, enclosing.as_ref()))
        .collect();
    if !dangling.is_empty() && config.policy == MergePolicy::Atomic {
        tracing::warn!(dangling = dangling.len(), "merge refused: dangling references");
        return Err(MergeError::DanglingReference(Box::new(
            DanglingReferenceReport {
                policy: config.policy,
                dangling,
                applied: Vec::new(),
                not_applied: pairs.iter().flat_map(source_keys).collect(),
                rolled_back: true,
            },
        )));
    }

    let mut apply = Apply {
        include_subregions: config.include_subregions,
        skip: dangling
            .iter()
            .map(|link| (link.region.clone(), link.element))
            .collect(),
        scopes: OpenScopes::default(),
        report: MergeReport::default(),
        applied: Vec::new(),
        not_applied: Vec::new(),
    };
    let outcome = apply.region(CURRENT, destination, &source);
    // Closing the scopes flushes one message per destination manager,
    // including after a failed write.
    let Apply {
        scopes,
        report,
        applied,
        not_applied,
        ..
    } = apply;
    drop(scopes);
    drop(source);
    outcome?;

    if dangling.is_empty() {
        tracing::info!(
            regions = report.regions_visited,
            written = report.objects_written(),
            "merge finished"
        );
        return Ok(report);
    }

    tracing::warn!(
        dangling = dangling.len(),
        applied = applied.len(),
        skipped = not_applied.len(),
        "merge partially applied"
    );
    Err(MergeError::DanglingReference(Box::new(
        DanglingReferenceReport {
            policy: config.policy,
            dangling,
            applied,
            not_applied,
            rolled_back: false,
        },
    )))
}

// ── check phase ────────────────────────────────────────────────────

/// The meshes of one source region and of its destination counterpart,
/// keyed by the region's path relative to the merge root. `parent` indexes
/// the enclosing region's pair.
struct Pair {
    path: String,
    parent: Option<usize>,
    source: Option<Mesh>,
    destination: Option<Mesh>,
}

fn collect_pairs(
    rel: &str,
    parent: Option<usize>,
    destination: Option<&Region>,
    source: &Region,
    include_subregions: bool,
    pairs: &mut Vec<Pair>,
) {
    let index = pairs.len();
    pairs.push(Pair {
        path: rel.to_string(),
        parent,
        source: source.container(),
        destination: destination.and_then(Region::container),
    });
    if !include_subregions {
        return;
    }
    for child in source.children() {
        let name = child.name();
        let counterpart = destination.and_then(|d| d.find_child(&name));
        collect_pairs(
            &path::join(rel, &name),
            Some(index),
            counterpart.as_ref(),
            &child,
            include_subregions,
            pairs,
        );
    }
}

fn incompatible(pair: &Pair, reason: String) -> MergeError {
    MergeError::IncompatibleRegions {
        region: pair.path.clone(),
        reason,
    }
}

fn check_compatible(pair: &Pair, definitions: &TreeManagers) -> Result<(), MergeError> {
    let Some(source) = &pair.source else {
        return Ok(());
    };
    if let Some(destination) = &pair.destination {
        if destination.dimension() != source.dimension() {
            return Err(incompatible(
                pair,
                format!(
                    "source mesh is {}-dimensional, destination is {}-dimensional",
                    source.dimension(),
                    destination.dimension()
                ),
            ));
        }
    }

    let mut bases = BTreeSet::<BasisId>::new();
    let mut shapes = BTreeSet::<ShapeId>::new();
    for handle in source.elements().handles() {
        let element = handle.payload();
        bases.insert(element.basis);
        shapes.insert(element.shape);
    }
    let theirs = source.definitions();
    for id in bases {
        match definitions.basis(id) {
            None => return Err(incompatible(pair, format!("basis {id} is not defined"))),
            Some(ours) if theirs.basis(id).as_ref() != Some(&ours) => {
                return Err(incompatible(pair, format!("basis {id} is defined differently")))
            }
            Some(_) => {}
        }
    }
    for id in shapes {
        match definitions.shape(id) {
            None => return Err(incompatible(pair, format!("shape {id} is not defined"))),
            Some(ours) if theirs.shape(id) != Some(ours) => {
                return Err(incompatible(pair, format!("shape {id} is defined differently")))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Whether `node` is held at pair `index` or any enclosing pair, on
/// either side, or by a mesh above the merge root.
fn resolves(pairs: &[Pair], index: usize, enclosing: Option<&Region>, node: NodeId) -> bool {
    let held = |mesh: &Option<Mesh>| mesh.as_ref().is_some_and(|m| m.nodes().contains(&node));
    let mut current = Some(index);
    while let Some(index) = current {
        let pair = &pairs[index];
        if held(&pair.source) || held(&pair.destination) {
            return true;
        }
        current = pair.parent;
    }
    enclosing.is_some_and(|region| region.find_node_holder(node).is_some())
}

fn find_dangling(pairs: &[Pair], index: usize, enclosing: Option<&Region>) -> Vec<DanglingLink> {
    let pair = &pairs[index];
    let Some(source) = &pair.source else {
        return Vec::new();
    };
    let mut dangling = Vec::new();
    for handle in source.elements().handles() {
        let element = handle.payload();
        for &node in &element.nodes {
            if !resolves(pairs, index, enclosing, node) {
                dangling.push(DanglingLink {
                    region: pair.path.clone(),
                    element: handle.identifier(),
                    node,
                });
            }
        }
    }
    dangling
}

fn source_keys(pair: &Pair) -> Vec<MergedKey> {
    let Some(source) = &pair.source else {
        return Vec::new();
    };
    let nodes = source.nodes().identifiers().into_iter().map(MeshObjectKey::from);
    let elements = source
        .elements()
        .identifiers()
        .into_iter()
        .map(MeshObjectKey::from);
    nodes
        .chain(elements)
        .map(|key| MergedKey {
            region: pair.path.clone(),
            key,
        })
        .collect()
}

// ── apply phase ────────────────────────────────────────────────────

/// Destination meshes with an open change scope, closed in opening order
/// on drop.
#[derive(Default)]
struct OpenScopes {
    meshes: Vec<Mesh>,
}

impl OpenScopes {
    fn open(&mut self, mesh: &Mesh) {
        if self.meshes.iter().any(|m| m.ptr_eq(mesh)) {
            return;
        }
        mesh.begin_change();
        self.meshes.push(mesh.clone());
    }
}

impl Drop for OpenScopes {
    fn drop(&mut self) {
        for mesh in &self.meshes {
            mesh.end_change();
        }
    }
}

struct Apply {
    include_subregions: bool,
    skip: HashSet<(String, ElementId)>,
    scopes: OpenScopes,
    report: MergeReport,
    applied: Vec<MergedKey>,
    not_applied: Vec<MergedKey>,
}

impl Apply {
    fn region(&mut self, rel: &str, destination: &Region, source: &Region) -> Result<(), MergeError> {
        self.report.regions_visited += 1;

        if let Some(theirs) = source.container() {
            let ours = match destination.container() {
                Some(mesh) => mesh,
                None => {
                    let mesh = Mesh::new(theirs.dimension(), destination.managers())
                        .map_err(|error| mesh_error(rel, error))?;
                    destination.attach_domain_container(mesh.clone())?;
                    self.report.containers_created += 1;
                    mesh
                }
            };
            self.scopes.open(&ours);
            self.nodes(rel, &ours, &theirs)?;
            self.elements(rel, &ours, &theirs)?;
        }

        if !self.include_subregions {
            return Ok(());
        }
        for child in source.children() {
            let name = child.name();
            let counterpart = match destination.find_child(&name) {
                Some(region) => region,
                None => {
                    self.report.regions_created += 1;
                    destination.create_child(&name)?
                }
            };
            self.region(&path::join(rel, &name), &counterpart, &child)?;
        }
        Ok(())
    }

    fn nodes(&mut self, rel: &str, ours: &Mesh, theirs: &Mesh) -> Result<(), MergeError> {
        for handle in theirs.nodes().handles() {
            let id = handle.identifier();
            let node = handle.payload().clone();
            match ours.find_node(id) {
                Some(existing) => {
                    ours.replace_node(&existing, node)
                        .map_err(|error| mesh_error(rel, error))?;
                    self.report.nodes_modified += 1;
                }
                None => {
                    ours.create_node(Some(id), node)
                        .map_err(|error| mesh_error(rel, error))?;
                    self.report.nodes_created += 1;
                }
            }
            self.applied.push(MergedKey {
                region: rel.to_string(),
                key: id.into(),
            });
        }
        Ok(())
    }

    fn elements(&mut self, rel: &str, ours: &Mesh, theirs: &Mesh) -> Result<(), MergeError> {
        for handle in theirs.elements().handles() {
            let id = handle.identifier();
            let key = MergedKey {
                region: rel.to_string(),
                key: id.into(),
            };
            if self.skip.contains(&(rel.to_string(), id)) {
                self.not_applied.push(key);
                continue;
            }
            let element = handle.payload().clone();
            match ours.find_element(id) {
                Some(existing) => {
                    ours.replace_element(&existing, element)
                        .map_err(|error| mesh_error(rel, error))?;
                    self.report.elements_modified += 1;
                }
                None => {
                    ours.create_element(Some(id), element)
                        .map_err(|error| mesh_error(rel, error))?;
                    self.report.elements_created += 1;
                }
            }
            self.applied.push(key);
        }
        Ok(())
    }
}

fn mesh_error(rel: &str, error: MeshError) -> MergeError {
    MergeError::Mesh {
        region: rel.to_string(),
        error,
    }
}
