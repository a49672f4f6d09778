//! The region tree.
//!
//! A [`Region`] is a shared handle on one tree node. Parents own their
//! children; children hold a weak link back, so dropping the last handle
//! on a root drops the whole subtree. Every region of one tree shares the
//! tree's [`TreeManagers`], and a region only accepts a mesh built from
//! them.
//!
//! An element of an attached mesh may name a node held by the mesh of any
//! enclosing region. The tree keeps those links resolvable: it refuses to
//! detach a subtree or take a mesh out while an element depends on the
//! nodes that would go.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tessera_core::{ElementId, NodeId, SubscriptionId};
use tessera_manager::Channel;
use tessera_mesh::{Mesh, NodeScope, TreeManagers};

use crate::error::RegionError;
use crate::path::{self, Segment, SEPARATOR};

/// Structural change to one region, delivered to that region's
/// subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegionChange {
    /// A child was created or appended.
    ChildAdded {
        /// The child's name.
        name: String,
    },
    /// A child was detached.
    ChildRemoved {
        /// The child's name.
        name: String,
    },
    /// A mesh was attached.
    ContainerAttached,
    /// The mesh was taken out.
    ContainerDetached,
    /// The region was renamed.
    Renamed {
        /// Previous name.
        from: String,
        /// New name.
        to: String,
    },
}

struct RegionNode {
    name: RefCell<String>,
    parent: RefCell<Weak<RegionNode>>,
    children: RefCell<Vec<Region>>,
    container: RefCell<Option<Mesh>>,
    managers: TreeManagers,
    channel: Channel<RegionChange>,
}

impl Drop for RegionNode {
    fn drop(&mut self) {
        if let Some(mesh) = self.container.get_mut().take() {
            mesh.set_scope(None);
        }
    }
}

/// Resolves an attached mesh's node links through the meshes of the
/// regions enclosing its own.
struct EnclosingMeshes {
    region: Weak<RegionNode>,
}

impl EnclosingMeshes {
    fn region(&self) -> Option<Region> {
        self.region.upgrade().map(|node| Region { node })
    }
}

impl NodeScope for EnclosingMeshes {
    fn resolves(&self, node: NodeId) -> bool {
        self.region()
            .and_then(|region| region.parent())
            .and_then(|parent| parent.find_node_holder(node))
            .is_some()
    }

    fn dependents(&self, node: NodeId) -> Vec<ElementId> {
        let Some(region) = self.region() else {
            return Vec::new();
        };
        region
            .outer_links()
            .into_iter()
            .filter(|link| link.node == node && link.holder.ptr_eq(&region))
            .map(|link| link.element)
            .collect()
    }
}

/// An element link that resolves through the mesh of an enclosing region.
struct OuterLink {
    region: Region,
    element: ElementId,
    node: NodeId,
    holder: Region,
}

/// Shared handle on a node of a region tree.
#[derive(Clone)]
pub struct Region {
    node: Rc<RegionNode>,
}

impl Region {
    /// A free-standing root region.
    pub fn new_root(name: &str, managers: &TreeManagers) -> Result<Self, RegionError> {
        path::validate_name(name)?;
        Ok(Self::unchecked_root(name, managers))
    }

    pub(crate) fn unchecked_root(name: &str, managers: &TreeManagers) -> Self {
        Self {
            node: Rc::new(RegionNode {
                name: RefCell::new(name.to_string()),
                parent: RefCell::new(Weak::new()),
                children: RefCell::new(Vec::new()),
                container: RefCell::new(None),
                managers: managers.clone(),
                channel: Channel::new(),
            }),
        }
    }

    /// The region's name.
    pub fn name(&self) -> String {
        self.node.name.borrow().clone()
    }

    /// Rename the region. Fails if a sibling already uses `name`.
    pub fn set_name(&self, name: &str) -> Result<(), RegionError> {
        path::validate_name(name)?;
        let from = self.name();
        if from == name {
            return Ok(());
        }
        if let Some(parent) = self.parent() {
            if parent.find_child(name).is_some() {
                return Err(RegionError::DuplicateName { name: name.into() });
            }
        }
        *self.node.name.borrow_mut() = name.to_string();
        tracing::debug!(%from, to = name, "region renamed");
        self.notify(RegionChange::Renamed {
            from,
            to: name.into(),
        });
        Ok(())
    }

    /// The basis and shape managers shared by this tree.
    pub fn managers(&self) -> &TreeManagers {
        &self.node.managers
    }

    /// Whether two handles refer to the same region.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    // ── navigation ─────────────────────────────────────────────

    /// The parent region, unless this is a root.
    pub fn parent(&self) -> Option<Region> {
        self.node
            .parent
            .borrow()
            .upgrade()
            .map(|node| Region { node })
    }

    /// Whether this region has no parent.
    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    /// The root of this region's tree.
    pub fn root(&self) -> Region {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Children in creation order.
    pub fn children(&self) -> Vec<Region> {
        self.node.children.borrow().clone()
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.node.children.borrow().len()
    }

    /// The direct child named `name`.
    pub fn find_child(&self, name: &str) -> Option<Region> {
        self.node
            .children
            .borrow()
            .iter()
            .find(|child| *child.node.name.borrow() == name)
            .cloned()
    }

    /// Resolve a `/`-separated path from this region. See [`path`] for
    /// the syntax.
    pub fn find_subregion_by_path(&self, path: &str) -> Option<Region> {
        let parsed = path::parse(path);
        let mut current = if parsed.absolute {
            self.root()
        } else {
            self.clone()
        };
        for segment in parsed.segments {
            current = match segment {
                Segment::Current => current,
                Segment::Parent => current.parent()?,
                Segment::Child(name) => current.find_child(name)?,
            };
        }
        Some(current)
    }

    /// Absolute path from the root, e.g. `/body/skin`. A root's path is
    /// `/`.
    pub fn path(&self) -> String {
        let mut names = Vec::new();
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            names.push(current.name());
            current = parent;
        }
        names.reverse();
        format!("{SEPARATOR}{}", names.join("/"))
    }

    /// Whether this region is `ancestor` or lies below it.
    pub fn is_within(&self, ancestor: &Region) -> bool {
        let mut current = Some(self.clone());
        while let Some(region) = current {
            if region.ptr_eq(ancestor) {
                return true;
            }
            current = region.parent();
        }
        false
    }

    /// The nearest region, from this one upward, whose mesh holds `node`.
    pub fn find_node_holder(&self, node: NodeId) -> Option<Region> {
        let mut current = Some(self.clone());
        while let Some(region) = current {
            if region
                .container()
                .is_some_and(|mesh| mesh.nodes().contains(&node))
            {
                return Some(region);
            }
            current = region.parent();
        }
        None
    }

    /// Number of regions in this subtree, including this one.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(Region::subtree_len)
            .sum::<usize>()
    }

    // ── structure ──────────────────────────────────────────────

    /// Create a child region sharing this tree's managers.
    pub fn create_child(&self, name: &str) -> Result<Region, RegionError> {
        path::validate_name(name)?;
        if self.find_child(name).is_some() {
            return Err(RegionError::DuplicateName { name: name.into() });
        }
        let child = Self::unchecked_root(name, &self.node.managers);
        self.link(&child);
        Ok(child)
    }

    /// Re-parent a detached root under this region.
    pub fn append_child(&self, child: &Region) -> Result<(), RegionError> {
        if !child.is_root() {
            return Err(RegionError::NotDetached {
                region: child.path(),
            });
        }
        if self.root().ptr_eq(child) {
            return Err(RegionError::WouldCycle {
                region: child.name(),
            });
        }
        if !child.managers().same_as(self.managers()) {
            return Err(RegionError::ForeignContainer {
                region: self.path(),
            });
        }
        let name = child.name();
        if self.find_child(&name).is_some() {
            return Err(RegionError::DuplicateName { name });
        }
        self.link(child);
        Ok(())
    }

    fn link(&self, child: &Region) {
        *child.node.parent.borrow_mut() = Rc::downgrade(&self.node);
        self.node.children.borrow_mut().push(child.clone());
        let name = child.name();
        tracing::debug!(parent = %self.path(), child = %name, "region attached");
        self.notify(RegionChange::ChildAdded { name });
    }

    /// Cut this region from its parent; it becomes the root of its own
    /// tree. Returns `Ok(false)` if it already was a root.
    ///
    /// Fails with [`RegionError::NodesInUse`] while an element in this
    /// subtree resolves a node through a mesh above it.
    pub fn detach(&self) -> Result<bool, RegionError> {
        let Some(parent) = self.parent() else {
            return Ok(false);
        };
        let links: Vec<OuterLink> = self
            .outer_links()
            .into_iter()
            .filter(|link| !link.holder.is_within(self))
            .collect();
        if !links.is_empty() {
            return Err(self.nodes_in_use(links));
        }
        parent
            .node
            .children
            .borrow_mut()
            .retain(|child| !child.ptr_eq(self));
        *self.node.parent.borrow_mut() = Weak::new();
        let name = self.name();
        tracing::debug!(parent = %parent.path(), child = %name, "region detached");
        parent.notify(RegionChange::ChildRemoved { name });
        Ok(true)
    }

    /// Element links in this subtree that resolve through the mesh of an
    /// enclosing region rather than their own.
    fn outer_links(&self) -> Vec<OuterLink> {
        let mut links = Vec::new();
        let mut stack = vec![self.clone()];
        while let Some(region) = stack.pop() {
            if let Some(mesh) = region.container() {
                let enclosing = region.parent();
                for handle in mesh.elements().handles() {
                    let element = handle.payload();
                    for &node in &element.nodes {
                        if mesh.nodes().contains(&node) {
                            continue;
                        }
                        let holder = enclosing
                            .as_ref()
                            .and_then(|parent| parent.find_node_holder(node));
                        if let Some(holder) = holder {
                            links.push(OuterLink {
                                region: region.clone(),
                                element: handle.identifier(),
                                node,
                                holder,
                            });
                        }
                    }
                }
            }
            stack.extend(region.children());
        }
        links
    }

    fn nodes_in_use(&self, links: Vec<OuterLink>) -> RegionError {
        tracing::debug!(region = %self.path(), links = links.len(), "nodes still referenced");
        RegionError::NodesInUse {
            region: self.path(),
            links: links
                .into_iter()
                .map(|link| (link.region.path(), link.element, link.node))
                .collect(),
        }
    }

    // ── domain container ───────────────────────────────────────

    /// Attach a mesh. The mesh must be built from this tree's managers
    /// and not be attached elsewhere. From here on its elements may name
    /// nodes held by the meshes of enclosing regions.
    pub fn attach_domain_container(&self, mesh: Mesh) -> Result<(), RegionError> {
        if !mesh.uses_definitions(self.managers()) {
            return Err(RegionError::ForeignContainer {
                region: self.path(),
            });
        }
        {
            let mut container = self.node.container.borrow_mut();
            if container.is_some() || mesh.has_scope() {
                return Err(RegionError::AlreadyAttached {
                    region: self.path(),
                });
            }
            let scope: Rc<dyn NodeScope> = Rc::new(EnclosingMeshes {
                region: Rc::downgrade(&self.node),
            });
            mesh.set_scope(Some(scope));
            *container = Some(mesh);
        }
        self.notify(RegionChange::ContainerAttached);
        Ok(())
    }

    /// A view of the attached mesh.
    pub fn container(&self) -> Option<Mesh> {
        self.node.container.borrow().clone()
    }

    /// Whether a mesh is attached.
    pub fn has_container(&self) -> bool {
        self.node.container.borrow().is_some()
    }

    /// Detach and return the mesh.
    ///
    /// Fails with [`RegionError::NodesInUse`] while an element below
    /// resolves a node through it.
    pub fn take_container(&self) -> Result<Option<Mesh>, RegionError> {
        let links: Vec<OuterLink> = self
            .outer_links()
            .into_iter()
            .filter(|link| link.holder.ptr_eq(self))
            .collect();
        if !links.is_empty() {
            return Err(self.nodes_in_use(links));
        }
        let Some(mesh) = self.node.container.borrow_mut().take() else {
            return Ok(None);
        };
        mesh.set_scope(None);
        self.notify(RegionChange::ContainerDetached);
        Ok(Some(mesh))
    }

    // ── notification ───────────────────────────────────────────

    /// Register a callback for structural changes to this region.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&RegionChange) + 'static,
    {
        self.node.channel.subscribe(callback)
    }

    /// Remove a callback. Returns `false` if the token was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.node.channel.unsubscribe(id)
    }

    fn notify(&self, change: RegionChange) {
        self.node.channel.deliver(&change);
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("path", &self.path())
            .field("children", &self.child_count())
            .field("container", &self.node.container.borrow())
            .finish()
    }
}
