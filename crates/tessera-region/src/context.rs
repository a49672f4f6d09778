//! The root context: owner of one region tree and its managers.

use indexmap::IndexMap;
use tessera_manager::{Manager, ManagerConfig};
use tessera_mesh::{BasisManager, Mesh, MeshError, ShapeManager, TreeManagers};

use crate::config::ContextConfig;
use crate::error::{ConfigError, MergeError, RegionError};
use crate::merge::{merge, MergeReport};
use crate::region::Region;

/// A named material with scalar properties in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    /// Property name to value.
    pub properties: IndexMap<String, f64>,
}

impl Material {
    /// Material with no properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style property setter.
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    /// Value of `name`, if set.
    pub fn property(&self, name: &str) -> Option<f64> {
        self.properties.get(name).copied()
    }
}

/// Owns the top-level managers and the region tree of one document.
///
/// Components receive what they need from here by parameter; there is
/// no process-wide state.
pub struct Context {
    config: ContextConfig,
    managers: TreeManagers,
    materials: Manager<String, Material>,
    root: Region,
}

impl Context {
    /// Build an empty context.
    pub fn new(config: ContextConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let managers = TreeManagers::new();
        let root = Region::unchecked_root(&config.root_name, &managers);
        tracing::debug!(root = %config.root_name, "context created");
        Ok(Self {
            config,
            managers,
            materials: Manager::with_config(ManagerConfig::labelled("materials")),
            root,
        })
    }

    /// The configuration this context was built with.
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// The root region.
    pub fn root(&self) -> &Region {
        &self.root
    }

    /// The basis and shape managers shared by the tree.
    pub fn managers(&self) -> &TreeManagers {
        &self.managers
    }

    /// Basis definitions.
    pub fn bases(&self) -> &BasisManager {
        self.managers.bases()
    }

    /// Shape definitions.
    pub fn shapes(&self) -> &ShapeManager {
        self.managers.shapes()
    }

    /// Materials, keyed by name.
    pub fn materials(&self) -> &Manager<String, Material> {
        &self.materials
    }

    /// Resolve `path` from the root.
    pub fn find_region(&self, path: &str) -> Option<Region> {
        self.root.find_subregion_by_path(path)
    }

    /// An empty mesh over this context's definitions, ready to attach.
    pub fn create_mesh(&self, dimension: usize) -> Result<Mesh, MeshError> {
        Mesh::new(dimension, &self.managers)
    }

    /// A free-standing root region over this context's definitions, for
    /// building an import.
    pub fn create_import_root(&self, name: &str) -> Result<Region, RegionError> {
        Region::new_root(name, &self.managers)
    }

    /// Merge a free-standing tree into the region at `path`, using the
    /// configured merge policy.
    pub fn import(&self, source: Region, path: &str) -> Result<MergeReport, MergeError> {
        let destination = self
            .find_region(path)
            .ok_or_else(|| RegionError::NotFound { path: path.into() })?;
        merge(&destination, source, &self.config.merge)
    }
}
