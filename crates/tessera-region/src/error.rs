//! Error types for region trees, merge and configuration.

use std::error::Error;
use std::fmt;

use tessera_core::{ElementId, MeshObjectKey, NodeId};
use tessera_mesh::MeshError;

use crate::config::MergePolicy;

// ── RegionError ────────────────────────────────────────────────────

/// Errors from region tree edits and lookups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegionError {
    /// A sibling already carries this name.
    DuplicateName {
        /// The contested name.
        name: String,
    },
    /// The name is empty, contains `/`, or is `.` or `..`.
    InvalidName {
        /// The rejected name.
        name: String,
    },
    /// The region already carries a domain container, or the mesh is
    /// attached to another region.
    AlreadyAttached {
        /// Path of the region.
        region: String,
    },
    /// The container or subtree was built from another tree's
    /// basis and shape managers.
    ForeignContainer {
        /// Path of the region that refused it.
        region: String,
    },
    /// Only a detached root can be appended as a child.
    NotDetached {
        /// Path of the region that still has a parent.
        region: String,
    },
    /// Appending would make a region its own ancestor.
    WouldCycle {
        /// Name of the region being appended.
        region: String,
    },
    /// No region resolves at this path.
    NotFound {
        /// The unresolved path.
        path: String,
    },
    /// Elements would lose nodes they resolve through an enclosing
    /// region's mesh.
    NodesInUse {
        /// Path of the region that refused the edit.
        region: String,
        /// Each dependent link as (region path, element, node).
        links: Vec<(String, ElementId, NodeId)>,
    },
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName { name } => write!(f, "a sibling region is already named '{name}'"),
            Self::InvalidName { name } => write!(f, "invalid region name '{name}'"),
            Self::AlreadyAttached { region } => {
                write!(f, "cannot attach at region {region}: a container is already attached")
            }
            Self::ForeignContainer { region } => write!(
                f,
                "region {region} cannot take content built from another tree's definitions"
            ),
            Self::NotDetached { region } => write!(f, "region {region} still has a parent"),
            Self::WouldCycle { region } => {
                write!(f, "appending '{region}' would make it its own ancestor")
            }
            Self::NotFound { path } => write!(f, "no region at '{path}'"),
            Self::NodesInUse { region, links } => write!(
                f,
                "{} element link(s) still resolve nodes through region {region}",
                links.len()
            ),
        }
    }
}

impl Error for RegionError {}

// ── MergeError ─────────────────────────────────────────────────────

/// An element-to-node link that resolves in neither merge side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DanglingLink {
    /// Region path relative to the merge root (`.` for the root itself).
    pub region: String,
    /// The referencing element.
    pub element: ElementId,
    /// The missing node.
    pub node: NodeId,
}

/// One reconciled (or skipped) object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergedKey {
    /// Region path relative to the merge root (`.` for the root itself).
    pub region: String,
    /// The object.
    pub key: MeshObjectKey,
}

/// What a merge with dangling references did to the destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DanglingReferenceReport {
    /// The policy the merge ran under.
    pub policy: MergePolicy,
    /// Every unresolved link.
    pub dangling: Vec<DanglingLink>,
    /// Objects written to the destination, in application order.
    pub applied: Vec<MergedKey>,
    /// Source objects not written.
    pub not_applied: Vec<MergedKey>,
    /// Whether the destination was left exactly as it was.
    pub rolled_back: bool,
}

/// Errors from [`merge`](crate::merge::merge).
#[derive(Clone, Debug, PartialEq)]
pub enum MergeError {
    /// The source still has a parent; only free-standing trees merge.
    SourceAttached {
        /// Path of the source region.
        source: String,
    },
    /// Source and destination belong to the same tree.
    SameTree,
    /// The trees cannot be reconciled. Nothing was written.
    IncompatibleRegions {
        /// Region path relative to the merge root.
        region: String,
        /// What did not match.
        reason: String,
    },
    /// Some element references did not resolve. See the report for what
    /// was written.
    DanglingReference(Box<DanglingReferenceReport>),
    /// Creating a destination region failed.
    Region(RegionError),
    /// Writing an object failed.
    Mesh {
        /// Region path relative to the merge root.
        region: String,
        /// The underlying failure.
        error: MeshError,
    },
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceAttached { source } => {
                write!(f, "merge source {source} is attached to a tree")
            }
            Self::SameTree => write!(f, "merge source and destination share a tree"),
            Self::IncompatibleRegions { region, reason } => {
                write!(f, "region {region} is incompatible: {reason}")
            }
            Self::DanglingReference(report) => write!(
                f,
                "{} dangling node reference(s); {} object(s) applied, {} not applied{}",
                report.dangling.len(),
                report.applied.len(),
                report.not_applied.len(),
                if report.rolled_back { ", destination unchanged" } else { "" }
            ),
            Self::Region(e) => write!(f, "region: {e}"),
            Self::Mesh { region, error } => write!(f, "region {region}: {error}"),
        }
    }
}

impl Error for MergeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Region(e) => Some(e),
            Self::Mesh { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<RegionError> for MergeError {
    fn from(e: RegionError) -> Self {
        Self::Region(e)
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`ContextConfig::validate()`](crate::config::ContextConfig::validate).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The root region name is not a valid region name.
    InvalidRootName {
        /// The rejected name.
        name: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRootName { name } => write!(f, "invalid root region name '{name}'"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dangling_display_summarises_report() {
        let err = MergeError::DanglingReference(Box::new(DanglingReferenceReport {
            policy: MergePolicy::Atomic,
            dangling: vec![DanglingLink {
                region: ".".into(),
                element: ElementId(1),
                node: NodeId(9),
            }],
            applied: Vec::new(),
            not_applied: vec![MergedKey {
                region: ".".into(),
                key: MeshObjectKey::Element(ElementId(1)),
            }],
            rolled_back: true,
        }));
        assert_eq!(
            err.to_string(),
            "1 dangling node reference(s); 0 object(s) applied, 1 not applied, destination unchanged"
        );
    }

    #[test]
    fn mesh_failure_chains_source() {
        let err = MergeError::Mesh {
            region: "body".into(),
            error: MeshError::InvalidDimension { dimension: 7 },
        };
        assert!(err.source().is_some());
        assert!(MergeError::SameTree.source().is_none());
    }
}
