//! Region trees and the merge engine.
//!
//! A [`Region`] tree organises a model into named, nested parts. Each
//! region may carry one [`Mesh`](tessera_mesh::Mesh); every mesh in a
//! tree validates against the tree's shared basis and shape managers.
//! [`merge`] folds a free-standing tree, typically freshly imported,
//! into a live one. [`Context`] owns a tree and its managers.
//!
//! # Paths
//!
//! ```
//! use tessera_mesh::TreeManagers;
//! use tessera_region::Region;
//!
//! let root = Region::new_root("root", &TreeManagers::new()).unwrap();
//! let body = root.create_child("body").unwrap();
//! let skin = body.create_child("skin").unwrap();
//!
//! assert!(root.find_subregion_by_path("body/skin").unwrap().ptr_eq(&skin));
//! assert!(skin.find_subregion_by_path("../skin").unwrap().ptr_eq(&skin));
//! assert_eq!(skin.path(), "/body/skin");
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod error;
pub mod merge;
pub mod path;
pub mod region;

pub use config::{ContextConfig, MergeConfig, MergePolicy};
pub use context::{Context, Material};
pub use error::{
    ConfigError, DanglingLink, DanglingReferenceReport, MergeError, MergedKey, RegionError,
};
pub use merge::{merge, MergeReport};
pub use region::{Region, RegionChange};
