//! Merge and context configuration.

use crate::error::ConfigError;
use crate::path;

/// What a merge does when an element references a node present in
/// neither the source nor the destination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Check every reference before writing; on failure write nothing.
    #[default]
    Atomic,
    /// Write everything that resolves, skip elements that do not, then
    /// report both sets.
    BestEffort,
}

/// Merge engine configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeConfig {
    /// Dangling-reference handling. Default: [`MergePolicy::Atomic`].
    pub policy: MergePolicy,
    /// Merge source subregions by name. Default: `true`.
    pub include_subregions: bool,
}

impl MergeConfig {
    /// Default configuration with `policy`.
    pub fn with_policy(policy: MergePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            policy: MergePolicy::Atomic,
            include_subregions: true,
        }
    }
}

/// Configuration of a root [`Context`](crate::context::Context).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextConfig {
    /// Name of the root region. Default: `"root"`.
    pub root_name: String,
    /// Used by [`Context::import`](crate::context::Context::import).
    pub merge: MergeConfig,
}

impl ContextConfig {
    /// Check that the configuration can build a context.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if path::validate_name(&self.root_name).is_err() {
            return Err(ConfigError::InvalidRootName {
                name: self.root_name.clone(),
            });
        }
        Ok(())
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            root_name: "root".into(),
            merge: MergeConfig::default(),
        }
    }
}
