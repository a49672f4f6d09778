//! Manager configuration.

/// Construction-time settings for a [`Manager`](crate::Manager).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Name used in log records. Default: `"objects"`.
    pub label: String,
    /// Lowest index handed out by automatic identifier assignment.
    /// Default: 0. Mesh node and element managers use 1.
    pub first_identifier: u32,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            label: "objects".to_string(),
            first_identifier: 0,
        }
    }
}

impl ManagerConfig {
    /// Default configuration with the given log label.
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Replace the automatic identifier floor.
    pub fn with_first_identifier(mut self, first_identifier: u32) -> Self {
        self.first_identifier = first_identifier;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_start_at_zero() {
        let config = ManagerConfig::default();
        assert_eq!(config.first_identifier, 0);
        assert_eq!(config.label, "objects");
    }

    #[test]
    fn builder_sets_label_and_floor() {
        let config = ManagerConfig::labelled("nodes").with_first_identifier(1);
        assert_eq!(config.label, "nodes");
        assert_eq!(config.first_identifier, 1);
    }
}
