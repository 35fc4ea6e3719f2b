//! Registry configuration.

use serde::{Deserialize, Serialize};

use crate::error::EcsError;
use crate::sparse_set::DEFAULT_PAGE_SIZE;

/// Construction-time settings for a [`Registry`](crate::Registry).
///
/// The page size is the only tunable. It trades page-table granularity
/// against the cost of the first touch in a region of identifier space, and
/// has no effect on behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Number of entity identifiers covered by one sparse page in every pool.
    pub page_size: usize,
}

impl RegistryConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the sparse page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Check that the settings can build a registry.
    pub fn validate(&self) -> Result<(), EcsError> {
        if self.page_size == 0 {
            return Err(EcsError::InvalidPageSize);
        }
        Ok(())
    }

    /// Parse and validate a JSON config such as `{"page_size": 256}`.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json(text: &str) -> Result<Self, EcsError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new()
    }
}
