use serde::{Deserialize, Serialize};

use crate::error::{EcsError, Result};
use crate::sparse_set::DEFAULT_PAGE_SIZE;

/// Storage tuning for a [`World`](crate::World).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcsConfig {
    /// Page length of every sparse set the world creates. Must be non-zero.
    pub sparse_page_size: usize,
    /// Slots reserved when a component pool is first registered.
    pub pool_capacity: usize,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            sparse_page_size: DEFAULT_PAGE_SIZE,
            pool_capacity: 0,
        }
    }
}

impl EcsConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sparse_page_size == 0 {
            return Err(EcsError::InvalidConfig(
                "sparse_page_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
