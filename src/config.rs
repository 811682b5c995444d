//! Archive configuration
//!
//! Loaded from a JSON file; every field has a default so a partial file (or
//! none at all) is fine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

pub const DEFAULT_TAG_MAX: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Maximum tag name length, in characters
    pub tag_max: usize,
    /// Default log level for `logging::init_logging`
    pub log_level: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            tag_max: DEFAULT_TAG_MAX,
            log_level: "info".to_string(),
        }
    }
}

impl ArchiveConfig {
    pub fn from_json_str(json: &str) -> DomainResult<Self> {
        let config: ArchiveConfig = serde_json::from_str(json)
            .map_err(|e| DomainError::InvalidInput(format!("invalid archive config: {}", e)))?;
        if config.tag_max == 0 {
            return Err(DomainError::InvalidInput("tag_max must be greater than 0".to_string()));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> DomainResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Internal(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }
}
