use serde::{Deserialize, Serialize};

use crate::{dma::DmaMode, error::MiaError, layout::FACTORY_MEMORY_SIZE};

/// Host-side device configuration, e.g.
///
/// ```json
/// { "memory_size": 524288, "dma": "deferred" }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiaConfig {
    pub memory_size: usize,
    pub dma: DmaMode,
}

impl Default for MiaConfig {
    fn default() -> Self {
        Self {
            memory_size: FACTORY_MEMORY_SIZE,
            dma: DmaMode::Immediate,
        }
    }
}

impl MiaConfig {
    pub fn from_json(json: &str) -> Result<Self, MiaError> {
        Ok(serde_json::from_str(json)?)
    }
}
