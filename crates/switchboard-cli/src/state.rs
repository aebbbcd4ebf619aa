//! State persistence for the switchboard CLI

use std::path::Path;

use switchboard_runtime::EngineSnapshot;

use crate::error::{CliError, Result};

/// Load a snapshot; a missing file yields `None`
pub fn load_from_file(path: &Path) -> Result<Option<EngineSnapshot>> {
    if !path.exists() {
        return Ok(None);
    }

    let state_str = std::fs::read_to_string(path)
        .map_err(|e| CliError::StatePersistence(format!("Failed to read state file: {}", e)))?;

    serde_json::from_str(&state_str)
        .map(Some)
        .map_err(|e| CliError::StatePersistence(format!("Failed to parse state file: {}", e)))
}

pub fn save_to_file(snapshot: &EngineSnapshot, path: &Path) -> Result<()> {
    let state_str = serde_json::to_string_pretty(snapshot)?;

    std::fs::write(path, state_str)
        .map_err(|e| CliError::StatePersistence(format!("Failed to write state file: {}", e)))
}
