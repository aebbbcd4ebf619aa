//! Application bootstrap: builds an engine from a state file or the data files

use std::path::{Path, PathBuf};

use switchboard_core::loader;
use switchboard_runtime::Engine;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::Result;
use crate::state;

pub struct SwitchboardApp {
    pub config: AppConfig,
    pub engine: Engine,
    state_path: Option<PathBuf>,
}

impl SwitchboardApp {
    /// Restore from `state_path` if it exists, otherwise load the configured data files
    pub fn new(config: AppConfig, state_path: Option<PathBuf>) -> Result<Self> {
        let engine = Engine::new(config.engine.clone())?;
        let app = Self {
            config,
            engine,
            state_path,
        };

        let restored = match &app.state_path {
            Some(path) => state::load_from_file(path)?,
            None => None,
        };
        match restored {
            Some(snapshot) => {
                info!("Restoring state from saved snapshot");
                app.engine.restore(snapshot)?;
            }
            None => app.load_data_files()?,
        }
        Ok(app)
    }

    fn load_data_files(&self) -> Result<()> {
        let paths = &self.config.paths;
        let load = &self.config.engine.load;

        if let Some(text) = read_optional(&paths.phonebook)? {
            self.engine
                .load_contacts(loader::parse_phonebook(&text, load.phonebook_has_header))?;
        }
        if let Some(text) = read_optional(&paths.calls)? {
            self.engine
                .load_calls(loader::parse_calls(&text, load.call_limit));
        }
        if let Some(text) = read_optional(&paths.blocked)? {
            self.engine.load_blocked(loader::parse_blocked(&text));
        }
        Ok(())
    }

    /// Write the engine state back to the state file, if one was given
    pub fn persist(&self) -> Result<()> {
        if let Some(path) = &self.state_path {
            self.save_to(path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        state::save_to_file(&self.engine.snapshot(), path)?;
        info!("State saved to {}", path.display());
        Ok(())
    }
}

/// Read a data file, skipping it with a warning when it does not exist
pub(crate) fn read_optional(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        warn!("Data file {} not found, skipping", path.display());
        return Ok(None);
    }
    Ok(Some(std::fs::read_to_string(path)?))
}
