//! Persisted UI preferences
//!
//! The one piece of state that outlives the view model: the
//! sidebar-collapsed flag, stored under its fixed key in a JSON file,
//! read at startup and written on toggle.

use crate::config::MOBILE_BREAKPOINT;
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiPrefs {
    #[serde(rename = "sidebarCollapsed", default)]
    pub sidebar_collapsed: bool,
}

/// File-backed preference store. Missing or corrupt files read as
/// defaults; saving creates the parent directory.
#[derive(Clone, Debug)]
pub struct PrefsStore {
    path: PathBuf,
}

impl PrefsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> Result<PathBuf> {
        dirs::home_dir()
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, "Could not find home directory")
                    .into()
            })
            .map(|home| home.join(".lab-dashboard").join("prefs.json"))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn load(&self) -> UiPrefs {
        match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(err) => {
                debug!("No stored preferences at {}: {}", self.path.display(), err);
                UiPrefs::default()
            }
        }
    }

    pub fn save(&self, prefs: &UiPrefs) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(prefs)?)?;
        Ok(())
    }
}

/// Effective collapsed state for a given viewport: at or below the
/// mobile breakpoint the sidebar always starts collapsed, otherwise
/// the stored flag decides.
pub fn sidebar_collapsed_for(viewport_width: u32, prefs: &UiPrefs) -> bool {
    viewport_width <= MOBILE_BREAKPOINT || prefs.sidebar_collapsed
}
