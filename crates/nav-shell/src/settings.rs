//! Shell settings, read from an optional JSON file

use std::path::Path;

use anyhow::{Context, Result};
use nav_core::NavigationSettings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSettings {
    /// Page manager settings
    pub navigation: NavigationSettings,

    /// History token shown at startup
    pub start_place: String,

    /// Pages that ask before letting the user leave them
    pub guarded_pages: Vec<String>,

    /// Simulated network latency of every page loader
    pub load_delay_ms: u64,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            navigation: NavigationSettings::default(),
            start_place: "main:dashboard/content:sites".to_string(),
            guarded_pages: vec!["editor".to_string()],
            load_delay_ms: 300,
        }
    }
}

impl ShellSettings {
    /// Load settings from `path`, or use the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Invalid settings in {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn is_guarded(&self, page_id: &str) -> bool {
        self.guarded_pages.iter().any(|p| p == page_id)
    }
}
