//! Navigation settings

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::navigation::{EventLoopScheduler, ImmediateScheduler, Scheduler};

/// When page loaders are invoked relative to the placeholder being shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadScheduling {
    /// Let pending UI events run first so the placeholder is rendered
    #[default]
    Deferred,
    /// Invoke the loader right away (no event queue, e.g. tests)
    Immediate,
}

/// Settings for the page manager
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSettings {
    pub load_scheduling: LoadScheduling,
}

impl NavigationSettings {
    /// Build the scheduler matching these settings
    pub fn scheduler(&self) -> Arc<dyn Scheduler> {
        match self.load_scheduling {
            LoadScheduling::Deferred => Arc::new(EventLoopScheduler),
            LoadScheduling::Immediate => Arc::new(ImmediateScheduler),
        }
    }
}
