//! Places, presenters and the coordinator moving between places

use std::fmt;

use serde::{Deserialize, Serialize};

mod engine;
mod loader;
mod page;
mod place;
mod scheduler;

pub use engine::{NavigationHandle, PageManager};
pub use loader::{loader_from_fn, FnPageLoader, PageLoader};
pub use page::{FrameRef, FrameSetPresenter, LoadingPlaceholder, PagePresenter, PageRef, PlaceholderRef};
pub use place::{PageId, Place, RegionId, ViewPathNode};
pub use scheduler::{EventLoopScheduler, ImmediateScheduler, Scheduler};

/// Identifies one navigation attempt. Later attempts get larger ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NavigationId(u64);

impl NavigationId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NavigationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Progress of a single navigation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationState {
    Start,
    ConfirmingPageChange,
    /// Waiting for the displayed page to allow leaving it
    AskingPermission,
    /// Walking down frames whose page does not need to change
    Descending,
    ShowingPlaceholder,
    LoadingPage,
    /// Every level of the place is displayed
    Active,
    /// Superseded by a newer navigation
    Cancelled,
    /// The displayed page did not let the user leave
    Refused,
    /// A page failed to load, or the hierarchy did not match the place
    Failed,
}

impl NavigationState {
    /// Terminal states never change again
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            NavigationState::Active
                | NavigationState::Cancelled
                | NavigationState::Refused
                | NavigationState::Failed
        )
    }
}
