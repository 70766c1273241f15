//! Core functionality for page navigation
//!
//! This crate provides the place model, the presenter abstractions and the
//! coordinator that moves a frame hierarchy from one place to another.

pub mod error;
pub mod events;
pub mod navigation;
pub mod settings;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use error::{NavigationError, PlaceParseError};
pub use events::{EventBus, NavigationAgreed, NavigationRequested};
pub use navigation::{
    FrameRef, FrameSetPresenter, LoadingPlaceholder, NavigationHandle, NavigationId,
    NavigationState, PageId, PageLoader, PageManager, PagePresenter, PageRef, Place,
    PlaceholderRef, RegionId, ViewPathNode,
};
pub use settings::{LoadScheduling, NavigationSettings};
