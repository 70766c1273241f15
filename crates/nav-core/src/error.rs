//! Error types for navigation

use thiserror::Error;

use crate::navigation::PageId;

/// Errors raised while starting or running a navigation.
///
/// All of these are programming errors in the surrounding application, such
/// as a malformed place or a page hierarchy that does not match the place.
/// Loader failures are not errors of this kind; they are reported through
/// the loading placeholder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("place '{0}' has an empty view path")]
    EmptyViewPath(String),

    #[error("cannot load page '{child}' into '{page}' because it is not a frame")]
    NotAFrame { page: PageId, child: PageId },

    #[error("no loader registered for page '{0}'")]
    NoLoader(PageId),

    #[error("page manager needs a current-thread runtime")]
    MultiThreadRuntime,
}

/// Errors that can occur when parsing a history token into a place
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaceParseError {
    #[error("empty view path node at position {0}")]
    EmptyNode(usize),

    #[error("view path node '{0}' is missing a ':' between region and page")]
    MissingSeparator(String),

    #[error("view path node '{0}' has an empty region or page")]
    EmptyComponent(String),

    #[error("malformed parameter '{0}'")]
    MalformedParameter(String),
}
