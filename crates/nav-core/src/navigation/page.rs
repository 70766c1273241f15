//! Presenter traits implemented by the host application

use std::sync::Arc;

use async_trait::async_trait;

use super::{PageId, Place, RegionId};

pub type PageRef = Arc<dyn PagePresenter>;
pub type FrameRef = Arc<dyn FrameSetPresenter>;
pub type PlaceholderRef = Arc<dyn LoadingPlaceholder>;

/// A page that can be shown in a region of a frame
#[async_trait]
pub trait PagePresenter: Send + Sync {
    /// The kind of page this is
    fn page_id(&self) -> PageId;

    /// Asks the page whether the user may leave it for `place`.
    ///
    /// Pages with unsaved changes typically ask the user before answering.
    /// The future may resolve much later, or never if the user walks away
    /// from the dialog.
    async fn request_to_navigate_away(&self, _place: &Place) -> bool {
        true
    }

    /// Tries to show `place` without being reloaded.
    ///
    /// Returns `false` if the page has to be replaced by a freshly loaded one.
    fn navigate(&self, _place: &Place) -> bool {
        false
    }

    /// Called right before the page is removed from its frame
    fn shutdown(&self) {}

    /// Returns the frame view of this page, if it hosts child pages
    fn into_frame(self: Arc<Self>) -> Option<FrameRef> {
        None
    }
}

/// A page that hosts child pages in named regions
pub trait FrameSetPresenter: PagePresenter {
    fn active_page(&self, region: &RegionId) -> Option<PageRef>;

    fn set_active_page(&self, region: &RegionId, page: PageRef);

    /// Shows a placeholder in `region` while `page_id` is being loaded
    fn show_loading_placeholder(
        &self,
        region: &RegionId,
        page_id: &PageId,
        place: &Place,
    ) -> PlaceholderRef;
}

/// Handle on a placeholder shown while a page loads
pub trait LoadingPlaceholder: Send + Sync {
    /// The page could not be loaded; let the user know and offer to retry
    fn on_connection_problem(&self);
}
