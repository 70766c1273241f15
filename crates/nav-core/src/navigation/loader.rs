//! Page loaders

use async_trait::async_trait;

use super::{PageId, PageRef, Place};

/// Materializes pages on demand.
///
/// A loader may need to fetch code or data before the page exists, so
/// loading is asynchronous and may fail.
#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load(&self, page_id: &PageId, place: &Place) -> anyhow::Result<PageRef>;
}

/// Loader backed by a synchronous factory closure
pub struct FnPageLoader<F> {
    factory: F,
}

#[async_trait]
impl<F> PageLoader for FnPageLoader<F>
where
    F: Fn(&PageId, &Place) -> anyhow::Result<PageRef> + Send + Sync,
{
    async fn load(&self, page_id: &PageId, place: &Place) -> anyhow::Result<PageRef> {
        (self.factory)(page_id, place)
    }
}

/// Create a page loader from a closure
pub fn loader_from_fn<F>(factory: F) -> FnPageLoader<F>
where
    F: Fn(&PageId, &Place) -> anyhow::Result<PageRef> + Send + Sync + 'static,
{
    FnPageLoader { factory }
}
