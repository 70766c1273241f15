//! Recording presenters and loaders for tests

use std::sync::Arc;

use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::navigation::{
    loader_from_fn, FrameRef, FrameSetPresenter, LoadingPlaceholder, PageId, PageLoader,
    PagePresenter, PageRef, Place, PlaceholderRef, RegionId, Scheduler,
};

/// Shared, ordered log of what presenters and loaders were asked to do
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.lock().iter().any(|e| e == entry)
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Let spawned navigation tasks run until they block
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

pub enum Permission {
    Allow,
    Deny,
    /// Answer with whatever the test sends; deny if the sender is dropped
    Gated(Mutex<Option<oneshot::Receiver<bool>>>),
}

impl Permission {
    pub fn gated(decision: oneshot::Receiver<bool>) -> Self {
        Permission::Gated(Mutex::new(Some(decision)))
    }
}

pub struct TestPage {
    id: PageId,
    journal: Journal,
    permission: Permission,
    reusable: bool,
}

impl TestPage {
    pub fn new(id: &str, journal: &Journal) -> Self {
        Self::with_permission(id, journal, Permission::Allow)
    }

    pub fn with_permission(id: &str, journal: &Journal, permission: Permission) -> Self {
        Self {
            id: PageId::new(id),
            journal: journal.clone(),
            permission,
            reusable: false,
        }
    }

    /// Accept in-place navigation instead of asking to be reloaded
    pub fn reusable(mut self) -> Self {
        self.reusable = true;
        self
    }
}

#[async_trait]
impl PagePresenter for TestPage {
    fn page_id(&self) -> PageId {
        self.id.clone()
    }

    async fn request_to_navigate_away(&self, _place: &Place) -> bool {
        self.journal.record(format!("permission:{}", self.id));
        match &self.permission {
            Permission::Allow => true,
            Permission::Deny => false,
            Permission::Gated(decision) => {
                let decision = decision.lock().take();
                match decision {
                    Some(decision) => decision.await.unwrap_or(false),
                    None => true,
                }
            }
        }
    }

    fn navigate(&self, _place: &Place) -> bool {
        self.journal.record(format!("navigate:{}", self.id));
        self.reusable
    }

    fn shutdown(&self) {
        self.journal.record(format!("shutdown:{}", self.id));
    }
}

/// Frame that keeps its child pages in a map
pub struct TestFrame {
    id: PageId,
    journal: Journal,
    slots: Mutex<AHashMap<RegionId, PageRef>>,
}

impl TestFrame {
    pub fn new(id: &str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            id: PageId::new(id),
            journal: journal.clone(),
            slots: Mutex::new(AHashMap::new()),
        })
    }

    pub fn page_in(&self, region: &str) -> Option<PageId> {
        self.slots
            .lock()
            .get(&RegionId::new(region))
            .map(|page| page.page_id())
    }
}

#[async_trait]
impl PagePresenter for TestFrame {
    fn page_id(&self) -> PageId {
        self.id.clone()
    }

    fn navigate(&self, _place: &Place) -> bool {
        self.journal.record(format!("navigate:{}", self.id));
        true
    }

    fn shutdown(&self) {
        self.journal.record(format!("shutdown:{}", self.id));
    }

    fn into_frame(self: Arc<Self>) -> Option<FrameRef> {
        Some(self)
    }
}

impl FrameSetPresenter for TestFrame {
    fn active_page(&self, region: &RegionId) -> Option<PageRef> {
        self.slots.lock().get(region).cloned()
    }

    fn set_active_page(&self, region: &RegionId, page: PageRef) {
        self.journal
            .record(format!("install:{}:{}", region, page.page_id()));
        self.slots.lock().insert(region.clone(), page);
    }

    fn show_loading_placeholder(
        &self,
        region: &RegionId,
        page_id: &PageId,
        _place: &Place,
    ) -> PlaceholderRef {
        self.journal
            .record(format!("placeholder:{}:{}", region, page_id));
        Arc::new(TestPlaceholder {
            page_id: page_id.clone(),
            journal: self.journal.clone(),
        })
    }
}

struct TestPlaceholder {
    page_id: PageId,
    journal: Journal,
}

impl LoadingPlaceholder for TestPlaceholder {
    fn on_connection_problem(&self) {
        self.journal
            .record(format!("connection-problem:{}", self.page_id));
    }
}

/// Loader creating a fresh leaf page for every request
pub fn page_loader(journal: &Journal) -> Arc<dyn PageLoader> {
    let journal = journal.clone();
    Arc::new(loader_from_fn(move |page_id: &PageId, _place: &Place| {
        journal.record(format!("load:{}", page_id));
        let page: PageRef = Arc::new(TestPage::new(page_id.as_str(), &journal));
        Ok(page)
    }))
}

/// Loader creating a fresh, empty frame for every request
pub fn frame_loader(journal: &Journal) -> Arc<dyn PageLoader> {
    let journal = journal.clone();
    Arc::new(loader_from_fn(move |page_id: &PageId, _place: &Place| {
        journal.record(format!("load:{}", page_id));
        let frame: PageRef = TestFrame::new(page_id.as_str(), &journal);
        Ok(frame)
    }))
}

/// Loader that always fails as if the server could not be reached
pub fn failing_loader(journal: &Journal) -> Arc<dyn PageLoader> {
    let journal = journal.clone();
    Arc::new(loader_from_fn(move |page_id: &PageId, _place: &Place| {
        journal.record(format!("load:{}", page_id));
        Err(anyhow::anyhow!("connection refused while loading {}", page_id))
    }))
}

/// Loader that does not answer until the test opens its gate
pub struct GatedLoader {
    journal: Journal,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    fails: bool,
}

impl GatedLoader {
    pub fn new(journal: &Journal, gate: oneshot::Receiver<()>) -> Arc<dyn PageLoader> {
        Arc::new(Self {
            journal: journal.clone(),
            gate: Mutex::new(Some(gate)),
            fails: false,
        })
    }

    /// Fails once the gate opens
    pub fn failing(journal: &Journal, gate: oneshot::Receiver<()>) -> Arc<dyn PageLoader> {
        Arc::new(Self {
            journal: journal.clone(),
            gate: Mutex::new(Some(gate)),
            fails: true,
        })
    }
}

#[async_trait]
impl PageLoader for GatedLoader {
    async fn load(&self, page_id: &PageId, _place: &Place) -> anyhow::Result<PageRef> {
        self.journal.record(format!("load:{}", page_id));
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.await?;
        }
        if self.fails {
            anyhow::bail!("connection lost while loading {}", page_id);
        }
        Ok(Arc::new(TestPage::new(page_id.as_str(), &self.journal)))
    }
}

/// Holds back the first deferred load until the test opens the gate;
/// later loads pass straight through
pub struct GatedScheduler {
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl GatedScheduler {
    pub fn new(gate: oneshot::Receiver<()>) -> Arc<dyn Scheduler> {
        Arc::new(Self {
            gate: Mutex::new(Some(gate)),
        })
    }
}

#[async_trait]
impl Scheduler for GatedScheduler {
    async fn after_pending_events(&self) {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }
}
