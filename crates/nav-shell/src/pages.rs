//! Console presenters and loaders for the demo page hierarchy

use std::sync::Arc;
use std::time::Duration;

use ahash::AHashMap;
use anyhow::anyhow;
use async_trait::async_trait;
use nav_core::navigation::loader_from_fn;
use nav_core::{
    FrameRef, FrameSetPresenter, LoadingPlaceholder, PageId, PageLoader, PageManager,
    PagePresenter, PageRef, Place, PlaceholderRef, RegionId,
};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crate::settings::ShellSettings;

const FRAMES: &[&str] = &["dashboard", "reports"];
const PAGES: &[&str] = &["sites", "site", "editor", "pivot", "map"];

/// Yes/no question waiting for the next line of input
#[derive(Default)]
pub struct Prompt {
    pending: Mutex<Option<oneshot::Sender<bool>>>,
}

impl Prompt {
    /// Ask `question` and wait for the answer.
    ///
    /// Asking again before an answer arrives withdraws the earlier question,
    /// which then counts as a "no".
    pub async fn ask(&self, question: &str) -> bool {
        let (tx, rx) = oneshot::channel();
        *self.pending.lock() = Some(tx);
        println!("{} [y/n]", question);
        rx.await.unwrap_or(false)
    }

    /// Feed a line of input to the pending question.
    ///
    /// Returns `false` if no question is pending or the line is not an answer.
    pub fn answer(&self, line: &str) -> bool {
        let allowed = match line {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => return false,
        };
        match self.pending.lock().take() {
            Some(tx) => {
                let _ = tx.send(allowed);
                true
            }
            None => false,
        }
    }
}

/// Frame printing the changes made to its regions
pub struct ConsoleFrame {
    id: PageId,
    regions: Mutex<AHashMap<RegionId, PageRef>>,
}

impl ConsoleFrame {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: PageId::new(id),
            regions: Mutex::new(AHashMap::new()),
        })
    }
}

#[async_trait]
impl PagePresenter for ConsoleFrame {
    fn page_id(&self) -> PageId {
        self.id.clone()
    }

    fn navigate(&self, _place: &Place) -> bool {
        true
    }

    fn shutdown(&self) {
        for (region, page) in self.regions.lock().drain() {
            debug!(frame = %self.id, region = %region, "shutting down child page");
            page.shutdown();
        }
        println!("{}: closed", self.id);
    }

    fn into_frame(self: Arc<Self>) -> Option<FrameRef> {
        Some(self)
    }
}

impl FrameSetPresenter for ConsoleFrame {
    fn active_page(&self, region: &RegionId) -> Option<PageRef> {
        self.regions.lock().get(region).cloned()
    }

    fn set_active_page(&self, region: &RegionId, page: PageRef) {
        println!("{}[{}]: showing {}", self.id, region, page.page_id());
        self.regions.lock().insert(region.clone(), page);
    }

    fn show_loading_placeholder(
        &self,
        region: &RegionId,
        page_id: &PageId,
        place: &Place,
    ) -> PlaceholderRef {
        println!("{}[{}]: loading {} for {}", self.id, region, page_id, place);
        Arc::new(ConsolePlaceholder {
            frame: self.id.clone(),
            region: region.clone(),
            page_id: page_id.clone(),
        })
    }
}

struct ConsolePlaceholder {
    frame: PageId,
    region: RegionId,
    page_id: PageId,
}

impl LoadingPlaceholder for ConsolePlaceholder {
    fn on_connection_problem(&self) {
        println!(
            "{}[{}]: could not load {}, check your connection and request the place again",
            self.frame, self.region, self.page_id
        );
    }
}

/// Content page; guarded pages ask before they can be left
pub struct ConsolePage {
    id: PageId,
    params: String,
    guard: Option<Arc<Prompt>>,
}

#[async_trait]
impl PagePresenter for ConsolePage {
    fn page_id(&self) -> PageId {
        self.id.clone()
    }

    async fn request_to_navigate_away(&self, place: &Place) -> bool {
        match &self.guard {
            Some(prompt) => {
                let question = format!("{} has unsaved changes. Leave for {}?", self.id, place);
                prompt.ask(&question).await
            }
            None => true,
        }
    }

    /// Parameters are baked into the page when it loads, so only an
    /// identical parameter set can be shown without reloading.
    fn navigate(&self, place: &Place) -> bool {
        params_of(place) == self.params
    }

    fn shutdown(&self) {
        println!("{}: closed", self.id);
    }
}

fn params_of(place: &Place) -> String {
    place
        .params()
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Waits before delegating, to make loading placeholders visible
pub struct DelayedLoader {
    delay: Duration,
    inner: Arc<dyn PageLoader>,
}

#[async_trait]
impl PageLoader for DelayedLoader {
    async fn load(&self, page_id: &PageId, place: &Place) -> anyhow::Result<PageRef> {
        tokio::time::sleep(self.delay).await;
        self.inner.load(page_id, place).await
    }
}

/// Register a loader for every page of the demo hierarchy
pub fn register_loaders(manager: &PageManager, settings: &ShellSettings, prompt: &Arc<Prompt>) {
    let delay = Duration::from_millis(settings.load_delay_ms);
    let delayed = |inner: Arc<dyn PageLoader>| -> Arc<dyn PageLoader> {
        if delay.is_zero() {
            inner
        } else {
            Arc::new(DelayedLoader { delay, inner })
        }
    };

    let frames: Arc<dyn PageLoader> = Arc::new(loader_from_fn(|page_id: &PageId, _place: &Place| {
        let frame: PageRef = ConsoleFrame::new(page_id.as_str());
        Ok(frame)
    }));
    let frames = delayed(frames);
    for id in FRAMES {
        manager.register_page_loader(PageId::new(id), frames.clone());
    }

    let guarded = settings.guarded_pages.clone();
    let prompt = prompt.clone();
    let pages: Arc<dyn PageLoader> = Arc::new(loader_from_fn(move |page_id: &PageId, place: &Place| {
        let guard = guarded
            .iter()
            .any(|p| p == page_id.as_str())
            .then(|| prompt.clone());
        let page: PageRef = Arc::new(ConsolePage {
            id: page_id.clone(),
            params: params_of(place),
            guard,
        });
        Ok(page)
    }));
    let pages = delayed(pages);
    for id in PAGES {
        manager.register_page_loader(PageId::new(id), pages.clone());
    }

    let offline: Arc<dyn PageLoader> = Arc::new(loader_from_fn(|page_id: &PageId, _place: &Place| {
        Err(anyhow!("server unreachable while loading {}", page_id))
    }));
    manager.register_page_loader(PageId::new("offline"), delayed(offline));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prompt_answer_resolves_question() {
        let prompt = Arc::new(Prompt::default());
        let asking = prompt.clone();
        let question = tokio::spawn(async move { asking.ask("leave?").await });
        tokio::task::yield_now().await;

        assert!(!prompt.answer("maybe"));
        assert!(prompt.answer("y"));
        assert!(question.await.unwrap());
        assert!(!prompt.answer("n"));
    }

    #[tokio::test]
    async fn test_new_question_withdraws_old_one() {
        let prompt = Arc::new(Prompt::default());
        let first = prompt.clone();
        let first = tokio::spawn(async move { first.ask("leave for a?").await });
        tokio::task::yield_now().await;
        let second = prompt.clone();
        let second = tokio::spawn(async move { second.ask("leave for b?").await });
        tokio::task::yield_now().await;

        assert!(prompt.answer("yes"));
        assert!(!first.await.unwrap());
        assert!(second.await.unwrap());
    }

    #[test]
    fn test_page_reuse_depends_on_params() {
        let page = ConsolePage {
            id: PageId::new("sites"),
            params: "db=1".to_string(),
            guard: None,
        };

        assert!(page.navigate(&"main:sites?db=1".parse().unwrap()));
        assert!(!page.navigate(&"main:sites?db=2".parse().unwrap()));
    }
}
