//! Page manager implementation

use std::slice;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use super::{
    FrameRef, NavigationId, NavigationState, PageId, PageLoader, PageRef, Place, Scheduler,
    ViewPathNode,
};
use crate::error::NavigationError;
use crate::events::{handler_for, EventBus, NavigationAgreed, NavigationRequested};
use crate::settings::NavigationSettings;

/// Moves the page hierarchy under the root frame to the places requested
/// on the event bus.
///
/// At most one navigation is active at a time. A navigation may suspend
/// while the displayed page decides whether it can be left, before a page
/// loader is invoked, and while the loader runs. Every time it resumes it
/// checks that no newer navigation has been requested in the meantime;
/// superseded navigations stop without touching the hierarchy.
///
/// Navigations run as tasks on the runtime handed to [`PageManager::new`],
/// which must be a current-thread runtime: the check that a navigation is
/// still active and the change it then makes must not interleave with
/// another navigation.
pub struct PageManager {
    inner: Arc<Inner>,
}

struct Inner {
    bus: Arc<EventBus>,
    root: FrameRef,
    loaders: RwLock<AHashMap<PageId, Arc<dyn PageLoader>>>,
    active: Mutex<Option<Arc<Navigation>>>,
    scheduler: Arc<dyn Scheduler>,
    runtime: Handle,
    next_id: AtomicU64,
}

/// One attempt to reach a place
struct Navigation {
    id: NavigationId,
    place: Place,
    state: watch::Sender<NavigationState>,
}

/// Outcome of walking the hierarchy before anything is changed
enum Confirmation {
    Proceed,
    AskPermission(PageRef),
}

/// Position of a navigation in the frame hierarchy
struct Cursor<'p> {
    remaining: slice::Iter<'p, ViewPathNode>,
    frame: FrameRef,
    target: &'p ViewPathNode,
    current: Option<PageRef>,
}

impl<'p> Cursor<'p> {
    fn start(root: &FrameRef, place: &'p Place) -> Result<Self, NavigationError> {
        let mut remaining = place.view_path().iter();
        let target = remaining
            .next()
            .ok_or_else(|| NavigationError::EmptyViewPath(place.to_string()))?;

        Ok(Self {
            remaining,
            frame: root.clone(),
            target,
            current: root.active_page(&target.region),
        })
    }

    /// Moves into the region named by the next node of `page`, the page now
    /// shown for the target.
    ///
    /// Returns `false` when the target is already the innermost node.
    fn descend(&mut self, page: PageRef) -> Result<bool, NavigationError> {
        let Some(child) = self.remaining.next() else {
            return Ok(false);
        };
        let frame = page
            .clone()
            .into_frame()
            .ok_or_else(|| NavigationError::NotAFrame {
                page: page.page_id(),
                child: child.page_id.clone(),
            })?;

        self.current = frame.active_page(&child.region);
        self.frame = frame;
        self.target = child;
        Ok(true)
    }
}

impl Navigation {
    fn new(id: NavigationId, place: Place) -> Self {
        let (state, _) = watch::channel(NavigationState::Start);
        Self { id, place, state }
    }

    fn state(&self) -> NavigationState {
        *self.state.borrow()
    }

    /// Terminal states are sticky: once reached, later transitions are ignored
    fn transition(&self, next: NavigationState) -> bool {
        let changed = self.state.send_if_modified(|state| {
            if state.is_terminal() || *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
        if changed {
            trace!(navigation = %self.id, state = ?next, "navigation state changed");
        }
        changed
    }
}

/// Handle on a navigation started by [`PageManager::request_navigation`]
pub struct NavigationHandle {
    id: NavigationId,
    place: Place,
    state: watch::Receiver<NavigationState>,
    task: JoinHandle<()>,
}

impl NavigationHandle {
    pub fn id(&self) -> NavigationId {
        self.id
    }

    pub fn place(&self) -> &Place {
        &self.place
    }

    /// Current state of the navigation
    pub fn state(&self) -> NavigationState {
        *self.state.borrow()
    }

    /// Wait until the state satisfies `predicate`.
    ///
    /// Returns the final state instead if the navigation ends without ever
    /// satisfying it.
    pub async fn wait_for_state<F>(&mut self, mut predicate: F) -> NavigationState
    where
        F: FnMut(&NavigationState) -> bool,
    {
        let reached = self
            .state
            .wait_for(|state| predicate(state) || state.is_terminal())
            .await
            .map(|state| *state);
        reached.unwrap_or_else(|_| *self.state.borrow())
    }

    /// Wait until the navigation task has finished and return its final state.
    ///
    /// A navigation left waiting for a permission or a loader that never
    /// answers never finishes.
    pub async fn join(self) -> NavigationState {
        if let Err(err) = self.task.await {
            warn!(navigation = %self.id, error = %err, "navigation task did not complete");
        }
        *self.state.borrow()
    }
}

impl PageManager {
    /// Create a page manager and connect it to the event bus.
    ///
    /// Fails if `runtime` is not a current-thread runtime.
    pub fn new(
        bus: Arc<EventBus>,
        root: FrameRef,
        settings: &NavigationSettings,
        runtime: Handle,
    ) -> Result<Self, NavigationError> {
        Self::with_scheduler(bus, root, settings.scheduler(), runtime)
    }

    /// Like [`PageManager::new`], with the scheduler used to defer page loads
    pub fn with_scheduler(
        bus: Arc<EventBus>,
        root: FrameRef,
        scheduler: Arc<dyn Scheduler>,
        runtime: Handle,
    ) -> Result<Self, NavigationError> {
        if runtime.runtime_flavor() != RuntimeFlavor::CurrentThread {
            return Err(NavigationError::MultiThreadRuntime);
        }

        let inner = Arc::new(Inner {
            bus: bus.clone(),
            root,
            loaders: RwLock::new(AHashMap::new()),
            active: Mutex::new(None),
            scheduler,
            runtime,
            next_id: AtomicU64::new(1),
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        bus.subscribe::<NavigationRequested>(handler_for(move |event: &NavigationRequested| {
            if let Some(inner) = weak.upgrade() {
                if let Err(err) = inner.request_navigation(event.place.clone()) {
                    error!(place = %event.place, error = %err, "navigation request rejected");
                }
            }
        }));
        debug!("PageManager: connected to event bus and listening");

        Ok(Self { inner })
    }

    /// Register the loader responsible for pages with `page_id`
    pub fn register_page_loader(&self, page_id: PageId, loader: Arc<dyn PageLoader>) {
        debug!(page = %page_id, "PageManager: registered page loader");
        self.inner.loaders.write().insert(page_id, loader);
    }

    /// Start navigating to `place`.
    ///
    /// Returns `Ok(None)` if `place` is already the target of the active
    /// navigation. Errors are returned before anything is changed and
    /// before any page is asked for permission.
    pub fn request_navigation(
        &self,
        place: Place,
    ) -> Result<Option<NavigationHandle>, NavigationError> {
        self.inner.request_navigation(place)
    }

    /// Target of the active navigation, if any
    pub fn active_place(&self) -> Option<Place> {
        self.inner
            .active
            .lock()
            .as_ref()
            .map(|navigation| navigation.place.clone())
    }
}

impl Inner {
    fn request_navigation(
        self: &Arc<Self>,
        place: Place,
    ) -> Result<Option<NavigationHandle>, NavigationError> {
        let already_active = self
            .active
            .lock()
            .as_ref()
            .is_some_and(|active| active.place == place);
        if already_active {
            debug!(place = %place, "PageManager: already at requested place");
            return Ok(None);
        }
        if place.view_path().is_empty() {
            return Err(NavigationError::EmptyViewPath(place.to_string()));
        }

        let id = NavigationId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let navigation = Arc::new(Navigation::new(id, place));
        let confirmation = match self.confirm_page_change(&navigation) {
            Ok(confirmation) => confirmation,
            Err(err) => {
                navigation.transition(NavigationState::Failed);
                return Err(err);
            }
        };

        let previous = self.active.lock().replace(navigation.clone());
        if let Some(previous) = previous {
            if previous.transition(NavigationState::Cancelled) {
                debug!(navigation = %previous.id, by = %id, "navigation superseded");
            }
        }
        debug!(navigation = %id, place = %navigation.place, "navigation started");

        let state = navigation.state.subscribe();
        let place = navigation.place.clone();
        let task = self.runtime.spawn(self.clone().run(navigation, confirmation));

        Ok(Some(NavigationHandle {
            id,
            place,
            state,
            task,
        }))
    }

    /// Walks down the levels whose page already matches the place until a
    /// level needs to change, without suspending.
    fn confirm_page_change(&self, navigation: &Navigation) -> Result<Confirmation, NavigationError> {
        navigation.transition(NavigationState::ConfirmingPageChange);
        let mut cursor = Cursor::start(&self.root, &navigation.place)?;
        loop {
            let Some(page) = cursor.current.clone() else {
                return Ok(Confirmation::Proceed);
            };
            if page.page_id() != cursor.target.page_id {
                return Ok(Confirmation::AskPermission(page));
            }
            if !cursor.descend(page)? {
                return Ok(Confirmation::Proceed);
            }
            navigation.transition(NavigationState::Descending);
        }
    }

    async fn run(self: Arc<Self>, navigation: Arc<Navigation>, confirmation: Confirmation) {
        if let Err(err) = self.drive(&navigation, confirmation).await {
            error!(
                navigation = %navigation.id,
                place = %navigation.place,
                error = %err,
                "navigation failed"
            );
            self.abandon(&navigation, NavigationState::Failed);
        }
    }

    async fn drive(
        &self,
        navigation: &Navigation,
        confirmation: Confirmation,
    ) -> Result<(), NavigationError> {
        if let Confirmation::AskPermission(page) = confirmation {
            navigation.transition(NavigationState::AskingPermission);
            let allowed = page.request_to_navigate_away(&navigation.place).await;
            if !allowed {
                debug!(
                    navigation = %navigation.id,
                    place = %navigation.place,
                    page = %page.page_id(),
                    "navigation refused"
                );
                self.abandon(navigation, NavigationState::Refused);
                return Ok(());
            }
        }
        if !self.resume(navigation) {
            return Ok(());
        }

        info!(navigation = %navigation.id, place = %navigation.place, "navigation agreed");
        self.bus.publish(NavigationAgreed {
            place: navigation.place.clone(),
        });
        // A subscriber may have requested another place while handling the event
        if !self.resume(navigation) {
            return Ok(());
        }

        self.change_page(navigation).await
    }

    async fn change_page(&self, navigation: &Navigation) -> Result<(), NavigationError> {
        let place = &navigation.place;
        let mut cursor = Cursor::start(&self.root, place)?;

        loop {
            let reusable = cursor
                .current
                .clone()
                .filter(|page| page.page_id() == cursor.target.page_id && page.navigate(place));
            if let Some(page) = reusable {
                if !cursor.descend(page)? {
                    break;
                }
                navigation.transition(NavigationState::Descending);
                continue;
            }

            let target = cursor.target;
            let loader = self.loader(&target.page_id)?;
            if let Some(page) = cursor.current.take() {
                page.shutdown();
            }

            navigation.transition(NavigationState::ShowingPlaceholder);
            let placeholder =
                cursor
                    .frame
                    .show_loading_placeholder(&target.region, &target.page_id, place);

            self.scheduler.after_pending_events().await;
            if !self.resume(navigation) {
                return Ok(());
            }

            navigation.transition(NavigationState::LoadingPage);
            let loaded = loader.load(&target.page_id, place).await;
            if !self.resume(navigation) {
                return Ok(());
            }

            match loaded {
                Ok(page) => {
                    debug!(navigation = %navigation.id, page = %target.page_id, "page loaded");
                    cursor.frame.set_active_page(&target.region, page.clone());
                    if !cursor.descend(page)? {
                        break;
                    }
                }
                Err(err) => {
                    placeholder.on_connection_problem();
                    error!(
                        navigation = %navigation.id,
                        page = %target.page_id,
                        error = ?err,
                        "could not load page"
                    );
                    self.abandon(navigation, NavigationState::Failed);
                    return Ok(());
                }
            }
        }

        navigation.transition(NavigationState::Active);
        info!(navigation = %navigation.id, place = %place, "navigation complete");
        Ok(())
    }

    fn loader(&self, page_id: &PageId) -> Result<Arc<dyn PageLoader>, NavigationError> {
        self.loaders
            .read()
            .get(page_id)
            .cloned()
            .ok_or_else(|| NavigationError::NoLoader(page_id.clone()))
    }

    fn is_still_active(&self, navigation: &Navigation) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|active| active.id == navigation.id)
    }

    /// Checks that `navigation` may continue after suspending. The user may
    /// have grown tired of waiting and asked for another place meanwhile.
    fn resume(&self, navigation: &Navigation) -> bool {
        if self.is_still_active(navigation) {
            return true;
        }
        navigation.transition(NavigationState::Cancelled);
        debug!(
            navigation = %navigation.id,
            state = ?navigation.state(),
            "dropping result of superseded navigation"
        );
        false
    }

    /// Ends `navigation` without reaching its place. If it is still the
    /// active one it stops being so, so the same place can be requested again.
    fn abandon(&self, navigation: &Navigation, outcome: NavigationState) {
        navigation.transition(outcome);
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|a| a.id == navigation.id) {
            *active = None;
        }
    }
}
