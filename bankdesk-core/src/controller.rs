//! Paginated list controller
//!
//! Owns the query and the visible page of one list view and keeps them
//! consistent across navigation, search/filter input, and row mutations.
//!
//! - Typed input (`set_search_term`, `set_filter`, `set_status_filter`,
//!   `set_page_size`) updates the query at once and schedules a single
//!   refetch after the quiet period.
//! - `go_to_page` fetches immediately.
//! - Every request carries a sequence number; only the answer to the most
//!   recently issued request is applied, and nothing is applied after
//!   `teardown`.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::debounce::{DebounceState, Debouncer};
use crate::error::{ControlError, FetchError};
use crate::pagination::{ItemRange, ListResponse, ListResult};
use crate::query::{ListQuery, ListSettings};
use crate::session::SessionContext;
use crate::source::{ListSource, MutationKind};

/// Clamp-and-refetch attempts per `refetch` call.
const MAX_CLAMP_RETRIES: usize = 1;

/// Fetch status of the list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(FetchError),
}

impl ListStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, ListStatus::Loading)
    }
}

/// Everything a view renders. Only the controller mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState<T> {
    query: ListQuery,
    result: Option<ListResult<T>>,
    status: ListStatus,
}

impl<T> ControllerState<T> {
    /// Idle state with no result, as before the first load.
    pub fn new(query: ListQuery) -> Self {
        Self {
            query,
            result: None,
            status: ListStatus::Idle,
        }
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// `None` before the first successful fetch and after a rejected session.
    pub fn result(&self) -> Option<&ListResult<T>> {
        self.result.as_ref()
    }

    pub fn status(&self) -> &ListStatus {
        &self.status
    }

    /// Present only while the status is `Failed`.
    pub fn last_error(&self) -> Option<&FetchError> {
        match &self.status {
            ListStatus::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn items(&self) -> &[T] {
        self.result.as_ref().map_or(&[], |r| r.items.as_slice())
    }

    /// Page count used to validate navigation. 1 until something loads.
    pub fn total_pages(&self) -> u32 {
        self.result.as_ref().map_or(1, |r| r.total_pages)
    }

    pub fn item_range(&self) -> Option<ItemRange> {
        let result = self.result.as_ref()?;
        ItemRange::new(result.page, self.query.page_size, result.total)
    }
}

/// Notices a view must act on, beyond re-rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// The session was invalidated; leave for the sign-in entry point.
    SessionExpired,
    /// The signed-in user lacks permission for the list.
    Forbidden(String),
}

enum Applied {
    /// Requested page was past the end; query moved to the last page.
    Clamped,
    Done(FetchOutcome),
}

/// What became of one `refetch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Loaded,
    Failed(FetchError),
    /// A later request was issued before this one resolved.
    Superseded,
    /// The view was torn down.
    Detached,
}

struct Shared<S: ListSource> {
    source: S,
    session: Arc<dyn SessionContext>,
    settings: ListSettings,
    state: Mutex<ControllerState<S::Item>>,
    seq: AtomicU64,
    alive: AtomicBool,
    debounce: Debouncer,
    version: watch::Sender<u64>,
    events: broadcast::Sender<ControllerEvent>,
}

/// Handle to a list view's controller. Clones share the same state.
pub struct ListController<S: ListSource> {
    shared: Arc<Shared<S>>,
}

impl<S: ListSource> Clone for ListController<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: ListSource> ListController<S> {
    pub fn new(source: S, session: Arc<dyn SessionContext>, settings: ListSettings) -> Self {
        let (version, _) = watch::channel(0);
        let (events, _) = broadcast::channel(16);
        let state = ControllerState::new(settings.initial_query());
        let debounce = Debouncer::new(settings.quiet_period);

        Self {
            shared: Arc::new(Shared {
                source,
                session,
                settings,
                state: Mutex::new(state),
                seq: AtomicU64::new(0),
                alive: AtomicBool::new(true),
                debounce,
                version,
                events,
            }),
        }
    }

    fn from_shared(shared: Arc<Shared<S>>) -> Self {
        Self { shared }
    }

    fn state(&self) -> MutexGuard<'_, ControllerState<S::Item>> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.shared.version.send_modify(|v| *v += 1);
    }

    fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::SeqCst)
    }

    pub fn settings(&self) -> &ListSettings {
        &self.shared.settings
    }

    /// Copy of the current state for rendering.
    pub fn snapshot(&self) -> ControllerState<S::Item> {
        self.state().clone()
    }

    /// Receiver whose value bumps after every state change.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.shared.version.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.shared.events.subscribe()
    }

    /// Whether a debounced refetch is waiting for its quiet period.
    pub fn refresh_pending(&self) -> bool {
        self.shared.debounce.state() == DebounceState::Pending
    }

    /// Reset the query to its defaults and load the first page.
    ///
    /// Called once when the view mounts.
    pub async fn initialize(&self) -> FetchOutcome {
        self.shared.alive.store(true, Ordering::SeqCst);
        {
            let mut state = self.state();
            *state = ControllerState::new(self.shared.settings.initial_query());
        }
        self.notify();
        self.refetch().await
    }

    /// Store `term` immediately and refetch once typing pauses.
    ///
    /// Edits that leave the trimmed term unchanged (a trailing space, say)
    /// keep the page and issue no request.
    pub fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        let (stored, effective) = {
            let mut state = self.state();
            if state.query.search == term {
                (false, false)
            } else {
                let before = state.query.search_term().map(str::to_owned);
                state.query.search = term;
                let effective = state.query.search_term() != before.as_deref();
                if effective {
                    state.query.page = 1;
                }
                (true, effective)
            }
        };
        if stored {
            self.notify();
        }
        if effective {
            self.schedule_refetch();
        }
    }

    /// Select a role filter ("All" clears it).
    pub fn set_filter(&self, key: &str) -> Result<(), ControlError> {
        let filter = self.shared.settings.resolve_filter(key)?;
        self.update_query(|query| {
            if query.filter == filter {
                return false;
            }
            query.filter = filter;
            true
        });
        Ok(())
    }

    /// Select an account status filter ("All" clears it).
    pub fn set_status_filter(&self, key: &str) -> Result<(), ControlError> {
        let status = self.shared.settings.resolve_status(key)?;
        self.update_query(|query| {
            if query.status == status {
                return false;
            }
            query.status = status;
            true
        });
        Ok(())
    }

    /// Change the page size. Sizes outside the allowed set are rejected
    /// and leave everything untouched.
    pub fn set_page_size(&self, size: u32) -> Result<(), ControlError> {
        let size = self.shared.settings.check_page_size(size)?;
        self.update_query(|query| {
            if query.page_size == size {
                return false;
            }
            query.page_size = size;
            true
        });
        Ok(())
    }

    /// Apply a search/filter/page-size change: reset to page 1 and
    /// restart the quiet period.
    fn update_query(&self, apply: impl FnOnce(&mut ListQuery) -> bool) {
        let changed = {
            let mut state = self.state();
            let changed = apply(&mut state.query);
            if changed {
                state.query.page = 1;
            }
            changed
        };
        if changed {
            self.notify();
            self.schedule_refetch();
        }
    }

    fn schedule_refetch(&self) {
        if !self.is_alive() {
            return;
        }
        let weak: Weak<Shared<S>> = Arc::downgrade(&self.shared);
        self.shared.debounce.schedule(async move {
            if let Some(shared) = weak.upgrade() {
                ListController::from_shared(shared).refetch().await;
            }
        });
    }

    /// Jump to `target` and fetch it right away.
    ///
    /// Out-of-range targets and the current page are ignored without
    /// touching state or issuing a request.
    pub async fn go_to_page(&self, target: u32) -> Result<FetchOutcome, ControlError> {
        {
            let mut state = self.state();
            let total_pages = state.total_pages();
            if target < 1 || target > total_pages || target == state.query.page {
                debug!(target, total_pages, current = state.query.page, "ignoring page change");
                return Err(ControlError::InvalidPageTarget(target));
            }
            state.query.page = target;
        }
        self.notify();
        Ok(self.refetch().await)
    }

    pub async fn next_page(&self) -> Result<FetchOutcome, ControlError> {
        let page = self.state().query.page;
        self.go_to_page(page.saturating_add(1)).await
    }

    pub async fn prev_page(&self) -> Result<FetchOutcome, ControlError> {
        let page = self.state().query.page;
        self.go_to_page(page.saturating_sub(1)).await
    }

    /// Fetch the current query and apply the answer unless a later
    /// request has been issued meanwhile.
    pub async fn refetch(&self) -> FetchOutcome {
        let mut clamps = 0;
        loop {
            if !self.is_alive() {
                return FetchOutcome::Detached;
            }

            let seq = self.shared.seq.fetch_add(1, Ordering::SeqCst) + 1;
            let query = {
                let mut state = self.state();
                state.status = ListStatus::Loading;
                state.query.clone()
            };
            self.notify();
            debug!(
                seq,
                page = query.page,
                page_size = query.page_size,
                search = query.search_term().unwrap_or(""),
                "requesting list page"
            );

            let response = self.shared.source.fetch_page(&query).await;

            match self.apply(seq, &query, response, clamps < MAX_CLAMP_RETRIES) {
                Applied::Clamped => clamps += 1,
                Applied::Done(outcome) => {
                    if let FetchOutcome::Failed(err) = &outcome {
                        self.signal_failure(err);
                    }
                    return outcome;
                }
            }
        }
    }

    fn apply(
        &self,
        seq: u64,
        query: &ListQuery,
        response: Result<ListResponse<S::Item>, FetchError>,
        may_clamp: bool,
    ) -> Applied {
        let outcome = {
            let mut state = self.state();
            if !self.is_alive() {
                debug!(seq, "dropping response for torn-down view");
                return Applied::Done(FetchOutcome::Detached);
            }
            if seq != self.shared.seq.load(Ordering::SeqCst) {
                debug!(seq, "discarding stale response");
                return Applied::Done(FetchOutcome::Superseded);
            }

            match response {
                Ok(response) => {
                    let result = response.normalize(query);
                    if result.total_pages < query.page && may_clamp {
                        info!(
                            requested = query.page,
                            total_pages = result.total_pages,
                            "page out of range, clamping"
                        );
                        state.query.page = result.total_pages;
                        return Applied::Clamped;
                    }
                    if result.contains_page(result.page) {
                        state.query.page = result.page;
                    }
                    debug!(
                        seq,
                        page = result.page,
                        total = result.total,
                        rows = result.items.len(),
                        "list page loaded"
                    );
                    state.result = Some(result);
                    state.status = ListStatus::Loaded;
                    FetchOutcome::Loaded
                }
                Err(FetchError::PageOutOfRange { total_pages, .. }) if may_clamp => {
                    info!(
                        requested = query.page,
                        total_pages, "server rejected page, clamping"
                    );
                    state.query.page = total_pages.max(1);
                    return Applied::Clamped;
                }
                Err(err) => {
                    match &err {
                        FetchError::Unauthenticated => state.result = None,
                        FetchError::MalformedResponse(reason) => {
                            error!(seq, reason = %reason, "malformed list response");
                            state.result = Some(ListResult::empty(query.page));
                        }
                        other => {
                            warn!(seq, error = %other, "list fetch failed");
                            state.result = Some(ListResult::empty(query.page));
                        }
                    }
                    state.status = ListStatus::Failed(err.clone());
                    FetchOutcome::Failed(err)
                }
            }
        };
        self.notify();
        Applied::Done(outcome)
    }

    fn signal_failure(&self, err: &FetchError) {
        match err {
            FetchError::Unauthenticated => self.expire_session(),
            FetchError::Forbidden(message) => {
                let _ = self
                    .shared
                    .events
                    .send(ControllerEvent::Forbidden(message.clone()));
            }
            _ => {}
        }
    }

    fn expire_session(&self) {
        warn!("session rejected by server, signing out");
        self.shared.session.invalidate();
        let _ = self.shared.events.send(ControllerEvent::SessionExpired);
    }

    /// Bring the page back in line after rows were created, edited or
    /// deleted elsewhere.
    ///
    /// Creation returns to page 1. Deleting the last rows of a loaded
    /// trailing page steps back one page.
    pub async fn after_mutation(&self, kind: MutationKind, affected: usize) -> FetchOutcome {
        {
            let mut state = self.state();
            match kind {
                MutationKind::Create => state.query.page = 1,
                MutationKind::Update => {}
                MutationKind::Delete => {
                    // A failed load shows no rows, which says nothing about the page.
                    let loaded = state.status == ListStatus::Loaded;
                    let remaining = state.items().len().saturating_sub(affected);
                    if loaded && remaining == 0 && state.query.page > 1 {
                        state.query.page -= 1;
                    }
                }
            }
            debug!(?kind, affected, page = state.query.page, "reconciling after mutation");
        }
        self.refetch().await
    }

    /// Await a mutation and reconcile the list when it succeeds.
    ///
    /// A rejected session tears the session down like a list 401; other
    /// failures are handed back and leave the list alone.
    pub async fn run_mutation<T, Fut>(
        &self,
        kind: MutationKind,
        affected: usize,
        mutation: Fut,
    ) -> Result<T, FetchError>
    where
        Fut: Future<Output = Result<T, FetchError>>,
    {
        match mutation.await {
            Ok(value) => {
                self.after_mutation(kind, affected).await;
                Ok(value)
            }
            Err(err) => {
                if err.is_unauthenticated() {
                    self.expire_session();
                } else {
                    warn!(?kind, error = %err, "mutation failed");
                }
                Err(err)
            }
        }
    }

    /// Unmount: cancel the pending refetch, ignore in-flight answers,
    /// and reset the state to its defaults.
    pub fn teardown(&self) {
        self.shared.alive.store(false, Ordering::SeqCst);
        if self.shared.debounce.cancel() {
            debug!("cancelled pending refetch");
        }
        *self.state() = ControllerState::new(self.shared.settings.initial_query());
        self.notify();
    }
}
