//! Paginated feed synchronization.
//!
//! [`FeedController`] turns user triggers (initial load, scroll-to-bottom,
//! pull-to-refresh, search) into page fetches against a [`DishListSource`].
//! Each fetch runs as a tokio task; its result comes back over an mpsc
//! channel owned by the controller and is applied by the owner once per UI
//! tick ([`FeedController::poll_completions`]).  Dropping the controller
//! drops the receiver, so late completions are discarded.
//!
//! ```text
//!  request_load / search          spawn            fetch_page()
//! ───────────────────────► state ───────► task ───────────────► source
//!                            ▲                │
//!                            │  PageCompletion│ (mpsc)
//!                            └────────────────┘
//!                            │
//!                            ▼ watch
//!                   items / loading / error
//! ```
//!
//! At most one fetch is in flight: every trigger that arrives while
//! `is_loading` is set is dropped.  Completions are therefore applied in
//! issue order without sequence numbers.  A failed fetch leaves the cursor,
//! the exhaustion flag and the items untouched, so the next trigger retries
//! the same page.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::source::{Dish, DishListSource, FetchError, PageRequest, PageResult};

/// Page size used when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

const LOAD_FAILED: &str = "Failed to load dishes";

/// Result of one fetch, sent from the fetch task back to the controller.
#[derive(Debug)]
pub struct PageCompletion {
    pub request: PageRequest,
    pub refresh: bool,
    pub outcome: Result<PageResult, FetchError>,
}

/// Read-only views of the controller's published state.
///
/// Cloning is cheap; every clone observes the same values.
#[derive(Debug, Clone)]
pub struct FeedSignals {
    pub items: watch::Receiver<Vec<Dish>>,
    pub loading: watch::Receiver<bool>,
    pub error: watch::Receiver<Option<String>>,
}

pub struct FeedController {
    source: Arc<dyn DishListSource>,
    runtime: Handle,
    page_size: u32,

    current_page: u32,
    is_loading: bool,
    is_last_page: bool,
    current_search: Option<String>,

    /// Accumulated items live in the watch sender; there is no second copy.
    items: watch::Sender<Vec<Dish>>,
    loading: watch::Sender<bool>,
    error: watch::Sender<Option<String>>,

    completions_tx: mpsc::UnboundedSender<PageCompletion>,
    completions_rx: mpsc::UnboundedReceiver<PageCompletion>,
}

impl FeedController {
    /// Create an idle controller.  Nothing is fetched until the first trigger.
    ///
    /// A `page_size` of zero is treated as 1.
    pub fn new(source: Arc<dyn DishListSource>, runtime: Handle, page_size: u32) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            source,
            runtime,
            page_size: page_size.max(1),
            current_page: 1,
            is_loading: false,
            is_last_page: false,
            current_search: None,
            items: watch::Sender::new(Vec::new()),
            loading: watch::Sender::new(false),
            error: watch::Sender::new(None),
            completions_tx,
            completions_rx,
        }
    }

    pub fn signals(&self) -> FeedSignals {
        FeedSignals {
            items: self.items.subscribe(),
            loading: self.loading.subscribe(),
            error: self.error.subscribe(),
        }
    }

    // -- state accessors -----------------------------------------------------

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_last_page(&self) -> bool {
        self.is_last_page
    }

    pub fn current_search(&self) -> Option<&str> {
        self.current_search.as_deref()
    }

    // -- triggers ------------------------------------------------------------

    /// Issue a fetch for the next page, or for page 1 when `refresh` is set.
    ///
    /// Returns `true` if a fetch was spawned.  Dropped triggers (already
    /// loading, or load-more past the last page) return `false`.  This never
    /// fails; errors surface on the `error` signal.
    pub fn request_load(&mut self, refresh: bool) -> bool {
        if self.is_loading {
            debug!(refresh, page = self.current_page, "fetch in flight; trigger dropped");
            return false;
        }

        if refresh {
            self.current_page = 1;
            self.is_last_page = false;
        } else if self.is_last_page {
            debug!(page = self.current_page, "feed exhausted; load-more ignored");
            return false;
        }

        self.is_loading = true;
        self.loading.send_replace(true);
        self.error.send_replace(None);

        let request = PageRequest {
            page: self.current_page,
            page_size: self.page_size,
            search: self.current_search.clone(),
        };
        info!(page = request.page, refresh, search = ?request.search, "fetching page");

        let source = Arc::clone(&self.source);
        let tx = self.completions_tx.clone();
        self.runtime.spawn(async move {
            let outcome = source.fetch_page(&request).await;
            let page = request.page;
            if tx.send(PageCompletion { request, refresh, outcome }).is_err() {
                // The controller is gone; nobody is left to update.
                debug!(page, "feed controller dropped; completion discarded");
            }
        });
        true
    }

    /// Change the search term and reload from page 1.
    ///
    /// `None` or a blank query clears the filter.  A non-blank query is
    /// stored exactly as typed, surrounding whitespace included.
    pub fn search(&mut self, query: Option<&str>) -> bool {
        self.current_search = query
            .filter(|q| !q.trim().is_empty())
            .map(str::to_owned);
        self.request_load(true)
    }

    // -- completions ---------------------------------------------------------

    /// Apply every completion that has already arrived.  Never blocks.
    ///
    /// Returns how many were applied.
    pub fn poll_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, completion: PageCompletion) {
        if !self.is_loading {
            warn!(page = completion.request.page, "completion without a pending fetch; ignored");
            return;
        }
        self.is_loading = false;
        self.loading.send_replace(false);

        match completion.outcome {
            Ok(page) => {
                let fetched = page.items.len();
                if completion.refresh {
                    self.items.send_replace(page.items);
                } else {
                    self.items.send_modify(|items| items.extend(page.items));
                }

                self.current_page += 1;
                let covered = u64::from(self.current_page - 1) * u64::from(self.page_size);
                self.is_last_page = fetched == 0 || covered >= page.total_count;

                info!(
                    page = completion.request.page,
                    fetched,
                    total = page.total_count,
                    last_page = self.is_last_page,
                    "page applied"
                );
            }
            Err(err) => {
                warn!(page = completion.request.page, %err, "page fetch failed");
                self.error.send_replace(Some(err.describe(LOAD_FAILED)));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
