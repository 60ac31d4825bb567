//! Sequential "load more" pagination
//!
//! Pages are appended strictly in order. While a request is in flight, further
//! `load_more` calls are suppressed instead of queued, so a page is never
//! appended twice. `refresh` and `close` start a new generation; a response
//! that arrives for an older generation is dropped.

use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::client::{PageRequest, TransactionApi};
use crate::error::Result;
use crate::models::Transaction;

/// Result of a `load_more` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page arrived and this many transactions were appended
    Loaded(usize),
    /// Another request for the current generation is still running
    Suppressed,
    /// Every page has been loaded
    Exhausted,
    /// The paginator was refreshed or closed while the request ran
    Discarded,
}

#[derive(Debug, Default)]
struct PageState {
    transactions: Vec<Transaction>,
    next_page: u32,
    total_pages: Option<u32>,
    total_transactions: u64,
    generation: u64,
    in_flight: Option<u64>,
    closed: bool,
}

impl PageState {
    fn exhausted(&self) -> bool {
        self.total_pages.is_some_and(|total| self.next_page > total)
    }
}

/// Pages through `GET /api/transactions` for one screen
pub struct Paginator<A> {
    api: A,
    limit: u32,
    group_id: Option<String>,
    user_id: Option<String>,
    state: Mutex<PageState>,
}

/// Clears the in-flight marker when a request finishes, fails or is dropped
struct InFlight<'a> {
    state: &'a Mutex<PageState>,
    generation: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        if state.in_flight == Some(self.generation) {
            state.in_flight = None;
        }
    }
}

fn lock(state: &Mutex<PageState>) -> MutexGuard<'_, PageState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<A: TransactionApi> Paginator<A> {
    pub fn new(api: A, limit: u32) -> Self {
        Self {
            api,
            limit: limit.max(1),
            group_id: None,
            user_id: None,
            state: Mutex::new(PageState {
                next_page: 1,
                ..Default::default()
            }),
        }
    }

    /// Only fetch transactions for this group
    pub fn for_group(mut self, group_id: Option<&str>) -> Self {
        self.group_id = group_id.map(str::to_string);
        self
    }

    /// Only fetch transactions involving this user
    pub fn for_user(mut self, user_id: Option<&str>) -> Self {
        self.user_id = user_id.map(str::to_string);
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetch the next page, unless one is already on its way.
    ///
    /// On error nothing already loaded is touched and the same page is tried
    /// again on the next call.
    pub async fn load_more(&self) -> Result<LoadOutcome> {
        let (request, generation) = {
            let mut state = lock(&self.state);
            if state.closed {
                return Ok(LoadOutcome::Discarded);
            }
            if state.in_flight == Some(state.generation) {
                debug!("Page {} already loading, suppressing", state.next_page);
                return Ok(LoadOutcome::Suppressed);
            }
            if state.exhausted() {
                return Ok(LoadOutcome::Exhausted);
            }
            state.in_flight = Some(state.generation);
            let request = PageRequest::new(state.next_page, self.limit)
                .group(self.group_id.as_deref())
                .user(self.user_id.as_deref());
            (request, state.generation)
        };
        let _in_flight = InFlight {
            state: &self.state,
            generation,
        };

        let page = self.api.fetch_transactions(&request).await?;

        let mut state = lock(&self.state);
        if state.closed || state.generation != generation {
            debug!(
                "Discarding page {} from generation {}",
                request.page, generation
            );
            return Ok(LoadOutcome::Discarded);
        }

        let loaded = page.transactions.len();
        state.transactions.extend(page.transactions);
        state.next_page = request.page + 1;
        state.total_transactions = page.pagination.total_transactions;
        state.total_pages = Some(if loaded == 0 {
            // An empty page ends the list whatever the server claims
            request.page
        } else {
            page.pagination.total_pages
        });
        debug!(
            "Loaded page {} of {:?} ({} transactions)",
            request.page, state.total_pages, loaded
        );
        Ok(LoadOutcome::Loaded(loaded))
    }

    /// Keep loading until the last page, returning how many were appended
    pub async fn load_all(&self) -> Result<usize> {
        let mut appended = 0;
        loop {
            match self.load_more().await? {
                LoadOutcome::Loaded(n) => appended += n,
                LoadOutcome::Exhausted | LoadOutcome::Suppressed | LoadOutcome::Discarded => {
                    return Ok(appended)
                }
            }
        }
    }

    /// Forget everything loaded and start again from page 1.
    ///
    /// A request still running for the previous generation completes but its
    /// page is dropped.
    pub fn reset(&self) {
        let mut state = lock(&self.state);
        let generation = state.generation + 1;
        *state = PageState {
            next_page: 1,
            generation,
            in_flight: state.in_flight,
            ..Default::default()
        };
    }

    /// Reset and load the first page
    pub async fn refresh(&self) -> Result<LoadOutcome> {
        self.reset();
        self.load_more().await
    }

    /// Stop accepting pages; late responses are dropped without error
    pub fn close(&self) {
        let mut state = lock(&self.state);
        state.closed = true;
        state.generation += 1;
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        lock(&self.state).transactions.clone()
    }

    pub fn total_transactions(&self) -> u64 {
        lock(&self.state).total_transactions
    }

    pub fn has_more(&self) -> bool {
        let state = lock(&self.state);
        !state.closed && !state.exhausted()
    }

    pub fn is_loading(&self) -> bool {
        let state = lock(&self.state);
        state.in_flight == Some(state.generation)
    }
}
