//! Offer discovery session: the filter/pagination state machine behind the
//! public listing. Free-text inputs are debounced so a burst of keystrokes
//! issues a single query; committed filter changes reset the page; results
//! arriving for a superseded fetch are discarded.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep_until, Instant};

use crate::dto::offer_dto::OfferListQuery;
use crate::error::Result;
use crate::models::offer::Offer;
use crate::services::offer_service::{OfferList, OfferService, SECTOR_ALL};

pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

/// Read side of the catalog, as seen by a discovery session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OfferSource: Send + Sync {
    async fn fetch(&self, query: OfferListQuery) -> Result<OfferList>;
}

#[async_trait]
impl OfferSource for OfferService {
    async fn fetch(&self, query: OfferListQuery) -> Result<OfferList> {
        self.list(query).await
    }
}

/// Per-field `Typing -> Committed` state. Each keystroke discards the
/// pending timer and starts a new one; only the committed value ever
/// reaches a query.
#[derive(Debug, Default)]
struct DebouncedField {
    typed: String,
    committed: String,
    deadline: Option<Instant>,
}

impl DebouncedField {
    fn set(&mut self, text: &str) {
        if text != self.typed {
            self.typed = text.to_string();
            self.deadline = Some(Instant::now() + DEBOUNCE_DELAY);
        }
    }

    /// Commits the typed value if its timer has elapsed. Returns whether
    /// the committed value actually changed.
    fn commit_elapsed(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                if self.committed != self.typed {
                    self.committed = self.typed.clone();
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }
}

pub struct DiscoverySession {
    source: Arc<dyn OfferSource>,
    title: DebouncedField,
    location: DebouncedField,
    sector: String,
    page: i64,
    per_page: i64,
    generation: u64,
    dirty: bool,
    /// Distinguishes "fetching" from "empty result" for the view.
    pub loading: bool,
    pub items: Vec<Offer>,
    pub total: i64,
    pub total_pages: i64,
}

impl DiscoverySession {
    pub fn new(source: Arc<dyn OfferSource>, per_page: i64) -> Self {
        Self {
            source,
            title: DebouncedField::default(),
            location: DebouncedField::default(),
            sector: SECTOR_ALL.to_string(),
            page: 1,
            per_page,
            generation: 0,
            dirty: true,
            loading: false,
            items: Vec::new(),
            total: 0,
            total_pages: 0,
        }
    }

    pub fn type_title(&mut self, text: &str) {
        self.title.set(text);
    }

    pub fn type_location(&mut self, text: &str) {
        self.location.set(text);
    }

    /// Sector selection is not debounced; it takes effect immediately and,
    /// like any filter change, resets pagination.
    pub fn select_sector(&mut self, sector: &str) {
        if sector != self.sector {
            self.sector = sector.to_string();
            self.page = 1;
            self.dirty = true;
        }
    }

    /// Changing page never touches the filters.
    pub fn go_to_page(&mut self, page: i64) {
        let page = page.max(1);
        if page != self.page {
            self.page = page;
            self.dirty = true;
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    /// Unmount/navigation: any in-flight fetch becomes stale. The external
    /// call itself is not aborted; its result just never lands.
    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.loading = false;
    }

    fn pending_deadline(&self) -> Option<Instant> {
        match (self.title.deadline, self.location.deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Waits out pending debounce timers and commits elapsed fields. A
    /// committed change to the effective filter resets the page to 1.
    pub async fn settle(&mut self) {
        while let Some(deadline) = self.pending_deadline() {
            sleep_until(deadline).await;
            let now = Instant::now();
            let mut changed = self.title.commit_elapsed(now);
            changed |= self.location.commit_elapsed(now);
            if changed {
                self.page = 1;
                self.dirty = true;
            }
        }
    }

    /// Starts a fetch for the current effective filter and page, tagging it
    /// with a fresh generation so earlier in-flight fetches become stale.
    pub fn begin_fetch(&mut self) -> (u64, OfferListQuery) {
        self.generation = self.generation.wrapping_add(1);
        self.loading = true;
        let query = OfferListQuery {
            title: Some(self.title.committed.clone()),
            location: Some(self.location.committed.clone()),
            sector: Some(self.sector.clone()),
            page: Some(self.page),
            per_page: Some(self.per_page),
        };
        (self.generation, query)
    }

    /// Applies a fetch result unless it was superseded. Returns whether the
    /// result landed.
    pub fn apply(&mut self, generation: u64, list: OfferList) -> bool {
        if generation != self.generation {
            return false;
        }
        self.items = list.items;
        self.total = list.total;
        self.total_pages = list.total_pages;
        self.loading = false;
        self.dirty = false;
        true
    }

    /// Drives one settle-then-fetch cycle. Returns whether a query was
    /// issued.
    pub async fn run_once(&mut self) -> Result<bool> {
        self.settle().await;
        if !self.dirty {
            return Ok(false);
        }
        let (generation, query) = self.begin_fetch();
        match self.source.fetch(query).await {
            Ok(list) => {
                self.apply(generation, list);
                Ok(true)
            }
            Err(err) => {
                self.loading = false;
                Err(err)
            }
        }
    }
}
