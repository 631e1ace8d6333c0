//! Crawl frontier and visited-set management
//!
//! This module handles:
//! - FIFO queueing of discovered URLs (breadth-first traversal)
//! - Rejecting URLs that are off-site, already queued or already visited
//! - Marking URLs visited at dequeue time, so nothing is fetched twice
//! - The optional page budget

use crate::url::{without_fragment, PathMapper, SiteScope};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Outcome of offering a URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The URL was appended to the queue
    Queued,
    /// The URL is not on the crawled site
    OffSite,
    /// The URL is already waiting in the queue
    AlreadyQueued,
    /// The URL was dequeued before
    AlreadyVisited,
}

/// Frontier owns the work queue and the visited set of one crawl
///
/// Membership is tracked by visit key (see [`PathMapper::visit_key`]), so
/// two spellings of one resource, such as with and without a fragment, are one
/// entry. Once a URL has been handed out by [`Frontier::next_url`] it is never
/// handed out again, whatever happened to its fetch.
pub struct Frontier {
    /// URLs waiting to be fetched, oldest first
    queue: VecDeque<Url>,

    /// Visit keys of everything in `queue`
    queued: HashSet<String>,

    /// Visit keys of everything dequeued or otherwise seen as fetched
    visited: HashSet<String>,

    scope: SiteScope,
    mapper: PathMapper,

    /// Maximum number of URLs handed out, 0 for no limit
    max_pages: u32,

    /// Number of URLs handed out so far
    dequeued: u32,
}

impl Frontier {
    /// Creates an empty frontier for the given site
    pub fn new(scope: SiteScope, mapper: PathMapper) -> Self {
        Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            scope,
            mapper,
            max_pages: 0,
            dequeued: 0,
        }
    }

    /// Limits the number of URLs [`Frontier::next_url`] hands out
    ///
    /// A budget of 0 means unlimited.
    pub fn with_page_budget(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Offers a URL to the frontier
    ///
    /// The fragment is dropped. Off-site, queued and visited URLs are
    /// rejected; the outcome says which.
    pub fn push(&mut self, url: &Url) -> PushOutcome {
        if !self.scope.contains(url) {
            return PushOutcome::OffSite;
        }

        let key = self.mapper.visit_key(url);
        if self.visited.contains(&key) {
            return PushOutcome::AlreadyVisited;
        }
        if self.queued.contains(&key) {
            return PushOutcome::AlreadyQueued;
        }

        self.queued.insert(key);
        self.queue.push_back(without_fragment(url));
        PushOutcome::Queued
    }

    /// Gets the next URL to fetch and marks it visited
    ///
    /// # Returns
    ///
    /// * `Some(Url)` - The oldest queued URL
    /// * `None` - The frontier is empty or the page budget is spent
    pub fn next_url(&mut self) -> Option<Url> {
        if self.budget_spent() {
            return None;
        }

        let url = self.queue.pop_front()?;
        let key = self.mapper.visit_key(&url);
        self.queued.remove(&key);
        self.visited.insert(key);
        self.dequeued += 1;

        Some(url)
    }

    /// Marks a URL visited without it passing through the queue
    ///
    /// Used for the final URL of a redirect. A queued entry for the same
    /// resource is dropped.
    pub fn mark_visited(&mut self, url: &Url) {
        let key = self.mapper.visit_key(url);
        if self.queued.remove(&key) {
            self.queue.retain(|queued| self.mapper.visit_key(queued) != key);
        }
        self.visited.insert(key);
    }

    /// Returns true if the page budget stops further dequeues
    pub fn budget_spent(&self) -> bool {
        self.max_pages > 0 && self.dequeued >= self.max_pages
    }

    /// Returns the number of URLs in the frontier
    pub fn frontier_size(&self) -> usize {
        self.queue.len()
    }

    /// Returns the number of visited URLs
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Returns whether the frontier is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
