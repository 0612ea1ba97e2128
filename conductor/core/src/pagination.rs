//! Pagination Loader
//!
//! Decides when to request older transcript pages and how fetched pages map
//! onto stable message ordinals.
//!
//! The backend slices pages from the end of a transcript: with `total`
//! messages and a page size `L`, page `p` covers `[total - p*L, total - (p-1)*L)`
//! clamped at zero. The loader only ever asks for the page after the last one
//! it has, and the transcript drops anything not strictly older than its
//! current head, so messages sent between page loads never show up twice.

use serde::{Deserialize, Serialize};

use crate::messages::{ConductorStatus, MessageOrdinal, MessageRole};
use crate::session::{ChatMessage, Transcript};

/// Pagination settings, fixed for the lifetime of a conductor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Messages per page (the `limit` query parameter)
    pub page_size: u32,
    /// Scroll offset from the top at or below which older history is requested
    pub near_top_threshold: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            near_top_threshold: 48,
        }
    }
}

/// Per-session bookkeeping of how much history is loaded
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    /// Pages fetched so far (0 = nothing loaded)
    pub pages_loaded: u32,
    /// Whether older pages remain on the server
    pub has_more: bool,
    /// An older-page fetch is outstanding
    pub fetching: bool,
}

/// Why an older-page request was refused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refusal {
    /// No session is active
    NoSession,
    /// The cursor reports the start of the transcript
    Exhausted,
    /// An older-page fetch is already outstanding
    AlreadyFetching,
    /// A session switch or bootstrap is in progress
    Switching,
}

/// Cursor plus settings for the active session
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    config: PaginationConfig,
    cursor: PageCursor,
}

impl Pagination {
    /// Create a loader with the given settings and an initial cursor
    #[must_use]
    pub fn new(config: PaginationConfig) -> Self {
        Self {
            config,
            cursor: PageCursor::default(),
        }
    }

    /// Current cursor
    #[must_use]
    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    /// Settings
    #[must_use]
    pub fn config(&self) -> PaginationConfig {
        self.config
    }

    /// Back to the initial cursor (on every context switch)
    pub fn reset(&mut self) {
        self.cursor = PageCursor::default();
    }

    /// Whether a scroll offset is close enough to the top to load history
    #[must_use]
    pub fn is_near_top(&self, offset_from_top: u32) -> bool {
        offset_from_top <= self.config.near_top_threshold
    }

    /// Check whether an older-page fetch may start
    pub fn check_older(&self, has_session: bool, status: ConductorStatus) -> Result<(), Refusal> {
        if !has_session {
            return Err(Refusal::NoSession);
        }
        if status.is_switching() {
            return Err(Refusal::Switching);
        }
        if self.cursor.fetching {
            return Err(Refusal::AlreadyFetching);
        }
        if !self.cursor.has_more {
            return Err(Refusal::Exhausted);
        }
        Ok(())
    }

    /// Mark an older-page fetch as outstanding and return the page to request
    pub fn begin_older(&mut self) -> u32 {
        self.cursor.fetching = true;
        self.cursor.pages_loaded + 1
    }

    /// Release the outstanding fetch without advancing (failure path)
    pub fn abort_older(&mut self) {
        self.cursor.fetching = false;
    }

    /// Record a loaded page and recompute `has_more`
    ///
    /// `oldest` is the first loaded ordinal. Ordinals count from the oldest
    /// stored message, so history remains exactly when it is above zero.
    /// Local-only or in-flight messages at the tail cannot skew this.
    pub fn page_loaded(&mut self, page: u32, oldest: Option<MessageOrdinal>) {
        self.cursor.pages_loaded = self.cursor.pages_loaded.max(page);
        self.cursor.has_more = oldest.is_some_and(|first| first > MessageOrdinal(0));
        self.cursor.fetching = false;
    }

    /// Mark the active transcript as fully known (freshly created session)
    pub fn mark_complete(&mut self) {
        self.cursor = PageCursor {
            pages_loaded: 1,
            has_more: false,
            fetching: false,
        };
    }

    /// Number a fetched page's messages in server coordinates
    #[must_use]
    pub fn number_page(
        &self,
        page: u32,
        total: u64,
        batch: Vec<(MessageRole, String)>,
    ) -> Vec<ChatMessage> {
        let skip = u64::from(page.saturating_sub(1)) * u64::from(self.config.page_size);
        let end = total.saturating_sub(skip);
        let start = end.saturating_sub(batch.len() as u64);

        batch
            .into_iter()
            .enumerate()
            .map(|(i, (role, text))| ChatMessage {
                ordinal: MessageOrdinal(start + i as u64),
                role,
                text,
                synthetic: false,
            })
            .collect()
    }

    /// Merge an older page into the transcript
    ///
    /// Returns how many messages were added. Never removes or reorders what
    /// is already loaded.
    pub fn merge_older(
        &mut self,
        transcript: &mut Transcript,
        page: u32,
        total: u64,
        batch: Vec<(MessageRole, String)>,
    ) -> usize {
        let numbered = self.number_page(page, total, batch);
        let added = transcript.prepend_older(numbered);
        self.page_loaded(page, transcript.first_ordinal());
        added
    }
}
