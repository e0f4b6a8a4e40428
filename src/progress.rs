use std::sync::Arc;

/// Events emitted while loading listing pages, for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A page request is about to be sent
    FetchingPage {
        filter_type: Option<String>,
        offset: u64,
        limit: u32,
    },

    /// A page was merged into the accumulated listings
    PageMerged {
        /// Listings contained in this page
        received: usize,
        /// Listings accumulated after the merge
        accumulated: usize,
        /// Total declared by the server for the current filter
        total_count: u64,
        load_more: bool,
    },

    /// The server answered with no listings; state was left unchanged
    EmptyPage { offset: u64 },

    /// A response arrived after the filter changed or the view went away
    StaleResponseDiscarded { generation: u64 },

    /// The content type filter changed and the listings were reset
    FilterChanged { filter_type: Option<String> },

    /// A page request failed
    FetchFailed { error: String },
}

/// Trait for reporting progress events while paging through listings.
///
/// Implementations can use this to display spinners, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {
        // Intentionally empty
    }
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}
