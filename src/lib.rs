pub mod error;
pub mod http;
pub mod listing;
pub mod pager;
pub mod progress;
pub mod state;

// Re-export main types for convenience
pub use error::{ActionError, FetchError, LoadError};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use listing::{
    DEFAULT_ENDPOINT, FetchResult, Listing, ListingId, ListingKind, PageQuery, build_page_url,
    fetch_page, parse_page,
};
pub use pager::{LoadOutcome, LoadPhase, PageRequest, Pager, PagerOptions};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use state::{
    Action, INITIAL_STATE, PageState, filter_change_actions, merge_actions, reduce, reduce_all,
};
