mod fetch;
mod parse;

pub use fetch::{DEFAULT_ENDPOINT, PageQuery, build_page_url, fetch_page};
pub use parse::{FetchResult, Listing, ListingId, ListingKind, parse_page};
