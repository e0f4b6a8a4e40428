use thiserror::Error;

/// Errors that can occur when fetching or normalizing a listing page
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to fetch listings from {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Malformed listing response: {reason}")]
    Malformed {
        reason: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Page size must be greater than zero")]
    InvalidLimit,

    #[error("Invalid listing endpoint: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl FetchError {
    /// Whether this error came from the transport or a non-success status
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::HttpStatus { .. })
    }

    /// Whether the server answered with a body missing the expected fields
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

/// Errors raised while decoding a dispatched action from its wire form
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Unrecognized action: {0}")]
    Unrecognized(#[source] serde_json::Error),
}

/// Errors that can occur while loading pages into the pager
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("No more pages to load")]
    NoMorePages,
}
