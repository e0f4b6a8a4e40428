// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tracing::debug;
use url::Url;

use crate::error::FetchError;
use crate::http::HttpClient;

use super::parse::{FetchResult, parse_page};

/// Listing endpoint used when none is configured
pub const DEFAULT_ENDPOINT: &str = "https://npr-poc.herokuapp.com/api/v2/pages/";

/// Parameters of a single page request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub filter_type: Option<String>,
    pub limit: u32,
    pub offset: u64,
}

/// Build the request URL for one page.
///
/// Parameters holding their falsy value (no or empty filter, zero offset,
/// zero limit) are left out instead of being sent, so `offset=0` never
/// appears on the wire.
pub fn build_page_url(endpoint: &Url, query: &PageQuery) -> Url {
    let mut url = endpoint.clone();
    let mut pairs: Vec<(&str, String)> = Vec::new();

    if let Some(filter_type) = query.filter_type.as_deref()
        && !filter_type.is_empty()
    {
        pairs.push(("type", filter_type.to_string()));
    }
    if query.offset != 0 {
        pairs.push(("offset", query.offset.to_string()));
    }
    if query.limit != 0 {
        pairs.push(("limit", query.limit.to_string()));
    }

    if !pairs.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())));
    }
    url
}

/// Fetch one page of listings and normalize the response
pub async fn fetch_page<C: HttpClient + ?Sized>(
    client: &C,
    endpoint: &Url,
    query: &PageQuery,
) -> Result<FetchResult, FetchError> {
    let url = build_page_url(endpoint, query);
    debug!(%url, "requesting listing page");

    let response = client
        .get(url.as_str())
        .await
        .map_err(|e| FetchError::Network {
            url: url.to_string(),
            source: e,
        })?;

    if !response.is_success() {
        return Err(FetchError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    let page = parse_page(&response.body)?;
    debug!(
        items = page.items.len(),
        total_count = page.total_count,
        "listing page received"
    );
    Ok(page)
}
