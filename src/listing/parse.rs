// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FetchError;

/// Identifier of a listing, numeric or textual depending on the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListingId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A single episode or show returned by the listing service.
///
/// Only `id` and `title` are interpreted; every other field is kept as-is
/// in `extra` and written back unchanged when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Listing {
    /// Create a listing with no extra fields
    pub fn new(id: impl Into<ListingId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            extra: Map::new(),
        }
    }
}

impl From<i64> for ListingId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ListingId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ListingId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One normalized page of listings
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub items: Vec<Listing>,
    /// Total number of listings matching the filter on the server,
    /// not the number fetched so far
    pub total_count: u64,
}

/// The content types the listing service knows how to filter by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingKind {
    Episode,
    Show,
}

impl ListingKind {
    /// Value of the `type` query parameter for this kind
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Episode => "podcasts.Episode",
            Self::Show => "podcasts.Show",
        }
    }

    /// Human readable label, plural
    pub fn label(&self) -> &'static str {
        match self {
            Self::Episode => "Episodes",
            Self::Show => "Shows",
        }
    }
}

#[derive(Deserialize)]
struct PageResponse {
    items: Vec<Listing>,
    meta: PageMeta,
}

#[derive(Deserialize)]
struct PageMeta {
    total_count: u64,
}

/// Parse a listing response body into a FetchResult
pub fn parse_page(body: &[u8]) -> Result<FetchResult, FetchError> {
    let response: PageResponse =
        serde_json::from_slice(body).map_err(|e| FetchError::Malformed {
            reason: e.to_string(),
            source: Some(e),
        })?;

    Ok(FetchResult {
        items: response.items,
        total_count: response.meta.total_count,
    })
}
