use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::listing::{FetchResult, Listing, PageQuery};

/// Pagination and filter state of the listing view
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    /// Content type filter (None = all types)
    pub filter_type: Option<String>,
    /// Listings accumulated so far, in server order
    pub listings: Vec<Listing>,
    /// Page size
    pub limit: u32,
    /// Number of listings to skip on the next request
    pub offset: u64,
    /// More pages exist beyond the accumulated listings
    pub load_more: bool,
}

/// State at mount time. Reset actions take their values from here.
pub static INITIAL_STATE: PageState = PageState {
    filter_type: None,
    listings: Vec::new(),
    limit: 5,
    offset: 0,
    load_more: false,
};

impl PageState {
    /// Mount state with a custom page size
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            ..INITIAL_STATE.clone()
        }
    }

    /// Request parameters for the next page
    pub fn query(&self) -> PageQuery {
        PageQuery {
            filter_type: self.filter_type.clone(),
            limit: self.limit,
            offset: self.offset,
        }
    }
}

impl Default for PageState {
    fn default() -> Self {
        INITIAL_STATE.clone()
    }
}

/// A discrete change to the page state.
///
/// The wire form is `{"type": "SET_FILTER_TYPE", "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    SetFilterType(Option<String>),
    ResetOffset,
    IncrementOffset(u64),
    #[serde(rename = "SET_LOADMORE")]
    SetLoadMore(bool),
    AddListings(Vec<Listing>),
    ResetListings,
}

impl Action {
    /// Decode an action from its JSON wire form
    pub fn from_json(json: &str) -> Result<Self, ActionError> {
        serde_json::from_str(json).map_err(ActionError::Unrecognized)
    }
}

/// Apply an action to a state, returning the new state.
///
/// The input state is left untouched.
pub fn reduce(state: &PageState, action: Action) -> PageState {
    match action {
        Action::SetFilterType(filter_type) => PageState {
            filter_type,
            ..state.clone()
        },
        Action::ResetOffset => PageState {
            offset: INITIAL_STATE.offset,
            ..state.clone()
        },
        Action::IncrementOffset(delta) => PageState {
            offset: state.offset.saturating_add(delta),
            ..state.clone()
        },
        Action::SetLoadMore(load_more) => PageState {
            load_more,
            ..state.clone()
        },
        Action::AddListings(items) => {
            let mut next = state.clone();
            next.listings.extend(items);
            next
        }
        Action::ResetListings => PageState {
            listings: INITIAL_STATE.listings.clone(),
            ..state.clone()
        },
    }
}

/// Actions for switching the content type filter.
///
/// Offset and listings are cleared before the new filter is set so nothing
/// from the previous filter survives into the first page of the new one.
/// An empty value means "all types".
pub fn filter_change_actions(filter_type: Option<&str>) -> [Action; 3] {
    let filter_type = filter_type.filter(|f| !f.is_empty()).map(String::from);
    [
        Action::ResetOffset,
        Action::ResetListings,
        Action::SetFilterType(filter_type),
    ]
}

/// Actions that merge a fetched page into the state.
///
/// An empty page yields no actions and leaves `load_more` as it was.
pub fn merge_actions(state: &PageState, page: &FetchResult) -> Vec<Action> {
    if page.items.is_empty() {
        return Vec::new();
    }

    let accumulated = (state.listings.len() + page.items.len()) as u64;
    let mut actions = vec![Action::AddListings(page.items.clone())];

    if page.total_count > accumulated {
        actions.push(Action::IncrementOffset(u64::from(state.limit)));
        actions.push(Action::SetLoadMore(true));
    } else {
        actions.push(Action::SetLoadMore(false));
    }

    actions
}

/// Apply several actions in order
pub fn reduce_all(state: &PageState, actions: impl IntoIterator<Item = Action>) -> PageState {
    actions
        .into_iter()
        .fold(state.clone(), |state, action| reduce(&state, action))
}
