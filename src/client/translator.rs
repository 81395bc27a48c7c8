//! Table state to URL query translation
//!
//! `TableState` mirrors what a data table widget holds (0-based page index,
//! page size, sorting, filtering). It maps deterministically onto the
//! canonical `ListQuery` and back from a URL, which stays the source of truth
//! for list state.

use tracing::debug;
use url::Url;

use crate::shared::{Filter, ListLimits, ListParams, ListQuery, Sort, DEFAULT_PER_PAGE, LIST_PARAMS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 0-based, as table widgets count pages
    pub page_index: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableState {
    pub pagination: Pagination,
    pub sort: Option<Sort>,
    pub filter: Option<Filter>,
}

impl TableState {
    /// Rebuild table state from a URL's query string.
    ///
    /// Missing or invalid values fall back to defaults (first page, default
    /// page size, no sort, no filter); an unknown direction falls back to
    /// ascending.
    pub fn from_url(url: &Url) -> Self {
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let mut params = ListParams::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let limits = ListLimits::default();
        let query = match params.resolve(limits) {
            Ok(query) => query,
            Err(_) => {
                params.direction = None;
                params.resolve(limits).unwrap_or_default()
            }
        };

        Self::from_query(&query)
    }

    pub fn from_query(query: &ListQuery) -> Self {
        Self {
            pagination: Pagination {
                page_index: query.page.saturating_sub(1),
                page_size: query.per_page.max(1),
            },
            sort: query.sort.clone(),
            filter: query.filter.clone(),
        }
    }

    /// Canonical query for the current state.
    pub fn to_query(&self) -> ListQuery {
        ListQuery {
            page: self.pagination.page_index.saturating_add(1),
            per_page: self.pagination.page_size.max(1),
            sort: self.sort.clone(),
            filter: self.filter.clone().filter(|f| !f.value.trim().is_empty()),
        }
    }

    pub fn set_page_index(&mut self, page_index: u32) {
        self.pagination.page_index = page_index;
    }

    /// Change the page size, keeping the first visible row on screen.
    pub fn set_page_size(&mut self, page_size: u32) {
        let page_size = page_size.max(1);
        let top_row = u64::from(self.pagination.page_index) * u64::from(self.pagination.page_size);
        self.pagination.page_index = u32::try_from(top_row / u64::from(page_size)).unwrap_or(u32::MAX);
        self.pagination.page_size = page_size;
    }

    /// Apply the widget's sorting list; only the first entry is honoured.
    pub fn set_sorting(&mut self, sorting: Vec<Sort>) {
        if sorting.len() > 1 {
            debug!(dropped = sorting.len() - 1, "Only one sort column is supported, extra entries ignored");
        }
        self.sort = sorting.into_iter().next();
    }

    /// Apply the widget's filter list; only the first entry is honoured and
    /// an empty value clears the filter.
    pub fn set_filtering(&mut self, filters: Vec<Filter>) {
        if filters.len() > 1 {
            debug!(dropped = filters.len() - 1, "Only one filter is supported, extra entries ignored");
        }
        self.filter = filters
            .into_iter()
            .next()
            .filter(|f| !f.value.trim().is_empty());
    }
}

/// URL for `query` derived from `current`.
///
/// Parameters the list does not own survive in their original order; stale
/// list parameters are dropped and the canonical set is appended.
pub fn request_url(current: &Url, query: &ListQuery) -> Url {
    let kept: Vec<(String, String)> = current
        .query_pairs()
        .filter(|(key, _)| !LIST_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = current.clone();
    url.set_query(None);
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &kept {
            pairs.append_pair(key, value);
        }
        for (key, value) in query.to_params() {
            pairs.append_pair(key, &value);
        }
    }
    url
}
