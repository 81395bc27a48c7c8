//! Paginated page of records
//!
//! `Page<T>` is the list payload shared by the server (which produces it)
//! and the list client (which renders from it).

use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use utoipa::ToSchema;

/// Pages shown on each side of the current page before the link list is
/// collapsed with "..." separators.
const LINKS_ON_EACH_SIDE: u32 = 3;

pub const PREVIOUS_LABEL: &str = "« Previous";
pub const NEXT_LABEL: &str = "Next »";
pub const GAP_LABEL: &str = "...";

/// A single navigation link rendered under a paginated table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationLink {
    /// Target URL, `null` for disabled links and gap markers
    pub url: Option<String>,
    pub label: String,
    pub active: bool,
}

/// One page of a filtered/sorted record list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    /// Records on this page, never more than `per_page`
    pub data: Vec<T>,
    /// Total number of records matching the filter (all pages)
    pub total: u64,
    /// Page size actually used by the server
    pub per_page: u32,
    /// Page actually served (1-based)
    pub current_page: u32,
    /// Last page number, at least 1
    pub last_page: u32,
    /// 1-based position of the first record on this page
    pub from: Option<u64>,
    /// 1-based position of the last record on this page
    pub to: Option<u64>,
    #[serde(default)]
    pub links: Vec<PaginationLink>,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, current_page: u32, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        let current_page = current_page.max(1);
        let last_page = last_page(total, per_page);

        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let first = u64::from(current_page - 1) * u64::from(per_page) + 1;
            (Some(first), Some(first + data.len() as u64 - 1))
        };

        Self {
            data,
            total,
            per_page,
            current_page,
            last_page,
            from,
            to,
            links: Vec::new(),
        }
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            per_page: self.per_page,
            current_page: self.current_page,
            last_page: self.last_page,
            from: self.from,
            to: self.to,
            links: self.links,
        }
    }

    /// Attach navigation links.
    ///
    /// Every link keeps the request's query string and only replaces `page`.
    pub fn with_links(mut self, path: &str, query: Option<&str>) -> Self {
        let pairs: Vec<(String, String)> = form_urlencoded::parse(query.unwrap_or("").as_bytes())
            .into_owned()
            .filter(|(key, _)| key != "page")
            .collect();
        let url_for = |page: u32| page_url(path, &pairs, page);

        let mut links = Vec::new();
        links.push(PaginationLink {
            url: (self.current_page > 1).then(|| url_for(self.current_page - 1)),
            label: PREVIOUS_LABEL.to_string(),
            active: false,
        });

        for slot in link_window(self.current_page, self.last_page) {
            links.push(match slot {
                Some(page) => PaginationLink {
                    url: Some(url_for(page)),
                    label: page.to_string(),
                    active: page == self.current_page,
                },
                None => PaginationLink {
                    url: None,
                    label: GAP_LABEL.to_string(),
                    active: false,
                },
            });
        }

        links.push(PaginationLink {
            url: self.has_more_pages().then(|| url_for(self.current_page + 1)),
            label: NEXT_LABEL.to_string(),
            active: false,
        });

        self.links = links;
        self
    }
}

pub fn last_page(total: u64, per_page: u32) -> u32 {
    let per_page = u64::from(per_page.max(1));
    let pages = total.div_ceil(per_page).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

fn page_url(path: &str, pairs: &[(String, String)], page: u32) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.append_pair("page", &page.to_string());
    format!("{}?{}", path, serializer.finish())
}

/// Page numbers to render; `None` marks a "..." gap.
fn link_window(current: u32, last: u32) -> Vec<Option<u32>> {
    let side = LINKS_ON_EACH_SIDE;
    let full = |range: std::ops::RangeInclusive<u32>| range.map(Some).collect::<Vec<_>>();

    // Small lists are rendered in full.
    if last < side * 2 + 8 {
        return full(1..=last);
    }

    let window = side * 2;
    let mut slots = Vec::new();
    if current <= window {
        slots.extend(full(1..=window + 2));
        slots.push(None);
        slots.extend(full(last - 1..=last));
    } else if current > last - window {
        slots.extend(full(1..=2));
        slots.push(None);
        slots.extend(full(last - (window + 1)..=last));
    } else {
        slots.extend(full(1..=2));
        slots.push(None);
        slots.extend(full(current - side..=current + side));
        slots.push(None);
        slots.extend(full(last - 1..=last));
    }
    slots
}
