//! Pagination types: server answers, the normalized page, and page-bar helpers

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::query::ListQuery;

/// Page buttons shown before the bar collapses with ellipses.
const MAX_PAGE_BUTTONS: u32 = 5;

/// Number of pages needed for `total` rows, never less than 1.
pub fn total_pages_for(total: u64, page_size: u32) -> u32 {
    if total == 0 || page_size == 0 {
        return 1;
    }
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// One page of rows as accepted by the list controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListResult<T> {
    /// Rows in server order
    pub items: Vec<T>,
    /// Matching rows across all pages
    pub total: u64,
    /// Always at least 1
    pub total_pages: u32,
    /// Page actually served
    pub page: u32,
}

impl<T> ListResult<T> {
    /// Result left behind after a failed fetch.
    pub fn empty(page: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            total_pages: 1,
            page: page.max(1),
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn contains_page(&self, page: u32) -> bool {
        (1..=self.total_pages).contains(&page)
    }
}

/// Paginated body of the list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PageBody<T> {
    #[serde(alias = "items")]
    pub users: Vec<T>,
    pub total: u64,
    #[serde(rename = "totalPages", alias = "total_pages")]
    pub total_pages: u32,
    pub page: u32,
}

/// The two body shapes a list collaborator may answer with.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    /// `{ users, total, totalPages, page }`
    Paginated(PageBody<T>),
    /// Legacy non-paginated array
    Bare(Vec<T>),
}

impl<T: DeserializeOwned> ListResponse<T> {
    /// Decode a JSON body, rejecting every shape other than the two above.
    pub fn from_json(value: serde_json::Value) -> Result<Self, FetchError> {
        serde_json::from_value(value).map_err(|err| FetchError::malformed(err.to_string()))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, FetchError> {
        serde_json::from_slice(bytes).map_err(|err| FetchError::malformed(err.to_string()))
    }
}

impl<T> ListResponse<T> {
    /// Collapse either shape into a [`ListResult`] for `query`.
    pub fn normalize(self, query: &ListQuery) -> ListResult<T> {
        match self {
            ListResponse::Paginated(body) => ListResult {
                items: body.users,
                total: body.total,
                total_pages: body.total_pages.max(1),
                page: body.page.max(1),
            },
            ListResponse::Bare(items) => {
                let total = items.len() as u64;
                ListResult {
                    items,
                    total,
                    total_pages: total_pages_for(total, query.page_size),
                    page: query.page,
                }
            }
        }
    }
}

/// Entry in the page-number bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(u32),
    Ellipsis,
}

/// Page buttons around `current`.
///
/// Up to five pages are listed in full. Past that the first and last page
/// stay visible and the gap collapses into [`PageLink::Ellipsis`].
pub fn page_window(current: u32, total_pages: u32) -> Vec<PageLink> {
    let total = total_pages.max(1);
    let current = current.clamp(1, total);

    if total <= MAX_PAGE_BUTTONS {
        return (1..=total).map(PageLink::Page).collect();
    }

    let shown: Vec<u32> = if current <= 3 {
        (1..=MAX_PAGE_BUTTONS).chain([total]).collect()
    } else if current >= total - 2 {
        [1].into_iter().chain(total - 4..=total).collect()
    } else {
        vec![1, current - 1, current, current + 1, total]
    };

    let mut links = Vec::with_capacity(shown.len() + 2);
    let mut previous = 0;
    for page in shown {
        // Ellipsis only where pages are actually skipped
        if previous != 0 && page > previous + 1 {
            links.push(PageLink::Ellipsis);
        }
        links.push(PageLink::Page(page));
        previous = page;
    }
    links
}

/// "Showing `start` to `end` of `total`"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ItemRange {
    /// `None` when nothing matches.
    pub fn new(page: u32, page_size: u32, total: u64) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let size = u64::from(page_size.max(1));
        let start = u64::from(page.max(1) - 1) * size + 1;
        let end = (u64::from(page.max(1)) * size).min(total);
        Some(Self { start, end, total })
    }
}

impl std::fmt::Display for ItemRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Showing {} to {} of {}", self.start, self.end, self.total)
    }
}
