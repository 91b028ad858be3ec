//! Offset/limit paging over list endpoints.
//!
//! A page is an object holding a results array and a `_total` count, in
//! any order, possibly next to fields we don't care about. The object is
//! scanned key by key; unknown values are skipped without being built,
//! and the results elements are only decoded into the caller's type when
//! they are handed out by [`PagedFetcher::next`].

use std::collections::VecDeque;
use std::fmt;

use serde::Deserializer as _;
use serde::de::{self, DeserializeOwned, IgnoredAny, MapAccess, Visitor};
use serde_json::Value;

use super::*;
use crate::TwitchError;

const TOTAL_KEY: &str = "_total";
const ERROR_KEY: &str = "error";

/// One paged list query: where to ask and what to ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedQuery {
    pub path: String,
    pub results_key: String,
    pub page_size: u64,
    pub params: Vec<(String, String)>,
}

impl PagedQuery {
    pub fn new(path: impl Into<String>, results_key: impl Into<String>, page_size: u64) -> Self {
        Self {
            path: path.into(),
            results_key: results_key.into(),
            page_size,
            params: Vec::new(),
        }
    }

    /// Add an endpoint-specific filter sent with every page request.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

/// Where a paged query stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub offset: u64,
    pub page_size: u64,
    total: Option<u64>,
    pub end_of_results: bool,
}

impl PageCursor {
    fn new(page_size: u64) -> Self {
        Self {
            offset: 0,
            page_size,
            total: None,
            end_of_results: false,
        }
    }

    /// The `_total` reported by the most recent page.
    ///
    /// Errors if no page has reported one yet.
    pub fn total(&self) -> Result<u64, TwitchError> {
        self.total
            .ok_or_else(|| TwitchError::MissingField(TOTAL_KEY.into()))
    }

    pub fn is_total_known(&self) -> bool {
        self.total.is_some()
    }

    /// Move past a finished page, or stop if it was the last one.
    fn advance(&mut self, total: u64) {
        if self.offset + self.page_size >= total {
            self.end_of_results = true;
        } else {
            self.offset += self.page_size;
        }
    }
}

/// Undecoded elements of the page currently being handed out.
struct Page {
    items: VecDeque<Value>,
}

/// Item-at-a-time iterator over a paged list endpoint.
///
/// The first page is requested by [`PagedFetcher::open`]; later pages are
/// requested by [`PagedFetcher::next`] when the previous one runs out, so
/// `next` may wait on the network. A failed page request leaves the
/// fetcher positioned on that page, ready to be retried with another
/// `next` call.
pub struct PagedFetcher<'a, T: Transport> {
    transport: &'a T,
    query: PagedQuery,
    cursor: PageCursor,
    page: Option<Page>,
}

impl<'a, T: Transport> PagedFetcher<'a, T> {
    /// Start the query and load its first page.
    pub async fn open(transport: &'a T, query: PagedQuery) -> Result<Self, TwitchError> {
        assert!(query.page_size > 0, "page size must be positive");

        let mut fetcher = Self {
            transport,
            cursor: PageCursor::new(query.page_size),
            query,
            page: None,
        };
        fetcher.load_page().await?;

        if fetcher.current_page_is_empty() {
            // An empty first page is only fine for an empty result set.
            let total = fetcher.finish_page()?;
            if total != 0 {
                return Err(TwitchError::InconsistentTotal { total });
            }
            fetcher.cursor.end_of_results = true;
        }

        Ok(fetcher)
    }

    /// Whether [`next`](Self::next) has another item to give.
    pub fn more(&self) -> bool {
        !self.cursor.end_of_results
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn query(&self) -> &PagedQuery {
        &self.query
    }

    /// Decode the next item, loading the next page first if needed.
    ///
    /// # Panics
    ///
    /// If called when [`more`](Self::more) is false.
    pub async fn next<D: DeserializeOwned>(&mut self) -> Result<D, TwitchError> {
        assert!(
            self.more(),
            "PagedFetcher::next() called after the last item of '{}'",
            self.query.path
        );

        if self.page.is_none() {
            tracing::debug!(path = %self.query.path, "No page in progress, loading page");
            self.load_page().await?;
        }

        let Some(item) = self.page.as_mut().and_then(|page| page.items.pop_front()) else {
            let total = self.finish_page()?;
            return Err(TwitchError::InconsistentTotal { total });
        };

        if self.current_page_is_empty() {
            let total = self.finish_page()?;
            self.cursor.advance(total);
        }

        Ok(serde_json::from_value(item)?)
    }

    fn current_page_is_empty(&self) -> bool {
        self.page.as_ref().is_some_and(|page| page.items.is_empty())
    }

    /// Drop the current page and return the total it reported.
    fn finish_page(&mut self) -> Result<u64, TwitchError> {
        self.page = None;
        self.cursor.total()
    }

    async fn load_page(&mut self) -> Result<(), TwitchError> {
        let offset = self.cursor.offset;
        let limit = self.cursor.page_size;

        let mut params = self.query.params.clone();
        params.push(("limit".into(), limit.to_string()));
        params.push(("offset".into(), offset.to_string()));
        let url = endpoint_url(self.transport.base_url(), &self.query.path, &params)?;

        tracing::debug!(
            path = %self.query.path,
            from = offset,
            to = offset + limit,
            "Loading page"
        );
        let resp = self.transport.get(url).await?;
        if resp.status != 200 {
            return Err(TwitchError::Status {
                status: resp.status,
                message: resp.body,
            });
        }

        let scanned = scan_page(&resp.body, &self.query.results_key)?;
        drop(resp);

        if let Some(error) = scanned.api_error {
            return Err(TwitchError::ApiReported(error.to_string()));
        }
        let Some(items) = scanned.items else {
            return Err(TwitchError::MissingField(self.query.results_key.clone()));
        };

        self.cursor.total = scanned.total;
        self.page = Some(Page {
            items: items.into(),
        });
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ScannedPage {
    total: Option<u64>,
    items: Option<Vec<Value>>,
    api_error: Option<Value>,
}

fn scan_page(body: &str, results_key: &str) -> Result<ScannedPage, TwitchError> {
    if !body.trim_start().starts_with('{') {
        return Err(TwitchError::Protocol("response was not an object".into()));
    }

    let mut de = serde_json::Deserializer::from_str(body);
    let scanned = (&mut de)
        .deserialize_map(PageVisitor { results_key })
        .map_err(|e| TwitchError::Protocol(e.to_string()))?;
    de.end().map_err(|e| TwitchError::Protocol(e.to_string()))?;
    Ok(scanned)
}

struct PageVisitor<'k> {
    results_key: &'k str,
}

impl<'de> Visitor<'de> for PageVisitor<'_> {
    type Value = ScannedPage;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an object with a '{}' array", self.results_key)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ScannedPage, A::Error> {
        let mut page = ScannedPage::default();
        while let Some(key) = map.next_key::<String>()? {
            if key == TOTAL_KEY {
                if page.total.is_some() {
                    return Err(de::Error::duplicate_field(TOTAL_KEY));
                }
                page.total = Some(map.next_value()?);
            } else if key == self.results_key {
                page.items = Some(map.next_value()?);
            } else if key == ERROR_KEY {
                page.api_error = Some(map.next_value()?);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(page)
    }
}
