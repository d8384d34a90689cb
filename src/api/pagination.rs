//! Pagination walkers for offset- and token-based listings.
//!
//! Both walkers stop on the first error and discard whatever was collected
//! so far. Callers that need partial results fetch page by page instead.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::{BoxedStr, PagerDutyError};

/// Upper bound on pages fetched by one walk.
pub const MAX_PAGES: usize = 1000;

/// Offset pagination fields returned alongside a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetPage {
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Token pagination fields returned alongside a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPage {
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl TokenPage {
    /// The token for the next request, if the listing continues.
    ///
    /// An empty string counts as absent.
    #[must_use]
    pub fn next_token(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Offset cursor state for one walk.
#[derive(Debug, Default)]
pub(crate) struct OffsetCursor {
    offset: u64,
    pages: usize,
}

impl OffsetCursor {
    pub(crate) const fn offset(&self) -> u64 {
        self.offset
    }

    /// Record a fetched page and decide whether to continue.
    ///
    /// The next offset is the page's own offset plus its limit.
    pub(crate) fn advance(&mut self, page: &OffsetPage) -> Result<bool, PagerDutyError> {
        self.pages = self.pages.saturating_add(1);
        if !page.more {
            return Ok(false);
        }
        if self.pages >= MAX_PAGES {
            return Err(PagerDutyError::Pagination(
                format!("pagination exceeded max pages {MAX_PAGES}").boxed(),
            ));
        }
        let next = page.offset.saturating_add(page.limit);
        if next <= self.offset {
            return Err(PagerDutyError::Pagination(
                format!(
                    "offset did not advance past {} (offset {}, limit {}, more=true)",
                    self.offset, page.offset, page.limit
                )
                .boxed(),
            ));
        }
        self.offset = next;
        Ok(true)
    }
}

/// Token cursor state for one walk.
#[derive(Debug, Default)]
pub(crate) struct TokenCursor {
    token: Option<String>,
    pages: usize,
}

impl TokenCursor {
    pub(crate) const fn new(start: Option<String>) -> Self {
        Self {
            token: start,
            pages: 0,
        }
    }

    pub(crate) fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Record a fetched page and decide whether to continue.
    pub(crate) fn advance(&mut self, page: &TokenPage) -> Result<bool, PagerDutyError> {
        self.pages = self.pages.saturating_add(1);
        let Some(next) = page.next_token() else {
            return Ok(false);
        };
        if self.pages >= MAX_PAGES {
            return Err(PagerDutyError::Pagination(
                format!("pagination exceeded max pages {MAX_PAGES}").boxed(),
            ));
        }
        if self.token.as_deref() == Some(next) {
            return Err(PagerDutyError::Pagination(
                format!("server repeated page token {next}").boxed(),
            ));
        }
        self.token = Some(next.to_string());
        Ok(true)
    }
}

/// Retrieve all pages of an offset-paginated listing.
///
/// `fetch` is called with offset 0, then with each page's offset plus its
/// limit, until a page reports `more=false`.
///
/// # Examples
/// ```
/// use pagerduty::api::{OffsetPage, paginate_offset};
///
/// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
/// let items = paginate_offset(|offset| async move {
///     let more = offset < 4;
///     Ok((vec![offset], OffsetPage { offset, limit: 2, more, total: None }))
/// })
/// .await
/// .expect("pagination");
/// assert_eq!(items, vec![0, 2, 4]);
/// # });
/// ```
///
/// # Errors
///
/// Propagates any error returned by `fetch`, and returns
/// [`PagerDutyError::Pagination`] if the offset stops advancing or the walk
/// exceeds [`MAX_PAGES`].
pub async fn paginate_offset<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, PagerDutyError>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, OffsetPage), PagerDutyError>>,
{
    let mut items = Vec::new();
    let mut cursor = OffsetCursor::default();
    loop {
        let (mut page, info) = fetch(cursor.offset()).await?;
        items.append(&mut page);
        if !cursor.advance(&info)? {
            break;
        }
    }
    Ok(items)
}

/// Retrieve all pages of a token-paginated listing.
///
/// The first call receives `start`; later calls receive the previous page's
/// `next_page_token` until it is null or absent.
///
/// # Errors
///
/// Propagates any error returned by `fetch`, and returns
/// [`PagerDutyError::Pagination`] if the server repeats a token or the walk
/// exceeds [`MAX_PAGES`].
pub async fn paginate_token<T, F, Fut>(
    start: Option<String>,
    mut fetch: F,
) -> Result<Vec<T>, PagerDutyError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, TokenPage), PagerDutyError>>,
{
    let mut items = Vec::new();
    let mut cursor = TokenCursor::new(start);
    loop {
        let (mut page, info) = fetch(cursor.token().map(str::to_string)).await?;
        items.append(&mut page);
        if !cursor.advance(&info)? {
            break;
        }
    }
    Ok(items)
}
