//! Pagination helpers for the REST client.

use serde::de::DeserializeOwned;

use super::Client;
use crate::api::ApiRequest;
use crate::api::pagination::{OffsetCursor, OffsetPage, TokenCursor, TokenPage};
use crate::error::PagerDutyError;

impl Client {
    /// Fetch one page of an offset-paginated listing.
    ///
    /// Any `offset` already present on `req` is replaced.
    ///
    /// # Errors
    ///
    /// As for [`Client::request`].
    pub async fn fetch_offset_page<Page: DeserializeOwned>(
        &self,
        req: ApiRequest,
        offset: u64,
    ) -> Result<Page, PagerDutyError> {
        self.request(req.set_query("offset", offset.to_string()))
            .await
    }

    /// Fetch one page of a token-paginated listing.
    ///
    /// The first page is requested without a `page_token`.
    ///
    /// # Errors
    ///
    /// As for [`Client::request`].
    pub async fn fetch_token_page<Page: DeserializeOwned>(
        &self,
        req: ApiRequest,
        token: Option<&str>,
    ) -> Result<Page, PagerDutyError> {
        let req = match token {
            Some(t) => req.set_query("page_token", t),
            None => req,
        };
        self.request(req).await
    }

    /// Fetch and concatenate every page of an offset-paginated listing.
    ///
    /// `map` extracts the items and pagination fields from each decoded
    /// page.
    ///
    /// # Errors
    ///
    /// Propagates any error from a request or from `map`. Items from pages
    /// already fetched are discarded.
    pub async fn paginate_offset_all<Item, Mapper, Page>(
        &self,
        req: ApiRequest,
        mut map: Mapper,
    ) -> Result<Vec<Item>, PagerDutyError>
    where
        Mapper: FnMut(Page) -> Result<(Vec<Item>, OffsetPage), PagerDutyError>,
        Page: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut cursor = OffsetCursor::default();
        loop {
            let data = self
                .fetch_offset_page::<Page>(req.clone(), cursor.offset())
                .await?;
            let (mut page, info) = map(data)?;
            items.append(&mut page);
            if !cursor.advance(&info)? {
                break;
            }
        }
        Ok(items)
    }

    /// Fetch and concatenate every page of a token-paginated listing,
    /// starting from `start_token` when given.
    ///
    /// # Errors
    ///
    /// Propagates any error from a request or from `map`. Items from pages
    /// already fetched are discarded.
    pub async fn paginate_token_all<Item, Mapper, Page>(
        &self,
        req: ApiRequest,
        start_token: Option<String>,
        mut map: Mapper,
    ) -> Result<Vec<Item>, PagerDutyError>
    where
        Mapper: FnMut(Page) -> Result<(Vec<Item>, TokenPage), PagerDutyError>,
        Page: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut cursor = TokenCursor::new(start_token);
        loop {
            let data = self
                .fetch_token_page::<Page>(req.clone(), cursor.token())
                .await?;
            let (mut page, info) = map(data)?;
            items.append(&mut page);
            if !cursor.advance(&info)? {
                break;
            }
        }
        Ok(items)
    }
}
