//! Generic resource services.
//!
//! PagerDuty wraps single objects in a key named after the resource
//! (`{"field": {...}}`) and lists in its plural (`{"fields": [...]}`).
//! [`Resource`] records those names once per type so one generic
//! [`Resources`] service covers list, get, create, update and delete.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::{ApiRequest, Client, OffsetPage, TokenPage, paginate_offset, paginate_token};
use crate::error::{BoxedStr, PagerDutyError};

/// How a resource's list endpoint pages its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    Offset,
    Token,
}

/// A type exposed by a PagerDuty REST endpoint.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync {
    /// Envelope key for a single object.
    const SINGULAR: &'static str;
    /// Envelope key for a list of objects.
    const PLURAL: &'static str;
    const PAGINATION: Pagination = Pagination::Offset;
    /// Extra headers sent with every request for this resource.
    const HEADERS: &'static [(&'static str, &'static str)] = &[];
}

/// A resource with a fixed top-level collection path.
///
/// Resources nested under another entity implement only [`Resource`] and
/// are reached through [`Client::resources_at`] or a dedicated accessor.
pub trait Collection: Resource {
    /// Collection path relative to the API base URL.
    const PATH: &'static str;
}

/// A `{id, type}` pointer to another entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Reference {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            summary: None,
        }
    }
}

/// One decoded page of a resource listing.
#[derive(Debug, Clone)]
pub struct ListPage<R, P> {
    pub items: Vec<R>,
    pub page: P,
}

/// CRUD operations for one resource type.
pub struct Resources<'c, R> {
    client: &'c Client,
    base: String,
    _marker: PhantomData<fn() -> R>,
}

/// Remove `key` from a decoded envelope and decode it as `T`.
///
/// `status` is the status of the response the envelope came from.
pub(crate) fn take_field<T: DeserializeOwned>(
    envelope: &mut Map<String, Value>,
    key: &str,
    status: u16,
) -> Result<T, PagerDutyError> {
    let value = envelope.remove(key).unwrap_or(Value::Null);
    serde_path_to_error::deserialize(value).map_err(|e| {
        let path = e.path().to_string();
        PagerDutyError::Schema {
            status,
            message: format!("{} at {key}.{path}", e.into_inner()).boxed(),
            snippet: "".boxed(),
        }
    })
}

fn page_info<P: DeserializeOwned>(envelope: Map<String, Value>) -> Result<P, PagerDutyError> {
    serde_json::from_value(Value::Object(envelope))
        .map_err(|e| PagerDutyError::Pagination(e.to_string().boxed()))
}

fn wrap<R: Resource>(item: &R) -> Result<Value, PagerDutyError> {
    let inner = serde_json::to_value(item).map_err(|e| {
        PagerDutyError::InvalidRequest(format!("serialising {}: {e}", R::SINGULAR).boxed())
    })?;
    let mut envelope = Map::new();
    envelope.insert(R::SINGULAR.to_string(), inner);
    Ok(Value::Object(envelope))
}

impl<'c, R: Resource> Resources<'c, R> {
    pub(crate) fn new(client: &'c Client, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
            _marker: PhantomData,
        }
    }

    fn request(&self, req: ApiRequest) -> Result<ApiRequest, PagerDutyError> {
        R::HEADERS
            .iter()
            .try_fold(req, |req, (name, value)| req.header(name, value))
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{id}", self.base)
    }

    async fn fetch(&self, req: ApiRequest) -> Result<(u16, Map<String, Value>), PagerDutyError> {
        self.client.request_with_status(req).await
    }

    async fn offset_page(
        &self,
        req: ApiRequest,
        offset: u64,
    ) -> Result<ListPage<R, OffsetPage>, PagerDutyError> {
        let (status, mut map) = self
            .fetch(req.set_query("offset", offset.to_string()))
            .await?;
        let items = take_field(&mut map, R::PLURAL, status)?;
        Ok(ListPage {
            items,
            page: page_info(map)?,
        })
    }

    async fn token_page(
        &self,
        req: ApiRequest,
        token: Option<&str>,
    ) -> Result<ListPage<R, TokenPage>, PagerDutyError> {
        let req = match token {
            Some(t) => req.set_query("page_token", t),
            None => req,
        };
        let (status, mut map) = self.fetch(req).await?;
        let items = take_field(&mut map, R::PLURAL, status)?;
        Ok(ListPage {
            items,
            page: page_info(map)?,
        })
    }

    /// Fetch every item, walking all pages.
    ///
    /// `query` is applied to every page request.
    ///
    /// # Errors
    ///
    /// Returns the first error from any page; items from earlier pages are
    /// discarded.
    pub async fn list(&self, query: &[(&str, &str)]) -> Result<Vec<R>, PagerDutyError> {
        let req = self.request(ApiRequest::get(&self.base).query_pairs(query))?;
        match R::PAGINATION {
            Pagination::Offset => {
                paginate_offset(|offset| {
                    let req = req.clone();
                    async move {
                        let page = self.offset_page(req, offset).await?;
                        Ok((page.items, page.page))
                    }
                })
                .await
            }
            Pagination::Token => {
                paginate_token(None, |token| {
                    let req = req.clone();
                    async move {
                        let page = self.token_page(req, token.as_deref()).await?;
                        Ok((page.items, page.page))
                    }
                })
                .await
            }
        }
    }

    /// Fetch a single page of an offset-paginated listing.
    ///
    /// # Errors
    ///
    /// Propagates request and decode errors.
    pub async fn list_page(
        &self,
        offset: u64,
        query: &[(&str, &str)],
    ) -> Result<ListPage<R, OffsetPage>, PagerDutyError> {
        let req = self.request(ApiRequest::get(&self.base).query_pairs(query))?;
        self.offset_page(req, offset).await
    }

    /// Fetch a single page of a token-paginated listing.
    ///
    /// # Errors
    ///
    /// Propagates request and decode errors.
    pub async fn list_token_page(
        &self,
        token: Option<&str>,
        query: &[(&str, &str)],
    ) -> Result<ListPage<R, TokenPage>, PagerDutyError> {
        let req = self.request(ApiRequest::get(&self.base).query_pairs(query))?;
        self.token_page(req, token).await
    }

    /// # Errors
    ///
    /// Propagates request and decode errors.
    pub async fn get(&self, id: &str, query: &[(&str, &str)]) -> Result<R, PagerDutyError> {
        let req = self.request(ApiRequest::get(self.item_path(id)).query_pairs(query))?;
        let (status, mut map) = self.fetch(req).await?;
        take_field(&mut map, R::SINGULAR, status)
    }

    /// # Errors
    ///
    /// Propagates request and decode errors.
    pub async fn create(&self, item: &R) -> Result<R, PagerDutyError> {
        let req = self.request(ApiRequest::post(&self.base).body(wrap(item)?))?;
        let (status, mut map) = self.fetch(req).await?;
        take_field(&mut map, R::SINGULAR, status)
    }

    /// # Errors
    ///
    /// Propagates request and decode errors.
    pub async fn update(&self, id: &str, item: &R) -> Result<R, PagerDutyError> {
        let req = self.request(ApiRequest::put(self.item_path(id)).body(wrap(item)?))?;
        let (status, mut map) = self.fetch(req).await?;
        take_field(&mut map, R::SINGULAR, status)
    }

    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn delete(&self, id: &str) -> Result<(), PagerDutyError> {
        let req = self.request(ApiRequest::delete(self.item_path(id)))?;
        self.client.execute(req).await.map(|_| ())
    }
}

impl Client {
    /// Service for a resource at its default collection path.
    #[must_use]
    pub fn resources<R: Collection>(&self) -> Resources<'_, R> {
        Resources::new(self, R::PATH)
    }

    /// Service for a resource nested under another path.
    #[must_use]
    pub fn resources_at<R: Resource>(&self, base: impl Into<String>) -> Resources<'_, R> {
        Resources::new(self, base)
    }

    /// Field configurations of the custom field schema `schema_id`.
    #[must_use]
    pub fn field_configurations(
        &self,
        schema_id: &str,
    ) -> Resources<'_, crate::custom_fields::FieldConfiguration> {
        Resources::new(
            self,
            format!("/customfields/schemas/{schema_id}/field_configurations"),
        )
    }
}
