//! REST transport, retry policy and pagination.
//!
//! [`Client`] issues [`ApiRequest`]s under a bounded fixed-interval retry
//! loop and decodes the responses. The walkers in this module drive offset-
//! and token-paginated listings on top of it.

pub mod client;
pub mod pagination;
pub mod request;
pub mod retry;

pub use client::{BASE_URL_ENV, BaseUrl, Client, HttpResponse, Token};
pub use pagination::{MAX_PAGES, OffsetPage, TokenPage, paginate_offset, paginate_token};
pub use request::ApiRequest;
pub use retry::{
    RATELIMIT_RESET, RetryConfig, build_retry_builder, classify_status, classify_transport,
    next_delay, rate_limit_delay, should_retry,
};
