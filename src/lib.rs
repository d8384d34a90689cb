//! Client library for the PagerDuty REST API.
//!
//! [`Client`] sends requests under a bounded retry policy that honours
//! PagerDuty's rate-limit headers, classifies every failure into an
//! [`ErrorKind`] and walks offset- and token-paginated listings. The
//! [`custom_fields`] and [`workflows`] modules carry the resource types
//! whose wire formats need more than a derived codec.

pub mod api;
pub mod cli_args;
pub mod config;
pub mod credentials;
pub mod custom_fields;
pub mod error;
pub mod resource;
pub mod workflows;

pub use api::{ApiRequest, BaseUrl, Client, HttpResponse, OffsetPage, RetryConfig, Token, TokenPage};
pub use config::ClientConfig;
pub use credentials::Credentials;
pub use error::{ApiError, ApiErrorDetails, ErrorKind, HttpFailure, PagerDutyError};
pub use resource::{Collection, ListPage, Pagination, Reference, Resource, Resources};
