//! Command execution for the `pagerduty` binary.
//!
//! Each sub-command loads its client from layered configuration, performs
//! its requests and writes JSON to standard output.

use std::io::{self, Write};

use log::{info, warn};
use pagerduty::api::{paginate_offset, paginate_token};
use pagerduty::cli_args::{GetArgs, GlobalArgs, ListArgs, LoginArgs};
use pagerduty::{ApiRequest, Client, ClientConfig, Credentials, ErrorKind, PagerDutyError};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Merge CLI flags over file and environment configuration.
pub fn load_config(global: &GlobalArgs) -> Result<ClientConfig, PagerDutyError> {
    ClientConfig::load_with(global.config.as_deref(), global)
}

/// Build a [`Client`], dropping the debug log if it cannot be created.
fn build_client(config: &ClientConfig) -> Result<Client, PagerDutyError> {
    match Client::from_config(config) {
        Ok(c) => Ok(c),
        Err(e) if e.kind() == ErrorKind::Io && config.debug_log.is_some() => {
            warn!("failed to create debug log: {e}");
            Client::from_config(&ClientConfig {
                debug_log: None,
                ..config.clone()
            })
        }
        Err(e) => Err(e),
    }
}

/// Print `value` as pretty JSON. A closed stdout is not an error.
fn print_json(value: &Value) -> Result<(), PagerDutyError> {
    let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    match writeln!(io::stdout().lock(), "{text}") {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e.into()),
        _ => Ok(()),
    }
}

fn schema_error(status: u16, message: String) -> PagerDutyError {
    PagerDutyError::Schema {
        status,
        message: message.into(),
        snippet: "".into(),
    }
}

/// Split a listing page into its items and pagination fields.
fn split_page<P: DeserializeOwned>(
    status: u16,
    mut page: Value,
    field: &str,
) -> Result<(Vec<Value>, P), PagerDutyError> {
    let items = match page.get_mut(field).map(Value::take) {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => {
            return Err(schema_error(
                status,
                format!("response has no '{field}' array"),
            ));
        }
        Some(other) => {
            return Err(schema_error(
                status,
                format!("expected '{field}' to be an array, found {other}"),
            ));
        }
    };
    let info = serde_json::from_value(page)
        .map_err(|e| PagerDutyError::Pagination(e.to_string().into()))?;
    Ok((items, info))
}

pub async fn run_validate(config: &ClientConfig) -> Result<(), PagerDutyError> {
    let client = build_client(config)?;
    let abilities = client.abilities().await?;
    info!("token accepted by {}", client.base_url().as_str());
    print_json(&serde_json::json!({ "valid": true, "abilities": abilities }))
}

pub async fn run_get(args: &GetArgs, config: &ClientConfig) -> Result<(), PagerDutyError> {
    let client = build_client(config)?;
    let query: Vec<(&str, &str)> = args
        .query
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let body: Value = client.get(&args.path, &query).await?;
    print_json(&body)
}

pub async fn run_list(args: &ListArgs, config: &ClientConfig) -> Result<(), PagerDutyError> {
    let client = build_client(config)?;
    let query: Vec<(&str, &str)> = args
        .query
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let req = args.headers.iter().try_fold(
        ApiRequest::get(&args.path).query_pairs(&query),
        |req, (name, value)| req.header(name, value),
    )?;
    let field = args.field_name();
    let client = &client;
    let items = if args.token_paging {
        paginate_token(None, |token| {
            let req = match token {
                Some(t) => req.clone().set_query("page_token", t),
                None => req.clone(),
            };
            async move {
                let (status, page) = client.request_with_status(req).await?;
                split_page(status, page, field)
            }
        })
        .await?
    } else {
        paginate_offset(|offset| {
            let req = req.clone().set_query("offset", offset.to_string());
            async move {
                let (status, page) = client.request_with_status(req).await?;
                split_page(status, page, field)
            }
        })
        .await?
    };
    info!("fetched {} items from {}", items.len(), args.path);
    print_json(&Value::Array(items))
}

pub fn run_login(args: &LoginArgs, config: &ClientConfig) -> Result<(), PagerDutyError> {
    let path = match &config.credentials {
        Some(path) => path.clone(),
        None => Credentials::place_default()?,
    };
    let mut creds = Credentials::load(&path)?;
    creds.set_token(config.profile.clone(), args.api_token.clone());
    creds.save(&path)?;
    print_json(&serde_json::json!({
        "profile": config.profile,
        "credentials": path.display().to_string(),
    }))
}
