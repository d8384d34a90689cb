//! Command-line argument structures.
//!
//! Isolates clap derivations so `main.rs` stays focused on runtime logic.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

/// Top-level command line of the `pagerduty` binary.
#[derive(Parser, Debug)]
#[command(name = "pagerduty", version, about = "Query the PagerDuty REST API")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Command,
}

/// Options that apply to every sub-command.
///
/// Serialises only the flags that were given, so it can be layered over
/// file and environment configuration.
#[derive(Args, Serialize, Default, Debug, Clone)]
pub struct GlobalArgs {
    /// Configuration file to read instead of the XDG default
    #[arg(long, global = true, value_name = "FILE")]
    #[serde(skip)]
    pub config: Option<PathBuf>,
    /// Credentials profile holding the API token
    #[arg(long, global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// API token, overriding the credentials file
    #[arg(long, global = true, value_name = "TOKEN")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// API base URL
    #[arg(long, global = true, value_name = "URL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Write an HTTP transcript to this file for debugging
    #[arg(long, global = true, value_name = "FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_log: Option<PathBuf>,
    /// HTTP request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_timeout: Option<u64>,
    /// HTTP connection timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Check that the configured token is accepted
    Validate,
    /// Fetch one resource and print it as JSON
    Get(GetArgs),
    /// Fetch every page of a listing and print the merged items
    List(ListArgs),
    /// Store a token in the credentials file
    Login(LoginArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    /// Path relative to the API base URL, e.g. `/users/PXPGF42`
    pub path: String,
    /// Query parameter as `KEY=VALUE`; may be repeated
    #[arg(short, long = "query", value_name = "KEY=VALUE", value_parser = parse_pair)]
    pub query: Vec<(String, String)>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Collection path, e.g. `/users`
    pub path: String,
    /// Envelope key holding the items; defaults to the last path segment
    #[arg(long, value_name = "NAME")]
    pub field: Option<String>,
    /// Page with `page_token` instead of `offset`
    #[arg(long)]
    pub token_paging: bool,
    /// Query parameter as `KEY=VALUE`; may be repeated
    #[arg(short, long = "query", value_name = "KEY=VALUE", value_parser = parse_pair)]
    pub query: Vec<(String, String)>,
    /// Extra request header as `NAME=VALUE`; may be repeated
    #[arg(long = "header", value_name = "NAME=VALUE", value_parser = parse_pair)]
    pub headers: Vec<(String, String)>,
}

impl ListArgs {
    /// Envelope key to read items from.
    #[must_use]
    pub fn field_name(&self) -> &str {
        self.field.as_deref().unwrap_or_else(|| {
            self.path
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    /// Token to store under the selected profile
    #[arg(value_name = "TOKEN")]
    pub api_token: String,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn only_given_flags_serialise() {
        let cli = Cli::try_parse_from(["pagerduty", "--token", "abc", "validate"]).expect("parse");
        assert_eq!(serde_json::to_value(&cli.global).expect("json"), json!({"token": "abc"}));
    }

    #[test]
    fn config_path_is_never_serialised() {
        let cli = Cli::try_parse_from(["pagerduty", "validate", "--config", "/tmp/pd.toml"])
            .expect("parse");
        assert_eq!(cli.global.config, Some(PathBuf::from("/tmp/pd.toml")));
        assert_eq!(serde_json::to_value(&cli.global).expect("json"), json!({}));
    }

    #[test]
    fn list_collects_query_pairs() {
        let cli = Cli::try_parse_from([
            "pagerduty",
            "list",
            "/users",
            "-q",
            "include[]=contact_methods",
            "--query",
            "query=ann",
        ])
        .expect("parse");
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(
            args.query,
            vec![
                ("include[]".to_string(), "contact_methods".to_string()),
                ("query".to_string(), "ann".to_string())
            ]
        );
        assert!(!args.token_paging);
    }

    #[rstest]
    #[case("novalue")]
    #[case("=value")]
    fn malformed_pairs_are_rejected(#[case] raw: &str) {
        assert!(Cli::try_parse_from(["pagerduty", "get", "/users", "-q", raw]).is_err());
    }

    #[rstest]
    #[case("/users", None, "users")]
    #[case("/customfields/fields/", None, "fields")]
    #[case("/incident_workflows/triggers", Some("triggers"), "triggers")]
    #[case("/schedules", Some("items"), "items")]
    fn list_field_name(#[case] path: &str, #[case] field: Option<&str>, #[case] expected: &str) {
        let args = ListArgs {
            path: path.into(),
            field: field.map(Into::into),
            token_paging: false,
            query: Vec::new(),
            headers: Vec::new(),
        };
        assert_eq!(args.field_name(), expected);
    }
}
