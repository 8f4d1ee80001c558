#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ticker-cache/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Supabase table source.
//!
//! This crate implements the ticker-core [`TableSource`] trait over a
//! Supabase project's [PostgREST](https://postgrest.org/) interface.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ticker_supabase::{SupabaseConfig, SupabaseTable};
//! use ticker_core::{Direction, Query, TableSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = SupabaseTable::new(SupabaseConfig::from_env()?);
//!
//!     let query = Query::all()
//!         .eq("symbol", "AAPL")
//!         .order_by("date", Direction::Descending)
//!         .limit(1);
//!     let rows = table.fetch(&query).await?;
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header::RETRY_AFTER};
use std::fmt;
use std::time::Duration;
use ticker_core::{
    Direction, Filter, FilterValue, Query, Result, Row, TableSource, TickerCacheError,
};

/// Project settings and environment lookup.
pub mod config;

pub use config::SupabaseConfig;

/// Characters PostgREST treats as syntax inside an `in.(...)` list.
const RESERVED: &[char] = &[',', '(', ')', '"', ':', '.', '\\', ' '];

/// Supabase REST table source.
///
/// Timeouts and connection pooling come from the [`reqwest::Client`]; pass a
/// configured one to [`SupabaseTable::with_client`] to change them.
#[derive(Clone)]
pub struct SupabaseTable {
    client: Client,
    config: SupabaseConfig,
}

impl fmt::Debug for SupabaseTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseTable")
            .field("config", &self.config)
            .finish()
    }
}

impl SupabaseTable {
    /// Create a new source with a default HTTP client.
    #[must_use]
    pub fn new(config: SupabaseConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create a new source with a custom HTTP client.
    #[must_use]
    pub const fn with_client(client: Client, config: SupabaseConfig) -> Self {
        Self { client, config }
    }

    /// Returns the connection settings.
    #[must_use]
    pub const fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    /// Build the request URL for a query.
    fn url(&self, query: &Query) -> Result<Url> {
        let mut url = self.config.table_endpoint()?;
        {
            let mut pairs = url.query_pairs_mut();

            let select = if query.columns().is_empty() {
                "*".to_string()
            } else {
                query.columns().join(",")
            };
            pairs.append_pair("select", &select);

            for filter in query.filters() {
                let value = match filter {
                    Filter::Eq(_, v) => format!("eq.{v}"),
                    Filter::Gte(_, v) => format!("gte.{v}"),
                    Filter::In(_, values) => {
                        let list: Vec<String> = values.iter().map(in_list_item).collect();
                        format!("in.({})", list.join(","))
                    }
                };
                pairs.append_pair(filter.column(), &value);
            }

            if let Some(order) = query.order() {
                let direction = match order.direction {
                    Direction::Ascending => "asc",
                    Direction::Descending => "desc",
                };
                pairs.append_pair("order", &format!("{}.{direction}", order.column));
            }

            if let Some(limit) = query.limit_value() {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        Ok(url)
    }
}

/// Render one member of an `in.(...)` list, quoting it if needed.
fn in_list_item(value: &FilterValue) -> String {
    let raw = value.to_string();
    if raw.contains(RESERVED) {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw
    }
}

/// Map a non-success response to an error.
fn status_error(status: StatusCode, retry_after: Option<Duration>, body: &str) -> TickerCacheError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            TickerCacheError::AuthenticationFailed(format!("HTTP {status}: {body}"))
        }
        StatusCode::TOO_MANY_REQUESTS => TickerCacheError::RateLimited { retry_after },
        _ => TickerCacheError::Network(format!("HTTP {status}: {body}")),
    }
}

#[async_trait]
impl TableSource for SupabaseTable {
    fn name(&self) -> &str {
        "Supabase"
    }

    async fn fetch(&self, query: &Query) -> Result<Vec<Row>> {
        let url = self.url(query)?;
        tracing::debug!(
            table = self.config.table(),
            filters = query.filters().len(),
            limit = ?query.limit_value(),
            "Supabase request"
        );

        let response = self
            .client
            .get(url)
            .header("apikey", self.config.key())
            .bearer_auth(self.config.key())
            .header("Accept-Profile", self.config.schema())
            .send()
            .await
            .map_err(|e| TickerCacheError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, retry_after, &text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| TickerCacheError::Network(e.to_string()))?;

        let rows: Vec<Row> = serde_json::from_str(&text)
            .map_err(|e| TickerCacheError::Parse(format!("{e}: {text}")))?;
        tracing::debug!(rows = rows.len(), "Supabase response");
        Ok(rows)
    }
}
