//! Transport trait for reading the indicator table.
//!
//! A [`TableSource`] executes a [`Query`] and hands back raw rows. The cache
//! client owns all record mapping and query policy; sources only move rows.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::Result, query::Query};

/// One row of the indicator table: column name to JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A readable table of daily indicator rows.
///
/// Implementations must apply every filter, the ordering and the limit of the
/// query. Ties under the requested ordering keep the backend's natural order.
#[async_trait]
pub trait TableSource: Send + Sync + Debug {
    /// Returns the name of this source (e.g., "Supabase").
    fn name(&self) -> &str;

    /// Executes a query and returns the matching rows.
    async fn fetch(&self, query: &Query) -> Result<Vec<Row>>;
}
