//! In-memory table implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use ticker_core::{
    Direction, Filter, FilterValue, Query, Result, Row, TableSource, TickerRecord,
};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Simple in-memory indicator table for testing and development.
///
/// Rows are kept in insertion order inside a `RwLock`-protected `Vec`; that
/// order is the tie-break when a query's ordering leaves rows equal. Every
/// call to [`TableSource::fetch`] is counted, so tests can assert how many
/// requests an operation issued.
#[derive(Debug, Default)]
pub struct InMemoryTable {
    rows: RwLock<Vec<Row>>,
    requests: AtomicUsize,
}

impl InMemoryTable {
    /// Create a new empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table pre-populated with records.
    pub fn with_records<'a>(records: impl IntoIterator<Item = &'a TickerRecord>) -> Result<Self> {
        let rows = records
            .into_iter()
            .map(TickerRecord::to_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::with_rows(rows))
    }

    /// Create a table pre-populated with raw rows.
    #[must_use]
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows: RwLock::new(rows),
            requests: AtomicUsize::new(0),
        }
    }

    /// Append a record.
    pub async fn insert(&self, record: &TickerRecord) -> Result<()> {
        let row = record.to_row()?;
        self.rows.write().await.push(row);
        Ok(())
    }

    /// Append a raw row, which is not validated.
    pub async fn insert_row(&self, row: Row) {
        self.rows.write().await.push(row);
    }

    /// Number of rows held.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Returns true if the table holds no rows.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Number of queries served so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(AtomicOrdering::SeqCst)
    }
}

#[async_trait]
impl TableSource for InMemoryTable {
    fn name(&self) -> &str {
        "In-memory"
    }

    #[instrument(skip_all, fields(filters = query.filters().len(), limit = ?query.limit_value()))]
    async fn fetch(&self, query: &Query) -> Result<Vec<Row>> {
        self.requests.fetch_add(1, AtomicOrdering::SeqCst);

        let rows = self.rows.read().await;
        let mut matched: Vec<&Row> = rows
            .iter()
            .filter(|row| query.filters().iter().all(|f| row_matches(row, f)))
            .collect();

        if let Some(order) = query.order() {
            // `sort_by` is stable, so equal keys keep insertion order.
            matched.sort_by(|a, b| {
                compare_for_order(a.get(&order.column), b.get(&order.column), order.direction)
            });
        }

        if let Some(limit) = query.limit_value() {
            matched.truncate(limit);
        }

        let result: Vec<Row> = matched
            .into_iter()
            .map(|row| project(row, query.columns()))
            .collect();

        debug!("Served {} rows from memory", result.len());
        Ok(result)
    }
}

fn row_matches(row: &Row, filter: &Filter) -> bool {
    let value = row.get(filter.column());
    match filter {
        Filter::Eq(_, expected) => compare_to_literal(value, expected) == Some(Ordering::Equal),
        Filter::Gte(_, bound) => matches!(
            compare_to_literal(value, bound),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Filter::In(_, options) => options
            .iter()
            .any(|o| compare_to_literal(value, o) == Some(Ordering::Equal)),
    }
}

/// Compares a cell against a literal; `None` when the cell is null, missing or
/// of an incomparable type, which never satisfies a filter.
fn compare_to_literal(value: Option<&Value>, literal: &FilterValue) -> Option<Ordering> {
    let value = value?;
    match literal {
        FilterValue::Text(s) => value.as_str().map(|v| v.cmp(s.as_str())),
        FilterValue::Date(d) => value
            .as_str()
            .and_then(|v| v.parse::<NaiveDate>().ok())
            .map(|v| v.cmp(d)),
        FilterValue::Number(n) => value.as_f64().and_then(|v| v.partial_cmp(n)),
    }
}

/// Ordering with nulls last when ascending and first when descending.
fn compare_for_order(a: Option<&Value>, b: Option<&Value>, direction: Direction) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    let ascending = match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => compare_values(a, b),
    };
    match direction {
        Direction::Ascending => ascending,
        Direction::Descending => ascending.reverse(),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        // ISO-8601 dates order correctly as strings.
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn project(row: &Row, columns: &[String]) -> Row {
    if columns.is_empty() {
        return row.clone();
    }
    columns
        .iter()
        .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ticker_core::Symbol;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn record(symbol: &str, day: u32, bullish: Option<f64>) -> TickerRecord {
        let mut r = TickerRecord::new(Symbol::new(symbol), date(day));
        r.bullish_score = bullish;
        r
    }

    fn symbols(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r["symbol"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_filters() {
        let table = InMemoryTable::with_records(&[
            record("AAPL", 10, Some(8.0)),
            record("MSFT", 10, Some(6.0)),
            record("AAPL", 9, Some(7.0)),
            record("NVDA", 10, None),
        ])
        .unwrap();

        let rows = table
            .fetch(&Query::all().eq("symbol", "AAPL").eq("date", date(9)))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["bullish_score"], json!(7.0));

        let rows = table
            .fetch(&Query::all().gte("bullish_score", 7.0))
            .await
            .unwrap();
        assert_eq!(symbols(&rows), ["AAPL", "AAPL"]);

        let rows = table
            .fetch(&Query::all().in_list("symbol", ["MSFT", "NVDA", "TSLA"]))
            .await
            .unwrap();
        assert_eq!(symbols(&rows), ["MSFT", "NVDA"]);
    }

    #[tokio::test]
    async fn test_order_limit_and_projection() {
        let table = InMemoryTable::with_records(&[
            record("MSFT", 10, Some(6.0)),
            record("AAPL", 10, None),
            record("NVDA", 10, Some(9.0)),
        ])
        .unwrap();

        let rows = table
            .fetch(&Query::all().order_by("bullish_score", Direction::Descending))
            .await
            .unwrap();
        // Nulls sort first when descending.
        assert_eq!(symbols(&rows), ["AAPL", "NVDA", "MSFT"]);

        let rows = table
            .fetch(
                &Query::select(&["symbol"])
                    .order_by("symbol", Direction::Ascending)
                    .limit(2),
            )
            .await
            .unwrap();
        assert_eq!(symbols(&rows), ["AAPL", "MSFT"]);
        assert_eq!(rows[0].len(), 1);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let mut first = record("AAPL", 10, Some(1.0));
        first.close = Some(100.0);
        let mut second = record("AAPL", 10, Some(2.0));
        second.close = Some(200.0);
        let table = InMemoryTable::with_records(&[first, second]).unwrap();

        let rows = table
            .fetch(&Query::all().order_by("date", Direction::Descending).limit(1))
            .await
            .unwrap();
        assert_eq!(rows[0]["close"], json!(100.0));
    }

    #[tokio::test]
    async fn test_request_count_and_inserts() {
        let table = InMemoryTable::new();
        assert!(table.is_empty().await);
        assert_eq!(table.request_count(), 0);

        table.insert(&record("AAPL", 10, None)).await.unwrap();
        table
            .insert_row(json!({"symbol": "MSFT", "date": "2025-01-10"}).as_object().unwrap().clone())
            .await;
        assert_eq!(table.len().await, 2);

        table.fetch(&Query::all()).await.unwrap();
        table.fetch(&Query::all()).await.unwrap();
        assert_eq!(table.request_count(), 2);
    }
}
