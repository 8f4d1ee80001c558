//! Query description passed to a [`TableSource`](crate::source::TableSource).
//!
//! A [`Query`] is a transport-neutral description of one read: which columns
//! to return, which rows to keep, how to order them, and how many to return.
//! Sources translate it into whatever their backend speaks.

use chrono::NaiveDate;
use std::fmt;

use crate::types::Symbol;

/// A literal compared against a column.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    /// A string literal.
    Text(String),
    /// A calendar date, rendered ISO-8601.
    Date(NaiveDate),
    /// A numeric literal.
    Number(f64),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&Symbol> for FilterValue {
    fn from(s: &Symbol) -> Self {
        Self::Text(s.as_str().to_string())
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// A row predicate on a single column.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq(String, FilterValue),
    /// `column >= value`; rows where the column is null never match.
    Gte(String, FilterValue),
    /// `column IN (values)`
    In(String, Vec<FilterValue>),
}

impl Filter {
    /// Returns the column this filter applies to.
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Eq(c, _) | Self::Gte(c, _) | Self::In(c, _) => c,
        }
    }
}

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// Ordering on a single column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    /// Column to order by.
    pub column: String,
    /// Sort direction.
    pub direction: Direction,
}

/// A read against the indicator table.
///
/// Built with chained methods:
///
/// ```
/// use ticker_core::{Direction, Query, Symbol};
///
/// let query = Query::all()
///     .eq("symbol", &Symbol::new("AAPL"))
///     .order_by("date", Direction::Descending)
///     .limit(30);
/// assert_eq!(query.filters().len(), 1);
/// assert_eq!(query.limit_value(), Some(30));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    columns: Vec<String>,
    filters: Vec<Filter>,
    order: Option<Order>,
    limit: Option<usize>,
}

impl Query {
    /// Creates a query returning every column.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Creates a query returning only the given columns.
    #[must_use]
    pub fn select(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            ..Self::default()
        }
    }

    /// Keeps rows where `column` equals `value`.
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    /// Keeps rows where `column` is at least `value`.
    #[must_use]
    pub fn gte(mut self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.filters
            .push(Filter::Gte(column.to_string(), value.into()));
        self
    }

    /// Keeps rows where `column` is one of `values`.
    #[must_use]
    pub fn in_list<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        self.filters.push(Filter::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Orders rows by `column`.
    #[must_use]
    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            direction,
        });
        self
    }

    /// Returns at most `n` rows.
    #[must_use]
    pub const fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Selected columns; empty means all columns.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row filters, all of which must match.
    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Requested ordering, if any.
    #[must_use]
    pub const fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    /// Requested row limit, if any.
    #[must_use]
    pub const fn limit_value(&self) -> Option<usize> {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_value_display() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
        assert_eq!(FilterValue::from(date).to_string(), "2025-01-03");
        assert_eq!(FilterValue::from(7.0).to_string(), "7");
        assert_eq!(FilterValue::from(7.25).to_string(), "7.25");
        assert_eq!(FilterValue::from(&Symbol::new("brk.b")).to_string(), "BRK.B");
    }

    #[test]
    fn test_builder() {
        let query = Query::select(&["symbol"])
            .eq("date", NaiveDate::from_ymd_opt(2025, 1, 13).unwrap())
            .gte("bullish_score", 7.0)
            .in_list("symbol", ["AAPL", "MSFT"])
            .order_by("symbol", Direction::Ascending)
            .limit(5);

        assert_eq!(query.columns(), ["symbol".to_string()]);
        assert_eq!(query.filters().len(), 3);
        assert_eq!(query.filters()[1].column(), "bullish_score");
        assert_eq!(
            query.filters()[2],
            Filter::In(
                "symbol".to_string(),
                vec![FilterValue::from("AAPL"), FilterValue::from("MSFT")]
            )
        );
        assert_eq!(query.order().unwrap().direction, Direction::Ascending);
        assert_eq!(query.limit_value(), Some(5));
    }

    #[test]
    fn test_all_has_no_constraints() {
        let query = Query::all();
        assert!(query.columns().is_empty());
        assert!(query.filters().is_empty());
        assert!(query.order().is_none());
        assert!(query.limit_value().is_none());
    }
}
