//! Core data types for daily indicator records.
//!
//! This module defines the record model:
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`TickerRecord`] - One ticker-day observation of indicators and scores
//! - [`ScoreComponents`] - Open breakdown of a composite score
//! - [`DivergenceType`] - Price/momentum divergence classification
//! - [`ReversalConviction`] - Conviction bucket for the reversal score

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TickerCacheError};
use crate::source::Row;

/// A trading symbol/ticker.
///
/// Symbols are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, trimming and converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the symbol is empty after normalisation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let symbol = Self::new(raw);
        if symbol.is_empty() {
            return Err(serde::de::Error::custom("symbol must not be empty"));
        }
        Ok(symbol)
    }
}

/// Divergence between price action and momentum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DivergenceType {
    /// Price makes a lower low while momentum makes a higher low.
    Bullish,
    /// Price makes a higher high while momentum makes a lower high.
    Bearish,
    /// No divergence detected.
    #[default]
    None,
}

/// Conviction bucket attached to the reversal score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReversalConviction {
    /// Strong confirmation from volume and trend strength.
    High,
    /// Partial confirmation.
    Medium,
    /// Weak confirmation.
    Low,
    /// No reversal setup.
    #[default]
    None,
}

/// Named contributions that make up a composite score.
///
/// Component names are chosen upstream and may change between releases, so
/// this is an open mapping rather than a fixed struct.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreComponents(BTreeMap<String, f64>);

impl ScoreComponents {
    /// Returns the contribution of a named component.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Returns the number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over `(name, contribution)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Sum of all contributions.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }
}

impl FromIterator<(String, f64)> for ScoreComponents {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Daily indicator data for a single ticker.
///
/// Every field except `symbol` and `date` is optional: upstream leaves an
/// indicator empty when there is not enough history to compute it. Records
/// are plain values; the `(symbol, date)` pair identifies one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerRecord {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Trading day of the observation.
    pub date: NaiveDate,

    // Price
    /// Closing price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<f64>,

    // Momentum
    /// Relative strength index (0-100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
    /// Stochastic %K (0-100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stoch_k: Option<f64>,
    /// Stochastic %D (0-100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stoch_d: Option<f64>,
    /// Williams %R (-100-0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub williams_r: Option<f64>,
    /// Rate of change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roc: Option<f64>,

    // Trend
    /// MACD line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd: Option<f64>,
    /// MACD signal line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd_signal: Option<f64>,
    /// MACD histogram.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd_hist: Option<f64>,
    /// Average directional index (0-100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adx: Option<f64>,

    // Moving averages
    /// 20-day simple moving average.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sma_20: Option<f64>,
    /// 50-day simple moving average.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sma_50: Option<f64>,
    /// 200-day simple moving average.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sma_200: Option<f64>,

    // Volatility
    /// Upper Bollinger band.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bb_upper: Option<f64>,
    /// Lower Bollinger band.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bb_lower: Option<f64>,
    /// Position of the close within the bands (0-1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bb_position: Option<f64>,
    /// Average true range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atr: Option<f64>,

    // Volume
    /// Shares traded.
    #[serde(
        default,
        deserialize_with = "deserialize_volume",
        skip_serializing_if = "Option::is_none"
    )]
    pub volume: Option<u64>,
    /// Volume relative to its recent average.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_ratio: Option<f64>,
    /// On-balance volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obv: Option<f64>,

    // Scores (0-10 scale)
    /// Bullish composite score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullish_score: Option<f64>,
    /// Reversal composite score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversal_score: Option<f64>,
    /// Oversold composite score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oversold_score: Option<f64>,

    // Score breakdowns
    /// Contributions to the bullish score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullish_components: Option<ScoreComponents>,
    /// Contributions to the reversal score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversal_components: Option<ScoreComponents>,
    /// Contributions to the oversold score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oversold_components: Option<ScoreComponents>,

    // Reversal details
    /// Conviction bucket for the reversal score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversal_conviction: Option<ReversalConviction>,
    /// Reversal score before multipliers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversal_raw_score: Option<f64>,
    /// Volume confirmation multiplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversal_volume_multiplier: Option<f64>,
    /// Trend strength multiplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversal_adx_multiplier: Option<f64>,

    // Divergence
    /// Kind of divergence detected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divergence_type: Option<DivergenceType>,
    /// Strength of the divergence (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divergence_strength: Option<f64>,

    // 52-week context
    /// 52-week high price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_52w_high: Option<f64>,
    /// Percent distance of the close from the 52-week high (usually <= 0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pct_from_52w_high: Option<f64>,

    // AI commentary
    /// Free-text explanation of the bullish score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_bullish_reason: Option<String>,
    /// Free-text technical summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_tech_summary: Option<String>,
}

impl TickerRecord {
    /// Creates a record with only the identity fields set.
    #[must_use]
    pub fn new(symbol: Symbol, date: NaiveDate) -> Self {
        Self {
            symbol,
            date,
            ..Default::default()
        }
    }

    /// Maps one row of the indicator table into a record.
    ///
    /// Missing and `null` columns become `None`. Unknown columns are ignored.
    /// A row without `symbol`/`date`, or with a column of the wrong type,
    /// fails with [`TickerCacheError::Parse`].
    pub fn from_row(row: &Row) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(row.clone())).map_err(|e| {
            let symbol = row
                .get("symbol")
                .and_then(|v| v.as_str())
                .unwrap_or("<unknown>");
            TickerCacheError::Parse(format!("Failed to map row for {symbol}: {e}"))
        })
    }

    /// Converts the record back into a row, omitting absent fields.
    pub fn to_row(&self) -> Result<Row> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(TickerCacheError::Parse(format!(
                "Record serialized to a non-object value: {other}"
            ))),
        }
    }

    /// Returns the `(symbol, date)` pair identifying this record.
    #[must_use]
    pub fn key(&self) -> (&Symbol, NaiveDate) {
        (&self.symbol, self.date)
    }
}

/// Accepts volume as an integer or as an integral float (`1200000.0`).
fn deserialize_volume<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_json::Number>::deserialize(deserializer)? {
        None => Ok(None),
        Some(n) => {
            if let Some(v) = n.as_u64() {
                return Ok(Some(v));
            }
            match n.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 => {
                    Ok(Some(f as u64))
                }
                _ => Err(D::Error::custom(format!(
                    "volume must be a non-negative integer, got {n}"
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_symbol_normalization() {
        assert_eq!(Symbol::new(" aapl ").as_str(), "AAPL");
        assert_eq!(Symbol::from("msft"), Symbol::new("MSFT"));
        assert!(Symbol::new("  ").is_empty());
    }

    #[test]
    fn test_from_row() {
        let record = TickerRecord::from_row(&row(json!({
            "symbol": "AAPL",
            "date": "2025-01-13",
            "close": 150.25,
            "rsi": 45.5,
            "bullish_score": 7.5,
            "volume": 52_000_000,
            "divergence_type": "bullish",
            "reversal_conviction": "HIGH",
            "bullish_components": {"trend": 2.5, "momentum": 1.75},
            "ai_tech_summary": "Holding above the 50-day.",
        })))
        .unwrap();

        assert_eq!(record.symbol.as_str(), "AAPL");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 1, 13).unwrap());
        assert_eq!(record.close, Some(150.25));
        assert_eq!(record.rsi, Some(45.5));
        assert_eq!(record.bullish_score, Some(7.5));
        assert_eq!(record.volume, Some(52_000_000));
        assert_eq!(record.divergence_type, Some(DivergenceType::Bullish));
        assert_eq!(record.reversal_conviction, Some(ReversalConviction::High));

        let components = record.bullish_components.unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(components.get("trend"), Some(2.5));
        assert!((components.total() - 4.25).abs() < 1e-12);
        let names: Vec<_> = components.iter().map(|(name, _)| name).collect();
        assert!(names.windows(2).all(|w| w[0] < w[1]));
        assert!(names.contains(&"trend"));
    }

    #[test]
    fn test_from_row_identity_only() {
        let record = TickerRecord::from_row(&row(json!({
            "symbol": "AAPL",
            "date": "2025-01-13",
        })))
        .unwrap();

        let expected = TickerRecord::new(
            Symbol::new("AAPL"),
            NaiveDate::from_ymd_opt(2025, 1, 13).unwrap(),
        );
        assert_eq!(record, expected);
        assert!(record.close.is_none());
        assert!(record.bullish_components.is_none());
        assert!(record.divergence_type.is_none());
        assert!(record.ai_bullish_reason.is_none());
    }

    #[test]
    fn test_from_row_nulls_and_unknown_columns() {
        let record = TickerRecord::from_row(&row(json!({
            "id": 9182,
            "symbol": "aapl",
            "date": "2025-01-13",
            "close": null,
            "rsi": null,
            "created_at": "2025-01-13T22:01:03+00:00",
        })))
        .unwrap();

        assert_eq!(record.symbol.as_str(), "AAPL");
        assert!(record.close.is_none());
        assert!(record.rsi.is_none());
    }

    #[test]
    fn test_from_row_integral_float_volume() {
        let record = TickerRecord::from_row(&row(json!({
            "symbol": "AAPL",
            "date": "2025-01-13",
            "volume": 1_200_000.0,
        })))
        .unwrap();
        assert_eq!(record.volume, Some(1_200_000));

        let err = TickerRecord::from_row(&row(json!({
            "symbol": "AAPL",
            "date": "2025-01-13",
            "volume": 12.5,
        })))
        .unwrap_err();
        assert!(matches!(err, TickerCacheError::Parse(_)));
    }

    #[test]
    fn test_from_row_volume_out_of_range() {
        // 2^64 is an integral float that does not fit in u64.
        let err = TickerRecord::from_row(&row(json!({
            "symbol": "AAPL",
            "date": "2025-01-13",
            "volume": 18_446_744_073_709_551_616.0,
        })))
        .unwrap_err();
        assert!(matches!(err, TickerCacheError::Parse(_)));
    }

    #[test]
    fn test_from_row_malformed() {
        let wrong_type = TickerRecord::from_row(&row(json!({
            "symbol": "AAPL",
            "date": "2025-01-13",
            "rsi": "high",
        })))
        .unwrap_err();
        assert!(matches!(wrong_type, TickerCacheError::Parse(ref msg) if msg.contains("AAPL")));
        assert!(!wrong_type.is_not_found());

        let bad_date = TickerRecord::from_row(&row(json!({
            "symbol": "AAPL",
            "date": "13/01/2025",
        })));
        assert!(matches!(bad_date, Err(TickerCacheError::Parse(_))));

        let missing_date = TickerRecord::from_row(&row(json!({ "symbol": "AAPL" })));
        assert!(matches!(missing_date, Err(TickerCacheError::Parse(_))));

        let empty_symbol = TickerRecord::from_row(&row(json!({
            "symbol": "",
            "date": "2025-01-13",
        })));
        assert!(matches!(empty_symbol, Err(TickerCacheError::Parse(_))));

        let unknown_divergence = TickerRecord::from_row(&row(json!({
            "symbol": "AAPL",
            "date": "2025-01-13",
            "divergence_type": "sideways",
        })));
        assert!(matches!(unknown_divergence, Err(TickerCacheError::Parse(_))));
    }

    #[test]
    fn test_to_row_omits_absent_fields() {
        let mut record = TickerRecord::new(
            Symbol::new("AAPL"),
            NaiveDate::from_ymd_opt(2025, 1, 13).unwrap(),
        );
        record.close = Some(150.25);
        record.rsi = Some(45.5);

        let row = record.to_row().unwrap();
        assert_eq!(row["symbol"], json!("AAPL"));
        assert_eq!(row["date"], json!("2025-01-13"));
        assert_eq!(row["close"], json!(150.25));
        assert_eq!(row["rsi"], json!(45.5));
        assert!(!row.contains_key("macd"));
        assert_eq!(row.len(), 4);

        assert_eq!(TickerRecord::from_row(&row).unwrap(), record);
    }

    #[test]
    fn test_key() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 13).unwrap();
        let record = TickerRecord::new(Symbol::new("AAPL"), date);
        assert_eq!(record.key(), (&Symbol::new("AAPL"), date));
    }
}
