//! Conversion of record collections into polars DataFrames.

use chrono::Datelike;
use polars::prelude::*;
use ticker_core::{Result, TickerCacheError, TickerRecord};

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Build a DataFrame from records, one row per record, sorted by symbol then date.
///
/// Columns: `symbol`, `date` (polars `Date`) and every numeric indicator and
/// score. Absent values become nulls. Score breakdowns and commentary are
/// not included.
pub fn records_to_frame(records: &[TickerRecord]) -> Result<DataFrame> {
    let mut sorted: Vec<&TickerRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.key().cmp(&b.key()));

    let f64_column = |name: &str, get: fn(&TickerRecord) -> Option<f64>| {
        Column::new(
            name.into(),
            sorted.iter().map(|r| get(r)).collect::<Vec<Option<f64>>>(),
        )
    };

    let symbols: Vec<&str> = sorted.iter().map(|r| r.symbol.as_str()).collect();
    let dates: Vec<i32> = sorted
        .iter()
        .map(|r| r.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
        .collect();
    let volumes: Vec<Option<u64>> = sorted.iter().map(|r| r.volume).collect();

    let df = DataFrame::new(vec![
        Column::new("symbol".into(), symbols),
        Column::new("date".into(), dates),
        f64_column("close", |r| r.close),
        f64_column("rsi", |r| r.rsi),
        f64_column("stoch_k", |r| r.stoch_k),
        f64_column("stoch_d", |r| r.stoch_d),
        f64_column("williams_r", |r| r.williams_r),
        f64_column("roc", |r| r.roc),
        f64_column("macd", |r| r.macd),
        f64_column("macd_signal", |r| r.macd_signal),
        f64_column("macd_hist", |r| r.macd_hist),
        f64_column("adx", |r| r.adx),
        f64_column("sma_20", |r| r.sma_20),
        f64_column("sma_50", |r| r.sma_50),
        f64_column("sma_200", |r| r.sma_200),
        f64_column("bb_upper", |r| r.bb_upper),
        f64_column("bb_lower", |r| r.bb_lower),
        f64_column("bb_position", |r| r.bb_position),
        f64_column("atr", |r| r.atr),
        Column::new("volume".into(), volumes),
        f64_column("volume_ratio", |r| r.volume_ratio),
        f64_column("obv", |r| r.obv),
        f64_column("bullish_score", |r| r.bullish_score),
        f64_column("reversal_score", |r| r.reversal_score),
        f64_column("oversold_score", |r| r.oversold_score),
        f64_column("divergence_strength", |r| r.divergence_strength),
        f64_column("price_52w_high", |r| r.price_52w_high),
        f64_column("pct_from_52w_high", |r| r.pct_from_52w_high),
    ])
    .map_err(|e| TickerCacheError::Parse(e.to_string()))?;

    df.lazy()
        .with_column(col("date").cast(DataType::Date))
        .collect()
        .map_err(|e| TickerCacheError::Parse(e.to_string()))
}
