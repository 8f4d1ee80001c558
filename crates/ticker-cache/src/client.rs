//! Read-only cache client over a [`TableSource`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, instrument};

use ticker_core::{
    Direction, Query, Result, Row, ScoreType, Symbol, TableSource, TickerCacheError, TickerRecord,
};

/// Default number of days returned by [`TickerCache::get_history`].
pub const DEFAULT_HISTORY_DAYS: usize = 30;

/// Default number of rows returned by [`TickerCache::get_top_scores`].
pub const DEFAULT_TOP_LIMIT: usize = 10;

/// Default threshold for [`TickerCache::get_top_scores`].
pub const DEFAULT_MIN_SCORE: f64 = 0.0;

/// Read-only client for the daily indicator table.
///
/// The client holds nothing but its source. Each operation issues its own
/// request(s) and maps the rows it gets back; nothing is remembered between
/// calls, so the latest snapshot date is looked up afresh every time it is
/// needed.
///
/// Lookups of a single record fail with [`TickerCacheError::NotFound`] when
/// there is no row. Operations returning collections return an empty
/// collection instead.
///
/// # Example
///
/// ```rust,ignore
/// use ticker_cache::{Symbol, TickerCache};
///
/// let cache = TickerCache::from_env()?;
/// let record = cache.get(&Symbol::new("AAPL"), None).await?;
/// println!("RSI: {:?}, Bullish Score: {:?}", record.rsi, record.bullish_score);
/// ```
#[derive(Clone)]
pub struct TickerCache {
    source: Arc<dyn TableSource>,
}

impl std::fmt::Debug for TickerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickerCache")
            .field("source", &self.source.name())
            .finish()
    }
}

impl TickerCache {
    /// Create a client reading from the given source.
    #[must_use]
    pub fn new(source: Arc<dyn TableSource>) -> Self {
        Self { source }
    }

    /// Create a client reading from Supabase with the given settings.
    #[cfg(feature = "supabase")]
    #[must_use]
    pub fn from_config(config: ticker_supabase::SupabaseConfig) -> Self {
        Self::new(Arc::new(ticker_supabase::SupabaseTable::new(config)))
    }

    /// Create a client reading from Supabase, configured from
    /// `SUPABASE_URL` and `SUPABASE_ANON_KEY`.
    ///
    /// Fails with [`TickerCacheError::NotConfigured`] before any request if
    /// either variable is missing or malformed.
    #[cfg(feature = "supabase")]
    pub fn from_env() -> Result<Self> {
        ticker_supabase::SupabaseConfig::from_env().map(Self::from_config)
    }

    /// Returns the name of the underlying source.
    #[must_use]
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    async fn fetch_records(&self, query: &Query) -> Result<Vec<TickerRecord>> {
        self.source
            .fetch(query)
            .await?
            .iter()
            .map(TickerRecord::from_row)
            .collect()
    }

    /// Returns the most recent date with data, or `None` if the table is empty.
    #[instrument(skip(self))]
    pub async fn latest_date(&self) -> Result<Option<NaiveDate>> {
        let query = Query::select(&["date"])
            .order_by("date", Direction::Descending)
            .limit(1);
        let rows = self.source.fetch(&query).await?;
        rows.first().map(row_date).transpose()
    }

    /// Get indicator data for a single ticker.
    ///
    /// Without `target_date` this is the most recent row for the symbol;
    /// otherwise the row for exactly that date. When several rows qualify the
    /// first one the source returns wins.
    ///
    /// # Errors
    ///
    /// [`TickerCacheError::NotFound`] if no row matches.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn get(&self, symbol: &Symbol, target_date: Option<NaiveDate>) -> Result<TickerRecord> {
        require_symbol(symbol)?;

        let query = Query::all().eq("symbol", symbol);
        let query = match target_date {
            Some(date) => query.eq("date", date),
            None => query.order_by("date", Direction::Descending),
        }
        .limit(1);

        let records = self.fetch_records(&query).await?;
        debug!("Fetched {} rows", records.len());
        records
            .into_iter()
            .next()
            .ok_or_else(|| TickerCacheError::NotFound {
                symbol: symbol.to_string(),
                date: target_date,
            })
    }

    /// Get the most recent record for each of several tickers.
    ///
    /// Symbols without data are left out of the result rather than reported
    /// as errors. Duplicates in `symbols` are harmless.
    ///
    /// Each distinct symbol is resolved with the same single-row query as
    /// [`get`](Self::get), so a response cap on the source cannot hide a
    /// symbol whose latest row is old.
    #[instrument(skip(self, symbols), fields(count = symbols.len()))]
    pub async fn get_batch(&self, symbols: &[Symbol]) -> Result<BTreeMap<Symbol, TickerRecord>> {
        self.resolve_each(symbols, None).await
    }

    /// Get the records of several tickers on one date.
    ///
    /// Symbols without a row on `date` are left out of the result.
    #[instrument(skip(self, symbols), fields(count = symbols.len()))]
    pub async fn get_batch_on(
        &self,
        symbols: &[Symbol],
        date: NaiveDate,
    ) -> Result<BTreeMap<Symbol, TickerRecord>> {
        self.resolve_each(symbols, Some(date)).await
    }

    /// Runs [`get`](Self::get) for every distinct symbol, skipping those not found.
    async fn resolve_each(
        &self,
        symbols: &[Symbol],
        target_date: Option<NaiveDate>,
    ) -> Result<BTreeMap<Symbol, TickerRecord>> {
        let wanted = symbol_set(symbols);
        let mut batch = BTreeMap::new();

        for symbol in &wanted {
            match self.get(symbol, target_date).await {
                Ok(record) => {
                    batch.insert(symbol.clone(), record);
                }
                Err(TickerCacheError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        debug!("Resolved {} of {} symbols", batch.len(), wanted.len());
        Ok(batch)
    }

    /// List the tickers present on the latest snapshot date, sorted ascending.
    ///
    /// Returns an empty list if the table holds no data.
    #[instrument(skip(self))]
    pub async fn list_tickers(&self) -> Result<Vec<Symbol>> {
        match self.latest_date().await? {
            Some(date) => self.list_tickers_on(date).await,
            None => Ok(Vec::new()),
        }
    }

    /// List the tickers present on `date`, sorted ascending.
    #[instrument(skip(self))]
    pub async fn list_tickers_on(&self, date: NaiveDate) -> Result<Vec<Symbol>> {
        let query = Query::select(&["symbol"])
            .eq("date", date)
            .order_by("symbol", Direction::Ascending);
        let rows = self.source.fetch(&query).await?;

        let mut symbols = rows.iter().map(row_symbol).collect::<Result<Vec<_>>>()?;
        symbols.sort();
        symbols.dedup();
        debug!("Listed {} tickers", symbols.len());
        Ok(symbols)
    }

    /// Get the highest-scoring tickers on the latest snapshot date.
    ///
    /// `score_type` must be one of `bullish_score`, `reversal_score` or
    /// `oversold_score`. See [`top_scores`](Self::top_scores) for the rest.
    ///
    /// # Errors
    ///
    /// [`TickerCacheError::InvalidParameter`] for an unknown score type,
    /// raised before any request.
    pub async fn get_top_scores(
        &self,
        score_type: &str,
        min_score: f64,
        limit: usize,
    ) -> Result<Vec<TickerRecord>> {
        let score = score_type.parse::<ScoreType>()?;
        self.top_scores(score, min_score, limit).await
    }

    /// Get up to `limit` records from the latest snapshot date whose `score`
    /// is at least `min_score`, highest first.
    #[instrument(skip(self))]
    pub async fn top_scores(
        &self,
        score: ScoreType,
        min_score: f64,
        limit: usize,
    ) -> Result<Vec<TickerRecord>> {
        require_finite(min_score)?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        match self.latest_date().await? {
            Some(date) => self.top_scores_on(score, min_score, limit, date).await,
            None => Ok(Vec::new()),
        }
    }

    /// Like [`top_scores`](Self::top_scores), for a specific date.
    #[instrument(skip(self))]
    pub async fn top_scores_on(
        &self,
        score: ScoreType,
        min_score: f64,
        limit: usize,
        date: NaiveDate,
    ) -> Result<Vec<TickerRecord>> {
        require_finite(min_score)?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let query = Query::all()
            .eq("date", date)
            .gte(score.column(), min_score)
            .order_by(score.column(), Direction::Descending)
            .limit(limit);
        let records = self.fetch_records(&query).await?;

        debug!("Found {} tickers with {score} >= {min_score}", records.len());
        Ok(records)
    }

    /// Get up to `days` of the most recent history for a ticker, oldest first.
    ///
    /// A symbol with no rows yields an empty list, not an error.
    ///
    /// # Errors
    ///
    /// [`TickerCacheError::InvalidParameter`] if `days` is zero.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn get_history(&self, symbol: &Symbol, days: usize) -> Result<Vec<TickerRecord>> {
        require_symbol(symbol)?;
        if days == 0 {
            return Err(TickerCacheError::InvalidParameter(
                "days must be a positive integer".to_string(),
            ));
        }

        // Duplicated dates use up limit slots, so widen the window until it
        // holds `days` distinct dates or the symbol runs out of rows.
        let mut limit = days;
        let mut records = loop {
            let query = Query::all()
                .eq("symbol", symbol)
                .order_by("date", Direction::Descending)
                .limit(limit);
            let mut records = self.fetch_records(&query).await?;
            let fetched = records.len();

            // Selected newest first; keep the first row of any duplicated date.
            records.dedup_by_key(|r| r.date);
            if records.len() >= days || fetched < limit {
                break records;
            }
            limit = limit.saturating_mul(2);
        };

        records.truncate(days);
        records.reverse();
        debug!("Fetched {} days of history", records.len());
        Ok(records)
    }
}

fn require_symbol(symbol: &Symbol) -> Result<()> {
    if symbol.is_empty() {
        return Err(TickerCacheError::InvalidParameter(
            "symbol must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn require_finite(min_score: f64) -> Result<()> {
    if !min_score.is_finite() {
        return Err(TickerCacheError::InvalidParameter(format!(
            "min_score must be finite, got {min_score}"
        )));
    }
    Ok(())
}

fn symbol_set(symbols: &[Symbol]) -> BTreeSet<Symbol> {
    symbols.iter().filter(|s| !s.is_empty()).cloned().collect()
}

fn row_date(row: &Row) -> Result<NaiveDate> {
    row.get("date")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<NaiveDate>().ok())
        .ok_or_else(|| TickerCacheError::Parse(format!("Row has no valid date: {row:?}")))
}

fn row_symbol(row: &Row) -> Result<Symbol> {
    row.get("symbol")
        .and_then(|v| v.as_str())
        .map(Symbol::new)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TickerCacheError::Parse(format!("Row has no valid symbol: {row:?}")))
}
