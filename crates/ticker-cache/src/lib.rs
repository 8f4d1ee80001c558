#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ticker-cache/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Read-only client for precomputed daily stock indicators.
//!
//! This crate re-exports the core record and error types, the available
//! table sources, and provides [`TickerCache`], the query client.
//!
//! # Features
//!
//! - `supabase` - Supabase REST source and environment-based construction
//! - `polars` - Conversion of records into a polars DataFrame
//!
//! # Example
//!
//! ```rust,ignore
//! use ticker_cache::{Symbol, TickerCache};
//!
//! #[tokio::main]
//! async fn main() -> ticker_cache::Result<()> {
//!     let cache = TickerCache::from_env()?;
//!
//!     for record in cache.get_top_scores("bullish_score", 7.0, 10).await? {
//!         println!("{} {:?}", record.symbol, record.bullish_score);
//!     }
//!
//!     let history = cache.get_history(&Symbol::new("AAPL"), 30).await?;
//!     println!("{} days of AAPL", history.len());
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use ticker_core::*;

// Sources
pub use ticker_memory::InMemoryTable;
#[cfg(feature = "supabase")]
pub use ticker_supabase::{SupabaseConfig, SupabaseTable};

mod client;
pub use client::{DEFAULT_HISTORY_DAYS, DEFAULT_MIN_SCORE, DEFAULT_TOP_LIMIT, TickerCache};

#[cfg(feature = "polars")]
mod frame;
#[cfg(feature = "polars")]
pub use frame::records_to_frame;
