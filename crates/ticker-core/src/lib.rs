#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ticker-cache/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types for the daily ticker indicator cache.
//!
//! This crate provides the pieces shared by every table source and the client:
//!
//! - [`TickerRecord`](types::TickerRecord) - One ticker-day of indicators and scores
//! - [`TickerCacheError`](error::TickerCacheError) - Error taxonomy
//! - [`ScoreType`](score::ScoreType) - Rankable score columns
//! - [`Query`](query::Query) - Transport-neutral read description
//! - [`TableSource`](source::TableSource) - Transport abstraction

/// Error types for cache operations.
pub mod error;
/// Query description types.
pub mod query;
/// Score column definitions.
pub mod score;
/// Table source trait.
pub mod source;
/// Record model (Symbol, TickerRecord, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use error::{Result, TickerCacheError};
pub use query::{Direction, Filter, FilterValue, Order, Query};
pub use score::ScoreType;
pub use source::{Row, TableSource};
pub use types::{DivergenceType, ReversalConviction, ScoreComponents, Symbol, TickerRecord};
