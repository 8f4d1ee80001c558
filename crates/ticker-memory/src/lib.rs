#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ticker-cache/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! In-memory table source.
//!
//! This crate provides [`InMemoryTable`], an implementation of the
//! [`TableSource`] trait from `ticker-core` that serves rows from memory.

/// In-memory table implementation.
pub mod memory;

// Re-export the trait for convenience
pub use ticker_core::TableSource;

pub use memory::InMemoryTable;
