//! Score column definitions.
//!
//! This module defines [`ScoreType`], the closed set of composite score
//! columns that can be ranked with a top-N query.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TickerCacheError;
use crate::types::TickerRecord;

/// A composite score column in the indicator table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreType {
    /// `bullish_score`
    #[default]
    #[serde(rename = "bullish_score")]
    Bullish,
    /// `reversal_score`
    #[serde(rename = "reversal_score")]
    Reversal,
    /// `oversold_score`
    #[serde(rename = "oversold_score")]
    Oversold,
}

impl ScoreType {
    /// All score columns, in declaration order.
    pub const ALL: [Self; 3] = [Self::Bullish, Self::Reversal, Self::Oversold];

    /// Returns the column name of this score.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Bullish => "bullish_score",
            Self::Reversal => "reversal_score",
            Self::Oversold => "oversold_score",
        }
    }

    /// Reads this score from a record.
    #[must_use]
    pub const fn value(&self, record: &TickerRecord) -> Option<f64> {
        match self {
            Self::Bullish => record.bullish_score,
            Self::Reversal => record.reversal_score,
            Self::Oversold => record.oversold_score,
        }
    }
}

impl fmt::Display for ScoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for ScoreType {
    type Err = TickerCacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|score| score.column() == s)
            .ok_or_else(|| {
                TickerCacheError::InvalidParameter(format!(
                    "Unknown score type: {s}. Supported: bullish_score, reversal_score, oversold_score"
                ))
            })
    }
}
