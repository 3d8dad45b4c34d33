use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::llm::ModelError;
use crate::sports::Selection;

/// Errors from the sports data path (client, cache, service).
#[derive(Debug, Clone, Error)]
pub enum DataError {
    /// Network or HTTP failure reported by the sports data client.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Fetch failed and no cached entry exists to fall back on.
    #[error("data unavailable for '{key}': {reason}")]
    Unavailable { key: String, reason: String },

    #[error("data fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Data-quality faults raised by the betting analysis engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("invalid decimal odds {0}: must be greater than 1.0")]
    InvalidOdds(Decimal),

    #[error("invalid stake {0}: must be greater than zero")]
    InvalidStake(Decimal),

    #[error("stake {stake} at odds {decimal_odds} is too large to settle")]
    StakeOverflow { stake: Decimal, decimal_odds: Decimal },

    #[error("incomplete market for fixture '{fixture_id}': {} selection(s) priced", .found.len())]
    IncompleteMarket {
        fixture_id: String,
        found: Vec<Selection>,
    },

    #[error("odds set spans more than one fixture")]
    MixedFixtures,
}

impl AnalysisError {
    /// Whether the user's stake, rather than market data, was rejected.
    pub fn is_stake_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidStake(_) | AnalysisError::StakeOverflow { .. }
        )
    }
}

/// Session lifecycle conditions. Internal only, never surfaced to callers.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("session '{session_id}' expired after {idle_secs}s idle")]
    Timeout { session_id: String, idle_secs: i64 },
}

/// Any failure that can end a conversation turn early.
///
/// The orchestrator converts every variant into a degraded result;
/// none of these cross the `handle_message` boundary.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl TurnError {
    /// Analysis faults indicate malformed input data rather than a transient
    /// failure. Stakes come from the user, not the data feed.
    pub fn is_data_quality(&self) -> bool {
        match self {
            TurnError::Analysis(err) => !err.is_stake_error(),
            _ => false,
        }
    }

    /// Short machine-readable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TurnError::Data(DataError::Upstream(_)) => "upstream_error",
            TurnError::Data(DataError::Unavailable { .. }) => "data_unavailable",
            TurnError::Data(DataError::Timeout(_)) => "data_timeout",
            TurnError::Analysis(AnalysisError::InvalidOdds(_)) => "invalid_odds",
            TurnError::Analysis(AnalysisError::InvalidStake(_)) => "invalid_stake",
            TurnError::Analysis(AnalysisError::StakeOverflow { .. }) => "stake_overflow",
            TurnError::Analysis(AnalysisError::IncompleteMarket { .. }) => "incomplete_market",
            TurnError::Analysis(AnalysisError::MixedFixtures) => "mixed_fixtures",
            TurnError::Model(ModelError::Timeout(_)) => "model_timeout",
            TurnError::Model(ModelError::MalformedOutput(_)) => "malformed_output",
            TurnError::Model(_) => "model_error",
        }
    }
}
