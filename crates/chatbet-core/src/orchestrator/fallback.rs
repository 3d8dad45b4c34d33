//! Safe narratives for degraded turns, and how their causes are logged.

use chatbet_types::error::TurnError;
use chatbet_types::llm::ModelError;
use tracing::{error, warn};

pub const DATA_UNAVAILABLE: &str =
    "Sports data is temporarily unavailable. Please try again in a moment.";

pub const MODEL_UNAVAILABLE: &str =
    "I'm having trouble answering right now. Please try again shortly.";

pub const NOT_UNDERSTOOD: &str =
    "Sorry, I couldn't work that out. Could you rephrase your question?";

pub const BAD_MARKET_DATA: &str = "I couldn't analyse the odds for that request because the \
market data looks incomplete or invalid. Try asking about another match.";

pub const INVALID_STAKE: &str = "I can only simulate a bet with a stake greater than zero \
and within a sensible range. What amount would you like to try?";

/// The narrative returned for a turn that ended with `err`.
pub fn narrative_for(err: &TurnError) -> &'static str {
    match err {
        TurnError::Data(_) => DATA_UNAVAILABLE,
        TurnError::Analysis(err) if err.is_stake_error() => INVALID_STAKE,
        TurnError::Analysis(_) => BAD_MARKET_DATA,
        TurnError::Model(ModelError::MalformedOutput(_)) => NOT_UNDERSTOOD,
        TurnError::Model(_) => MODEL_UNAVAILABLE,
    }
}

/// Data-quality faults are logged as errors under their own target;
/// transient upstream and model faults as warnings.
pub fn log_failure(session_id: &str, err: &TurnError) {
    if err.is_data_quality() {
        error!(
            target: "chatbet::data_quality",
            %session_id,
            kind = err.kind(),
            error = %err,
            "analysis rejected input data"
        );
    } else {
        warn!(%session_id, kind = err.kind(), error = %err, "turn degraded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbet_types::error::{AnalysisError, DataError};
    use rust_decimal::Decimal;
    use std::time::Duration;

    #[test]
    fn each_failure_family_has_its_own_narrative() {
        let data = TurnError::from(DataError::Upstream("500".into()));
        let analysis = TurnError::from(AnalysisError::MixedFixtures);
        let timeout = TurnError::from(ModelError::Timeout(Duration::from_secs(30)));
        let malformed = TurnError::from(ModelError::MalformedOutput("x".into()));

        assert_eq!(narrative_for(&data), DATA_UNAVAILABLE);
        assert_eq!(narrative_for(&analysis), BAD_MARKET_DATA);
        assert_eq!(narrative_for(&timeout), MODEL_UNAVAILABLE);
        assert_eq!(narrative_for(&malformed), NOT_UNDERSTOOD);
    }

    #[test]
    fn rejected_stake_asks_for_a_positive_amount() {
        let zero = TurnError::from(AnalysisError::InvalidStake(Decimal::ZERO));
        let huge = TurnError::from(AnalysisError::StakeOverflow {
            stake: Decimal::MAX,
            decimal_odds: Decimal::TWO,
        });

        assert_eq!(narrative_for(&zero), INVALID_STAKE);
        assert_eq!(narrative_for(&huge), INVALID_STAKE);
        assert!(!INVALID_STAKE.contains("market data"));
    }

    #[test]
    fn narratives_never_leak_error_details() {
        let err = TurnError::from(ModelError::MalformedOutput("expected `}` at line 3".into()));
        assert!(!narrative_for(&err).contains("line 3"));
    }
}
