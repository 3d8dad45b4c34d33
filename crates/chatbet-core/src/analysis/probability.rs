use chatbet_types::error::AnalysisError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// `1 / decimal_odds`. Fails with [`AnalysisError::InvalidOdds`] unless `decimal_odds > 1.0`.
pub fn implied_probability(decimal_odds: Decimal) -> Result<Decimal, AnalysisError> {
    if decimal_odds <= Decimal::ONE {
        return Err(AnalysisError::InvalidOdds(decimal_odds));
    }
    Decimal::ONE
        .checked_div(decimal_odds)
        .ok_or(AnalysisError::InvalidOdds(decimal_odds))
}

/// Implied probability as a float, for scoring.
pub(crate) fn implied_probability_f64(decimal_odds: Decimal) -> Result<f64, AnalysisError> {
    implied_probability(decimal_odds)?
        .to_f64()
        .ok_or(AnalysisError::InvalidOdds(decimal_odds))
}
