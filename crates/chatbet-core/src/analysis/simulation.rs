use chatbet_types::analysis::BetSimulation;
use chatbet_types::error::AnalysisError;
use chatbet_types::sports::{FixtureOdds, Selection};
use rust_decimal::Decimal;

/// Simulate a wager: `payout = stake * odds`, `profit = payout - stake`.
///
/// Fails with [`AnalysisError::InvalidStake`] when `stake <= 0`, with
/// [`AnalysisError::InvalidOdds`] when `decimal_odds <= 1.0`, and with
/// [`AnalysisError::StakeOverflow`] when the payout does not fit a `Decimal`.
pub fn simulate(stake: Decimal, decimal_odds: Decimal) -> Result<BetSimulation, AnalysisError> {
    if stake <= Decimal::ZERO {
        return Err(AnalysisError::InvalidStake(stake));
    }
    if decimal_odds <= Decimal::ONE {
        return Err(AnalysisError::InvalidOdds(decimal_odds));
    }
    let overflow = || AnalysisError::StakeOverflow { stake, decimal_odds };
    let payout = stake.checked_mul(decimal_odds).ok_or_else(overflow)?;
    let profit = payout.checked_sub(stake).ok_or_else(overflow)?;
    Ok(BetSimulation {
        stake,
        selection: None,
        fixture_id: None,
        description: None,
        decimal_odds,
        payout,
        profit,
    })
}

/// Simulate `stake` on every match-result selection of each fixture.
///
/// Ordered by profit descending, then fixture id and selection; at most `limit` entries.
pub fn simulate_across(
    stake: Decimal,
    priced: &[FixtureOdds],
    limit: usize,
) -> Result<Vec<BetSimulation>, AnalysisError> {
    let mut simulations = Vec::new();
    for entry in priced {
        for selection in [Selection::Home, Selection::Draw, Selection::Away] {
            let Some(quote) = entry.price(selection) else {
                continue;
            };
            let mut sim = simulate(stake, quote.decimal_odds)?;
            sim.selection = Some(selection);
            sim.fixture_id = Some(entry.fixture.id.clone());
            sim.description = Some(format!(
                "{} ({})",
                selection.describe(&entry.fixture),
                entry.fixture.label()
            ));
            simulations.push(sim);
        }
    }
    simulations.sort_by(|a, b| {
        b.profit
            .cmp(&a.profit)
            .then_with(|| a.fixture_id.cmp(&b.fixture_id))
            .then_with(|| a.selection.cmp(&b.selection))
    });
    simulations.truncate(limit);
    Ok(simulations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbet_types::sports::{Fixture, FixtureStatus, OddsQuote};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn hundred_at_two_fifty() {
        let sim = simulate(dec!(100), dec!(2.50)).unwrap();
        assert_eq!(sim.payout, dec!(250.00));
        assert_eq!(sim.profit, dec!(150.00));
    }

    #[test]
    fn profit_is_exactly_stake_times_odds_minus_one() {
        let stakes = [dec!(0.01), dec!(0.1), dec!(1), dec!(7.77), dec!(33.33), dec!(1000)];
        let odds = [dec!(1.01), dec!(1.1), dec!(1.333), dec!(2.10), dec!(3.40), dec!(17.5)];
        for stake in stakes {
            for price in odds {
                let sim = simulate(stake, price).unwrap();
                assert_eq!(sim.profit, stake * (price - Decimal::ONE), "{stake} @ {price}");
            }
        }
    }

    #[test]
    fn rejects_non_positive_stake() {
        assert_eq!(simulate(dec!(0), dec!(2)), Err(AnalysisError::InvalidStake(dec!(0))));
        assert_eq!(simulate(dec!(-5), dec!(2)), Err(AnalysisError::InvalidStake(dec!(-5))));
    }

    #[test]
    fn payout_beyond_decimal_range_is_rejected() {
        let err = simulate(Decimal::MAX, dec!(2.50)).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::StakeOverflow {
                stake: Decimal::MAX,
                decimal_odds: dec!(2.50)
            }
        );
    }

    #[test]
    fn simulate_across_rejects_overflowing_stake() {
        let now = Utc::now();
        let fixture = Fixture {
            id: "f1".to_string(),
            home_team: "Liverpool".to_string(),
            away_team: "Chelsea".to_string(),
            tournament_id: "t".to_string(),
            tournament_name: None,
            sport_id: 1,
            kickoff_time: now,
            status: FixtureStatus::Scheduled,
        };
        let priced = vec![FixtureOdds {
            quotes: vec![OddsQuote::new("f1", Selection::Home, dec!(10.00), now).unwrap()],
            fixture,
        }];

        let stake = dec!(10000000000000000000000000000);
        let err = simulate_across(stake, &priced, 5).unwrap_err();
        assert!(err.is_stake_error());
    }

    #[test]
    fn rejects_invalid_odds() {
        assert_eq!(simulate(dec!(10), dec!(1)), Err(AnalysisError::InvalidOdds(dec!(1))));
    }

    #[test]
    fn simulate_across_orders_by_profit() {
        let now = Utc::now();
        let fixture = Fixture {
            id: "f1".to_string(),
            home_team: "Liverpool".to_string(),
            away_team: "Chelsea".to_string(),
            tournament_id: "t".to_string(),
            tournament_name: None,
            sport_id: 1,
            kickoff_time: now,
            status: FixtureStatus::Scheduled,
        };
        let priced = vec![FixtureOdds {
            quotes: vec![
                OddsQuote::new("f1", Selection::Home, dec!(1.80), now).unwrap(),
                OddsQuote::new("f1", Selection::Draw, dec!(3.60), now).unwrap(),
                OddsQuote::new("f1", Selection::Away, dec!(4.50), now).unwrap(),
            ],
            fixture,
        }];

        let sims = simulate_across(dec!(50), &priced, 2).unwrap();
        assert_eq!(sims.len(), 2);
        assert_eq!(sims[0].selection, Some(Selection::Away));
        assert_eq!(sims[0].profit, dec!(175.00));
        assert_eq!(sims[1].selection, Some(Selection::Draw));
        assert_eq!(
            sims[0].description.as_deref(),
            Some("Chelsea to win (Liverpool vs Chelsea)")
        );
    }
}
