//! Ranking fixtures by competitiveness and classifying the best bet in each.

use chatbet_types::analysis::{Recommendation, RecommendationKind};
use chatbet_types::error::AnalysisError;
use chatbet_types::sports::{Fixture, FixtureOdds, Selection};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use tracing::debug;

use super::market::competitiveness;

/// A fixture with its competitiveness score and suggested selection.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFixture<'a> {
    pub fixture: &'a Fixture,
    pub score: f64,
    pub recommendation: Option<Recommendation>,
}

/// Order fixtures from most to least competitive.
///
/// Ties break by earlier kickoff, then by fixture id, so the ordering is
/// total and ranking the output again yields the same order. Fixtures
/// whose match-result market cannot be scored are left out; if no fixture
/// can be scored the first such error is returned.
pub fn rank_recommendations(
    fixtures_with_odds: &[FixtureOdds],
) -> Result<Vec<RankedFixture<'_>>, AnalysisError> {
    let mut ranked = Vec::with_capacity(fixtures_with_odds.len());
    let mut first_error = None;

    for entry in fixtures_with_odds {
        match competitiveness(&entry.quotes) {
            Ok(score) => ranked.push(RankedFixture {
                fixture: &entry.fixture,
                score,
                recommendation: classify(entry),
            }),
            Err(err) => {
                debug!(fixture_id = %entry.fixture.id, error = %err, "fixture not ranked");
                first_error.get_or_insert(err);
            }
        }
    }

    if ranked.is_empty() {
        if let Some(err) = first_error {
            return Err(err);
        }
    }

    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.fixture.kickoff_time.cmp(&b.fixture.kickoff_time))
            .then_with(|| a.fixture.id.cmp(&b.fixture.id))
    });
    Ok(ranked)
}

/// Pick the strongest bet class for a fixture from its match-result prices.
///
/// - safe bet: a win priced under 2.0, strength `1 / odds`
/// - value bet: a win priced 2.0 to 3.5 (strength `odds / 3`) or a draw
///   priced 3.0 to 4.0 (strength `odds / 4`)
/// - high risk: a win priced 3.5 or more, strength `min(odds / 6, 1)`
///
/// Home is considered before away. The class with the highest strength
/// wins, safe before value before high risk on ties.
pub fn classify(entry: &FixtureOdds) -> Option<Recommendation> {
    let home = entry.price(Selection::Home).map(|q| q.decimal_odds);
    let draw = entry.price(Selection::Draw).map(|q| q.decimal_odds);
    let away = entry.price(Selection::Away).map(|q| q.decimal_odds);
    let wins = [(Selection::Home, home), (Selection::Away, away)];

    let safe = wins.iter().find_map(|(selection, odds)| {
        let odds = (*odds).filter(|o| *o < dec!(2.0))?;
        Some((*selection, odds, 1.0 / odds.to_f64()?))
    });
    let value = wins
        .iter()
        .find_map(|(selection, odds)| {
            let odds = (*odds).filter(|o| *o >= dec!(2.0) && *o <= dec!(3.5))?;
            Some((*selection, odds, odds.to_f64()? / 3.0))
        })
        .or_else(|| {
            let odds = draw.filter(|o| *o >= dec!(3.0) && *o <= dec!(4.0))?;
            Some((Selection::Draw, odds, odds.to_f64()? / 4.0))
        });
    let risk = wins.iter().find_map(|(selection, odds)| {
        let odds = (*odds).filter(|o| *o >= dec!(3.5))?;
        Some((*selection, odds, (odds.to_f64()? / 6.0).min(1.0)))
    });

    let mut best: Option<(RecommendationKind, Selection, Decimal, f64)> = None;
    for (kind, candidate) in [
        (RecommendationKind::SafeBet, safe),
        (RecommendationKind::ValueBet, value),
        (RecommendationKind::HighRisk, risk),
    ] {
        let Some((selection, odds, strength)) = candidate else {
            continue;
        };
        if strength > best.map_or(0.0, |(_, _, _, s)| s) {
            best = Some((kind, selection, odds, strength));
        }
    }

    best.map(|(kind, selection, decimal_odds, strength)| Recommendation {
        kind,
        selection,
        option: selection.describe(&entry.fixture),
        decimal_odds,
        strength,
    })
}
