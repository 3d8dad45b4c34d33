//! Conversion of analysis output into the structured payload.
//!
//! This is the only place values are rounded: money and odds to two
//! decimal places, probabilities and scores to two places.

use chatbet_types::analysis::{
    BetSimulation, FavoriteSummary, FixtureOddsView, PricedSelection, RankedRecommendation,
    ScheduleEntry, StructuredPayload, TeamPrice, round_money, round_score,
};
use chatbet_types::error::AnalysisError;
use chatbet_types::sports::{Fixture, FixtureOdds, Selection};
use rust_decimal::prelude::ToPrimitive;

use super::market::match_market;
use super::probability::implied_probability_f64;
use super::ranking::RankedFixture;

/// Display order of selections within a fixture.
const SELECTION_ORDER: [Selection; 7] = [
    Selection::Home,
    Selection::Draw,
    Selection::Away,
    Selection::Over,
    Selection::Under,
    Selection::Yes,
    Selection::No,
];

pub fn schedule_list<'a>(fixtures: impl IntoIterator<Item = &'a Fixture>) -> StructuredPayload {
    StructuredPayload::ScheduleList {
        fixtures: fixtures
            .into_iter()
            .map(|f| ScheduleEntry {
                fixture_id: f.id.clone(),
                home_team: f.home_team.clone(),
                away_team: f.away_team.clone(),
                tournament: f.tournament_name.clone(),
                kickoff_time: f.kickoff_time,
                status: f.status,
            })
            .collect(),
    }
}

/// Price views for each fixture, with an optional favourite comparison.
pub fn odds_comparison(
    priced: &[FixtureOdds],
    favorite: Option<FavoriteSummary>,
) -> Result<StructuredPayload, AnalysisError> {
    let markets = priced
        .iter()
        .map(odds_view)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(StructuredPayload::OddsComparison {
        markets,
        favorite: favorite.map(|fav| FavoriteSummary {
            team: fav.team,
            decimal_odds: round_money(fav.decimal_odds),
            implied_probability: round_score(fav.implied_probability),
            compared: fav
                .compared
                .into_iter()
                .map(|p| TeamPrice {
                    decimal_odds: round_money(p.decimal_odds),
                    ..p
                })
                .collect(),
        }),
    })
}

fn odds_view(entry: &FixtureOdds) -> Result<FixtureOddsView, AnalysisError> {
    let mut prices = Vec::new();
    for selection in SELECTION_ORDER {
        let Some(quote) = entry.price(selection) else {
            continue;
        };
        prices.push(PricedSelection {
            selection,
            description: selection.describe(&entry.fixture),
            decimal_odds: round_money(quote.decimal_odds),
            implied_probability: round_score(implied_probability_f64(quote.decimal_odds)?),
        });
    }
    let overround = match_market(&entry.quotes)
        .and_then(|market| market.overround())
        .ok()
        .and_then(|o| o.to_f64())
        .map(round_score);

    Ok(FixtureOddsView {
        fixture_id: entry.fixture.id.clone(),
        label: entry.fixture.label(),
        kickoff_time: entry.fixture.kickoff_time,
        prices,
        overround,
    })
}

pub fn simulation_result(simulations: &[BetSimulation]) -> StructuredPayload {
    StructuredPayload::SimulationResult {
        simulations: simulations.iter().map(BetSimulation::rounded).collect(),
    }
}

/// The top `limit` ranked fixtures, numbered from 1.
pub fn recommendation_list(ranked: &[RankedFixture<'_>], limit: usize) -> StructuredPayload {
    StructuredPayload::RecommendationList {
        recommendations: ranked
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, r)| RankedRecommendation {
                rank: i + 1,
                fixture_id: r.fixture.id.clone(),
                label: r.fixture.label(),
                tournament: r.fixture.tournament_name.clone(),
                kickoff_time: r.fixture.kickoff_time,
                competitiveness: round_score(r.score),
                recommendation: r.recommendation.clone().map(|mut rec| {
                    rec.decimal_odds = round_money(rec.decimal_odds);
                    rec.strength = round_score(rec.strength);
                    rec
                }),
            })
            .collect(),
    }
}
