//! Match-result market analysis: competitiveness, overround and favourites.

use std::collections::BTreeMap;

use chatbet_types::analysis::{FavoriteSummary, TeamPrice};
use chatbet_types::error::AnalysisError;
use chatbet_types::sports::{FixtureOdds, Market, OddsQuote, Selection};
use rust_decimal::Decimal;

use super::probability::{implied_probability, implied_probability_f64};

/// The latest match-result price per selection of a single fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchMarket {
    pub fixture_id: String,
    /// Ordered home, draw, away.
    pub prices: Vec<(Selection, Decimal)>,
}

impl MatchMarket {
    pub fn price(&self, selection: Selection) -> Option<Decimal> {
        self.prices
            .iter()
            .find(|(s, _)| *s == selection)
            .map(|(_, odds)| *odds)
    }

    /// Sum of implied probabilities minus one.
    pub fn overround(&self) -> Result<Decimal, AnalysisError> {
        let mut total = Decimal::ZERO;
        for (_, odds) in &self.prices {
            total += implied_probability(*odds)?;
        }
        Ok(total - Decimal::ONE)
    }
}

/// Collect the match-result market of one fixture from its quotes.
///
/// Quotes of other markets are ignored. When a selection was quoted more
/// than once the latest observation wins. At least two selections must be
/// priced.
pub fn match_market(quotes: &[OddsQuote]) -> Result<MatchMarket, AnalysisError> {
    let mut fixture_id: Option<&str> = None;
    let mut latest: BTreeMap<Selection, &OddsQuote> = BTreeMap::new();

    for quote in quotes.iter().filter(|q| q.market == Market::MatchResult) {
        match fixture_id {
            None => fixture_id = Some(&quote.fixture_id),
            Some(id) if id != quote.fixture_id => return Err(AnalysisError::MixedFixtures),
            Some(_) => {}
        }
        latest
            .entry(quote.selection)
            .and_modify(|current| {
                if quote.observed_at > current.observed_at {
                    *current = quote;
                }
            })
            .or_insert(quote);
    }

    let fixture_id = fixture_id
        .or_else(|| quotes.first().map(|q| q.fixture_id.as_str()))
        .unwrap_or_default()
        .to_string();
    if latest.len() < 2 {
        return Err(AnalysisError::IncompleteMarket {
            fixture_id,
            found: latest.into_keys().collect(),
        });
    }

    Ok(MatchMarket {
        fixture_id,
        prices: latest
            .into_iter()
            .map(|(selection, quote)| (selection, quote.decimal_odds))
            .collect(),
    })
}

/// How evenly matched a fixture is, in `[0, 1]`.
///
/// Implied probabilities of the match-result selections are normalized to
/// remove the bookmaker margin, then compared against a uniform split. The
/// score is one minus their variance relative to the largest variance
/// possible for that many outcomes: 1.0 for a perfectly balanced market,
/// approaching 0.0 as one outcome dominates.
pub fn competitiveness(quotes: &[OddsQuote]) -> Result<f64, AnalysisError> {
    let market = match_market(quotes)?;
    let probabilities = market
        .prices
        .iter()
        .map(|(_, odds)| implied_probability_f64(*odds))
        .collect::<Result<Vec<f64>, _>>()?;

    let n = probabilities.len() as f64;
    let total: f64 = probabilities.iter().sum();
    let uniform = 1.0 / n;
    let variance = probabilities
        .iter()
        .map(|p| (p / total - uniform).powi(2))
        .sum::<f64>()
        / n;
    let max_variance = (n - 1.0) / (n * n);

    Ok((1.0 - variance / max_variance).clamp(0.0, 1.0))
}

/// Compare the win prices of the named teams and pick the favourite.
///
/// Each team is priced from the first fixture it appears in. Needs at least
/// two priced teams; the lowest win price is the favourite, earlier teams
/// winning ties.
pub fn favorite(teams: &[String], priced: &[FixtureOdds]) -> Option<FavoriteSummary> {
    let compared: Vec<TeamPrice> = teams
        .iter()
        .filter_map(|team| {
            priced.iter().find_map(|entry| {
                let side = entry.fixture.side_of(team)?;
                let quote = entry.price(side)?;
                let name = match side {
                    Selection::Home => entry.fixture.home_team.clone(),
                    _ => entry.fixture.away_team.clone(),
                };
                Some(TeamPrice {
                    team: name,
                    fixture_id: entry.fixture.id.clone(),
                    decimal_odds: quote.decimal_odds,
                })
            })
        })
        .collect();

    if compared.len() < 2 {
        return None;
    }
    let best = compared
        .iter()
        .reduce(|best, next| if next.decimal_odds < best.decimal_odds { next } else { best })?;
    let implied_probability = implied_probability_f64(best.decimal_odds).ok()?;

    Some(FavoriteSummary {
        team: best.team.clone(),
        decimal_odds: best.decimal_odds,
        implied_probability,
        compared: compared.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbet_types::sports::{Fixture, FixtureStatus};
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn quotes(fixture_id: &str, prices: &[(Selection, Decimal)]) -> Vec<OddsQuote> {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        prices
            .iter()
            .map(|(s, o)| OddsQuote::new(fixture_id, *s, *o, at).unwrap())
            .collect()
    }

    fn fixture(id: &str, home: &str, away: &str) -> Fixture {
        Fixture {
            id: id.to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            tournament_id: "t1".to_string(),
            tournament_name: None,
            sport_id: 1,
            kickoff_time: Utc.with_ymd_and_hms(2026, 10, 24, 15, 0, 0).unwrap(),
            status: FixtureStatus::Scheduled,
        }
    }

    #[test]
    fn balanced_market_scores_one() {
        let q = quotes(
            "f1",
            &[
                (Selection::Home, dec!(3.0)),
                (Selection::Draw, dec!(3.0)),
                (Selection::Away, dec!(3.0)),
            ],
        );
        let score = competitiveness(&q).unwrap();
        assert!((score - 1.0).abs() < 1e-9, "score = {score}");
    }

    #[test]
    fn skewed_market_scores_below_balanced() {
        let q = quotes(
            "f1",
            &[
                (Selection::Home, dec!(2.10)),
                (Selection::Draw, dec!(3.40)),
                (Selection::Away, dec!(3.20)),
            ],
        );
        let score = competitiveness(&q).unwrap();
        assert!(score < 1.0);
        assert!(score > 0.95, "score = {score}");
    }

    #[test]
    fn lopsided_market_scores_lower_than_close_one() {
        let close = quotes(
            "a",
            &[
                (Selection::Home, dec!(2.50)),
                (Selection::Draw, dec!(3.20)),
                (Selection::Away, dec!(2.80)),
            ],
        );
        let lopsided = quotes(
            "b",
            &[
                (Selection::Home, dec!(1.15)),
                (Selection::Draw, dec!(7.50)),
                (Selection::Away, dec!(15.0)),
            ],
        );
        let close = competitiveness(&close).unwrap();
        let lopsided = competitiveness(&lopsided).unwrap();
        assert!(lopsided < close);
        assert!((0.0..=1.0).contains(&lopsided));
    }

    #[test]
    fn single_selection_is_incomplete() {
        let q = quotes("f9", &[(Selection::Home, dec!(1.90))]);
        assert_eq!(
            competitiveness(&q),
            Err(AnalysisError::IncompleteMarket {
                fixture_id: "f9".to_string(),
                found: vec![Selection::Home],
            })
        );
    }

    #[test]
    fn no_quotes_is_incomplete() {
        assert!(matches!(
            competitiveness(&[]),
            Err(AnalysisError::IncompleteMarket { .. })
        ));
    }

    #[test]
    fn quotes_from_two_fixtures_are_rejected() {
        let mut q = quotes("a", &[(Selection::Home, dec!(2.0))]);
        q.extend(quotes("b", &[(Selection::Away, dec!(2.0))]));
        assert_eq!(competitiveness(&q), Err(AnalysisError::MixedFixtures));
    }

    #[test]
    fn latest_quote_per_selection_wins() {
        let mut q = quotes(
            "f1",
            &[(Selection::Home, dec!(2.00)), (Selection::Away, dec!(4.00))],
        );
        let mut newer = q[0].clone();
        newer.decimal_odds = dec!(1.50);
        newer.observed_at += Duration::minutes(5);
        q.push(newer);

        let market = match_market(&q).unwrap();
        assert_eq!(market.price(Selection::Home), Some(dec!(1.50)));
        assert_eq!(market.prices.len(), 2);
    }

    #[test]
    fn overround_of_fair_book_is_zero() {
        let q = quotes(
            "f1",
            &[(Selection::Home, dec!(2.0)), (Selection::Away, dec!(2.0))],
        );
        assert_eq!(match_market(&q).unwrap().overround().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn favorite_is_lowest_win_price() {
        let priced = vec![
            FixtureOdds {
                quotes: quotes(
                    "f1",
                    &[(Selection::Home, dec!(1.85)), (Selection::Away, dec!(4.20))],
                ),
                fixture: fixture("f1", "Real Madrid", "Getafe"),
            },
            FixtureOdds {
                quotes: quotes(
                    "f2",
                    &[(Selection::Home, dec!(3.10)), (Selection::Away, dec!(2.05))],
                ),
                fixture: fixture("f2", "Sevilla", "Barcelona"),
            },
        ];
        let teams = vec!["Barcelona".to_string(), "Madrid".to_string()];

        let fav = favorite(&teams, &priced).unwrap();
        assert_eq!(fav.team, "Real Madrid");
        assert_eq!(fav.decimal_odds, dec!(1.85));
        assert_eq!(fav.compared.len(), 2);
        assert_eq!(fav.compared[0].team, "Barcelona");
    }

    #[test]
    fn favorite_needs_two_priced_teams() {
        let priced = vec![FixtureOdds {
            quotes: quotes("f1", &[(Selection::Home, dec!(1.85))]),
            fixture: fixture("f1", "Real Madrid", "Getafe"),
        }];
        let teams = vec!["Real Madrid".to_string(), "Arsenal".to_string()];
        assert!(favorite(&teams, &priced).is_none());
    }
}
