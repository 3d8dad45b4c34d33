//! Intents, analysis results and the structured payload returned per turn.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::sports::{FixtureStatus, Selection};

/// Classified purpose of a user message.
///
/// `Unknown` is reserved for degraded results; the model is never allowed
/// to produce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// "When does Barcelona play?" / "What matches are tomorrow?"
    ScheduleQuery,
    /// "What are the odds for Real Madrid vs PSG?" / "Who is the favorite?"
    OddsQuery,
    /// "Simulate a $50 bet on Liverpool."
    BetSimulation,
    /// "Which match do you recommend?" / "Most competitive match this weekend?"
    BettingRecommendation,
    /// Greetings, small talk, anything without a data need.
    General,
    Unknown,
}

impl Intent {
    /// Every intent a classification may produce.
    pub const CLASSIFIABLE: [Intent; 5] = [
        Intent::ScheduleQuery,
        Intent::OddsQuery,
        Intent::BetSimulation,
        Intent::BettingRecommendation,
        Intent::General,
    ];

    /// Intents whose results are enriched by the betting analysis engine.
    pub fn is_analysis_eligible(self) -> bool {
        matches!(
            self,
            Intent::OddsQuery | Intent::BetSimulation | Intent::BettingRecommendation
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::ScheduleQuery => "schedule_query",
            Intent::OddsQuery => "odds_query",
            Intent::BetSimulation => "bet_simulation",
            Intent::BettingRecommendation => "betting_recommendation",
            Intent::General => "general",
            Intent::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "schedule_query" => Ok(Intent::ScheduleQuery),
            "odds_query" => Ok(Intent::OddsQuery),
            "bet_simulation" => Ok(Intent::BetSimulation),
            "betting_recommendation" => Ok(Intent::BettingRecommendation),
            "general" => Ok(Intent::General),
            "unknown" => Ok(Intent::Unknown),
            other => Err(format!("invalid intent: '{other}'")),
        }
    }
}

/// The unit returned to the caller for every turn, successful or degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub intent: Intent,
    /// Classification confidence in `[0, 1]`.
    pub confidence: f64,
    pub narrative: String,
    pub payload: StructuredPayload,
}

impl AnalysisResult {
    /// A degraded result: intent `unknown`, zero confidence, no payload.
    pub fn degraded(narrative: impl Into<String>) -> Self {
        Self {
            intent: Intent::Unknown,
            confidence: 0.0,
            narrative: narrative.into(),
            payload: StructuredPayload::Empty,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.intent == Intent::Unknown
    }
}

/// Intent-specific structured data. All numbers are already rounded for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuredPayload {
    ScheduleList {
        fixtures: Vec<ScheduleEntry>,
    },
    OddsComparison {
        markets: Vec<FixtureOddsView>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        favorite: Option<FavoriteSummary>,
    },
    SimulationResult {
        simulations: Vec<BetSimulation>,
    },
    RecommendationList {
        recommendations: Vec<RankedRecommendation>,
    },
    Empty,
}

/// A fixture listed in a schedule answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub fixture_id: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament: Option<String>,
    pub kickoff_time: DateTime<Utc>,
    pub status: FixtureStatus,
}

/// Prices for one fixture with their implied probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureOddsView {
    pub fixture_id: String,
    pub label: String,
    pub kickoff_time: DateTime<Utc>,
    pub prices: Vec<PricedSelection>,
    /// Bookmaker margin: sum of match-result implied probabilities minus one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overround: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedSelection {
    pub selection: Selection,
    pub description: String,
    pub decimal_odds: Decimal,
    pub implied_probability: f64,
}

/// Outcome of comparing the win prices of two or more teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteSummary {
    pub team: String,
    pub decimal_odds: Decimal,
    pub implied_probability: f64,
    pub compared: Vec<TeamPrice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamPrice {
    pub team: String,
    pub fixture_id: String,
    pub decimal_odds: Decimal,
}

/// A simulated wager. `payout = stake * decimal_odds`, `profit = payout - stake`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetSimulation {
    pub stake: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixture_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub decimal_odds: Decimal,
    pub payout: Decimal,
    pub profit: Decimal,
}

impl BetSimulation {
    /// Copy with money fields rounded to two places for display.
    pub fn rounded(&self) -> Self {
        Self {
            stake: round_money(self.stake),
            decimal_odds: round_money(self.decimal_odds),
            payout: round_money(self.payout),
            profit: round_money(self.profit),
            ..self.clone()
        }
    }
}

/// Strength class attached to a recommended fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    /// Short-priced favourite (win price below 2.0).
    SafeBet,
    /// Mid-priced win or a draw in the 3.0-4.0 band.
    ValueBet,
    /// Long-priced underdog (3.5 and above).
    HighRisk,
}

impl fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationKind::SafeBet => write!(f, "safe bet"),
            RecommendationKind::ValueBet => write!(f, "value bet"),
            RecommendationKind::HighRisk => write!(f, "high risk/high reward"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub selection: Selection,
    pub option: String,
    pub decimal_odds: Decimal,
    pub strength: f64,
}

/// A fixture in a recommendation list, ordered by competitiveness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecommendation {
    pub rank: usize,
    pub fixture_id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament: Option<String>,
    pub kickoff_time: DateTime<Utc>,
    pub competitiveness: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

/// Round a money or odds value to two places, halves away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a probability or score to two places.
pub fn round_score(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn eligible_intents() {
        assert!(Intent::OddsQuery.is_analysis_eligible());
        assert!(Intent::BetSimulation.is_analysis_eligible());
        assert!(Intent::BettingRecommendation.is_analysis_eligible());
        assert!(!Intent::ScheduleQuery.is_analysis_eligible());
        assert!(!Intent::Unknown.is_analysis_eligible());
    }

    #[test]
    fn intent_display_matches_serde() {
        for intent in [
            Intent::ScheduleQuery,
            Intent::OddsQuery,
            Intent::BetSimulation,
            Intent::BettingRecommendation,
            Intent::General,
            Intent::Unknown,
        ] {
            let json = serde_json::to_string(&intent).unwrap();
            assert_eq!(json, format!("\"{intent}\""));
            assert_eq!(intent.to_string().parse::<Intent>().unwrap(), intent);
        }
    }

    #[test]
    fn payload_is_tagged_by_kind() {
        let payload = StructuredPayload::SimulationResult {
            simulations: vec![BetSimulation {
                stake: dec!(100),
                selection: None,
                fixture_id: None,
                description: None,
                decimal_odds: dec!(2.5),
                payout: dec!(250),
                profit: dec!(150),
            }],
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["kind"], "simulation_result");
        assert_eq!(value["simulations"][0]["payout"], 250.0);
    }

    #[test]
    fn degraded_result_has_unknown_intent() {
        let result = AnalysisResult::degraded("try again");
        assert!(result.is_degraded());
        assert_eq!(result.payload, StructuredPayload::Empty);
    }

    #[test]
    fn rounding_applies_half_away_from_zero() {
        assert_eq!(round_money(dec!(2.345)), dec!(2.35));
        assert_eq!(round_money(dec!(150)), dec!(150));
        assert!((round_score(0.97432) - 0.97).abs() < f64::EPSILON);
    }
}
