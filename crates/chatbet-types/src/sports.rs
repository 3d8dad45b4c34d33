//! Sports reference records: tournaments, fixtures and odds quotes.
//!
//! These are the typed records the sports data client hands to the core.
//! Prices are carried as [`Decimal`] so that payout arithmetic stays exact.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// A competition grouping fixtures (e.g. "Premier League").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: String,
    pub name: String,
    pub sport_id: u32,
}

/// Lifecycle status of a fixture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureStatus {
    #[default]
    Scheduled,
    Live,
    Finished,
    Postponed,
    Cancelled,
}

impl fmt::Display for FixtureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureStatus::Scheduled => write!(f, "scheduled"),
            FixtureStatus::Live => write!(f, "live"),
            FixtureStatus::Finished => write!(f, "finished"),
            FixtureStatus::Postponed => write!(f, "postponed"),
            FixtureStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for FixtureStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scheduled" | "pre_match" | "not_started" => Ok(FixtureStatus::Scheduled),
            "live" | "in_play" => Ok(FixtureStatus::Live),
            "finished" | "ended" => Ok(FixtureStatus::Finished),
            "postponed" => Ok(FixtureStatus::Postponed),
            "cancelled" | "canceled" => Ok(FixtureStatus::Cancelled),
            other => Err(format!("invalid fixture status: '{other}'")),
        }
    }
}

/// A single scheduled match between two teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub tournament_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_name: Option<String>,
    pub sport_id: u32,
    pub kickoff_time: DateTime<Utc>,
    #[serde(default)]
    pub status: FixtureStatus,
}

impl Fixture {
    /// "Home vs Away" label used in prompts and payloads.
    pub fn label(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }

    /// Whether the given team mention refers to either side of this fixture.
    ///
    /// Case-insensitive substring match in both directions, so "Madrid"
    /// matches "Real Madrid" and "Real Madrid CF" matches "Real Madrid".
    pub fn involves(&self, team: &str) -> bool {
        let team = team.trim().to_lowercase();
        if team.is_empty() {
            return false;
        }
        [&self.home_team, &self.away_team].iter().any(|side| {
            let side = side.to_lowercase();
            !side.is_empty() && (side.contains(&team) || team.contains(&side))
        })
    }

    /// Which side of the fixture a team mention refers to, if any.
    pub fn side_of(&self, team: &str) -> Option<Selection> {
        let team = team.trim().to_lowercase();
        let matches = |side: &str| {
            let side = side.to_lowercase();
            !side.is_empty() && (side.contains(&team) || team.contains(&side))
        };
        if team.is_empty() {
            None
        } else if matches(&self.home_team) {
            Some(Selection::Home)
        } else if matches(&self.away_team) {
            Some(Selection::Away)
        } else {
            None
        }
    }
}

/// Betting market a quote belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    /// Home / draw / away (the 1X2 market).
    MatchResult,
    OverUnder,
    BothTeamsToScore,
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::MatchResult => write!(f, "match_result"),
            Market::OverUnder => write!(f, "over_under"),
            Market::BothTeamsToScore => write!(f, "both_teams_to_score"),
        }
    }
}

/// Outcome within a market.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    Home,
    Draw,
    Away,
    Over,
    Under,
    Yes,
    No,
}

impl Selection {
    /// The market a selection is priced in.
    pub fn market(self) -> Market {
        match self {
            Selection::Home | Selection::Draw | Selection::Away => Market::MatchResult,
            Selection::Over | Selection::Under => Market::OverUnder,
            Selection::Yes | Selection::No => Market::BothTeamsToScore,
        }
    }

    /// Human-readable description of backing this selection in a fixture.
    pub fn describe(self, fixture: &Fixture) -> String {
        match self {
            Selection::Home => format!("{} to win", fixture.home_team),
            Selection::Away => format!("{} to win", fixture.away_team),
            Selection::Draw => "Draw".to_string(),
            Selection::Over => "Over".to_string(),
            Selection::Under => "Under".to_string(),
            Selection::Yes => "Both teams to score".to_string(),
            Selection::No => "Not both teams to score".to_string(),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Home => write!(f, "home"),
            Selection::Draw => write!(f, "draw"),
            Selection::Away => write!(f, "away"),
            Selection::Over => write!(f, "over"),
            Selection::Under => write!(f, "under"),
            Selection::Yes => write!(f, "yes"),
            Selection::No => write!(f, "no"),
        }
    }
}

/// A price for one selection of one fixture at a point in time.
///
/// `decimal_odds` is always greater than 1.0 when built through [`OddsQuote::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddsQuote {
    pub fixture_id: String,
    pub market: Market,
    pub selection: Selection,
    pub decimal_odds: Decimal,
    pub observed_at: DateTime<Utc>,
}

impl OddsQuote {
    /// Build a quote, rejecting prices that are not strictly above 1.0.
    pub fn new(
        fixture_id: impl Into<String>,
        selection: Selection,
        decimal_odds: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<Self, AnalysisError> {
        if decimal_odds <= Decimal::ONE {
            return Err(AnalysisError::InvalidOdds(decimal_odds));
        }
        Ok(Self {
            fixture_id: fixture_id.into(),
            market: selection.market(),
            selection,
            decimal_odds,
            observed_at,
        })
    }
}

/// A fixture together with the quotes currently known for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureOdds {
    pub fixture: Fixture,
    pub quotes: Vec<OddsQuote>,
}

impl FixtureOdds {
    /// Latest quote for a selection, if priced.
    pub fn price(&self, selection: Selection) -> Option<&OddsQuote> {
        self.quotes
            .iter()
            .filter(|q| q.selection == selection)
            .max_by_key(|q| q.observed_at)
    }
}

/// Resource families exposed by the sports data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Tournaments,
    Fixtures,
    Odds,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Tournaments => write!(f, "tournaments"),
            ResourceKind::Fixtures => write!(f, "fixtures"),
            ResourceKind::Odds => write!(f, "odds"),
        }
    }
}

/// Filters narrowing a data request. Unset fields mean "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixture_id: Option<String>,
}

/// A request to the sports data client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRequest {
    pub kind: ResourceKind,
    #[serde(default)]
    pub filters: DataFilters,
}

impl DataRequest {
    pub fn tournaments() -> Self {
        Self {
            kind: ResourceKind::Tournaments,
            filters: DataFilters::default(),
        }
    }

    pub fn fixtures(sport_id: u32) -> Self {
        Self {
            kind: ResourceKind::Fixtures,
            filters: DataFilters {
                sport_id: Some(sport_id),
                ..DataFilters::default()
            },
        }
    }

    pub fn odds(fixture: &Fixture) -> Self {
        Self {
            kind: ResourceKind::Odds,
            filters: DataFilters {
                sport_id: Some(fixture.sport_id),
                tournament_id: Some(fixture.tournament_id.clone()),
                fixture_id: Some(fixture.id.clone()),
            },
        }
    }
}

/// Typed records returned by the sports data client, one variant per [`ResourceKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "records", rename_all = "snake_case")]
pub enum DataRecords {
    Tournaments(Vec<Tournament>),
    Fixtures(Vec<Fixture>),
    Odds(Vec<OddsQuote>),
}

impl DataRecords {
    pub fn kind(&self) -> ResourceKind {
        match self {
            DataRecords::Tournaments(_) => ResourceKind::Tournaments,
            DataRecords::Fixtures(_) => ResourceKind::Fixtures,
            DataRecords::Odds(_) => ResourceKind::Odds,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DataRecords::Tournaments(v) => v.len(),
            DataRecords::Fixtures(v) => v.len(),
            DataRecords::Odds(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
