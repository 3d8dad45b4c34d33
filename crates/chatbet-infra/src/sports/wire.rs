//! ChatBet sports API wire records and their mapping to domain types.
//!
//! The upstream API is loosely typed: ids arrive as numbers or strings,
//! names either as plain strings or as `{ "en": ... }` translations, and
//! payloads are sometimes wrapped in a `data` envelope. Everything is read
//! into `serde_json::Value`-tolerant structs here and mapped once.

use std::str::FromStr;

use chatbet_types::sports::{Fixture, FixtureStatus, OddsQuote, Selection, Tournament};
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Response of `POST /auth/generate_token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// A fixture as returned by `GET /sports/sports-fixtures`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFixture {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub home_competitor: Option<WireNamed>,
    #[serde(default)]
    pub away_competitor: Option<WireNamed>,
    #[serde(default)]
    pub home_competitor_name: Option<Value>,
    #[serde(default)]
    pub away_competitor_name: Option<Value>,
    #[serde(default)]
    pub tournament: Option<WireNamed>,
    #[serde(default, rename = "tournament_name")]
    pub tournament_name: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
}

/// `{ "id": ..., "name": ... }` where both fields are loosely typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireNamed {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: Value,
}

/// A single priced outcome inside the odds payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePrice {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub odds: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMatchResult {
    #[serde(default)]
    pub home_team: Option<WirePrice>,
    #[serde(default)]
    pub tie: Option<WirePrice>,
    #[serde(default)]
    pub away_team: Option<WirePrice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireOverUnder {
    #[serde(default)]
    pub over: Option<WirePrice>,
    #[serde(default)]
    pub under: Option<WirePrice>,
}

/// Body of `GET /sports/odds`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireOdds {
    #[serde(default)]
    pub result: Option<WireMatchResult>,
    #[serde(default)]
    pub over_under: Option<WireOverUnder>,
}

/// Unwrap an optional `{ "data": ... }` envelope.
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") && !map.contains_key("result") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Map a fixtures payload. Entries without an id or with an unreadable
/// kickoff time are skipped.
pub fn fixtures_from_value(body: Value, sport_id: u32) -> Result<Vec<Fixture>, String> {
    let wire: Vec<WireFixture> = serde_json::from_value(unwrap_data(body))
        .map_err(|e| format!("unexpected fixtures payload: {e}"))?;
    Ok(wire
        .into_iter()
        .filter_map(|f| fixture_from_wire(f, sport_id))
        .collect())
}

fn fixture_from_wire(wire: WireFixture, sport_id: u32) -> Option<Fixture> {
    let Some(id) = id_string(&wire.id) else {
        debug!("skipping fixture entry without id");
        return None;
    };
    let raw_start = wire.start_time.as_deref().unwrap_or_default();
    let Some(kickoff_time) = parse_kickoff(raw_start) else {
        warn!(fixture_id = %id, start_time = raw_start, "skipping fixture with unreadable kickoff time");
        return None;
    };

    let home_team = wire
        .home_competitor
        .as_ref()
        .and_then(|c| name_string(&c.name))
        .or_else(|| wire.home_competitor_name.as_ref().and_then(name_string))?;
    let away_team = wire
        .away_competitor
        .as_ref()
        .and_then(|c| name_string(&c.name))
        .or_else(|| wire.away_competitor_name.as_ref().and_then(name_string))?;

    Some(Fixture {
        id,
        home_team,
        away_team,
        tournament_id: wire
            .tournament
            .as_ref()
            .and_then(|t| id_string(&t.id))
            .unwrap_or_default(),
        tournament_name: wire
            .tournament
            .as_ref()
            .and_then(|t| name_string(&t.name))
            .or_else(|| wire.tournament_name.as_ref().and_then(name_string)),
        sport_id,
        kickoff_time,
        status: wire
            .status
            .as_deref()
            .and_then(|s| FixtureStatus::from_str(s).ok())
            .unwrap_or_default(),
    })
}

/// Map an odds payload for one fixture. Prices at or below 1.0 are dropped.
pub fn odds_from_value(
    body: Value,
    fixture_id: &str,
    observed_at: DateTime<Utc>,
) -> Result<Vec<OddsQuote>, String> {
    let wire: WireOdds = serde_json::from_value(unwrap_data(body))
        .map_err(|e| format!("unexpected odds payload: {e}"))?;

    let result = wire.result.unwrap_or_default();
    let over_under = wire.over_under.unwrap_or_default();
    let priced = [
        (Selection::Home, result.home_team),
        (Selection::Draw, result.tie),
        (Selection::Away, result.away_team),
        (Selection::Over, over_under.over),
        (Selection::Under, over_under.under),
    ];

    Ok(priced
        .into_iter()
        .filter_map(|(selection, price)| {
            let odds = decimal(&price?.odds)?;
            match OddsQuote::new(fixture_id, selection, odds, observed_at) {
                Ok(quote) => Some(quote),
                Err(err) => {
                    debug!(%fixture_id, %selection, error = %err, "dropping unusable price");
                    None
                }
            }
        })
        .collect())
}

/// Map the tournaments payload.
///
/// Accepts a flat list of tournaments or a list of sports each carrying a
/// `tournaments` array; entries without an id are skipped.
pub fn tournaments_from_value(body: Value, default_sport_id: u32) -> Vec<Tournament> {
    let mut out = Vec::new();
    collect_tournaments(&unwrap_data(body), default_sport_id, &mut out);
    out
}

fn collect_tournaments(value: &Value, sport_id: u32, out: &mut Vec<Tournament>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_tournaments(item, sport_id, out);
            }
        }
        Value::Object(map) => {
            if let Some(nested) = map.get("tournaments") {
                let sport_id = map
                    .get("sportId")
                    .or_else(|| map.get("sport_id"))
                    .or_else(|| map.get("id"))
                    .and_then(id_string)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(sport_id);
                collect_tournaments(nested, sport_id, out);
                return;
            }
            let id = map.get("id").and_then(id_string);
            let name = map.get("name").and_then(name_string);
            if let (Some(id), Some(name)) = (id, name) {
                out.push(Tournament { id, name, sport_id });
            }
        }
        _ => {}
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn name_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(map) => map.get("en").and_then(name_string),
        _ => None,
    }
}

fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn parse_kickoff(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
