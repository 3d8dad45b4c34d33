//! Builds the model request for a turn.
//!
//! [`PromptBuilder::build`] is pure: the same input, including `now`,
//! always yields the same request. History is cut to the last
//! `max_history` turns and the data block is capped at `max_data_chars`.

use std::fmt::Write as _;
use std::time::Duration;

use chatbet_types::analysis::Intent;
use chatbet_types::chat::{Turn, TurnRole};
use chatbet_types::config::ChatBetConfig;
use chatbet_types::llm::{ModelError, ModelRequest, ResponseSchema};
use chatbet_types::sports::{Fixture, FixtureOdds, Selection};
use chrono::{DateTime, Duration as ChronoDuration, Utc};

use super::schema::response_schema;
use crate::data::window::{DEFAULT_WINDOW_DAYS, FixtureWindow};

const NO_DATA: &str = "No matching fixtures or odds were found for this request. \
Do not invent matches, kickoff times or prices; say that no data is available.";

const STALE_NOTE: &str = "Note: the data source could not be refreshed, some of this data may be out of date.";

#[derive(Debug, Clone)]
pub struct PromptSettings {
    pub max_history: usize,
    pub max_data_chars: usize,
    pub model_timeout: Duration,
}

impl PromptSettings {
    pub fn from_config(config: &ChatBetConfig) -> Self {
        Self {
            max_history: config.max_history,
            max_data_chars: config.prompt.max_data_chars,
            model_timeout: Duration::from_millis(config.timeouts.model_timeout_ms),
        }
    }
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self::from_config(&ChatBetConfig::default())
    }
}

/// Sports data gathered for a turn.
#[derive(Debug, Clone, Default)]
pub struct RelevantData {
    pub fixtures: Vec<Fixture>,
    pub odds: Vec<FixtureOdds>,
    /// Some of the data came from a stale cache entry.
    pub stale: bool,
}

impl RelevantData {
    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty() && self.odds.is_empty()
    }
}

/// Everything the prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub message: &'a str,
    pub history: &'a [Turn],
    pub data: &'a RelevantData,
    pub mentioned_teams: &'a [String],
    pub last_intent: Option<Intent>,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    settings: PromptSettings,
    schema: ResponseSchema,
}

impl PromptBuilder {
    pub fn new(settings: PromptSettings) -> Self {
        Self {
            settings,
            schema: response_schema(),
        }
    }

    pub fn settings(&self) -> &PromptSettings {
        &self.settings
    }

    pub fn build(&self, input: &PromptInput<'_>) -> ModelRequest {
        ModelRequest {
            system: self.system_prompt(input.now),
            user: self.user_prompt(input),
            response_schema: self.schema.clone(),
            timeout: self.settings.model_timeout,
        }
    }

    /// The same request with the validation error and the required shape restated.
    pub fn corrective(&self, request: &ModelRequest, error: &ModelError) -> ModelRequest {
        let mut retry = request.clone();
        let _ = write!(
            retry.user,
            "\n\nYour previous reply was rejected: {error}.\n\
             Reply again with a single JSON object only, no prose and no code fence. \
             It must have \"intent\" (one of the listed intents), \"confidence\" \
             (a number from 0 to 1), a non-empty \"narrative\" string and an \
             \"entities\" object, exactly as the schema describes."
        );
        retry
    }

    fn system_prompt(&self, now: DateTime<Utc>) -> String {
        let today = now.date_naive();
        let tomorrow = today + ChronoDuration::days(1);
        let sunday = FixtureWindow::sunday(now).start.date_naive();
        let window_end = today + ChronoDuration::days(DEFAULT_WINDOW_DAYS);
        let schema = serde_json::to_string_pretty(&self.schema.schema).unwrap_or_default();

        format!(
            "You are ChatBet, a friendly sports betting assistant. You answer questions \
about football fixtures, compare odds, simulate bets and suggest matches, using only \
the data provided to you. Prices are decimal odds. Keep answers short and remind users \
to bet responsibly when recommending bets.\n\
\n\
Calendar (UTC):\n\
- Today: {today_name} {today}\n\
- Tomorrow: {tomorrow_name} {tomorrow}\n\
- Next Sunday: {sunday}\n\
- Default window (no date, team or tournament named): {today} to {window_end}\n\
\n\
Classify the user's message as one of these intents:\n\
- schedule_query: when a team plays, or which matches are on a date\n\
- odds_query: prices for a match, or which team is the favourite\n\
- bet_simulation: what a stake would pay at given odds\n\
- betting_recommendation: which match or bet to pick, or the most competitive match\n\
- general: greetings and anything else\n\
\n\
Respond with a single JSON object matching this schema:\n{schema}",
            today_name = today.format("%A"),
            tomorrow_name = tomorrow.format("%A"),
        )
    }

    fn user_prompt(&self, input: &PromptInput<'_>) -> String {
        let mut out = String::new();

        if !input.mentioned_teams.is_empty() || input.last_intent.is_some() {
            out.push_str("Known about this user:\n");
            if !input.mentioned_teams.is_empty() {
                let _ = writeln!(out, "- Teams mentioned before: {}", input.mentioned_teams.join(", "));
            }
            if let Some(intent) = input.last_intent {
                let _ = writeln!(out, "- Last request type: {intent}");
            }
            out.push('\n');
        }

        let skip = input.history.len().saturating_sub(self.settings.max_history);
        let history = &input.history[skip..];
        if !history.is_empty() {
            out.push_str("Conversation so far:\n");
            for turn in history {
                let speaker = match turn.role {
                    TurnRole::User => "User",
                    TurnRole::Assistant => "Assistant",
                };
                let _ = writeln!(out, "{speaker}: {}", turn.text);
            }
            out.push('\n');
        }

        out.push_str("Data:\n");
        out.push_str(&self.data_block(input.data));
        let _ = write!(out, "\n\nUser message: {}", input.message);
        out
    }

    fn data_block(&self, data: &RelevantData) -> String {
        if data.is_empty() {
            return NO_DATA.to_string();
        }

        let mut lines = Vec::new();
        if !data.fixtures.is_empty() {
            lines.push("Fixtures:".to_string());
            lines.extend(data.fixtures.iter().map(fixture_line));
        }
        if !data.odds.is_empty() {
            lines.push("Match result odds (decimal):".to_string());
            lines.extend(data.odds.iter().map(odds_line));
        }

        let mut block = String::new();
        let mut written = 0;
        for line in &lines {
            if block.len() + line.len() + 1 > self.settings.max_data_chars {
                break;
            }
            block.push_str(line);
            block.push('\n');
            written += 1;
        }
        let omitted = lines.len() - written;
        if omitted > 0 {
            let _ = writeln!(block, "... {omitted} more omitted");
        }
        if data.stale {
            block.push_str(STALE_NOTE);
            block.push('\n');
        }
        block.trim_end().to_string()
    }
}

fn fixture_line(fixture: &Fixture) -> String {
    let tournament = fixture.tournament_name.as_deref().unwrap_or("unknown tournament");
    format!(
        "- {} | {} | {} | {}",
        fixture.label(),
        tournament,
        fixture.kickoff_time.format("%a %Y-%m-%d %H:%M UTC"),
        fixture.status,
    )
}

fn odds_line(entry: &FixtureOdds) -> String {
    let prices: Vec<String> = [Selection::Home, Selection::Draw, Selection::Away]
        .into_iter()
        .filter_map(|s| entry.price(s).map(|q| format!("{s} {}", q.decimal_odds)))
        .collect();
    let prices = if prices.is_empty() {
        "no prices".to_string()
    } else {
        prices.join(", ")
    };
    format!("- {}: {prices}", entry.fixture.label())
}
