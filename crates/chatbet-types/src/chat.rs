//! Conversation session and turn types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisResult, Intent};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for TurnRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(TurnRole::User),
            "assistant" => Ok(TurnRole::Assistant),
            other => Err(format!("invalid turn role: '{other}'")),
        }
    }
}

/// One message within a session. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_result: Option<AnalysisResult>,
}

impl Turn {
    pub fn user(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            timestamp,
            structured_result: None,
        }
    }

    pub fn assistant(result: AnalysisResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: result.narrative.clone(),
            timestamp,
            structured_result: Some(result),
        }
    }
}

/// Per-session conversation history plus lightweight user state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_key: Option<String>,
    pub turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    /// Teams the user has referred to, deduplicated, in first-mention order.
    #[serde(default)]
    pub mentioned_teams: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_intent: Option<Intent>,
}

impl Session {
    pub fn new(session_id: impl Into<String>, user_key: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            user_key,
            turns: Vec::new(),
            created_at: now,
            last_activity: now,
            mentioned_teams: Vec::new(),
            last_intent: None,
        }
    }

    /// Whether the session has been idle for longer than `timeout`.
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_activity > timeout
    }

    /// Append a turn, keeping only the most recent `max_history` turns.
    pub fn push_turn(&mut self, turn: Turn, max_history: usize) {
        if turn.timestamp > self.last_activity {
            self.last_activity = turn.timestamp;
        }
        self.turns.push(turn);
        if self.turns.len() > max_history {
            let excess = self.turns.len() - max_history;
            self.turns.drain(..excess);
        }
    }

    /// Record team mentions, ignoring case-insensitive duplicates.
    pub fn remember_teams<I, S>(&mut self, teams: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for team in teams {
            let team = team.as_ref().trim();
            if team.is_empty() {
                continue;
            }
            let known = self
                .mentioned_teams
                .iter()
                .any(|t| t.eq_ignore_ascii_case(team));
            if !known {
                self.mentioned_teams.push(team.to_string());
            }
        }
    }

    /// The last `n` turns, oldest first.
    pub fn recent_turns(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }
}
