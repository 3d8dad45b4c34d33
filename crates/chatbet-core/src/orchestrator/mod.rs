//! Turn orchestrator.
//!
//! [`Orchestrator::handle_message`] drives one user message through the
//! turn state machine: load context, gather sports data, build the prompt,
//! call the model (one corrective retry on malformed output), apply the
//! analysis engine and commit the turn. Every failure ends the turn with a
//! degraded [`AnalysisResult`]; nothing is returned as an error and a
//! degraded turn is never written to the session.

pub mod entities;
pub mod fallback;
pub mod state;

use std::sync::Arc;
use std::time::Instant;

use chatbet_types::analysis::{AnalysisResult, BetSimulation, Intent, StructuredPayload};
use chatbet_types::chat::{Session, Turn};
use chatbet_types::config::ChatBetConfig;
use chatbet_types::error::TurnError;
use chatbet_types::llm::{ModelError, ModelRequest, ModelResponse};
use chatbet_types::sports::{FixtureOdds, Selection, Tournament};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tracing::{debug, info, warn};

use crate::analysis::{self, presentation};
use crate::context::store::ContextStore;
use crate::data::service::SportsDataService;
use crate::data::window::FixtureWindow;
use crate::llm::box_capability::BoxModelCapability;
use crate::prompt::{ModelOutput, PromptBuilder, PromptInput, PromptSettings, RelevantData, parse_model_output};

use self::entities::{TeamMatcher, find_tournaments, parse_odds, parse_stake};
use self::state::{TurnState, TurnTrace};

/// Words suggesting the answer needs prices, not just the schedule.
const ODDS_KEYWORDS: &[&str] = &[
    "odds", "price", "prices", "favorite", "favourite", "favorites", "bet", "bets", "stake",
    "simulate", "simulation", "wager", "payout", "recommend", "recommendation", "suggest",
    "competitive", "value", "safe", "risk", "win", "pick",
];

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Eligible intents below this confidence get no analysis payload.
    pub analysis_min_confidence: f64,
    pub max_fixtures: usize,
    pub max_odds_fixtures: usize,
    pub max_recommendations: usize,
    pub max_simulations: usize,
}

impl OrchestratorSettings {
    pub fn from_config(config: &ChatBetConfig) -> Self {
        Self {
            analysis_min_confidence: config.analysis_min_confidence,
            max_fixtures: config.prompt.max_fixtures,
            max_odds_fixtures: config.prompt.max_odds_fixtures,
            max_recommendations: 5,
            max_simulations: 10,
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&ChatBetConfig::default())
    }
}

/// What the message itself says, before the model is asked.
#[derive(Debug, Clone, Default)]
struct Extracted {
    teams: Vec<String>,
    tournaments: Vec<Tournament>,
    stake: Option<Decimal>,
    decimal_odds: Option<Decimal>,
    wants_odds: bool,
}

pub struct Orchestrator {
    context: Arc<ContextStore>,
    data: Arc<SportsDataService>,
    model: BoxModelCapability,
    prompt: PromptBuilder,
    teams: TeamMatcher,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        context: Arc<ContextStore>,
        data: Arc<SportsDataService>,
        model: BoxModelCapability,
        prompt: PromptBuilder,
        teams: TeamMatcher,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            context,
            data,
            model,
            prompt,
            teams,
            settings,
        }
    }

    pub fn from_config(
        config: &ChatBetConfig,
        context: Arc<ContextStore>,
        data: Arc<SportsDataService>,
        model: BoxModelCapability,
    ) -> Self {
        Self::new(
            context,
            data,
            model,
            PromptBuilder::new(PromptSettings::from_config(config)),
            TeamMatcher::new(&config.known_teams),
            OrchestratorSettings::from_config(config),
        )
    }

    pub fn context(&self) -> &Arc<ContextStore> {
        &self.context
    }

    pub fn model_name(&self) -> &str {
        self.model.model()
    }

    /// Handle one user message. Always returns a well-formed result.
    pub async fn handle_message(
        &self,
        session_id: &str,
        user_key: Option<&str>,
        message: &str,
    ) -> AnalysisResult {
        self.handle_message_at(session_id, user_key, message, Utc::now())
            .await
    }

    pub async fn handle_message_at(
        &self,
        session_id: &str,
        user_key: Option<&str>,
        message: &str,
        now: DateTime<Utc>,
    ) -> AnalysisResult {
        self.run_turn(session_id, user_key, message, now).await.0
    }

    async fn run_turn(
        &self,
        session_id: &str,
        user_key: Option<&str>,
        message: &str,
        now: DateTime<Utc>,
    ) -> (AnalysisResult, TurnTrace) {
        let started = Instant::now();
        let mut trace = TurnTrace::new(session_id);

        // Held until the turn ends so turns of one session apply in order.
        let mut session = self.context.lock_at(session_id, user_key, now).await;
        trace.advance(TurnState::ContextLoaded);

        let outcome = self.complete_turn(&mut session, message, now, &mut trace).await;
        drop(session);

        let result = match outcome {
            Ok(result) => {
                info!(
                    %session_id,
                    intent = %result.intent,
                    confidence = result.confidence,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "turn completed"
                );
                result
            }
            Err(err) => {
                fallback::log_failure(session_id, &err);
                AnalysisResult::degraded(fallback::narrative_for(&err))
            }
        };
        trace.advance(TurnState::Done);
        (result, trace)
    }

    async fn complete_turn(
        &self,
        session: &mut Session,
        message: &str,
        now: DateTime<Utc>,
        trace: &mut TurnTrace,
    ) -> Result<AnalysisResult, TurnError> {
        let mut extracted = self.extract(message, session);
        extracted.tournaments = self.named_tournaments(message).await;
        let mut data = self.gather(message, &extracted, now).await?;
        trace.advance(TurnState::DataRetrieved);

        let request = self.prompt.build(&PromptInput {
            message,
            history: &session.turns,
            data: &data,
            mentioned_teams: &session.mentioned_teams,
            last_intent: session.last_intent,
            now,
        });
        trace.advance(TurnState::PromptBuilt);

        let output = self.invoke(&request, &session.session_id, trace).await?;
        merge_model_entities(&mut extracted, &output);

        if self.needs_odds(&output, &extracted, &data) {
            debug!(intent = %output.intent, "fetching odds for classified intent");
            data.odds = self
                .data
                .odds_for_fixtures(data.fixtures.iter(), self.settings.max_odds_fixtures)
                .await?;
        }

        let payload = self.apply(&output, &extracted, &data)?;
        if output.intent.is_analysis_eligible() {
            trace.advance(TurnState::AnalysisApplied);
        }

        let result = AnalysisResult {
            intent: output.intent,
            confidence: output.confidence,
            narrative: output.narrative,
            payload,
        };

        session.remember_teams(&extracted.teams);
        session.last_intent = Some(result.intent);
        self.context.append_locked(session, Turn::user(message, now));
        self.context
            .append_locked(session, Turn::assistant(result.clone(), now));
        trace.advance(TurnState::ContextUpdated);

        Ok(result)
    }

    fn extract(&self, message: &str, session: &Session) -> Extracted {
        let lower = message.to_lowercase();
        let wants_odds = lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| ODDS_KEYWORDS.contains(&word));
        let extracted = Extracted {
            teams: self.teams.resolve(message, &session.mentioned_teams),
            tournaments: Vec::new(),
            stake: parse_stake(message),
            decimal_odds: parse_odds(message),
            wants_odds,
        };
        debug!(
            session_id = %session.session_id,
            teams = ?extracted.teams,
            stake = ?extracted.stake,
            decimal_odds = ?extracted.decimal_odds,
            "extracted entities"
        );
        extracted
    }

    async fn gather(
        &self,
        message: &str,
        extracted: &Extracted,
        now: DateTime<Utc>,
    ) -> Result<RelevantData, TurnError> {
        let targeted = !extracted.teams.is_empty() || !extracted.tournaments.is_empty();
        let window = FixtureWindow::for_message(message, now, targeted);
        let relevant = self
            .data
            .relevant_fixtures(&extracted.teams, &extracted.tournaments, window)
            .await?;
        let fixtures: Vec<_> = relevant
            .iter()
            .take(self.settings.max_fixtures)
            .cloned()
            .collect();
        debug!(
            window_start = %relevant.window().start,
            window_end = %relevant.window().end,
            fixtures = fixtures.len(),
            stale = relevant.is_stale(),
            "gathered fixtures"
        );

        let odds = if extracted.wants_odds && !fixtures.is_empty() {
            self.data
                .odds_for_fixtures(fixtures.iter(), self.settings.max_odds_fixtures)
                .await?
        } else {
            Vec::new()
        };

        Ok(RelevantData {
            fixtures,
            odds,
            stale: relevant.is_stale(),
        })
    }

    /// Tournaments named in the message. A failed tournament lookup only
    /// loses the tournament filter.
    async fn named_tournaments(&self, message: &str) -> Vec<Tournament> {
        match self.data.tournaments().await {
            Ok(cached) => find_tournaments(message, &cached.value),
            Err(err) => {
                warn!(error = %err, "tournament lookup failed, not filtering by tournament");
                Vec::new()
            }
        }
    }

    /// Whether the classified intent needs prices that were not gathered up front.
    fn needs_odds(&self, output: &ModelOutput, extracted: &Extracted, data: &RelevantData) -> bool {
        if !output.intent.is_analysis_eligible()
            || output.confidence < self.settings.analysis_min_confidence
            || !data.odds.is_empty()
            || data.fixtures.is_empty()
        {
            return false;
        }
        // A stake at stated odds is simulated without market prices.
        !(output.intent == Intent::BetSimulation && extracted.decimal_odds.is_some())
    }

    /// Call the model and validate its output, retrying once with a
    /// corrective instruction when the output is malformed.
    async fn invoke(
        &self,
        request: &ModelRequest,
        session_id: &str,
        trace: &mut TurnTrace,
    ) -> Result<ModelOutput, ModelError> {
        trace.advance(TurnState::ModelInvoked);
        let response = self.call_model(request).await?;
        let err = match parse_model_output(&response.content) {
            Ok(output) => {
                trace.advance(TurnState::Parsed);
                return Ok(output);
            }
            Err(err) => err,
        };

        warn!(%session_id, error = %err, "model output rejected, retrying with correction");
        trace.advance(TurnState::ParseFailed);

        let retry = self.prompt.corrective(request, &err);
        trace.advance(TurnState::ModelInvoked);
        let response = self.call_model(&retry).await?;
        match parse_model_output(&response.content) {
            Ok(output) => {
                trace.advance(TurnState::Parsed);
                Ok(output)
            }
            Err(err) => {
                trace.advance(TurnState::ParseFailed);
                Err(err)
            }
        }
    }

    async fn call_model(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let started = Instant::now();
        let response = tokio::time::timeout(request.timeout, self.model.invoke(request))
            .await
            .map_err(|_| ModelError::Timeout(request.timeout))??;
        debug!(
            provider = self.model.name(),
            model = %response.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model responded"
        );
        Ok(response)
    }

    /// Build the structured payload for the parsed intent.
    fn apply(
        &self,
        output: &ModelOutput,
        extracted: &Extracted,
        data: &RelevantData,
    ) -> Result<StructuredPayload, TurnError> {
        if output.intent.is_analysis_eligible()
            && output.confidence < self.settings.analysis_min_confidence
        {
            debug!(
                intent = %output.intent,
                confidence = output.confidence,
                "confidence below analysis threshold"
            );
            return Ok(StructuredPayload::Empty);
        }

        let payload = match output.intent {
            Intent::ScheduleQuery => presentation::schedule_list(&data.fixtures),
            Intent::OddsQuery => {
                let favorite = if extracted.teams.len() >= 2 {
                    analysis::favorite(&extracted.teams, &data.odds)
                } else {
                    None
                };
                presentation::odds_comparison(&data.odds, favorite)?
            }
            Intent::BetSimulation => self.simulations(output, extracted, data)?,
            Intent::BettingRecommendation => {
                let ranked = analysis::rank_recommendations(&data.odds)?;
                presentation::recommendation_list(&ranked, self.settings.max_recommendations)
            }
            Intent::General | Intent::Unknown => StructuredPayload::Empty,
        };
        Ok(payload)
    }

    fn simulations(
        &self,
        output: &ModelOutput,
        extracted: &Extracted,
        data: &RelevantData,
    ) -> Result<StructuredPayload, TurnError> {
        let Some(stake) = extracted.stake else {
            debug!("bet simulation without a stake");
            return Ok(StructuredPayload::Empty);
        };

        let simulations = match extracted.decimal_odds {
            Some(odds) => vec![analysis::simulate(stake, odds)?],
            None => {
                let mut all = analysis::simulate_across(stake, &data.odds, usize::MAX)?;
                if let Some(selection) = output.entities.selection {
                    all.retain(|s| s.selection == Some(selection));
                } else if !extracted.teams.is_empty() {
                    all.retain(|s| backs_named_team(s, &data.odds, &extracted.teams));
                }
                all.truncate(self.settings.max_simulations);
                all
            }
        };
        Ok(presentation::simulation_result(&simulations))
    }
}

/// Fill gaps in the message-derived entities from the model's extraction.
fn merge_model_entities(extracted: &mut Extracted, output: &ModelOutput) {
    if extracted.teams.is_empty() {
        extracted.teams = output.entities.teams.clone();
    }
    if extracted.stake.is_none() {
        extracted.stake = output.entities.amount.and_then(Decimal::from_f64);
    }
    if extracted.decimal_odds.is_none() {
        extracted.decimal_odds = output.entities.decimal_odds.and_then(Decimal::from_f64);
    }
}

fn backs_named_team(sim: &BetSimulation, priced: &[FixtureOdds], teams: &[String]) -> bool {
    let Some(entry) = priced
        .iter()
        .find(|e| Some(&e.fixture.id) == sim.fixture_id.as_ref())
    else {
        return false;
    };
    teams.iter().any(|team| {
        let side = entry.fixture.side_of(team);
        side.is_some() && side == sim.selection && side != Some(Selection::Draw)
    })
}
