//! Turn state machine.

use std::fmt;

use tracing::debug;

/// Where a turn is in its lifecycle. `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    ContextLoaded,
    DataRetrieved,
    PromptBuilt,
    ModelInvoked,
    Parsed,
    ParseFailed,
    AnalysisApplied,
    ContextUpdated,
    Done,
}

impl TurnState {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnState::Idle => "idle",
            TurnState::ContextLoaded => "context_loaded",
            TurnState::DataRetrieved => "data_retrieved",
            TurnState::PromptBuilt => "prompt_built",
            TurnState::ModelInvoked => "model_invoked",
            TurnState::Parsed => "parsed",
            TurnState::ParseFailed => "parse_failed",
            TurnState::AnalysisApplied => "analysis_applied",
            TurnState::ContextUpdated => "context_updated",
            TurnState::Done => "done",
        }
    }

    /// Whether `next` may follow `self`.
    ///
    /// Every state except `Idle` and `Done` may end the turn early (degraded).
    /// `ParseFailed -> ModelInvoked` is the single corrective retry.
    pub fn can_transition_to(self, next: TurnState) -> bool {
        use TurnState::*;
        match (self, next) {
            (Idle, ContextLoaded)
            | (ContextLoaded, DataRetrieved)
            | (DataRetrieved, PromptBuilt)
            | (PromptBuilt, ModelInvoked)
            | (ModelInvoked, Parsed)
            | (ModelInvoked, ParseFailed)
            | (ParseFailed, ModelInvoked)
            | (Parsed, AnalysisApplied)
            | (Parsed, ContextUpdated)
            | (AnalysisApplied, ContextUpdated)
            | (ContextUpdated, Done) => true,
            (Idle, Done) | (Done, _) => false,
            (_, Done) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == TurnState::Done
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records the states one turn passes through.
#[derive(Debug, Clone)]
pub struct TurnTrace {
    session_id: String,
    visited: Vec<TurnState>,
}

impl TurnTrace {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            visited: vec![TurnState::Idle],
        }
    }

    pub fn state(&self) -> TurnState {
        self.visited.last().copied().unwrap_or(TurnState::Idle)
    }

    pub fn visited(&self) -> &[TurnState] {
        &self.visited
    }

    pub fn advance(&mut self, next: TurnState) {
        let from = self.state();
        debug_assert!(
            from.can_transition_to(next),
            "invalid turn transition {from} -> {next}"
        );
        debug!(session_id = %self.session_id, %from, to = %next, "turn transition");
        self.visited.push(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_valid() {
        let path = [
            TurnState::Idle,
            TurnState::ContextLoaded,
            TurnState::DataRetrieved,
            TurnState::PromptBuilt,
            TurnState::ModelInvoked,
            TurnState::Parsed,
            TurnState::AnalysisApplied,
            TurnState::ContextUpdated,
            TurnState::Done,
        ];
        assert!(path.windows(2).all(|w| w[0].can_transition_to(w[1])));
    }

    #[test]
    fn degraded_exits_go_straight_to_done() {
        assert!(TurnState::ContextLoaded.can_transition_to(TurnState::Done));
        assert!(TurnState::ParseFailed.can_transition_to(TurnState::Done));
        assert!(TurnState::ModelInvoked.can_transition_to(TurnState::Done));
    }

    #[test]
    fn done_is_terminal() {
        assert!(TurnState::Done.is_terminal());
        assert!(!TurnState::Done.can_transition_to(TurnState::Idle));
        assert!(!TurnState::Done.can_transition_to(TurnState::Done));
    }

    #[test]
    fn cannot_skip_the_model() {
        assert!(!TurnState::DataRetrieved.can_transition_to(TurnState::Parsed));
        assert!(!TurnState::PromptBuilt.can_transition_to(TurnState::AnalysisApplied));
    }

    #[test]
    fn trace_records_path() {
        let mut trace = TurnTrace::new("s1");
        trace.advance(TurnState::ContextLoaded);
        trace.advance(TurnState::Done);
        assert_eq!(
            trace.visited(),
            &[TurnState::Idle, TurnState::ContextLoaded, TurnState::Done]
        );
        assert!(trace.state().is_terminal());
    }
}
