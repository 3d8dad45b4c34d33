//! Conversation orchestration and betting analysis for ChatBet.
//!
//! Holds the data cache, context store, prompt builder, analysis engine
//! and the turn orchestrator. The sports data source and the language
//! model are consumed through the [`data::client::SportsDataClient`] and
//! [`llm::capability::ModelCapability`] traits, implemented in chatbet-infra.

pub mod analysis;
pub mod cache;
pub mod context;
pub mod data;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
