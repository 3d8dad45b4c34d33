//! Shared domain types for ChatBet.
//!
//! This crate contains the domain types used across the ChatBet workspace:
//! sports reference records, sessions and turns, intents and analysis
//! results, model request/response shapes, configuration, and errors.
//!
//! Zero infrastructure dependencies -- only serde, chrono, rust_decimal, thiserror.

pub mod analysis;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod sports;
