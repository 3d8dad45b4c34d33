//! Infrastructure implementations for ChatBet.
//!
//! Concrete adapters behind the capability traits defined in `chatbet-core`:
//! the ChatBet sports HTTP API, an OpenAI-compatible model provider, and the
//! configuration loader.

pub mod config;
pub mod llm;
pub mod sports;
