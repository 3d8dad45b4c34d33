//! ChatBet sports data API adapter.

pub mod client;
pub mod wire;

pub use client::ChatBetApiClient;
