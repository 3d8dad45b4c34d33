//! Per-session conversation history and lightweight user state.

pub mod store;
