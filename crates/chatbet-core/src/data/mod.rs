//! Sports data access: the client capability, its boxed wrapper, and the
//! cached service the orchestrator reads through.

pub mod box_client;
pub mod client;
pub mod service;
pub mod window;
