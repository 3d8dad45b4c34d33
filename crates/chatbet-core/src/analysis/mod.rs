//! Betting analysis engine.
//!
//! Pure, deterministic computation over odds and fixtures: implied
//! probability, payout simulation, competitiveness scoring and
//! recommendation ranking. No I/O and no model calls. Values are kept at
//! full precision here; rounding happens once in [`presentation`].

pub mod market;
pub mod presentation;
pub mod probability;
pub mod ranking;
pub mod simulation;

pub use market::{competitiveness, favorite, match_market};
pub use probability::implied_probability;
pub use ranking::{RankedFixture, rank_recommendations};
pub use simulation::{simulate, simulate_across};
