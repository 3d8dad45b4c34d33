//! Time-bounded memoization of sports reference data.

pub mod ttl;
