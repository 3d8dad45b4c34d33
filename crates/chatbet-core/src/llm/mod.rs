//! The language model as a capability: prompt plus schema in, structured JSON out.

pub mod box_capability;
pub mod capability;
