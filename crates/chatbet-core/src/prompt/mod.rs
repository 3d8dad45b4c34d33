//! Prompt construction and model output validation.

pub mod builder;
pub mod schema;

pub use builder::{PromptBuilder, PromptInput, PromptSettings, RelevantData};
pub use schema::{ModelEntities, ModelOutput, parse_model_output, response_schema};
