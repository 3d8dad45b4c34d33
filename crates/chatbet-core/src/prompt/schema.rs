//! The structured object the model must return, and its validation.

use chatbet_types::analysis::Intent;
use chatbet_types::llm::{ModelError, ResponseSchema};
use chatbet_types::sports::Selection;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Model output for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelOutput {
    /// One of the listed intents.
    #[schemars(schema_with = "classifiable_intent")]
    pub intent: Intent,
    /// Confidence in the intent, between 0 and 1.
    pub confidence: f64,
    /// The reply shown to the user.
    pub narrative: String,
    #[serde(default)]
    pub entities: ModelEntities,
}

/// Entities the model picked out of the message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelEntities {
    /// Team names mentioned or referred to.
    #[serde(default)]
    pub teams: Vec<String>,
    /// Dates or date words ("tomorrow", "10-31").
    #[serde(default)]
    pub dates: Vec<String>,
    /// Stake amount for a simulated bet.
    #[serde(default)]
    pub amount: Option<f64>,
    /// Decimal odds stated by the user.
    #[serde(default)]
    pub decimal_odds: Option<f64>,
    /// Outcome the user wants to back.
    #[serde(default)]
    pub selection: Option<Selection>,
}

/// Intents offered to the model; the degraded-only intent is left out.
fn classifiable_intent(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    let names: Vec<&str> = Intent::CLASSIFIABLE.iter().map(|i| i.as_str()).collect();
    schemars::json_schema!({
        "type": "string",
        "enum": names,
    })
}

/// The strict JSON schema sent with every model request.
pub fn response_schema() -> ResponseSchema {
    ResponseSchema::for_type::<ModelOutput>("ModelOutput")
}

/// Parse and validate raw model text.
///
/// Accepts a bare JSON object or one wrapped in a Markdown code fence.
pub fn parse_model_output(raw: &str) -> Result<ModelOutput, ModelError> {
    let json = strip_code_fence(raw);
    let output: ModelOutput = serde_json::from_str(json)
        .map_err(|e| ModelError::MalformedOutput(format!("not a valid ModelOutput object: {e}")))?;

    if output.intent == Intent::Unknown {
        return Err(ModelError::MalformedOutput(
            "intent must be one of the listed intents, not 'unknown'".to_string(),
        ));
    }
    if !output.confidence.is_finite() || !(0.0..=1.0).contains(&output.confidence) {
        return Err(ModelError::MalformedOutput(format!(
            "confidence must be between 0 and 1, got {}",
            output.confidence
        )));
    }
    if output.narrative.trim().is_empty() {
        return Err(ModelError::MalformedOutput(
            "narrative must not be empty".to_string(),
        ));
    }
    Ok(output)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "intent": "bet_simulation",
        "confidence": 0.92,
        "narrative": "A $100 bet at 2.50 returns $250.",
        "entities": {"teams": [], "dates": [], "amount": 100, "decimal_odds": 2.5, "selection": null}
    }"#;

    #[test]
    fn parses_plain_json() {
        let out = parse_model_output(VALID).unwrap();
        assert_eq!(out.intent, Intent::BetSimulation);
        assert_eq!(out.entities.amount, Some(100.0));
        assert_eq!(out.entities.decimal_odds, Some(2.5));
    }

    #[test]
    fn strips_markdown_fence() {
        let fenced = format!("```json\n{VALID}\n```");
        assert_eq!(parse_model_output(&fenced).unwrap().intent, Intent::BetSimulation);
    }

    #[test]
    fn entities_are_optional() {
        let out = parse_model_output(r#"{"intent":"general","confidence":1.0,"narrative":"Hi!"}"#)
            .unwrap();
        assert_eq!(out.entities, ModelEntities::default());
    }

    #[test]
    fn rejects_prose() {
        let err = parse_model_output("Sure! Barcelona plays on Sunday.").unwrap_err();
        assert!(matches!(err, ModelError::MalformedOutput(_)));
    }

    #[test]
    fn rejects_unknown_intent_names() {
        let err = parse_model_output(r#"{"intent":"lottery","confidence":0.5,"narrative":"x"}"#)
            .unwrap_err();
        assert!(matches!(err, ModelError::MalformedOutput(_)));
        let err = parse_model_output(r#"{"intent":"unknown","confidence":0.5,"narrative":"x"}"#)
            .unwrap_err();
        assert!(matches!(err, ModelError::MalformedOutput(ref m) if m.contains("unknown")));
    }

    #[test]
    fn rejects_confidence_out_of_range() {
        let err = parse_model_output(r#"{"intent":"general","confidence":1.5,"narrative":"x"}"#)
            .unwrap_err();
        assert!(matches!(err, ModelError::MalformedOutput(ref m) if m.contains("confidence")));
    }

    #[test]
    fn rejects_blank_narrative() {
        let err = parse_model_output(r#"{"intent":"general","confidence":0.4,"narrative":"  "}"#)
            .unwrap_err();
        assert!(matches!(err, ModelError::MalformedOutput(_)));
    }

    #[test]
    fn schema_is_closed() {
        let schema = response_schema();
        assert_eq!(schema.name, "ModelOutput");
        assert_eq!(schema.schema["additionalProperties"], serde_json::Value::Bool(false));
        assert!(schema.schema["properties"]["intent"].is_object());
    }

    fn names(value: &serde_json::Value) -> Vec<String> {
        let mut names: Vec<String> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n.as_str().unwrap().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn schema_offers_only_classifiable_intents() {
        let schema = response_schema().schema;
        let intent = &schema["properties"]["intent"];
        assert_eq!(intent["type"], "string");
        assert_eq!(
            names(&intent["enum"]),
            ["bet_simulation", "betting_recommendation", "general", "odds_query", "schedule_query"]
        );
        assert!(!schema.to_string().contains("\"unknown\""));
    }

    #[test]
    fn schema_requires_every_property() {
        let schema = response_schema().schema;
        assert_eq!(
            names(&schema["required"]),
            ["confidence", "entities", "intent", "narrative"]
        );

        let entities = match schema["properties"]["entities"].get("$ref") {
            Some(reference) => {
                let name = reference.as_str().unwrap().rsplit('/').next().unwrap();
                schema["$defs"][name].clone()
            }
            None => schema["properties"]["entities"].clone(),
        };
        assert_eq!(
            names(&entities["required"]),
            ["amount", "dates", "decimal_odds", "selection", "teams"]
        );
        assert_eq!(entities["additionalProperties"], serde_json::Value::Bool(false));
    }

    #[test]
    fn schema_avoids_one_of() {
        let schema = response_schema().schema;
        assert!(!schema.to_string().contains("\"oneOf\""));
    }
}
