//! Test-result domain types: the outcome records written on completion.
//!
//! Result rows snapshot prompt, response, and reference at evaluation
//! time so historical results stay faithful even when test cases are
//! later edited.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::grading::GradingMethod;

/// Method-specific score breakdown, keyed by grading method.
///
/// LLM-judge details are trimmed to the `attributes` and `responses`
/// sub-objects; the metric methods store the engine's detail object
/// verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreDetail {
    Bleu(Value),
    Rouge(Value),
    Meteor(Value),
    LlmJudge { attributes: Value, responses: Value },
}

impl ScoreDetail {
    /// Build a detail from the engine's evaluation detail object.
    #[must_use]
    pub fn from_engine_detail(method: GradingMethod, detail: &Value) -> Self {
        match method {
            GradingMethod::Bleu => Self::Bleu(detail.clone()),
            GradingMethod::Rouge => Self::Rouge(detail.clone()),
            GradingMethod::Meteor => Self::Meteor(detail.clone()),
            GradingMethod::LlmJudge => Self::LlmJudge {
                attributes: detail.get("attributes").cloned().unwrap_or(Value::Null),
                responses: detail.get("responses").cloned().unwrap_or(Value::Null),
            },
        }
    }

    /// Parse a detail back from its stored JSON text.
    pub fn from_stored(method: GradingMethod, raw: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::from_engine_detail(method, &value))
    }

    /// The grading method this detail belongs to.
    #[must_use]
    pub const fn method(&self) -> GradingMethod {
        match self {
            Self::Bleu(_) => GradingMethod::Bleu,
            Self::Rouge(_) => GradingMethod::Rouge,
            Self::Meteor(_) => GradingMethod::Meteor,
            Self::LlmJudge { .. } => GradingMethod::LlmJudge,
        }
    }

    /// JSON projection persisted in the `attribute_scores` column and
    /// returned over the API.
    #[must_use]
    pub fn as_json(&self) -> Value {
        match self {
            Self::Bleu(detail) | Self::Rouge(detail) | Self::Meteor(detail) => detail.clone(),
            Self::LlmJudge {
                attributes,
                responses,
            } => serde_json::json!({
                "attributes": attributes,
                "responses": responses,
            }),
        }
    }
}

impl Serialize for ScoreDetail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bleu(detail) | Self::Rouge(detail) | Self::Meteor(detail) => {
                detail.serialize(serializer)
            }
            Self::LlmJudge {
                attributes,
                responses,
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("attributes", attributes)?;
                map.serialize_entry("responses", responses)?;
                map.end()
            }
        }
    }
}

/// A persisted test result.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub id: i64,
    pub test_case_id: i64,
    pub module_id: i64,
    /// Implementation name the run was dispatched against.
    pub model_implementation: String,
    /// Specific model within the implementation.
    pub model_name: String,
    /// Prompt as dispatched.
    pub prompt: String,
    /// The model's response.
    pub model_response: String,
    /// Reference response as dispatched.
    pub reference_response: String,
    pub grading_method: GradingMethod,
    /// Method-specific meaning; see the grading method's documentation.
    pub overall_score: f64,
    pub attribute_scores: ScoreDetail,
    /// System prompt in effect at dispatch time.
    pub system_prompt_id: Option<i64>,
    pub system_prompt_content: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Module name joined in for display.
    pub module_name: Option<String>,
    /// System prompt name joined in for display.
    pub system_prompt_name: Option<String>,
}

/// A result row to be inserted on completion (no ID yet).
#[derive(Debug, Clone)]
pub struct NewTestResult {
    pub test_case_id: i64,
    pub module_id: i64,
    pub model_implementation: String,
    pub model_name: String,
    pub prompt: String,
    pub model_response: String,
    pub reference_response: String,
    pub grading_method: GradingMethod,
    pub overall_score: f64,
    pub attribute_scores: ScoreDetail,
    pub system_prompt_id: Option<i64>,
    pub system_prompt_content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn llm_judge_detail_keeps_only_attributes_and_responses() {
        let raw = json!({
            "attributes": {"accuracy": {"score": 0.9, "explanation": "good"}},
            "responses": {"input": "q", "llm_response": "a", "reference_response": "b"},
            "debug": {"tokens": 512},
        });
        let detail = ScoreDetail::from_engine_detail(GradingMethod::LlmJudge, &raw);
        let stored = detail.as_json();
        assert!(stored.get("attributes").is_some());
        assert!(stored.get("responses").is_some());
        assert!(stored.get("debug").is_none());
    }

    #[test]
    fn metric_detail_is_stored_verbatim() {
        let raw = json!({
            "reference_tokens": ["a", "b"],
            "response_tokens": ["a", "c"],
            "precisions": [0.5],
        });
        let detail = ScoreDetail::from_engine_detail(GradingMethod::Bleu, &raw);
        assert_eq!(detail.as_json(), raw);
        assert_eq!(detail.method(), GradingMethod::Bleu);
    }

    #[test]
    fn stored_round_trip() {
        let raw = json!({"rouge1": {"fmeasure": 0.4}});
        let detail = ScoreDetail::from_engine_detail(GradingMethod::Rouge, &raw);
        let text = serde_json::to_string(&detail.as_json()).unwrap();
        let back = ScoreDetail::from_stored(GradingMethod::Rouge, &text).unwrap();
        assert_eq!(back, detail);
    }
}
