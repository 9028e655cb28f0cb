//! Grading method enumeration.

use serde::{Deserialize, Serialize};

/// How a model response is scored against its reference response.
///
/// This is a closed set: assignments and engine output are validated
/// against it, and the wire form is the SCREAMING_SNAKE name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GradingMethod {
    Bleu,
    Rouge,
    Meteor,
    LlmJudge,
}

impl GradingMethod {
    /// All grading methods, in the order the UI lists them.
    pub const ALL: [Self; 4] = [Self::Bleu, Self::Rouge, Self::Meteor, Self::LlmJudge];

    /// Parse a method from its wire/storage name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BLEU" => Some(Self::Bleu),
            "ROUGE" => Some(Self::Rouge),
            "METEOR" => Some(Self::Meteor),
            "LLM_JUDGE" => Some(Self::LlmJudge),
            _ => None,
        }
    }

    /// Wire/storage name of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bleu => "BLEU",
            Self::Rouge => "ROUGE",
            Self::Meteor => "METEOR",
            Self::LlmJudge => "LLM_JUDGE",
        }
    }
}

impl std::fmt::Display for GradingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
