//! System prompt domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reusable system prompt.
///
/// Modules reference one as their default; individual test cases may
/// override it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemPrompt {
    /// Database ID.
    pub id: i64,
    /// Human-readable name shown in pickers.
    pub name: String,
    /// The prompt text sent to the model.
    pub content: String,
    /// UTC timestamp of creation.
    pub created_at: DateTime<Utc>,
}

/// A system prompt to be inserted (no ID yet).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSystemPrompt {
    pub name: String,
    pub content: String,
}
