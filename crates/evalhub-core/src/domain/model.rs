//! Model registration domain types.
//!
//! A registration names a model implementation the evaluation engine can
//! drive. The stored API key is encrypted at rest; the ciphertext record
//! never leaves the persistence/vault boundary.

use serde::{Deserialize, Serialize};

/// A registered model implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRegistration {
    /// Database ID of the registration.
    pub id: i64,
    /// Unique implementation name (e.g. "openai", "anthropic").
    pub name: String,
    /// Implementation kind reported by the engine.
    #[serde(rename = "type")]
    pub kind: String,
    /// Free-form description.
    pub description: String,
    /// Opaque engine-specific configuration.
    pub config: serde_json::Value,
}

/// A registration to be inserted or refreshed (no ID yet).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewModelRegistration {
    pub name: String,
    #[serde(default = "default_kind", rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

fn default_kind() -> String {
    "unknown".to_string()
}

/// Encrypted API key at rest: base64 ciphertext plus base64 nonce.
///
/// Empty strings mean "registered but no key stored yet" - the registry
/// seeds an empty record so the admin UI can show key status per model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyRecord {
    pub encrypted_key: String,
    pub iv: String,
}

impl ApiKeyRecord {
    /// An empty placeholder record (no key stored).
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            encrypted_key: String::new(),
            iv: String::new(),
        }
    }

    /// Whether a key has actually been stored.
    #[must_use]
    pub fn is_present(&self) -> bool {
        !self.encrypted_key.is_empty() && !self.iv.is_empty()
    }
}
