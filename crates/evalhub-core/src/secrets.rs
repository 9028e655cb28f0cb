//! Redacting wrapper for decrypted credentials.
//!
//! A decrypted API key lives in memory only between vault resolution and
//! engine dispatch. The wrapper keeps it out of `Debug`/`Display` output
//! and makes every read an explicit `expose()` call at the serialization
//! boundary.

/// A decrypted API key.
///
/// Never derives `Serialize`; the engine job payload is the only place
/// the plaintext is written, via [`ApiKey::expose`].
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a decrypted key.
    #[must_use]
    pub const fn new(plaintext: String) -> Self {
        Self(plaintext)
    }

    /// Read the plaintext. Callers must not log or persist the value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the key is empty (treated as "no usable credential").
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<redacted>")
    }
}
