//! Deterministic fingerprint of a tool input schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// Lowercase hex SHA-256 of the canonical (JCS) form of an input schema.
///
/// Key order and whitespace do not affect the hash, so two fetches of an
/// unchanged schema always agree. A missing schema hashes as JSON `null`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaHash(String);

impl SchemaHash {
    /// Computes the fingerprint of an optional schema.
    #[must_use]
    pub fn compute(schema: Option<&Value>) -> Self {
        let value = schema.unwrap_or(&Value::Null);
        let canonical =
            serde_jcs::to_vec(value).unwrap_or_else(|_| value.to_string().into_bytes());
        Self::from_bytes(&canonical)
    }

    /// Hashes arbitrary bytes into the same hex representation.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        Self(digest.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaHash {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
