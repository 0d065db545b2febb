//! Strongly-typed identifiers used across the model.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a diagram element (shape, connection or root).
///
/// Ids are free-form strings so callers can pick readable ids (`"shape1"`);
/// [`ElementId::generate`] mints a unique one when none is supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create an identifier from a caller-chosen string.
    ///
    /// Returns [`DomainError::InvalidId`] for empty or whitespace-only input.
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::invalid_id("ElementId: must not be empty"));
        }
        Ok(Self(id))
    }

    /// Mint a fresh identifier.
    ///
    /// Uses UUIDv7 (time-ordered). Prefer passing ids explicitly in tests
    /// for determinism.
    pub fn generate() -> Self {
        Self(format!("el_{}", Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ElementId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ElementId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<ElementId> for String {
    fn from(value: ElementId) -> Self {
        value.0
    }
}

impl AsRef<str> for ElementId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_ids() {
        assert!(ElementId::new("").is_err());
        assert!(ElementId::new("   ").is_err());
        assert_eq!(ElementId::new("shape1").unwrap().as_str(), "shape1");
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = ElementId::generate();
        let b = ElementId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("el_"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id: ElementId = "root".parse().unwrap();
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("root"));
    }
}
