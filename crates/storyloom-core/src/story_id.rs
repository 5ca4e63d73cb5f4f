//! Normalized story identifiers.
//!
//! A story is addressed by the id of the discussion post it lives on. Hosts
//! hand that id over in several shapes (`t3_abc123`, `T3_ABC123`, ` abc123 `),
//! so every key is derived from the normalized form only.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

const POST_FULLNAME_PREFIX: &str = "t3_";

/// A normalized story/post identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoryId(String);

impl StoryId {
    /// Normalizes `raw`: trims whitespace, strips a `t3_` prefix in any case,
    /// and lowercases.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if nothing is left after normalization
    /// or the id contains whitespace or a `:` key separator.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        let bare = match trimmed.get(..POST_FULLNAME_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(POST_FULLNAME_PREFIX) => {
                &trimmed[POST_FULLNAME_PREFIX.len()..]
            }
            _ => trimmed,
        };
        let normalized = bare.to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(DomainError::Validation(format!("invalid story id: {raw:?}")));
        }
        if normalized.chars().any(|c| c.is_whitespace() || c == ':') {
            return Err(DomainError::Validation(format!(
                "story id contains forbidden characters: {raw:?}"
            )));
        }
        Ok(Self(normalized))
    }

    /// The normalized id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The post fullname (`t3_{id}`) the discussion platform expects.
    #[must_use]
    pub fn fullname(&self) -> String {
        format!("{POST_FULLNAME_PREFIX}{}", self.0)
    }

    /// The durable key of this story's document.
    #[must_use]
    pub fn document_key(&self) -> String {
        format!("story:{}", self.0)
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for StoryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StoryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
