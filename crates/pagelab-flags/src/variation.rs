//! Flag keys and canonical variation values
//!
//! The service can serve the same experiment as a boolean in one
//! environment and a string letter in another. Downstream code never sees
//! that: everything compares through [`Variation::canonical`], where
//! `false` is `"A"` (control) and `true` is `"B"`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique experiment key (e.g. `chargeperk-cta-text`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagKey(pub String);

impl FlagKey {
    /// Create a key
    #[inline]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FlagKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// A variant value as served by the flag service
///
/// Serialized untagged so `true` and `"B"` both deserialize naturally from
/// a raw snapshot payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variation {
    /// Boolean flag; coerces to `"A"`/`"B"` at comparison time
    Bool(bool),
    /// Enumerated string variant (`"A"`, `"B"`, `"C"`, ...)
    Text(String),
}

impl Variation {
    /// The control value shared by every experiment
    #[inline]
    #[must_use]
    pub fn control() -> Self {
        Self::Text("A".to_string())
    }

    /// Canonical string form: `Bool(false)` → `"A"`, `Bool(true)` → `"B"`
    #[must_use]
    pub fn canonical(&self) -> &str {
        match self {
            Self::Bool(false) => "A",
            Self::Bool(true) => "B",
            Self::Text(s) => s.as_str(),
        }
    }

    /// Whether two variations denote the same variant after coercion
    #[inline]
    #[must_use]
    pub fn same_as(&self, other: &Variation) -> bool {
        self.canonical() == other.canonical()
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

impl From<bool> for Variation {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Variation {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Variation {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn booleans_coerce_to_letters() {
        assert_eq!(Variation::Bool(false).canonical(), "A");
        assert_eq!(Variation::Bool(true).canonical(), "B");
        assert!(Variation::Bool(false).same_as(&Variation::control()));
        assert!(Variation::Bool(true).same_as(&Variation::Text("B".into())));
    }

    #[test]
    fn text_variants_pass_through() {
        assert_eq!(Variation::Text("C".into()).canonical(), "C");
        assert!(!Variation::Text("C".into()).same_as(&Variation::control()));
    }

    #[test]
    fn untagged_serde_accepts_both_shapes() {
        let from_bool: Variation = serde_json::from_str("true").unwrap();
        let from_text: Variation = serde_json::from_str("\"C\"").unwrap();
        assert_eq!(from_bool, Variation::Bool(true));
        assert_eq!(from_text, Variation::Text("C".into()));
    }
}
