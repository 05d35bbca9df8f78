//! Enum types for album grading.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Physical condition of a record, following the usual vinyl grading scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum AlbumCondition {
    /// Unplayed or indistinguishable from unplayed
    Mint,
    /// Light signs of play, no audible defects
    #[serde(rename = "very good", alias = "very_good", alias = "verygood")]
    VeryGood,
    /// Audible surface noise, plays through
    Good,
    /// Heavy wear
    Fair,
    /// Damaged, collectible only
    Poor,
}

impl AlbumCondition {
    /// All grades from best to worst.
    pub const ALL: [AlbumCondition; 5] = [
        AlbumCondition::Mint,
        AlbumCondition::VeryGood,
        AlbumCondition::Good,
        AlbumCondition::Fair,
        AlbumCondition::Poor,
    ];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            AlbumCondition::Mint => "mint",
            AlbumCondition::VeryGood => "very good",
            AlbumCondition::Good => "good",
            AlbumCondition::Fair => "fair",
            AlbumCondition::Poor => "poor",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, AlbumConditionParseError> {
        match normalize_token(s).as_str() {
            "mint" => Ok(AlbumCondition::Mint),
            "verygood" | "vg" => Ok(AlbumCondition::VeryGood),
            "good" => Ok(AlbumCondition::Good),
            "fair" => Ok(AlbumCondition::Fair),
            "poor" => Ok(AlbumCondition::Poor),
            _ => Err(AlbumConditionParseError(s.to_string())),
        }
    }

    /// Parse an optional column value where the empty string means "ungraded".
    pub fn from_optional_str(s: &str) -> Result<Option<Self>, AlbumConditionParseError> {
        if s.trim().is_empty() {
            Ok(None)
        } else {
            Self::from_db_str(s).map(Some)
        }
    }
}

fn normalize_token(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl fmt::Display for AlbumCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for AlbumCondition {
    type Err = AlbumConditionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid album condition string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumConditionParseError(pub String);

impl fmt::Display for AlbumConditionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid album condition: {}", self.0)
    }
}

impl std::error::Error for AlbumConditionParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_str_roundtrip_for_every_grade() {
        for condition in AlbumCondition::ALL {
            assert_eq!(AlbumCondition::from_db_str(condition.as_db_str()), Ok(condition));
        }
    }

    #[test]
    fn test_parse_is_lenient_about_spacing_and_case() {
        assert_eq!("Very Good".parse::<AlbumCondition>(), Ok(AlbumCondition::VeryGood));
        assert_eq!("very_good".parse::<AlbumCondition>(), Ok(AlbumCondition::VeryGood));
        assert_eq!("MINT".parse::<AlbumCondition>(), Ok(AlbumCondition::Mint));
    }

    #[test]
    fn test_parse_rejects_unknown_grade() {
        let err = "scratched".parse::<AlbumCondition>().unwrap_err();
        assert!(err.to_string().contains("scratched"));
    }

    #[test]
    fn test_optional_empty_means_ungraded() {
        assert_eq!(AlbumCondition::from_optional_str(""), Ok(None));
        assert_eq!(AlbumCondition::from_optional_str("  "), Ok(None));
        assert_eq!(
            AlbumCondition::from_optional_str("fair"),
            Ok(Some(AlbumCondition::Fair))
        );
    }

    #[test]
    fn test_serde_uses_spaced_name() {
        let json = serde_json::to_string(&AlbumCondition::VeryGood).unwrap();
        assert_eq!(json, "\"very good\"");
        let parsed: AlbumCondition = serde_json::from_str("\"very_good\"").unwrap();
        assert_eq!(parsed, AlbumCondition::VeryGood);
    }
}
