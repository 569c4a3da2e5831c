use serde::{Deserialize, Serialize};
use std::fmt;

/// Listing category. Unknown input falls back to `House`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyType {
    #[default]
    House,
    Condo,
    Penthouse,
    Townhouse,
    Estate,
    Duplex,
    Loft,
}

impl PropertyType {
    pub const ALL: [PropertyType; 7] = [
        PropertyType::House,
        PropertyType::Condo,
        PropertyType::Penthouse,
        PropertyType::Townhouse,
        PropertyType::Estate,
        PropertyType::Duplex,
        PropertyType::Loft,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::House => "House",
            PropertyType::Condo => "Condo",
            PropertyType::Penthouse => "Penthouse",
            PropertyType::Townhouse => "Townhouse",
            PropertyType::Estate => "Estate",
            PropertyType::Duplex => "Duplex",
            PropertyType::Loft => "Loft",
        }
    }

    /// Case-insensitive match against the known categories
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(raw))
    }
}

impl From<String> for PropertyType {
    fn from(raw: String) -> Self {
        Self::parse(&raw).unwrap_or_default()
    }
}

impl From<PropertyType> for String {
    fn from(kind: PropertyType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(PropertyType::parse("condo"), Some(PropertyType::Condo));
        assert_eq!(PropertyType::parse("  PENTHOUSE "), Some(PropertyType::Penthouse));
        assert_eq!(PropertyType::parse("Castle"), None);
    }

    #[test]
    fn unknown_values_deserialize_as_house() {
        let kind: PropertyType = serde_json::from_str("\"Castle\"").unwrap();
        assert_eq!(kind, PropertyType::House);
        let kind: PropertyType = serde_json::from_str("\"loft\"").unwrap();
        assert_eq!(kind, PropertyType::Loft);
    }

    #[test]
    fn serializes_canonical_name() {
        assert_eq!(serde_json::to_string(&PropertyType::Townhouse).unwrap(), "\"Townhouse\"");
    }
}
