use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::listing::PropertyType;

/// Store-assigned row identifier. Hosted tables use either bigint or uuid
/// keys, so both shapes are carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    /// Read an identifier from a request body value. Empty strings, nulls and
    /// non-scalar values are not identifiers.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RecordId::Int),
            Value::String(s) if !s.trim().is_empty() => Some(RecordId::Text(s.trim().to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(i) => write!(f, "{}", i),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// Treat an explicit JSON null like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A row of the `properties` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: RecordId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: i64,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: PropertyType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub beds: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub baths: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sqft: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub garage: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_rental: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Normalized column values written by an insert or update. `image_url` and
/// `image` always carry the same value; `None` leaves the stored images alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDraft {
    pub title: String,
    pub location: String,
    pub full_address: String,
    pub price: i64,
    #[serde(rename = "type")]
    pub kind: PropertyType,
    pub status: String,
    pub beds: i64,
    pub baths: i64,
    pub sqft: i64,
    pub garage: i64,
    pub description: String,
    pub is_rental: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl PropertyDraft {
    pub fn set_image(&mut self, url: String) {
        self.image_url = Some(url.clone());
        self.image = Some(url);
    }

    /// Materialize the row a store would hold after writing this draft
    pub fn into_property(self, id: RecordId, created_at: DateTime<Utc>) -> Property {
        Property {
            id,
            title: self.title,
            location: self.location,
            full_address: self.full_address,
            price: self.price,
            kind: self.kind,
            status: self.status,
            beds: self.beds,
            baths: self.baths,
            sqft: self.sqft,
            garage: self.garage,
            description: self.description,
            is_rental: self.is_rental,
            image_url: self.image_url,
            image: self.image,
            created_at,
        }
    }

    /// Apply this draft on top of a stored row, keeping its images when the
    /// draft carries none
    pub fn apply_to(self, existing: &Property) -> Property {
        let image_url = self.image_url.clone().or_else(|| existing.image_url.clone());
        let image = self.image.clone().or_else(|| existing.image.clone());
        let mut updated = self.into_property(existing.id.clone(), existing.created_at);
        updated.image_url = image_url;
        updated.image = image;
        updated
    }
}
