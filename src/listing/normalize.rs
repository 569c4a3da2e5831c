use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::image::image_url;
use super::kind::PropertyType;
use crate::database::models::{Property, PropertyDraft};

/// Loosely-typed property fields as sent by the admin dashboard. Forms send
/// camelCase keys, but a body echoing a stored row carries the column names,
/// and some clients send both; the camelCase value wins when it is usable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInput {
    pub id: Option<Value>,
    pub title: Option<Value>,
    pub location: Option<Value>,
    pub full_address: Option<Value>,
    #[serde(rename = "full_address")]
    pub full_address_column: Option<Value>,
    pub price: Option<Value>,
    #[serde(rename = "type")]
    pub kind: Option<Value>,
    pub status: Option<Value>,
    pub beds: Option<Value>,
    pub baths: Option<Value>,
    pub sqft: Option<Value>,
    pub garage: Option<Value>,
    pub description: Option<Value>,
    pub is_rental: Option<Value>,
    #[serde(rename = "is_rental")]
    pub is_rental_column: Option<Value>,
}

impl PropertyInput {
    fn full_address(&self) -> Option<&Value> {
        prefer(self.full_address.as_ref(), self.full_address_column.as_ref(), |v| {
            text(v).is_some()
        })
    }

    fn is_rental(&self) -> Option<&Value> {
        prefer(self.is_rental.as_ref(), self.is_rental_column.as_ref(), |v| {
            !v.is_null()
        })
    }
}

/// `first` when present and `usable`, otherwise `second`
fn prefer<'a>(
    first: Option<&'a Value>,
    second: Option<&'a Value>,
    usable: impl Fn(&Value) -> bool,
) -> Option<&'a Value> {
    first.filter(|v| usable(v)).or(second)
}

/// Create rejected before touching the store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing required fields: {}", .0.join(", "))]
pub struct MissingFields(pub Vec<&'static str>);

#[derive(Debug, Clone, Copy)]
struct IntField {
    floor: i64,
    default: i64,
}

const PRICE: IntField = IntField { floor: 0, default: 0 };
const BEDS: IntField = IntField { floor: 1, default: 1 };
const BATHS: IntField = IntField { floor: 1, default: 1 };
const SQFT: IntField = IntField { floor: 500, default: 1000 };
const GARAGE: IntField = IntField { floor: 0, default: 1 };

const DEFAULT_STATUS: &str = "For Sale";

/// Normalize a create request. `seq` stamps the generated image URL.
pub fn draft_for_create(input: &PropertyInput, seq: i64) -> Result<PropertyDraft, MissingFields> {
    let title = input.title.as_ref().and_then(text);
    let location = input.location.as_ref().and_then(text);
    let description = input.description.as_ref().and_then(text);

    let missing: Vec<&'static str> = [
        ("title", title.is_none()),
        ("location", location.is_none()),
        ("description", description.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();

    let (Some(title), Some(location), Some(description)) = (title, location, description) else {
        return Err(MissingFields(missing));
    };

    let kind = input
        .kind
        .as_ref()
        .and_then(text)
        .and_then(|raw| PropertyType::parse(&raw))
        .unwrap_or_default();

    let mut draft = PropertyDraft {
        full_address: resolve_text(input.full_address(), None, &location),
        title,
        location,
        price: resolve_int(input.price.as_ref(), None, PRICE),
        kind,
        status: resolve_text(input.status.as_ref(), None, DEFAULT_STATUS),
        beds: resolve_int(input.beds.as_ref(), None, BEDS),
        baths: resolve_int(input.baths.as_ref(), None, BATHS),
        sqft: resolve_int(input.sqft.as_ref(), None, SQFT),
        garage: resolve_int(input.garage.as_ref(), None, GARAGE),
        description,
        is_rental: input.is_rental().map(truthy).unwrap_or(false),
        image_url: None,
        image: None,
    };
    draft.set_image(image_url(&draft.title, draft.kind, seq));
    Ok(draft)
}

/// Normalize an update against the stored row. Fields the caller leaves out
/// keep their stored values; the image is regenerated only when the title or
/// type actually changes.
pub fn draft_for_update(input: &PropertyInput, existing: &Property, seq: i64) -> PropertyDraft {
    let kind = input
        .kind
        .as_ref()
        .and_then(text)
        .and_then(|raw| PropertyType::parse(&raw))
        .unwrap_or(existing.kind);

    let mut draft = PropertyDraft {
        title: resolve_text(input.title.as_ref(), Some(&existing.title), ""),
        location: resolve_text(input.location.as_ref(), Some(&existing.location), ""),
        full_address: resolve_text(input.full_address(), Some(&existing.full_address), ""),
        price: resolve_int(input.price.as_ref(), Some(existing.price), PRICE),
        kind,
        status: resolve_text(input.status.as_ref(), Some(&existing.status), DEFAULT_STATUS),
        beds: resolve_int(input.beds.as_ref(), Some(existing.beds), BEDS),
        baths: resolve_int(input.baths.as_ref(), Some(existing.baths), BATHS),
        sqft: resolve_int(input.sqft.as_ref(), Some(existing.sqft), SQFT),
        garage: resolve_int(input.garage.as_ref(), Some(existing.garage), GARAGE),
        description: resolve_text(input.description.as_ref(), Some(&existing.description), ""),
        is_rental: input.is_rental().map(truthy).unwrap_or(existing.is_rental),
        image_url: None,
        image: None,
    };

    if draft.title != existing.title || draft.kind != existing.kind {
        draft.set_image(image_url(&draft.title, draft.kind, seq));
    }
    draft
}

/// Trimmed string form of a scalar; blank strings count as absent
fn text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn resolve_text(raw: Option<&Value>, prior: Option<&str>, default: &str) -> String {
    raw.and_then(text)
        .or_else(|| prior.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()))
        .unwrap_or_else(|| default.trim().to_string())
}

fn resolve_int(raw: Option<&Value>, prior: Option<i64>, field: IntField) -> i64 {
    raw.and_then(parse_int)
        .filter(|v| *v >= field.floor)
        .or(prior)
        .unwrap_or(field.default)
        .max(field.floor)
}

/// Lenient integer read: JSON numbers are truncated, strings contribute their
/// leading sign and digits ("12 beds" is 12, "abc" is nothing).
pub(crate) fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => leading_int(s),
        _ => None,
    }
}

fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => {
            let s = s.trim();
            !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
        }
        Value::Array(_) | Value::Object(_) => true,
    }
}
