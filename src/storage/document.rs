//! Conversions between stored BSON documents and the JSON returned to clients.

use mongodb::bson::{oid::ObjectId, Bson, Document};
use serde_json::{Map, Number, Value};

pub const RATING_FIELD: &str = "rating";

/// Parse a client supplied identifier, returning `None` when it is not a valid ObjectId.
pub fn parse_object_id(raw: &str) -> Option<ObjectId> {
    ObjectId::parse_str(raw.trim()).ok()
}

/// Coerce a rating value to a BSON number.
///
/// Numeric strings become integers (or doubles when fractional); anything that
/// cannot be read as a number becomes `Null`.
pub fn numeric_rating(value: &Bson) -> Bson {
    match value {
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => value.clone(),
        Bson::String(raw) => {
            let raw = raw.trim();
            if let Ok(n) = raw.parse::<i64>() {
                i32::try_from(n).map(Bson::Int32).unwrap_or(Bson::Int64(n))
            } else if let Ok(f) = raw.parse::<f64>() {
                Bson::Double(f)
            } else {
                Bson::Null
            }
        }
        _ => Bson::Null,
    }
}

/// Replace `rating` (when present) with its numeric form.
pub fn normalize_rating(document: &mut Document) {
    if let Some(rating) = document.get(RATING_FIELD) {
        let numeric = numeric_rating(rating);
        document.insert(RATING_FIELD, numeric);
    }
}

/// Render a document as plain JSON: ObjectIds become hex strings and dates RFC 3339.
pub fn document_to_json(document: Document) -> Value {
    let map: Map<String, Value> = document
        .into_iter()
        .map(|(key, value)| (key, bson_to_json(value)))
        .collect();
    Value::Object(map)
}

pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(date) => match date.try_to_rfc3339_string() {
            Ok(formatted) => Value::String(formatted),
            Err(_) => Bson::DateTime(date).into_relaxed_extjson(),
        },
        Bson::String(s) => Value::String(s),
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Int32(n) => Value::Number(n.into()),
        Bson::Int64(n) => Value::Number(n.into()),
        Bson::Double(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::Document(inner) => document_to_json(inner),
        other => other.into_relaxed_extjson(),
    }
}
