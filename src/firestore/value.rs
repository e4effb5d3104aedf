//! Conversion between serde values and Firestore's typed value encoding.

use super::models::{ArrayValue, MapValue, Value, ValueType};
use super::FirestoreError;
use serde::de::{DeserializeOwned, Error as _};
use serde::Serialize;
use serde_json::{json, Map, Value as SerdeValue};
use std::collections::HashMap;

/// Serializes `value` into a document field map. Only structs and maps can be
/// stored as documents.
pub fn to_fields<T: Serialize>(value: &T) -> Result<HashMap<String, Value>, FirestoreError> {
    match serde_json::to_value(value)? {
        SerdeValue::Object(map) => map
            .into_iter()
            .map(|(k, v)| Ok::<_, FirestoreError>((k, to_value(v)?)))
            .collect(),
        other => Err(FirestoreError::SerializationError(serde_json::Error::custom(
            format!("documents must be objects, got {}", other),
        ))),
    }
}

/// Deserializes a document field map into `T`.
pub fn from_fields<T: DeserializeOwned>(fields: HashMap<String, Value>) -> Result<T, FirestoreError> {
    Ok(serde_json::from_value(fields_to_serde(fields)?)?)
}

pub fn to_value(value: SerdeValue) -> Result<Value, FirestoreError> {
    let value_type = match value {
        SerdeValue::Null => ValueType::NullValue(()),
        SerdeValue::Bool(b) => ValueType::BooleanValue(b),
        SerdeValue::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => ValueType::IntegerValue(i.to_string()),
            (None, Some(f)) => ValueType::DoubleValue(f),
            _ => {
                return Err(FirestoreError::SerializationError(serde_json::Error::custom(
                    format!("unsupported number: {}", n),
                )))
            }
        },
        SerdeValue::String(s) => ValueType::StringValue(s),
        SerdeValue::Array(items) => ValueType::ArrayValue(ArrayValue {
            values: items.into_iter().map(to_value).collect::<Result<_, _>>()?,
        }),
        SerdeValue::Object(map) => ValueType::MapValue(MapValue {
            fields: map
                .into_iter()
                .map(|(k, v)| Ok::<_, FirestoreError>((k, to_value(v)?)))
                .collect::<Result<_, _>>()?,
        }),
    };
    Ok(Value { value_type })
}

fn fields_to_serde(fields: HashMap<String, Value>) -> Result<SerdeValue, FirestoreError> {
    let map = fields
        .into_iter()
        .map(|(k, v)| Ok::<_, FirestoreError>((k, from_value(v)?)))
        .collect::<Result<Map<_, _>, FirestoreError>>()?;
    Ok(SerdeValue::Object(map))
}

pub fn from_value(value: Value) -> Result<SerdeValue, FirestoreError> {
    Ok(match value.value_type {
        ValueType::StringValue(s)
        | ValueType::TimestampValue(s)
        | ValueType::BytesValue(s)
        | ValueType::ReferenceValue(s) => SerdeValue::String(s),
        ValueType::IntegerValue(s) => {
            let i: i64 = s.parse().map_err(|e| {
                serde_json::Error::custom(format!("invalid integer '{}': {}", s, e))
            })?;
            SerdeValue::Number(i.into())
        }
        ValueType::DoubleValue(d) => serde_json::Number::from_f64(d)
            .map(SerdeValue::Number)
            .ok_or_else(|| serde_json::Error::custom(format!("invalid double: {}", d)))?,
        ValueType::BooleanValue(b) => SerdeValue::Bool(b),
        ValueType::NullValue(()) => SerdeValue::Null,
        ValueType::MapValue(map) => fields_to_serde(map.fields)?,
        ValueType::ArrayValue(array) => SerdeValue::Array(
            array
                .values
                .into_iter()
                .map(from_value)
                .collect::<Result<_, _>>()?,
        ),
        ValueType::GeoPointValue(gp) => json!({ "latitude": gp.latitude, "longitude": gp.longitude }),
    })
}
