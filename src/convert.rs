use std::io;

use serde::Serialize;

use crate::error::{DjsonError, Result};
use crate::value::{JsonArray, JsonData, JsonObject, JsonValue};

const RECURSION_LIMIT: usize = 512;

/// Builds a DOM from any [`serde::Serialize`] value.
///
/// The resulting values carry no formatting metadata; writers apply
/// their configured defaults.
///
/// # Example
///
/// ```rust
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Player {
///     name: String,
///     score: i32,
/// }
///
/// let player = Player { name: "Alice".into(), score: 95 };
/// let value = djson::from_serialize(&player).unwrap();
/// assert_eq!(Some("Alice"), value.as_object().unwrap().get("name").unwrap().as_str());
/// ```
pub fn from_serialize<T: Serialize>(value: &T) -> Result<JsonValue> {
    let serde_value = serde_json::to_value(value)
        .map_err(|e| DjsonError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    from_serde_value(&serde_value)
}

/// Converts a [`serde_json::Value`] tree into a DOM.
pub fn from_serde_value(element: &serde_json::Value) -> Result<JsonValue> {
    convert_element(element, RECURSION_LIMIT)
}

fn convert_element(element: &serde_json::Value, recursion_limit: usize) -> Result<JsonValue> {
    if recursion_limit == 0 {
        return Err(DjsonError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "depth limit exceeded - possible circular reference",
        )));
    }
    Ok(match element {
        serde_json::Value::Null => JsonValue::null(),
        serde_json::Value::Bool(b) => JsonValue::bool(*b),
        serde_json::Value::Number(n) => JsonValue::number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => JsonValue::string(s.clone()),
        serde_json::Value::Array(elements) => {
            let mut array = JsonArray::new();
            for child in elements {
                array.add(convert_element(child, recursion_limit - 1)?);
            }
            array.into()
        }
        serde_json::Value::Object(map) => {
            let mut object = JsonObject::new();
            for (key, child) in map {
                object.add(key.clone(), convert_element(child, recursion_limit - 1)?);
            }
            object.into()
        }
    })
}

/// Converts a DOM back into a [`serde_json::Value`].
///
/// Comments and formatting metadata are not representable and are
/// dropped; non-finite numbers become `null`, matching serde_json's own
/// convention.
pub fn to_serde_value(value: &JsonValue) -> serde_json::Value {
    match value.data() {
        JsonData::Null => serde_json::Value::Null,
        JsonData::Bool(b) => serde_json::Value::Bool(*b),
        JsonData::Number(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        JsonData::String { value, .. } => serde_json::Value::String(value.clone()),
        JsonData::Array(array) => {
            serde_json::Value::Array(array.iter().map(to_serde_value).collect())
        }
        JsonData::Object(object) => {
            let mut map = serde_json::Map::new();
            for (key, member) in object.iter() {
                map.insert(key.to_string(), to_serde_value(member));
            }
            serde_json::Value::Object(map)
        }
    }
}
