use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Number, Value};

use crate::{Tag, WireMap, WireValue};

impl WireValue {
    /// Projects the value onto JSON.
    ///
    /// Tags are dropped and the tagged inner value is projected instead.
    /// Byte strings become text: base64 or base16 when the enclosing tag
    /// announces the expected encoding, base64url otherwise. Non finite floats
    /// become `null` and non string map keys are replaced by their projection
    /// rendered as JSON text.
    ///
    /// # Examples
    ///
    /// ```
    /// use wc_wire::{Tag, WireValue};
    ///
    /// let value = WireValue::tagged(Tag::EXPECTED_BASE16, WireValue::Bytes(vec![0xca, 0xfe]));
    /// assert_eq!(value.to_json(), serde_json::json!("cafe"));
    /// ```
    pub fn to_json(&self) -> Value {
        self.project(None)
    }

    fn project(&self, hint: Option<Tag>) -> Value {
        match self {
            WireValue::Null => Value::Null,
            WireValue::Bool(v) => Value::Bool(*v),
            WireValue::Integer(v) => Value::Number(Number::from(*v)),
            WireValue::Float(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
            WireValue::String(v) => Value::String(v.clone()),
            WireValue::Bytes(v) => Value::String(encode_bytes(v, hint)),
            WireValue::Array(items) => Value::Array(items.iter().map(|v| v.project(None)).collect()),
            WireValue::Map(map) => {
                let mut object = Map::with_capacity(map.len());
                for (key, value) in map.iter() {
                    object.insert(json_key(key), value.project(None));
                }
                Value::Object(object)
            }
            WireValue::Tagged(tag, inner) => inner.project(Some(*tag)),
        }
    }

    /// Lifts a JSON document into the wire model.
    ///
    /// Integral numbers that fit into `i64` become [`WireValue::Integer`],
    /// every other number becomes [`WireValue::Float`].
    pub fn from_json(value: &Value) -> WireValue {
        match value {
            Value::Null => WireValue::Null,
            Value::Bool(v) => WireValue::Bool(*v),
            Value::Number(n) => match n.as_i64() {
                Some(v) => WireValue::Integer(v),
                None => WireValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(v) => WireValue::String(v.clone()),
            Value::Array(items) => WireValue::Array(items.iter().map(WireValue::from_json).collect()),
            Value::Object(object) => WireValue::Map(
                object
                    .iter()
                    .map(|(k, v)| (WireValue::String(k.clone()), WireValue::from_json(v)))
                    .collect::<WireMap>(),
            ),
        }
    }
}

fn encode_bytes(bytes: &[u8], hint: Option<Tag>) -> String {
    use base64::engine::general_purpose::STANDARD;

    match hint {
        Some(Tag::EXPECTED_BASE64) => STANDARD.encode(bytes),
        Some(Tag::EXPECTED_BASE16) => hex::encode(bytes),
        _ => URL_SAFE_NO_PAD.encode(bytes),
    }
}

fn json_key(key: &WireValue) -> String {
    match key.untagged() {
        WireValue::String(v) => v.clone(),
        other => other.to_json().to_string(),
    }
}

impl From<&Value> for WireValue {
    #[inline]
    fn from(value: &Value) -> Self {
        WireValue::from_json(value)
    }
}
