use core::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{WireMap, WireValue};

/// Writes the untagged projection of the tree.
///
/// Tags carry no serde equivalent and are dropped; byte strings use
/// `serialize_bytes` so binary formats keep them intact.
impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WireValue::Null => serializer.serialize_unit(),
            WireValue::Bool(v) => serializer.serialize_bool(*v),
            WireValue::Integer(v) => serializer.serialize_i64(*v),
            WireValue::Float(v) => serializer.serialize_f64(*v),
            WireValue::String(v) => serializer.serialize_str(v),
            WireValue::Bytes(v) => serializer.serialize_bytes(v),
            WireValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            WireValue::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map.iter() {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            WireValue::Tagged(_, inner) => inner.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WireValueVisitor)
    }
}

struct WireValueVisitor;

impl<'de> Visitor<'de> for WireValueVisitor {
    type Value = WireValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any self-describing value")
    }

    fn visit_unit<E>(self) -> Result<WireValue, E> {
        Ok(WireValue::Null)
    }

    fn visit_none<E>(self) -> Result<WireValue, E> {
        Ok(WireValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<WireValue, D::Error> {
        WireValue::deserialize(deserializer)
    }

    fn visit_bool<E>(self, v: bool) -> Result<WireValue, E> {
        Ok(WireValue::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<WireValue, E> {
        Ok(WireValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<WireValue, E> {
        match i64::try_from(v) {
            Ok(v) => Ok(WireValue::Integer(v)),
            Err(_) => Ok(WireValue::Float(v as f64)),
        }
    }

    fn visit_f64<E>(self, v: f64) -> Result<WireValue, E> {
        Ok(WireValue::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<WireValue, E> {
        Ok(WireValue::String(v.to_owned()))
    }

    fn visit_string<E>(self, v: String) -> Result<WireValue, E> {
        Ok(WireValue::String(v))
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<WireValue, E> {
        Ok(WireValue::Bytes(v.to_vec()))
    }

    fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<WireValue, E> {
        Ok(WireValue::Bytes(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<WireValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(WireValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<WireValue, A::Error> {
        let mut map = WireMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<WireValue, WireValue>()? {
            map.insert(key, value);
        }
        Ok(WireValue::Map(map))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Tag, WireMap, WireValue};

    #[test]
    fn serializes_through_serde_json() {
        let mut map = WireMap::new();
        map.insert("list", vec![WireValue::from(1), WireValue::Null]);
        map.insert("when", WireValue::tagged(Tag::UNIX_TIME, 10));

        let text = serde_json::to_string(&WireValue::Map(map)).unwrap();
        assert_eq!(text, r#"{"list":[1,null],"when":10}"#);
    }

    #[test]
    fn deserializes_from_ron() {
        let value: WireValue = ron::from_str(r#"{"a": [1, 2.5, "x"], "b": true}"#).unwrap();

        let mut map = WireMap::new();
        map.insert(
            "a",
            vec![WireValue::from(1), WireValue::from(2.5), WireValue::from("x")],
        );
        map.insert("b", true);
        assert_eq!(value, WireValue::Map(map));
    }
}
