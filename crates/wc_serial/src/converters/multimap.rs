use core::any::TypeId;

use wc_reflect::info::BaseKind;
use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireMap, WireValue};

use super::map::string_entries;
use super::{base_kind, emplace, extract, subtypes};
use crate::converter::expect_value;
use crate::{Error, MultiMapMode, SerializationHelper, TypeConverter};

/// Converts multi maps with `String` keys.
///
/// The written shape follows [`MultiMapMode`]. Every shape is accepted
/// when reading, no matter the configured mode.
///
/// Values that are arrays themselves are always written in groups in the
/// `Map` mode, so a repeated key never reads back as one value.
pub struct MultiMapConverter;

/// Whether values of `ty` are written as arrays themselves.
fn array_shaped(helper: &dyn SerializationHelper, ty: TypeId) -> bool {
    matches!(
        base_kind(helper, ty),
        Some(BaseKind::List | BaseKind::Set | BaseKind::Pair | BaseKind::Tuple)
    )
}

/// Whether a map entry holds a group of values rather than a single one.
///
/// Groups of array-shaped values are non-empty arrays of arrays.
fn is_group(values: &[WireValue], array_values: bool) -> bool {
    !array_values
        || (!values.is_empty() && values.iter().all(|v| v.untagged().as_array().is_some()))
}

fn format_name(helper: &dyn SerializationHelper) -> &'static str {
    if helper.is_json_mode() { "JSON" } else { "CBOR" }
}

impl MultiMapConverter {
    fn read_entry(
        &self,
        value_ty: TypeId,
        key: &str,
        value: &WireValue,
        owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
        parts: &mut Vec<Box<dyn Reflect>>,
    ) -> Result<(), Error> {
        let hint = format!("[{key}]");
        parts.push(Box::new(key.to_owned()));
        parts.push(helper.deserialize_subtype(value_ty, value, owner, &hint)?);
        Ok(())
    }
}

impl TypeConverter for MultiMapConverter {
    fn name(&self) -> &'static str {
        "MultiMapConverter"
    }

    fn can_convert(&self, ty: TypeId, helper: &dyn SerializationHelper) -> bool {
        base_kind(helper, ty) == Some(BaseKind::MultiMap)
            && subtypes(helper, ty).first() == Some(&TypeId::of::<String>())
    }

    fn allowed_tags(&self, _ty: TypeId, _helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
        vec![None, Some(Tag::MULTI_MAP)]
    }

    fn allowed_kinds(
        &self,
        _ty: TypeId,
        _tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        vec![WireKind::Map, WireKind::Array]
    }

    fn serialize(
        &self,
        ty: TypeId,
        value: &dyn Reflect,
        helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error> {
        let (extractor, parts) = extract(helper, ty, value)?;
        let Some(&value_ty) = extractor.subtypes().get(1) else {
            return Err(Error::serialization(format!(
                "Multi map type {} has no value type",
                helper.type_name(ty)
            )));
        };

        let mut entries: Vec<(&str, WireValue)> = Vec::with_capacity(parts.len() / 2);
        for entry in parts.chunks_exact(2) {
            let key = expect_value::<String>(&*entry[0])?;
            let value = helper.serialize_subtype(value_ty, &*entry[1], &format!("[{key}]"))?;
            entries.push((key.as_str(), value));
        }

        let mode = helper.config().multi_map_mode;
        let dense = mode == MultiMapMode::Map && !array_shaped(helper, value_ty);
        if mode == MultiMapMode::List {
            let items = entries
                .into_iter()
                .map(|(key, value)| WireValue::Array(vec![WireValue::from(key), value]))
                .collect::<Vec<_>>();
            return Ok(WireValue::tagged(Tag::MULTI_MAP, items));
        }

        // Group by key, keeping the order keys first appear in.
        let mut groups: Vec<(&str, Vec<WireValue>)> = Vec::new();
        for (key, value) in entries {
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, values)) => values.push(value),
                None => groups.push((key, vec![value])),
            }
        }
        let map = groups
            .into_iter()
            .map(|(key, mut values)| {
                if dense && values.len() == 1 {
                    (key, values.remove(0))
                } else {
                    (key, WireValue::Array(values))
                }
            })
            .collect::<WireMap>();
        Ok(WireValue::tagged(Tag::MULTI_MAP, map))
    }

    fn deserialize_cbor(
        &self,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        let Some(&value_ty) = subtypes(helper, ty).get(1) else {
            return Err(Error::deserialization(format!(
                "Multi map type {} has no value type",
                helper.type_name(ty)
            )));
        };

        let mut parts = Vec::new();
        match value.untagged() {
            WireValue::Map(map) => {
                let array_values = array_shaped(helper, value_ty);
                for entry in string_entries(map) {
                    let (key, value) = entry?;
                    match value.untagged().as_array() {
                        Some(values) if is_group(values, array_values) => {
                            for value in values {
                                self.read_entry(value_ty, key, value, owner, helper, &mut parts)?;
                            }
                        }
                        _ => self.read_entry(value_ty, key, value, owner, helper, &mut parts)?,
                    }
                }
            }
            WireValue::Array(items) => {
                for item in items {
                    let [key, value] = item.untagged().as_array().unwrap_or_default() else {
                        return Err(Error::deserialization(format!(
                            "{} array must have exactly 2 elements to be read as a value of a multi map",
                            format_name(helper)
                        )));
                    };
                    let Some(key) = key.as_str() else {
                        return Err(Error::deserialization(format!(
                            "Map keys must be strings, but got {}",
                            key.kind()
                        )));
                    };
                    self.read_entry(value_ty, key, value, owner, helper, &mut parts)?;
                }
            }
            other => {
                return Err(Error::deserialization(format!(
                    "Expected a map or array for {}, but got {}",
                    helper.type_name(ty),
                    other.kind()
                )));
            }
        }
        emplace(helper, ty, parts, owner)
    }
}

#[cfg(test)]
mod tests {
    use wc_reflect::extract::MultiMap;

    use super::*;
    use crate::testing::*;

    fn sample() -> MultiMap<String, i32> {
        [("a", 1), ("b", 2), ("a", 3)]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect()
    }

    #[test]
    fn map_mode_groups_repeated_keys() {
        let serializer = serializer().register::<MultiMap<String, i32>>().build();
        let json = serializer.to_json(&sample()).unwrap();
        assert_eq!(json, serde_json::json!({"a": [1, 3], "b": 2}));

        let back = serializer.from_json::<MultiMap<String, i32>>(&json).unwrap();
        assert_eq!(back.get_all(&"a".to_owned()).copied().collect::<Vec<_>>(), [1, 3]);
        assert_eq!(back.len(), 3);
    }

    #[test]
    fn list_and_list_map_modes() {
        let list = serializer()
            .register::<MultiMap<String, i32>>()
            .multi_map_mode(MultiMapMode::List)
            .build();
        let json = list.to_json(&sample()).unwrap();
        assert_eq!(json, serde_json::json!([["a", 1], ["b", 2], ["a", 3]]));
        assert_eq!(list.from_json::<MultiMap<String, i32>>(&json).unwrap(), sample());

        let list_map = serializer()
            .register::<MultiMap<String, i32>>()
            .multi_map_mode(MultiMapMode::ListMap)
            .build();
        let json = list_map.to_json(&sample()).unwrap();
        assert_eq!(json, serde_json::json!({"a": [1, 3], "b": [2]}));
    }

    #[test]
    fn array_values_stay_whole() {
        let serializer = serializer().register::<MultiMap<String, Vec<i32>>>().build();
        let json = serde_json::json!({"k": [1, 2]});
        let value = serializer.from_json::<MultiMap<String, Vec<i32>>>(&json).unwrap();
        assert_eq!(value.len(), 1);
        assert_eq!(value.iter().next().map(|(_, v)| v.as_slice()), Some(&[1, 2][..]));
    }

    #[test]
    fn array_values_round_trip_in_groups() {
        let serializer = serializer().register::<MultiMap<String, Vec<i32>>>().build();
        let value: MultiMap<String, Vec<i32>> =
            [("a", vec![1, 2]), ("a", vec![3]), ("b", vec![4])]
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect();

        let json = serializer.to_json(&value).unwrap();
        assert_eq!(json, serde_json::json!({"a": [[1, 2], [3]], "b": [[4]]}));
        assert_eq!(
            serializer.from_json::<MultiMap<String, Vec<i32>>>(&json).unwrap(),
            value
        );

        let wire = serializer.serialize(&value).unwrap();
        assert_eq!(
            serializer.deserialize::<MultiMap<String, Vec<i32>>>(&wire).unwrap(),
            value
        );
    }

    #[test]
    fn malformed_entries() {
        let serializer = serializer().register::<MultiMap<String, i32>>().build();
        let err = serializer
            .from_json::<MultiMap<String, i32>>(&serde_json::json!([["a", 1, 2]]))
            .unwrap_err();
        assert_eq!(
            err.message(),
            "JSON array must have exactly 2 elements to be read as a value of a multi map"
        );
    }
}
