use core::any::TypeId;

use wc_reflect::info::BaseKind;
use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireMap, WireValue};

use super::{base_kind, emplace, extract, registered, subtypes};
use crate::converter::expect_value;
use crate::{Dynamic, Error, SerializationHelper, TypeConverter};

/// Converts maps with `String` keys to wire maps.
pub struct MapConverter;

fn string_keyed(helper: &dyn SerializationHelper, ty: TypeId) -> bool {
    subtypes(helper, ty).first() == Some(&TypeId::of::<String>())
}

/// The entries of a wire map, rejecting non-string keys.
pub(super) fn string_entries(
    map: &WireMap,
) -> impl Iterator<Item = Result<(&str, &WireValue), Error>> {
    map.iter().map(|(key, value)| match key.as_str() {
        Some(key) => Ok((key, value)),
        None => Err(Error::deserialization(format!(
            "Map keys must be strings, but got {}",
            key.kind()
        ))),
    })
}

impl TypeConverter for MapConverter {
    fn name(&self) -> &'static str {
        "MapConverter"
    }

    fn can_convert(&self, ty: TypeId, helper: &dyn SerializationHelper) -> bool {
        base_kind(helper, ty) == Some(BaseKind::Map) && string_keyed(helper, ty)
    }

    fn allowed_tags(&self, _ty: TypeId, _helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
        vec![None, Some(Tag::EXPLICIT_MAP)]
    }

    fn allowed_kinds(
        &self,
        _ty: TypeId,
        _tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        vec![WireKind::Map]
    }

    fn guess_type(
        &self,
        tag: Option<Tag>,
        kind: WireKind,
        helper: &dyn SerializationHelper,
    ) -> Option<TypeId> {
        if kind == WireKind::Map && matches!(tag, None | Some(Tag::EXPLICIT_MAP)) {
            registered(helper, TypeId::of::<alloc::collections::BTreeMap<String, Dynamic>>())
        } else {
            None
        }
    }

    fn serialize(
        &self,
        ty: TypeId,
        value: &dyn Reflect,
        helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error> {
        let (extractor, parts) = extract(helper, ty, value)?;
        let value_ty = extractor.subtypes()[1];

        let mut map = WireMap::with_capacity(parts.len() / 2);
        for entry in parts.chunks_exact(2) {
            let key = expect_value::<String>(&*entry[0])?;
            let value = helper.serialize_subtype(value_ty, &*entry[1], &format!("[{key}]"))?;
            map.insert(key.as_str(), value);
        }
        Ok(WireValue::Map(map))
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
                "Map type {} has no value type",
                helper.type_name(ty)
            )));
        };
        let Some(map) = value.untagged().as_map() else {
            return Err(Error::deserialization(format!(
                "Expected a map for {}, but got {}",
                helper.type_name(ty),
                value.untagged().kind()
            )));
        };

        let mut parts: Vec<Box<dyn Reflect>> = Vec::with_capacity(map.len() * 2);
        for entry in string_entries(map) {
            let (key, value) = entry?;
            let value = helper.deserialize_subtype(value_ty, value, owner, &format!("[{key}]"))?;
            parts.push(Box::new(key.to_owned()));
            parts.push(value);
        }
        emplace(helper, ty, parts, owner)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use super::*;
    use crate::testing::*;

    #[test]
    fn string_keyed_maps() {
        let serializer = serializer().register::<HashMap<String, f64>>().build();
        let value = HashMap::from([("half".to_owned(), 0.5), ("two".to_owned(), 2.25)]);
        let json = serializer.to_json(&value).unwrap();
        assert_eq!(json, serde_json::json!({"half": 0.5, "two": 2.25}));
        assert_eq!(serializer.from_json::<HashMap<String, f64>>(&json).unwrap(), value);
    }

    #[test]
    fn explicit_map_tag_is_accepted() {
        let serializer = serializer().register::<BTreeMap<String, i32>>().build();
        let map: WireMap = [("a", 1)].into_iter().collect();
        let wire = WireValue::tagged(Tag::EXPLICIT_MAP, map);
        let value = serializer.deserialize::<BTreeMap<String, i32>>(&wire).unwrap();
        assert_eq!(value, BTreeMap::from([("a".to_owned(), 1)]));
    }

    #[test]
    fn other_keys_are_rejected() {
        let strings = serializer().register::<BTreeMap<String, i32>>().build();
        let map: WireMap = [(1, 1)].into_iter().collect();
        let err = strings
            .deserialize::<BTreeMap<String, i32>>(&WireValue::Map(map))
            .unwrap_err();
        assert_eq!(err.message(), "Map keys must be strings, but got integer");

        let ints = serializer().register::<BTreeMap<i32, i32>>().build();
        let err = ints.serialize(&BTreeMap::from([(1, 2)])).unwrap_err();
        assert!(err.message().starts_with("Unable to find a converter for type"));
    }

    #[test]
    fn value_errors_name_the_key() {
        let serializer = serializer().register::<BTreeMap<String, i32>>().build();
        let err = serializer
            .from_json::<BTreeMap<String, i32>>(&serde_json::json!({"bad": "x"}))
            .unwrap_err();
        assert_eq!(err.trace()[0].name, "[bad]");
    }
}
