use core::any::TypeId;

use wc_reflect::info::BaseKind;
use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireValue};

use super::{base_kind, emplace, extract, subtypes};
use crate::{ANY_KIND, Error, SerializationHelper, TypeConverter};

/// Converts `Option<T>`, writing `None` as null and `Some` as the bare
/// inner value.
pub struct OptionalConverter;

impl TypeConverter for OptionalConverter {
    fn name(&self) -> &'static str {
        "OptionalConverter"
    }

    fn can_convert(&self, ty: TypeId, helper: &dyn SerializationHelper) -> bool {
        base_kind(helper, ty) == Some(BaseKind::Optional)
    }

    fn allowed_kinds(
        &self,
        _ty: TypeId,
        _tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        ANY_KIND.to_vec()
    }

    fn serialize(
        &self,
        ty: TypeId,
        value: &dyn Reflect,
        helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error> {
        let (extractor, parts) = extract(helper, ty, value)?;
        match parts.first() {
            Some(inner) => helper.serialize_subtype(extractor.subtypes()[0], &**inner, "value"),
            None => Ok(WireValue::Null),
        }
    }

    fn deserialize_cbor(
        &self,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        if value.is_null() {
            return emplace(helper, ty, Vec::new(), owner);
        }
        let Some(&inner) = subtypes(helper, ty).first() else {
            return Err(Error::deserialization(format!(
                "Optional type {} has no value type",
                helper.type_name(ty)
            )));
        };
        let inner = helper.deserialize_subtype(inner, value, owner, "value")?;
        emplace(helper, ty, vec![inner], owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn none_is_null() {
        let serializer = serializer().register::<Option<i32>>().build();
        assert_eq!(serializer.serialize(&None::<i32>).unwrap(), WireValue::Null);
        assert_eq!(serializer.serialize(&Some(4)).unwrap(), WireValue::Integer(4));
        assert_eq!(serializer.deserialize::<Option<i32>>(&WireValue::Null).unwrap(), None);
        assert_eq!(serializer.from_json::<Option<i32>>(&serde_json::json!(9)).unwrap(), Some(9));
    }

    #[test]
    fn nested_options_collapse_null() {
        let serializer = serializer().register::<Vec<Option<String>>>().build();
        let json = serde_json::json!(["a", null]);
        let value = serializer.from_json::<Vec<Option<String>>>(&json).unwrap();
        assert_eq!(value, [Some("a".to_owned()), None]);
        assert_eq!(serializer.to_json(&value).unwrap(), json);
    }
}
