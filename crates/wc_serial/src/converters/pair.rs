use core::any::TypeId;

use wc_reflect::info::BaseKind;
use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireValue};

use super::{base_kind, emplace, extract, subtypes};
use crate::{Error, SerializationHelper, TypeConverter};

/// Converts pairs, including `(A, B)`, to two element arrays.
pub struct PairConverter;

impl TypeConverter for PairConverter {
    fn name(&self) -> &'static str {
        "PairConverter"
    }

    fn can_convert(&self, ty: TypeId, helper: &dyn SerializationHelper) -> bool {
        base_kind(helper, ty) == Some(BaseKind::Pair)
    }

    fn allowed_tags(&self, _ty: TypeId, _helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
        vec![None, Some(Tag::PAIR)]
    }

    fn allowed_kinds(
        &self,
        _ty: TypeId,
        _tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        vec![WireKind::Array]
    }

    fn serialize(
        &self,
        ty: TypeId,
        value: &dyn Reflect,
        helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error> {
        let (extractor, parts) = extract(helper, ty, value)?;
        let &[first_ty, second_ty] = extractor.subtypes() else {
            return Err(Error::serialization(format!(
                "Pair type {} does not have two element types",
                helper.type_name(ty)
            )));
        };
        let [first, second] = parts.as_slice() else {
            return Err(Error::serialization(format!(
                "Expected two elements in {}, but got {}",
                helper.type_name(ty),
                parts.len()
            )));
        };
        let items = vec![
            helper.serialize_subtype(first_ty, &**first, "first")?,
            helper.serialize_subtype(second_ty, &**second, "second")?,
        ];
        Ok(WireValue::tagged(Tag::PAIR, items))
    }

    fn deserialize_cbor(
        &self,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        let &[first_ty, second_ty] = subtypes(helper, ty) else {
            return Err(Error::deserialization(format!(
                "Pair type {} does not have two element types",
                helper.type_name(ty)
            )));
        };
        let Some([first, second]) = value.untagged().as_array() else {
            return Err(Error::deserialization(format!(
                "{} array must have exactly 2 elements to be read as a pair",
                if helper.is_json_mode() { "JSON" } else { "CBOR" }
            )));
        };
        let parts = vec![
            helper.deserialize_subtype(first_ty, first, owner, "first")?,
            helper.deserialize_subtype(second_ty, second, owner, "second")?,
        ];
        emplace(helper, ty, parts, owner)
    }
}

#[cfg(test)]
mod tests {
    use wc_reflect::extract::PairExtractor;
    use wc_reflect::registry::TypeMeta;

    use super::*;
    use crate::testing::*;

    /// Declares its count before its flag, against the field layout.
    #[derive(Debug, Clone, PartialEq)]
    struct Reading {
        valid: bool,
        count: i32,
    }

    #[test]
    fn declared_order_wins_over_layout() {
        let meta = TypeMeta::container::<Reading>(PairExtractor::<Reading, i32, bool>::new(
            |r| &r.count,
            |r| &r.valid,
            |count, valid| Reading { valid, count },
        ))
        .with_name("Reading");
        let serializer = serializer().type_meta(meta).build();

        let value = Reading { valid: true, count: 42 };
        let wire = serializer.serialize(&value).unwrap();
        assert_eq!(
            wire,
            WireValue::tagged(Tag::PAIR, vec![WireValue::from(42), WireValue::Bool(true)])
        );
        assert_eq!(serializer.deserialize::<Reading>(&wire).unwrap(), value);
    }

    #[test]
    fn tuples_of_two() {
        let serializer = serializer().register::<(String, bool)>().build();
        let value = ("on".to_owned(), true);
        let wire = serializer.serialize(&value).unwrap();
        assert_eq!(wire.tag(), Some(Tag::PAIR));
        assert_eq!(serializer.to_json(&value).unwrap(), serde_json::json!(["on", true]));
        assert_eq!(serializer.deserialize::<(String, bool)>(&wire).unwrap(), value);
    }

    #[test]
    fn arity_is_checked() {
        let serializer = serializer().register::<(i32, i32)>().build();
        let err = serializer
            .from_json::<(i32, i32)>(&serde_json::json!([1, 2, 3]))
            .unwrap_err();
        assert_eq!(
            err.message(),
            "JSON array must have exactly 2 elements to be read as a pair"
        );
    }

    #[test]
    fn element_hints() {
        let serializer = serializer().register::<(i32, u8)>().build();
        let err = serializer
            .from_json::<(i32, u8)>(&serde_json::json!([1, 1000]))
            .unwrap_err();
        assert_eq!(err.trace()[0].name, "second");
    }
}
