use core::any::TypeId;

use wc_reflect::info::BaseKind;
use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireValue};

use super::{base_kind, emplace, extract, subtypes};
use crate::converter::expect_array;
use crate::{Error, SerializationHelper, TypeConverter};

/// Converts tuples of three or more elements to arrays of the same length.
pub struct TupleConverter;

impl TypeConverter for TupleConverter {
    fn name(&self) -> &'static str {
        "TupleConverter"
    }

    fn can_convert(&self, ty: TypeId, helper: &dyn SerializationHelper) -> bool {
        base_kind(helper, ty) == Some(BaseKind::Tuple)
    }

    fn allowed_tags(&self, _ty: TypeId, _helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
        vec![None, Some(Tag::TUPLE)]
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
        let items = extractor
            .subtypes()
            .iter()
            .zip(&parts)
            .enumerate()
            .map(|(i, (&element, part))| helper.serialize_subtype(element, &**part, &format!("<{i}>")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(WireValue::tagged(Tag::TUPLE, items))
    }

    fn deserialize_cbor(
        &self,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        let elements = subtypes(helper, ty);
        let items = expect_array(value, helper.type_name(ty))?;
        if items.len() != elements.len() {
            return Err(Error::deserialization(format!(
                "Expected array with {} elements, but got {} instead",
                elements.len(),
                items.len()
            )));
        }
        let parts = elements
            .iter()
            .zip(items)
            .enumerate()
            .map(|(i, (&element, item))| {
                helper.deserialize_subtype(element, item, owner, &format!("<{i}>"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        emplace(helper, ty, parts, owner)
    }
}
