use core::any::TypeId;

use wc_reflect::info::BaseKind;
use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireValue};

use super::{base_kind, emplace, extract, registered, subtypes};
use crate::converter::expect_array;
use crate::{Dynamic, Error, SerializationHelper, TypeConverter};

/// Converts lists and sets to arrays.
///
/// Sets are written with the set tag. Arrays of unknown type are read as
/// `Vec<Dynamic>`.
pub struct ListConverter;

impl TypeConverter for ListConverter {
    fn name(&self) -> &'static str {
        "ListConverter"
    }

    fn can_convert(&self, ty: TypeId, helper: &dyn SerializationHelper) -> bool {
        matches!(base_kind(helper, ty), Some(BaseKind::List | BaseKind::Set))
    }

    fn allowed_tags(&self, ty: TypeId, helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
        match base_kind(helper, ty) {
            Some(BaseKind::Set) => vec![None, Some(Tag::SET), Some(Tag::HOMOGENEOUS)],
            _ => vec![None, Some(Tag::HOMOGENEOUS)],
        }
    }

    fn allowed_kinds(
        &self,
        _ty: TypeId,
        _tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        vec![WireKind::Array]
    }

    fn guess_type(
        &self,
        tag: Option<Tag>,
        kind: WireKind,
        helper: &dyn SerializationHelper,
    ) -> Option<TypeId> {
        let list_tag = matches!(tag, None | Some(Tag::HOMOGENEOUS | Tag::SET));
        if kind == WireKind::Array && list_tag {
            registered(helper, TypeId::of::<Vec<Dynamic>>())
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
        let item = extractor.subtypes()[0];
        let items = parts
            .iter()
            .enumerate()
            .map(|(i, part)| helper.serialize_subtype(item, &**part, &format!("[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;

        if base_kind(helper, ty) == Some(BaseKind::Set) {
            Ok(WireValue::tagged(Tag::SET, items))
        } else {
            Ok(WireValue::Array(items))
        }
    }

    fn deserialize_cbor(
        &self,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        let Some(&item) = subtypes(helper, ty).first() else {
            return Err(Error::deserialization(format!(
                "List type {} has no item type",
                helper.type_name(ty)
            )));
        };
        let parts = expect_array(value, helper.type_name(ty))?
            .iter()
            .enumerate()
            .map(|(i, v)| helper.deserialize_subtype(item, v, owner, &format!("[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;
        emplace(helper, ty, parts, owner)
    }
}
