use core::any::TypeId;

use wc_reflect::info::BaseKind;
use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireValue};

use super::{base_kind, emplace, extract, subtypes};
use crate::{ANY_KIND, Error, SerializationHelper, TypeConverter};

/// Converts sum types as the alternative they hold.
///
/// The wire form carries no marker of the alternative. Reading tries the
/// alternatives in declaration order and keeps the first that succeeds.
pub struct VariantConverter;

impl TypeConverter for VariantConverter {
    fn name(&self) -> &'static str {
        "VariantConverter"
    }

    fn can_convert(&self, ty: TypeId, helper: &dyn SerializationHelper) -> bool {
        base_kind(helper, ty) == Some(BaseKind::Variant)
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
        let (_, parts) = extract(helper, ty, value)?;
        let Some(held) = parts.first() else {
            return Err(Error::serialization(format!(
                "Variant of type {} holds no value",
                helper.type_name(ty)
            )));
        };
        let held_ty = (**held).ty_id();
        helper.serialize_subtype(held_ty, &**held, &format!("<{}>", helper.type_name(held_ty)))
    }

    fn deserialize_cbor(
        &self,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        for &alternative in subtypes(helper, ty) {
            let hint = format!("<{}>", helper.type_name(alternative));
            match helper.deserialize_subtype(alternative, value, owner, &hint) {
                Ok(part) => return emplace(helper, ty, vec![part], owner),
                Err(err) => log::trace!(
                    "variant alternative {} rejected the value: {}",
                    helper.type_name(alternative),
                    err.message()
                ),
            }
        }
        Err(Error::deserialization(format!(
            "Failed to deserialize value to {} because all possible sub-type converters rejected the passed value.",
            helper.type_name(ty)
        )))
    }
}
