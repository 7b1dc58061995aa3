use core::any::TypeId;

use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireValue};

use super::registered;
use crate::types::duration::{UnitInfo, units};
use crate::{Error, SerializationHelper, TypeConverter};

/// Converts the duration types of [`types::duration`](crate::types::duration)
/// to integers tagged with their unit.
///
/// A duration tagged with a coarser unit is scaled on read. Finer units are
/// rejected, as they would lose precision.
pub struct DurationConverter;

fn unit_of(ty: TypeId) -> Option<UnitInfo> {
    units().into_iter().find(|unit| unit.type_id == ty)
}

fn unit_error(helper: &dyn SerializationHelper, ty: TypeId) -> Error {
    Error::deserialization(format!("{} is not a duration type", helper.type_name(ty)))
}

impl TypeConverter for DurationConverter {
    fn name(&self) -> &'static str {
        "DurationConverter"
    }

    fn can_convert(&self, ty: TypeId, _helper: &dyn SerializationHelper) -> bool {
        unit_of(ty).is_some()
    }

    fn allowed_tags(&self, ty: TypeId, _helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
        let Some(own) = unit_of(ty) else {
            return Vec::new();
        };
        let coarser = units()
            .into_iter()
            .filter(|unit| unit.nanos >= own.nanos)
            .map(|unit| Some(unit.tag));
        core::iter::once(None).chain(coarser).collect()
    }

    fn allowed_kinds(
        &self,
        _ty: TypeId,
        _tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        vec![WireKind::Integer]
    }

    fn guess_type(
        &self,
        tag: Option<Tag>,
        kind: WireKind,
        helper: &dyn SerializationHelper,
    ) -> Option<TypeId> {
        if kind != WireKind::Integer {
            return None;
        }
        let tag = tag?;
        let unit = units().into_iter().find(|unit| unit.tag == tag)?;
        registered(helper, unit.type_id)
    }

    fn serialize(
        &self,
        ty: TypeId,
        value: &dyn Reflect,
        helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error> {
        let unit = unit_of(ty).ok_or_else(|| unit_error(helper, ty))?;
        let count = (unit.count)(value).ok_or_else(|| {
            Error::serialization(format!(
                "Expected a value of type {}, but got {}",
                helper.type_name(ty),
                value.reflect_type_path()
            ))
        })?;
        Ok(WireValue::tagged(unit.tag, count))
    }

    fn deserialize_cbor(
        &self,
        ty: TypeId,
        value: &WireValue,
        _owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        let own = unit_of(ty).ok_or_else(|| unit_error(helper, ty))?;
        let Some(count) = value.untagged().as_integer() else {
            return Err(Error::deserialization(format!(
                "Expected an integer duration, but got {}",
                value.untagged().kind()
            )));
        };

        let source = match value.tag() {
            None => own.nanos,
            Some(tag) if Some(tag) == helper.type_tag(ty) => own.nanos,
            Some(tag) => match units().into_iter().find(|unit| unit.tag == tag) {
                Some(unit) => unit.nanos,
                None => return Err(Error::deserialization(format!("Invalid CBOR tag {tag}"))),
            },
        };
        if source < own.nanos {
            return Err(Error::deserialization(format!(
                "Cannot read a duration of a finer unit into {}",
                helper.type_name(ty)
            )));
        }
        let scaled = count.checked_mul(source / own.nanos).ok_or_else(|| {
            Error::deserialization(format!(
                "Duration of {count} overflows when converted to {}",
                helper.type_name(ty)
            ))
        })?;
        Ok((own.build)(scaled))
    }
}
