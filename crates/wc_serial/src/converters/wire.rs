use core::any::TypeId;

use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireValue};

use crate::converter::expect_value;
use crate::{ANY_KIND, Error, SerializationHelper, TypeConverter};

/// Passes [`WireValue`] fields through unchanged.
pub struct WireConverter;

/// Passes `serde_json::Value` fields through their JSON projection.
///
/// Tags and byte strings do not survive a round trip through the full
/// wire model, see [`WireValue::to_json`].
pub struct JsonConverter;

impl TypeConverter for WireConverter {
    fn name(&self) -> &'static str {
        "WireConverter"
    }

    fn can_convert(&self, ty: TypeId, _helper: &dyn SerializationHelper) -> bool {
        ty == TypeId::of::<WireValue>()
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
        _ty: TypeId,
        value: &dyn Reflect,
        _helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error> {
        Ok(expect_value::<WireValue>(value)?.clone())
    }

    fn deserialize_cbor(
        &self,
        _ty: TypeId,
        value: &WireValue,
        _owner: Option<&Owner>,
        _helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        Ok(Box::new(value.clone()))
    }
}

impl TypeConverter for JsonConverter {
    fn name(&self) -> &'static str {
        "JsonConverter"
    }

    fn can_convert(&self, ty: TypeId, _helper: &dyn SerializationHelper) -> bool {
        ty == TypeId::of::<serde_json::Value>()
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
        _ty: TypeId,
        value: &dyn Reflect,
        _helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error> {
        Ok(WireValue::from_json(expect_value::<serde_json::Value>(value)?))
    }

    fn deserialize_cbor(
        &self,
        _ty: TypeId,
        value: &WireValue,
        _owner: Option<&Owner>,
        _helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        Ok(Box::new(value.to_json()))
    }
}
