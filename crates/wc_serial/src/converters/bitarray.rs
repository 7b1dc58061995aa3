use core::any::TypeId;

use base64::Engine;
use fixedbitset::FixedBitSet;
use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireValue};

use super::bytes::BASE64URL;
use super::{expect_str, registered};
use crate::converter::expect_value;
use crate::{Error, SerializationHelper, TypeConverter};

/// Converts [`FixedBitSet`] to a byte string tagged as bit array.
///
/// The first byte holds the bit count modulo eight, the following bytes
/// the bits, least significant first. JSON carries the bytes as base64url.
pub struct BitArrayConverter;

fn pack(bits: &FixedBitSet) -> Vec<u8> {
    if bits.is_empty() {
        return Vec::new();
    }
    let mut bytes = vec![0u8; 1 + bits.len().div_ceil(8)];
    bytes[0] = (bits.len() % 8) as u8;
    for index in bits.ones() {
        bytes[1 + index / 8] |= 1 << (index % 8);
    }
    bytes
}

fn unpack(bytes: &[u8]) -> Result<FixedBitSet, Error> {
    let Some((&rest, data)) = bytes.split_first() else {
        return Ok(FixedBitSet::new());
    };
    let len = match rest {
        0 => data.len() * 8,
        1..=7 if !data.is_empty() => (data.len() - 1) * 8 + usize::from(rest),
        _ => {
            return Err(Error::deserialization(format!(
                "Invalid bit array of {} bytes with {rest} trailing bits",
                data.len()
            )));
        }
    };
    let mut bits = FixedBitSet::with_capacity(len);
    for index in 0..len {
        if (data[index / 8] >> (index % 8)) & 1 == 1 {
            bits.insert(index);
        }
    }
    Ok(bits)
}

impl TypeConverter for BitArrayConverter {
    fn name(&self) -> &'static str {
        "BitArrayConverter"
    }

    fn can_convert(&self, ty: TypeId, _helper: &dyn SerializationHelper) -> bool {
        ty == TypeId::of::<FixedBitSet>()
    }

    fn allowed_tags(&self, _ty: TypeId, _helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
        vec![Some(Tag::BIT_ARRAY)]
    }

    fn allowed_kinds(
        &self,
        _ty: TypeId,
        _tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        vec![WireKind::Bytes]
    }

    fn guess_type(
        &self,
        tag: Option<Tag>,
        kind: WireKind,
        helper: &dyn SerializationHelper,
    ) -> Option<TypeId> {
        if tag == Some(Tag::BIT_ARRAY) && kind == WireKind::Bytes {
            registered(helper, TypeId::of::<FixedBitSet>())
        } else {
            None
        }
    }

    fn serialize(
        &self,
        _ty: TypeId,
        value: &dyn Reflect,
        _helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error> {
        let bits = expect_value::<FixedBitSet>(value)?;
        Ok(WireValue::tagged(Tag::BIT_ARRAY, WireValue::Bytes(pack(bits))))
    }

    fn deserialize_cbor(
        &self,
        _ty: TypeId,
        value: &WireValue,
        _owner: Option<&Owner>,
        _helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        let bytes = value.untagged().as_bytes().ok_or_else(|| {
            Error::deserialization(format!(
                "Expected a byte string for a bit array, but got {}",
                value.untagged().kind()
            ))
        })?;
        Ok(Box::new(unpack(bytes)?))
    }

    fn deserialize_json(
        &self,
        _ty: TypeId,
        value: &WireValue,
        _owner: Option<&Owner>,
        _helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        let text = expect_str(value, "a bit array")?;
        let bytes = BASE64URL
            .decode(text)
            .map_err(|err| Error::deserialization(format!("Invalid base64url data: {err}")))?;
        Ok(Box::new(unpack(&bytes)?))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::Dynamic;
    use crate::testing::*;

    fn sample() -> FixedBitSet {
        let mut bits = FixedBitSet::with_capacity(10);
        bits.insert(0);
        bits.insert(3);
        bits.insert(9);
        bits
    }

    #[test]
    fn packed_layout() {
        let serializer = serializer().build();
        let wire = serializer.serialize(&sample()).unwrap();
        assert_eq!(
            wire,
            WireValue::tagged(Tag::BIT_ARRAY, WireValue::Bytes(vec![2, 0b1001, 0b10]))
        );
        assert_eq!(serializer.deserialize::<FixedBitSet>(&wire).unwrap(), sample());

        let full = WireValue::tagged(Tag::BIT_ARRAY, WireValue::Bytes(vec![0, 0xff]));
        assert_eq!(serializer.deserialize::<FixedBitSet>(&full).unwrap().count_ones(..), 8);
    }

    #[test]
    fn empty_bit_arrays() {
        let serializer = serializer().build();
        let wire = serializer.serialize(&FixedBitSet::new()).unwrap();
        assert_eq!(wire, WireValue::tagged(Tag::BIT_ARRAY, WireValue::Bytes(Vec::new())));
        assert!(serializer.deserialize::<FixedBitSet>(&wire).unwrap().is_empty());
    }

    #[test]
    fn json_is_base64url() {
        let serializer = serializer().build();
        let json = serializer.to_json(&sample()).unwrap();
        assert_eq!(json, json!("AgkC"));
        assert_eq!(serializer.from_json::<FixedBitSet>(&json).unwrap(), sample());
    }

    #[test]
    fn tag_is_required() {
        let serializer = serializer().build();
        assert!(
            serializer
                .deserialize::<FixedBitSet>(&WireValue::Bytes(vec![0]))
                .is_err()
        );
        let err = serializer
            .deserialize::<FixedBitSet>(&WireValue::tagged(Tag::BIT_ARRAY, WireValue::Bytes(vec![9, 0])))
            .unwrap_err();
        assert_eq!(err.message(), "Invalid bit array of 1 bytes with 9 trailing bits");

        let guessed: Dynamic = serializer
            .deserialize(&WireValue::tagged(Tag::BIT_ARRAY, WireValue::Bytes(vec![1, 1])))
            .unwrap();
        assert_eq!(guessed.downcast_ref::<FixedBitSet>().map(FixedBitSet::len), Some(1));
    }
}
