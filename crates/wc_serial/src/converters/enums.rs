use core::any::TypeId;

use wc_reflect::info::{BaseKind, EnumInfo};
use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireValue};

use crate::{Error, Priority, SerializationHelper, TypeConverter};

/// Converts registered enums and flag sets.
///
/// Values are written as integers, or by name with `enumAsString`. Flag
/// names are joined with `|`. Both forms are always accepted when reading.
pub struct EnumConverter;

fn enum_info(helper: &dyn SerializationHelper, ty: TypeId) -> Result<&EnumInfo, Error> {
    helper
        .registry()
        .get_type_info(ty)
        .and_then(|info| info.as_enum())
        .ok_or_else(|| Error::serialization(format!("{} is not an enum", helper.type_name(ty))))
}

fn own_tag(info: &EnumInfo) -> Tag {
    if info.is_flags() { Tag::FLAGS } else { Tag::ENUM }
}

/// Names the set bits of `bits`, covering every bit by a declared key.
fn flag_names(info: &EnumInfo, bits: i64) -> Option<String> {
    if bits == 0 {
        return Some(info.key_of(0).unwrap_or_default().to_owned());
    }
    let mut names = Vec::new();
    let mut remaining = bits;
    for &(key, value) in info.keys() {
        if value != 0 && bits & value == value && remaining & value != 0 {
            names.push(key);
            remaining &= !value;
        }
    }
    (remaining == 0).then(|| names.join("|"))
}

fn parse_flags(info: &EnumInfo, text: &str) -> Result<i64, Error> {
    let mut bits = 0;
    for name in text.split('|').map(str::trim).filter(|name| !name.is_empty()) {
        bits |= info.value_of(name).ok_or_else(|| {
            Error::deserialization(format!("Unknown key {name} for flags {}", info.name()))
        })?;
    }
    Ok(bits)
}

impl TypeConverter for EnumConverter {
    fn name(&self) -> &'static str {
        "EnumConverter"
    }

    fn priority(&self) -> Priority {
        Priority::LOW
    }

    fn can_convert(&self, ty: TypeId, helper: &dyn SerializationHelper) -> bool {
        matches!(
            helper.registry().base_kind(ty),
            Some(BaseKind::Enum | BaseKind::Flags)
        )
    }

    fn allowed_tags(&self, ty: TypeId, helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
        match enum_info(helper, ty) {
            Ok(info) => vec![None, Some(own_tag(info))],
            Err(_) => Vec::new(),
        }
    }

    fn allowed_kinds(
        &self,
        _ty: TypeId,
        _tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        vec![WireKind::Integer, WireKind::String]
    }

    fn serialize(
        &self,
        ty: TypeId,
        value: &dyn Reflect,
        helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error> {
        let info = enum_info(helper, ty)?;
        let int = info.to_integer(value).ok_or_else(|| {
            Error::serialization(format!(
                "Value of type {} is not a {}",
                value.reflect_type_path(),
                info.name()
            ))
        })?;
        if !helper.config().enum_as_string {
            return Ok(WireValue::tagged(own_tag(info), int));
        }

        let name = if info.is_flags() {
            flag_names(info, int)
        } else {
            info.key_of(int).map(str::to_owned)
        };
        let name = name.ok_or_else(|| {
            Error::serialization(format!("Value {int} has no name in {}", info.name()))
        })?;
        Ok(WireValue::tagged(own_tag(info), name))
    }

    fn deserialize_cbor(
        &self,
        ty: TypeId,
        value: &WireValue,
        _owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        let info = enum_info(helper, ty).map_err(|err| Error::deserialization(err.message()))?;
        let int = match value.untagged() {
            WireValue::Integer(int) => *int,
            WireValue::String(text) if info.is_flags() => parse_flags(info, text)?,
            WireValue::String(text) => info.value_of(text.trim()).ok_or_else(|| {
                Error::deserialization(format!("Unknown key {text} for enum {}", info.name()))
            })?,
            other => {
                return Err(Error::deserialization(format!(
                    "Expected an integer or string for enum {}, but got {}",
                    info.name(),
                    other.kind()
                )));
            }
        };
        info.from_integer(int).ok_or_else(|| {
            Error::deserialization(format!("Value {int} is not valid for enum {}", info.name()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn integer_and_name_modes() {
        let serializer = serializer().build();
        let wire = serializer.serialize(&Level::High).unwrap();
        assert_eq!(wire, WireValue::tagged(Tag::ENUM, 5));
        assert_eq!(serializer.deserialize::<Level>(&wire).unwrap(), Level::High);
        assert_eq!(serializer.deserialize::<Level>(&WireValue::from("Low")).unwrap(), Level::Low);

        let serializer = serializer_with(|b| b.enum_as_string(true));
        assert_eq!(serializer.to_json(&Level::High).unwrap(), serde_json::json!("High"));
        assert_eq!(serializer.from_json::<Level>(&serde_json::json!(0)).unwrap(), Level::Low);
    }

    #[test]
    fn flags_join_names() {
        let serializer = serializer_with(|b| b.enum_as_string(true));
        let value = Permissions(Permissions::READ | Permissions::WRITE);
        let json = serializer.to_json(&value).unwrap();
        assert_eq!(json, serde_json::json!("Read|Write"));
        assert_eq!(serializer.from_json::<Permissions>(&json).unwrap(), value);
        assert_eq!(
            serializer.from_json::<Permissions>(&serde_json::json!("")).unwrap(),
            Permissions(0)
        );
    }

    #[test]
    fn unknown_names_fail() {
        let serializer = serializer().build();
        let err = serializer.deserialize::<Level>(&WireValue::from("Medium")).unwrap_err();
        assert_eq!(err.message(), "Unknown key Medium for enum Level");
        let err = serializer.deserialize::<Level>(&WireValue::Integer(3)).unwrap_err();
        assert_eq!(err.message(), "Value 3 is not valid for enum Level");
        assert!(serializer.deserialize::<Permissions>(&WireValue::from("Read|Fly")).is_err());
    }

    #[test]
    fn foreign_tag_is_rejected() {
        let serializer = serializer().build();
        let err = serializer
            .deserialize::<Level>(&WireValue::tagged(Tag::FLAGS, 0))
            .unwrap_err();
        assert!(err.message().contains("is not convertible to that type"));
    }
}
