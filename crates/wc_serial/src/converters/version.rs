use core::any::TypeId;

use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireValue};

use super::registered;
use crate::converter::expect_value;
use crate::types::VersionNumber;
use crate::{Error, SerializationHelper, TypeConverter};

/// Converts [`VersionNumber`] to an array of its segments, or to dotted
/// text when `versionAsString` is set.
pub struct VersionConverter;

fn read_segments(items: &[WireValue]) -> Result<VersionNumber, Error> {
    let segments = items
        .iter()
        .map(|item| {
            item.as_integer()
                .and_then(|segment| u32::try_from(segment).ok())
                .ok_or_else(|| {
                    Error::deserialization(format!(
                        "Version segments must be non-negative integers, but got {item}"
                    ))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(VersionNumber::new(segments))
}

fn read_text(text: &str) -> Result<VersionNumber, Error> {
    if text.is_empty() {
        return Ok(VersionNumber::default());
    }
    let (version, suffix) = VersionNumber::parse_with_suffix(text)
        .map_err(|err| Error::deserialization(err.to_string()))?;
    if !suffix.is_empty() {
        log::warn!("parsed version number {version} with suffix {suffix:?}, the suffix is discarded");
    }
    Ok(version)
}

impl TypeConverter for VersionConverter {
    fn name(&self) -> &'static str {
        "VersionConverter"
    }

    fn can_convert(&self, ty: TypeId, _helper: &dyn SerializationHelper) -> bool {
        ty == TypeId::of::<VersionNumber>()
    }

    fn allowed_tags(&self, _ty: TypeId, _helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
        vec![None, Some(Tag::VERSION_NUMBER)]
    }

    fn allowed_kinds(
        &self,
        _ty: TypeId,
        _tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        vec![WireKind::Array, WireKind::String]
    }

    fn guess_type(
        &self,
        tag: Option<Tag>,
        kind: WireKind,
        helper: &dyn SerializationHelper,
    ) -> Option<TypeId> {
        let shaped = matches!(kind, WireKind::Array | WireKind::String);
        if tag == Some(Tag::VERSION_NUMBER) && shaped {
            registered(helper, TypeId::of::<VersionNumber>())
        } else {
            None
        }
    }

    fn serialize(
        &self,
        _ty: TypeId,
        value: &dyn Reflect,
        helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error> {
        let version = expect_value::<VersionNumber>(value)?;
        let inner = if helper.config().version_as_string {
            WireValue::from(version.to_string())
        } else {
            version.segments().iter().map(|&s| WireValue::from(s)).collect()
        };
        Ok(WireValue::tagged(Tag::VERSION_NUMBER, inner))
    }

    fn deserialize_cbor(
        &self,
        _ty: TypeId,
        value: &WireValue,
        _owner: Option<&Owner>,
        _helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        let version = match value.untagged() {
            WireValue::Array(items) => read_segments(items)?,
            WireValue::String(text) => read_text(text)?,
            other => {
                return Err(Error::deserialization(format!(
                    "Expected an array or a string for a version number, but got {}",
                    other.kind()
                )));
            }
        };
        Ok(Box::new(version))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::*;

    #[test]
    fn segments_or_text() {
        let version = VersionNumber::new([1, 2, 3]);

        let serializer = serializer().build();
        assert_eq!(serializer.to_json(&version).unwrap(), json!([1, 2, 3]));
        assert_eq!(
            serializer.serialize(&version).unwrap().tag(),
            Some(Tag::VERSION_NUMBER)
        );

        let text = serializer_with(|b| b.version_as_string(true));
        assert_eq!(text.to_json(&version).unwrap(), json!("1.2.3"));

        // Both shapes are read regardless of the option.
        assert_eq!(serializer.from_json::<VersionNumber>(&json!("1.2.3")).unwrap(), version);
        assert_eq!(text.from_json::<VersionNumber>(&json!([1, 2, 3])).unwrap(), version);
    }

    #[test]
    fn suffixes_are_dropped() {
        let serializer = serializer().build();
        let version = serializer.from_json::<VersionNumber>(&json!("5.12-beta")).unwrap();
        assert_eq!(version, VersionNumber::new([5, 12]));
        assert!(serializer.from_json::<VersionNumber>(&json!("")).unwrap().is_null());
    }

    #[test]
    fn invalid_versions() {
        let serializer = serializer().build();
        let err = serializer.from_json::<VersionNumber>(&json!("beta")).unwrap_err();
        assert_eq!(err.message(), "Invalid version number, no segments found");
        let err = serializer.from_json::<VersionNumber>(&json!([1, -2])).unwrap_err();
        assert_eq!(
            err.message(),
            "Version segments must be non-negative integers, but got -2"
        );
    }
}
