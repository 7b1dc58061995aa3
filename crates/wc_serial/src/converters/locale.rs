use core::any::TypeId;

use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireValue};

use super::{expect_str, registered};
use crate::converter::expect_value;
use crate::types::Locale;
use crate::{Error, SerializationHelper, TypeConverter};

/// Converts [`Locale`] to its BCP 47 tag, or to its `lang_TERRITORY` name
/// when `useBcp47Locale` is off.
///
/// Both forms are read regardless of the option.
pub struct LocaleConverter;

const LOCALE_TAGS: [Tag; 2] = [Tag::LOCALE_ISO, Tag::LOCALE_BCP47];

impl TypeConverter for LocaleConverter {
    fn name(&self) -> &'static str {
        "LocaleConverter"
    }

    fn can_convert(&self, ty: TypeId, _helper: &dyn SerializationHelper) -> bool {
        ty == TypeId::of::<Locale>()
    }

    fn allowed_tags(&self, _ty: TypeId, _helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
        LOCALE_TAGS.into_iter().map(Some).collect()
    }

    fn allowed_kinds(
        &self,
        _ty: TypeId,
        _tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        vec![WireKind::String]
    }

    fn guess_type(
        &self,
        tag: Option<Tag>,
        kind: WireKind,
        helper: &dyn SerializationHelper,
    ) -> Option<TypeId> {
        let tagged = tag.is_some_and(|tag| LOCALE_TAGS.contains(&tag));
        if tagged && kind == WireKind::String {
            registered(helper, TypeId::of::<Locale>())
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
        let locale = expect_value::<Locale>(value)?;
        if helper.config().use_bcp47_locale {
            Ok(WireValue::tagged(Tag::LOCALE_BCP47, locale.bcp47_name()))
        } else {
            Ok(WireValue::tagged(Tag::LOCALE_ISO, locale.name()))
        }
    }

    fn deserialize_cbor(
        &self,
        _ty: TypeId,
        value: &WireValue,
        _owner: Option<&Owner>,
        _helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        let text = expect_str(value, "a locale")?;
        let locale = text
            .parse::<Locale>()
            .map_err(|err| Error::deserialization(err.to_string()))?;
        Ok(Box::new(locale))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::*;

    #[test]
    fn bcp47_and_iso_names() {
        let locale: Locale = "sr_Latn_RS".parse().unwrap();

        let serializer = serializer().build();
        let wire = serializer.serialize(&locale).unwrap();
        assert_eq!(wire, WireValue::tagged(Tag::LOCALE_BCP47, "sr-Latn-RS"));
        assert_eq!(serializer.deserialize::<Locale>(&wire).unwrap(), locale);

        let iso = serializer_with(|b| b.use_bcp47_locale(false));
        assert_eq!(iso.to_json(&locale).unwrap(), json!("sr_RS"));
        assert_eq!(iso.from_json::<Locale>(&json!("de-AT")).unwrap().name(), "de_AT");
    }

    #[test]
    fn c_locale_and_garbage() {
        let serializer = serializer().build();
        assert!(serializer.from_json::<Locale>(&json!("")).unwrap().is_c());
        assert!(serializer.from_json::<Locale>(&json!("C")).unwrap().is_c());

        let err = serializer.from_json::<Locale>(&json!("no locale")).unwrap_err();
        assert_eq!(err.message(), "String cannot be interpreted as locale");
    }

    #[test]
    fn untagged_text_needs_json() {
        let serializer = serializer().build();
        assert!(serializer.deserialize::<Locale>(&WireValue::from("en")).is_err());
        assert_eq!(
            serializer.from_json::<Locale>(&json!("en")).unwrap().language(),
            "en"
        );
    }
}
