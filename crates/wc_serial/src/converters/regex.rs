use core::any::TypeId;

use ::regex::Regex;
use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireMap, WireValue};

use super::registered;
use crate::converter::expect_value;
use crate::{Error, SerializationHelper, TypeConverter};

/// Converts [`Regex`] to its pattern, tagged as regular expression.
///
/// Older documents stored `{"pattern", "options"}` objects, where the option
/// bits 1, 2, 4 and 8 stand for case insensitivity, `.` matching newlines,
/// multi line anchors and extended syntax. They are read into the equivalent
/// inline flags.
pub struct RegexConverter;

const OPTION_FLAGS: [(i64, char); 4] = [(1, 'i'), (2, 's'), (4, 'm'), (8, 'x')];

fn legacy_pattern(map: &WireMap) -> Result<String, Error> {
    let (2, Some(pattern), Some(options)) = (map.len(), map.get_str("pattern"), map.get_str("options"))
    else {
        return Err(Error::deserialization(
            "Regular expression object has no pattern or options properties or does have extra properties",
        ));
    };
    let (Some(pattern), Some(options)) = (pattern.as_str(), options.as_integer()) else {
        return Err(Error::deserialization(
            "Regular expression objects need a string pattern and integer options",
        ));
    };

    let flags: String = OPTION_FLAGS
        .iter()
        .filter(|(bit, _)| options & bit != 0)
        .map(|(_, flag)| flag)
        .collect();
    if flags.is_empty() || pattern.is_empty() {
        Ok(pattern.to_owned())
    } else {
        Ok(format!("(?{flags}){pattern}"))
    }
}

impl TypeConverter for RegexConverter {
    fn name(&self) -> &'static str {
        "RegexConverter"
    }

    fn can_convert(&self, ty: TypeId, _helper: &dyn SerializationHelper) -> bool {
        ty == TypeId::of::<Regex>()
    }

    fn allowed_tags(&self, _ty: TypeId, _helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
        vec![None, Some(Tag::REGULAR_EXPRESSION)]
    }

    fn allowed_kinds(
        &self,
        _ty: TypeId,
        tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        match tag {
            Some(_) => vec![WireKind::String],
            None => vec![WireKind::String, WireKind::Map],
        }
    }

    fn guess_type(
        &self,
        tag: Option<Tag>,
        kind: WireKind,
        helper: &dyn SerializationHelper,
    ) -> Option<TypeId> {
        if tag == Some(Tag::REGULAR_EXPRESSION) && kind == WireKind::String {
            registered(helper, TypeId::of::<Regex>())
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
        let regex = expect_value::<Regex>(value)?;
        Ok(WireValue::tagged(Tag::REGULAR_EXPRESSION, regex.as_str()))
    }

    fn deserialize_cbor(
        &self,
        _ty: TypeId,
        value: &WireValue,
        _owner: Option<&Owner>,
        _helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        let pattern = match value.untagged() {
            WireValue::String(pattern) => pattern.clone(),
            WireValue::Map(map) => legacy_pattern(map)?,
            other => {
                return Err(Error::deserialization(format!(
                    "Expected a string or an object for a regular expression, but got {}",
                    other.kind()
                )));
            }
        };
        match Regex::new(&pattern) {
            Ok(regex) => Ok(Box::new(regex)),
            Err(err) => {
                log::debug!("rejected regular expression {pattern:?}: {err}");
                Err(Error::deserialization("Invalid regular expression pattern"))
            }
        }
    }
}
