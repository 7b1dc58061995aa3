use core::any::TypeId;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireValue};

use super::{expect_str, registered};
use crate::converter::expect_value;
use crate::{ByteArrayFormat, Error, Priority, SerializationHelper, TypeConverter};

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

pub(super) const BASE64: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
pub(super) const BASE64URL: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Converts `Vec<u8>` to byte strings.
///
/// JSON carries no byte strings, so there the bytes are written as text in
/// the configured [`ByteArrayFormat`]. The value is tagged with the matching
/// "expected encoding" tag, which the JSON projection encodes with.
pub struct ByteArrayConverter;

impl ByteArrayConverter {
    fn decode_text(&self, text: &str, helper: &dyn SerializationHelper) -> Result<Vec<u8>, Error> {
        let config = helper.config();
        let format = config.byte_array_format;
        if config.validate_base64 {
            validate(text, format)?;
        }

        let decoded = match format {
            ByteArrayFormat::Base64 => BASE64.decode(lenient_base64(text, b"+/")),
            ByteArrayFormat::Base64url => BASE64URL.decode(lenient_base64(text, b"-_")),
            ByteArrayFormat::Base16 => {
                let mut digits: Vec<u8> = text.bytes().filter(u8::is_ascii_hexdigit).collect();
                digits.truncate(digits.len() & !1);
                return hex::decode(digits)
                    .map_err(|err| Error::deserialization(format!("Invalid base16 data: {err}")));
            }
        };
        decoded.map_err(|err| Error::deserialization(format!("Invalid base64 data: {err}")))
    }
}

fn validate(text: &str, format: ByteArrayFormat) -> Result<(), Error> {
    let invalid = |msg: &str| Err(Error::deserialization(msg.to_owned()));
    match format {
        ByteArrayFormat::Base64 => {
            if text.len() % 4 != 0 {
                return invalid("String has invalid length for base64 encoding");
            }
            let body = text.trim_end_matches('=');
            let symbols = body
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/');
            if !symbols || text.len() - body.len() > 2 {
                return invalid("String contains unallowed symbols for base64 encoding");
            }
        }
        ByteArrayFormat::Base64url => {
            let symbols = text
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
            if !symbols {
                return invalid("String contains unallowed symbols for base64url encoding");
            }
        }
        ByteArrayFormat::Base16 => {
            if text.len() % 2 != 0 {
                return invalid("String has invalid length for base16 encoding");
            }
            if !text.bytes().all(|b| b.is_ascii_hexdigit()) {
                return invalid("String contains unallowed symbols for base16 encoding");
            }
        }
    }
    Ok(())
}

/// Drops every symbol outside the alphabet and a dangling last symbol.
fn lenient_base64(text: &str, extra: &[u8; 2]) -> Vec<u8> {
    let mut symbols: Vec<u8> = text
        .bytes()
        .filter(|b| b.is_ascii_alphanumeric() || extra.contains(b))
        .collect();
    if symbols.len() % 4 == 1 {
        symbols.pop();
    }
    symbols
}

fn format_tag(format: ByteArrayFormat) -> Tag {
    match format {
        ByteArrayFormat::Base64 => Tag::EXPECTED_BASE64,
        ByteArrayFormat::Base64url => Tag::EXPECTED_BASE64URL,
        ByteArrayFormat::Base16 => Tag::EXPECTED_BASE16,
    }
}

impl TypeConverter for ByteArrayConverter {
    fn name(&self) -> &'static str {
        "ByteArrayConverter"
    }

    fn priority(&self) -> Priority {
        Priority::HIGH
    }

    fn can_convert(&self, ty: TypeId, _helper: &dyn SerializationHelper) -> bool {
        ty == TypeId::of::<Vec<u8>>()
    }

    fn allowed_tags(&self, _ty: TypeId, _helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
        vec![
            None,
            Some(Tag::EXPECTED_BASE64URL),
            Some(Tag::EXPECTED_BASE64),
            Some(Tag::EXPECTED_BASE16),
        ]
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
        let expected = matches!(
            tag,
            None | Some(Tag::EXPECTED_BASE64URL | Tag::EXPECTED_BASE64 | Tag::EXPECTED_BASE16)
        );
        if expected && kind == WireKind::Bytes {
            registered(helper, TypeId::of::<Vec<u8>>())
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
        let bytes = WireValue::Bytes(expect_value::<Vec<u8>>(value)?.clone());
        if helper.is_json_mode() {
            Ok(WireValue::tagged(format_tag(helper.config().byte_array_format), bytes))
        } else {
            Ok(bytes)
        }
    }

    fn deserialize_cbor(
        &self,
        _ty: TypeId,
        value: &WireValue,
        _owner: Option<&Owner>,
        _helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        match value.untagged().as_bytes() {
            Some(bytes) => Ok(Box::new(bytes.to_vec())),
            None => Err(Error::deserialization(format!(
                "Expected a byte string, but got {}",
                value.untagged().kind()
            ))),
        }
    }

    fn deserialize_json(
        &self,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        if value.untagged().kind() == WireKind::Bytes {
            return self.deserialize_cbor(ty, value, owner, helper);
        }
        let text = expect_str(value, "a byte array")?;
        Ok(Box::new(self.decode_text(text, helper)?))
    }
}
