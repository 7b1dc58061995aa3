use serde::{Deserialize, Serialize};
use wc_wire::WireValue;

use crate::ValidationFlags;

// -----------------------------------------------------------------------------
// Options

/// When objects carry an `"@class"` marker naming their runtime class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Polymorphing {
    /// Never written, never read.
    Disabled,
    /// Written for runtime classes that differ from the declared class and
    /// opted in to polymorphism. Read when present.
    #[default]
    Enabled,
    /// Always written and required.
    Forced,
}

/// Shape of multi maps on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MultiMapMode {
    /// A map from key to value, or to an array if the key repeats.
    #[default]
    Map,
    /// An array of `[key, value]` arrays.
    List,
    /// A map from key to an array of values, even for single values.
    ListMap,
}

/// Text encoding of byte arrays in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ByteArrayFormat {
    #[default]
    Base64,
    Base64url,
    Base16,
}

// -----------------------------------------------------------------------------
// Config

/// Options shared by every call of a [`Serializer`](crate::Serializer).
///
/// Field names follow the option names converters query through
/// [`config_option`](crate::SerializationHelper::config_option), so a
/// configuration can be loaded from any serde format:
///
/// ```
/// use wc_serial::{Config, Polymorphing};
///
/// let config: Config = serde_json::from_str(r#"{
///     "enumAsString": true,
///     "polymorphing": "Forced"
/// }"#).unwrap();
///
/// assert!(config.enum_as_string);
/// assert_eq!(config.polymorphing, Polymorphing::Forced);
/// assert!(config.use_bcp47_locale);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Decode `null` into a default value where no converter accepts it.
    pub allow_default_null: bool,
    /// Write the diagnostic `objectName` of objects.
    pub keep_object_name: bool,
    /// Write enums and flags by name.
    pub enum_as_string: bool,
    /// Write version numbers as `"1.2.3"` instead of integer arrays.
    pub version_as_string: bool,
    /// Write date-times as unix timestamps.
    pub date_as_time_stamp: bool,
    /// Write locales as BCP 47 tags instead of `lang_TERRITORY`.
    pub use_bcp47_locale: bool,
    pub validation_flags: ValidationFlags,
    pub polymorphing: Polymorphing,
    pub multi_map_mode: MultiMapMode,
    /// Write fields marked as not stored as well.
    pub ignore_stored_attribute: bool,
    pub byte_array_format: ByteArrayFormat,
    /// Reject malformed base64/base16 text instead of decoding leniently.
    pub validate_base64: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allow_default_null: false,
            keep_object_name: false,
            enum_as_string: false,
            version_as_string: false,
            date_as_time_stamp: false,
            use_bcp47_locale: true,
            validation_flags: ValidationFlags::STANDARD_VALIDATION,
            polymorphing: Polymorphing::Enabled,
            multi_map_mode: MultiMapMode::Map,
            ignore_stored_attribute: false,
            byte_array_format: ByteArrayFormat::Base64,
            validate_base64: true,
        }
    }
}

impl Config {
    /// Looks an option up by its camelCase name.
    ///
    /// Flags are returned as booleans, modes as their variant names and
    /// validation flags as their bits.
    pub fn option(&self, name: &str) -> Option<WireValue> {
        let value = match name {
            "allowDefaultNull" => WireValue::Bool(self.allow_default_null),
            "keepObjectName" => WireValue::Bool(self.keep_object_name),
            "enumAsString" => WireValue::Bool(self.enum_as_string),
            "versionAsString" => WireValue::Bool(self.version_as_string),
            "dateAsTimeStamp" => WireValue::Bool(self.date_as_time_stamp),
            "useBcp47Locale" => WireValue::Bool(self.use_bcp47_locale),
            "validationFlags" => WireValue::from(self.validation_flags.bits()),
            "polymorphing" => WireValue::from(variant_name(&self.polymorphing)),
            "multiMapMode" => WireValue::from(variant_name(&self.multi_map_mode)),
            "ignoreStoredAttribute" => WireValue::Bool(self.ignore_stored_attribute),
            "byteArrayFormat" => WireValue::from(variant_name(&self.byte_array_format)),
            "validateBase64" => WireValue::Bool(self.validate_base64),
            _ => return None,
        };
        Some(value)
    }
}

fn variant_name<T: core::fmt::Debug>(value: &T) -> String {
    format!("{value:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_by_name() {
        let config = Config {
            multi_map_mode: MultiMapMode::ListMap,
            validation_flags: ValidationFlags::FULL_VALIDATION,
            ..Config::default()
        };
        assert_eq!(config.option("useBcp47Locale"), Some(WireValue::Bool(true)));
        assert_eq!(config.option("multiMapMode"), Some(WireValue::from("ListMap")));
        assert_eq!(config.option("validationFlags"), Some(WireValue::from(0x0F)));
        assert_eq!(config.option("unknown"), None);
    }

    #[test]
    fn load_from_ron() {
        let config: Config = ron::from_str(
            "(allowDefaultNull: true, byteArrayFormat: Base16, multiMapMode: List)",
        )
        .unwrap();
        assert!(config.allow_default_null);
        assert_eq!(config.byte_array_format, ByteArrayFormat::Base16);
        assert_eq!(config.multi_map_mode, MultiMapMode::List);
        assert_eq!(config.polymorphing, Polymorphing::Enabled);
        assert!(config.validate_base64);
    }

    #[test]
    fn json_round_trip() {
        let config = Config {
            validation_flags: ValidationFlags::NO_EXTRA_PROPERTIES,
            ..Config::default()
        };
        let text = serde_json::to_string(&config).unwrap();
        assert!(text.contains("\"validationFlags\""));
        let back: Config = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
