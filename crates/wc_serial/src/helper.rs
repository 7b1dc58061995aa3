use core::any::TypeId;

use wc_reflect::registry::TypeRegistry;
use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireValue};

use crate::{Config, Error, ValidationFlags};

/// The engine as seen by a [`TypeConverter`](crate::TypeConverter).
///
/// Converters hand nested values back through the helper, which selects
/// the converter for them and keeps the property trace.
pub trait SerializationHelper {
    /// Whether the current call targets the JSON projection.
    fn is_json_mode(&self) -> bool;

    fn config(&self) -> &Config;

    /// Reads an option by its camelCase name, see [`Config::option`].
    fn config_option(&self, name: &str) -> Option<WireValue> {
        self.config().option(name)
    }

    /// The validation flags in effect at the current position.
    ///
    /// Property checks are dropped below the outermost objects unless deep
    /// validation is requested.
    fn validation_flags(&self) -> ValidationFlags;

    /// The tag written for `ty` in place of the converter's own tag.
    fn type_tag(&self, ty: TypeId) -> Option<Tag>;

    /// Types associated with `tag`, in registration order.
    fn types_for_tag(&self, tag: Tag) -> &[TypeId];

    fn registry(&self) -> &TypeRegistry;

    /// Short name of `ty` for messages.
    fn type_name(&self, ty: TypeId) -> &str {
        self.registry().type_name(ty).unwrap_or("<unregistered>")
    }

    /// Converts a nested value of declared type `ty`.
    ///
    /// `trace_hint` names the value in the property trace, like a field
    /// name or `"[3]"`.
    fn serialize_subtype(
        &self,
        ty: TypeId,
        value: &dyn Reflect,
        trace_hint: &str,
    ) -> Result<WireValue, Error>;

    /// Builds a nested value of declared type `ty`.
    ///
    /// `owner` is passed on to weak pointers further down.
    fn deserialize_subtype(
        &self,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
        trace_hint: &str,
    ) -> Result<Box<dyn Reflect>, Error>;
}
