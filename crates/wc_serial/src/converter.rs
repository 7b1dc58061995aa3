use core::any::TypeId;

use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireValue};

use crate::{Error, SerializationHelper, ValidationFlags};

// -----------------------------------------------------------------------------
// Priority

/// Ordering of converters; higher values are asked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i32);

impl Priority {
    pub const EXTREMELY_LOW: Priority = Priority(-0x00FF_FFFF);
    pub const VERY_LOW: Priority = Priority(-0xFFFF);
    pub const LOW: Priority = Priority(-0xFF);
    pub const STANDARD: Priority = Priority(0);
    pub const HIGH: Priority = Priority(0xFF);
    pub const VERY_HIGH: Priority = Priority(0xFFFF);
    pub const EXTREMELY_HIGH: Priority = Priority(0x00FF_FFFF);
}

impl Default for Priority {
    #[inline]
    fn default() -> Self {
        Priority::STANDARD
    }
}

// -----------------------------------------------------------------------------
// Capability

/// How well a converter fits a value to be deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Cannot handle it.
    Negative,
    /// Handles the type, but not the tag of the value.
    WrongTag,
    /// The type is unknown, but the value looks like the given type.
    Guessed(TypeId),
    /// Handles the type, tag and kind.
    Positive,
}

/// Every structural kind, for converters that accept any shape.
pub const ANY_KIND: &[WireKind] = &[
    WireKind::Null,
    WireKind::Bool,
    WireKind::Integer,
    WireKind::Float,
    WireKind::String,
    WireKind::Bytes,
    WireKind::Array,
    WireKind::Map,
    WireKind::Tagged,
];

// -----------------------------------------------------------------------------
// TypeConverter

/// Converts the values of one family of types.
///
/// Converters are registered once into a
/// [`ConverterRegistry`](crate::ConverterRegistry) and asked, by descending
/// [`priority`](Self::priority), whether they handle a type. Nested values
/// are passed back through the [`SerializationHelper`].
///
/// # Examples
///
/// A converter writing a `u8` newtype as a single character string:
///
/// ```
/// use core::any::TypeId;
/// use wc_reflect::{Owner, Reflect};
/// use wc_serial::{Error, SerializationHelper, Serializer, TypeConverter};
/// use wc_wire::{WireKind, WireValue};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Grade(u8);
///
/// struct GradeConverter;
///
/// impl TypeConverter for GradeConverter {
///     fn name(&self) -> &'static str {
///         "GradeConverter"
///     }
///
///     fn can_convert(&self, ty: TypeId, _: &dyn SerializationHelper) -> bool {
///         ty == TypeId::of::<Grade>()
///     }
///
///     fn allowed_kinds(&self, _: TypeId, _: Option<wc_wire::Tag>, _: &dyn SerializationHelper) -> Vec<WireKind> {
///         vec![WireKind::String]
///     }
///
///     fn serialize(&self, _: TypeId, value: &dyn Reflect, _: &dyn SerializationHelper) -> Result<WireValue, Error> {
///         let grade = value.downcast_ref::<Grade>().ok_or_else(|| Error::serialization("not a grade"))?;
///         Ok(WireValue::from(char::from(b'A' + grade.0).to_string()))
///     }
///
///     fn deserialize_cbor(
///         &self,
///         _: TypeId,
///         value: &WireValue,
///         _: Option<&Owner>,
///         _: &dyn SerializationHelper,
///     ) -> Result<Box<dyn Reflect>, Error> {
///         match value.as_str().map(str::as_bytes) {
///             Some([c @ b'A'..=b'F']) => Ok(Box::new(Grade(c - b'A'))),
///             _ => Err(Error::deserialization("invalid grade")),
///         }
///     }
/// }
///
/// let serializer = Serializer::builder()
///     .opaque::<Grade>()
///     .converter(GradeConverter)
///     .build();
///
/// let wire = serializer.serialize(&Grade(1)).unwrap();
/// assert_eq!(wire, WireValue::from("B"));
/// assert_eq!(serializer.deserialize::<Grade>(&wire).unwrap(), Grade(1));
/// ```
pub trait TypeConverter: Send + Sync + 'static {
    /// Name used in log messages.
    fn name(&self) -> &'static str;

    /// Default priority, used unless overridden at registration.
    fn priority(&self) -> Priority {
        Priority::STANDARD
    }

    /// Whether values of `ty` are handled by this converter.
    fn can_convert(&self, ty: TypeId, helper: &dyn SerializationHelper) -> bool;

    /// Tags accepted when deserializing `ty`; `None` stands for untagged.
    ///
    /// An empty list accepts any tag.
    fn allowed_tags(&self, _ty: TypeId, _helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
        Vec::new()
    }

    /// Kinds accepted when deserializing `ty` from a value tagged `tag`.
    fn allowed_kinds(
        &self,
        ty: TypeId,
        tag: Option<Tag>,
        helper: &dyn SerializationHelper,
    ) -> Vec<WireKind>;

    /// The type a value of unknown type most likely has.
    fn guess_type(
        &self,
        _tag: Option<Tag>,
        _kind: WireKind,
        _helper: &dyn SerializationHelper,
    ) -> Option<TypeId> {
        None
    }

    /// Rates how well this converter fits a value.
    ///
    /// `ty` is `None` when the declared type is erased. Tags are only
    /// checked on the full wire model or under
    /// [`STRICT_BASIC_TYPES`](ValidationFlags::STRICT_BASIC_TYPES), as JSON
    /// carries none. JSON also blurs integers and floats, and carries byte
    /// arrays as strings.
    fn can_deserialize(
        &self,
        ty: Option<TypeId>,
        tag: Option<Tag>,
        kind: WireKind,
        helper: &dyn SerializationHelper,
    ) -> Capability {
        let Some(ty) = ty else {
            return match self.guess_type(tag, kind, helper) {
                Some(guess) => Capability::Guessed(guess),
                None => Capability::Negative,
            };
        };
        if !self.can_convert(ty, helper) {
            return Capability::Negative;
        }

        let json = helper.is_json_mode();
        let strict = helper
            .validation_flags()
            .contains(ValidationFlags::STRICT_BASIC_TYPES);
        let overridden = tag.is_some() && tag == helper.type_tag(ty);
        if (!json || strict) && !overridden {
            let tags = self.allowed_tags(ty, helper);
            if !tags.is_empty() && !tags.contains(&tag) {
                return Capability::WrongTag;
            }
        }

        let accepted = self.allowed_kinds(ty, tag, helper).into_iter().any(|allowed| {
            allowed == kind
                || json
                    && matches!(
                        (allowed, kind),
                        (WireKind::Float, WireKind::Integer)
                            | (WireKind::Integer, WireKind::Float)
                            | (WireKind::Bytes, WireKind::String)
                    )
        });
        if accepted {
            Capability::Positive
        } else {
            Capability::Negative
        }
    }

    /// Converts `value`, whose declared type is `ty`.
    ///
    /// The runtime type of `value` is `ty`, or a record deriving from it.
    fn serialize(
        &self,
        ty: TypeId,
        value: &dyn Reflect,
        helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error>;

    /// Builds a value of `ty` from the full wire model.
    fn deserialize_cbor(
        &self,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error>;

    /// Builds a value of `ty` from the JSON projection.
    fn deserialize_json(
        &self,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        self.deserialize_cbor(ty, value, owner, helper)
    }
}

// -----------------------------------------------------------------------------
// Helpers for converters

/// Downcasts a value handed to [`TypeConverter::serialize`].
pub(crate) fn expect_value<T: Reflect>(value: &dyn Reflect) -> Result<&T, Error> {
    value.downcast_ref::<T>().ok_or_else(|| {
        Error::serialization(format!(
            "Expected a value of type {}, but got {}",
            core::any::type_name::<T>(),
            value.reflect_type_path(),
        ))
    })
}

/// Downcasts a nested value returned by the helper.
pub(crate) fn take_value<T: Reflect>(value: Box<dyn Reflect>) -> Result<T, Error> {
    value.take::<T>().map_err(|value| {
        Error::deserialization(format!(
            "Expected a value of type {}, but got {}",
            core::any::type_name::<T>(),
            (*value).reflect_type_path(),
        ))
    })
}

/// The untagged array of `value`, or an error naming what was expected.
pub(crate) fn expect_array<'a>(value: &'a WireValue, what: &str) -> Result<&'a [WireValue], Error> {
    value.untagged().as_array().ok_or_else(|| {
        Error::deserialization(format!(
            "Expected an array for {what}, but got {}",
            value.untagged().kind()
        ))
    })
}

/// Describes an optional tag for messages.
pub(crate) fn describe_tag(tag: Option<Tag>) -> String {
    match tag {
        Some(tag) => tag.to_string(),
        None => "<none>".to_owned(),
    }
}
