use core::any::TypeId;

use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireValue};

use crate::converter::expect_value;
use crate::{Error, SerializationHelper, TypeConverter, ValidationFlags};

/// Converts `bool`, the integer and float primitives, `char`, `String`
/// and `()`.
///
/// Unless strict validation is requested, numbers, numeric strings and
/// booleans convert into each other where the value fits.
pub struct ScalarConverter;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scalar {
    Unit,
    Bool,
    Int,
    Float,
    Char,
    String,
}

macro_rules! dispatch {
    ($ty:expr; $($scalar:ident => [$($t:ty),+]),+ $(,)?) => {{
        let ty = $ty;
        $($(if ty == TypeId::of::<$t>() { return Some(Scalar::$scalar); })+)+
        None
    }};
}

fn classify(ty: TypeId) -> Option<Scalar> {
    dispatch!(ty;
        Unit => [()],
        Bool => [bool],
        Int => [i8, i16, i32, i64, isize, u8, u16, u32, u64, usize],
        Float => [f32, f64],
        Char => [char],
        String => [String],
    )
}

impl Scalar {
    /// The only kinds accepted under strict validation.
    fn strict_kinds(self) -> &'static [WireKind] {
        match self {
            Scalar::Unit => &[WireKind::Null],
            Scalar::Bool => &[WireKind::Bool],
            Scalar::Int => &[WireKind::Integer],
            Scalar::Float => &[WireKind::Float, WireKind::Integer],
            Scalar::Char | Scalar::String => &[WireKind::String],
        }
    }
}

// -----------------------------------------------------------------------------
// Reading

fn to_i64(value: &WireValue) -> Option<i64> {
    match value {
        WireValue::Integer(v) => Some(*v),
        WireValue::Float(v) if v.fract() == 0.0 && v.abs() < 9.2e18 => Some(*v as i64),
        WireValue::Bool(v) => Some(i64::from(*v)),
        WireValue::String(v) => v.trim().parse().ok(),
        _ => None,
    }
}

fn to_f64(value: &WireValue) -> Option<f64> {
    match value {
        WireValue::Integer(v) => Some(*v as f64),
        WireValue::Float(v) => Some(*v),
        WireValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
        WireValue::String(v) => v.trim().parse().ok(),
        _ => None,
    }
}

fn to_bool(value: &WireValue) -> Option<bool> {
    match value {
        WireValue::Bool(v) => Some(*v),
        WireValue::Integer(v) => Some(*v != 0),
        WireValue::Float(v) => Some(*v != 0.0),
        WireValue::String(v) => match v.trim() {
            s if s.eq_ignore_ascii_case("true") => Some(true),
            s if s.eq_ignore_ascii_case("false") => Some(false),
            s => s.parse::<i64>().ok().map(|v| v != 0),
        },
        _ => None,
    }
}

fn to_string(value: &WireValue) -> Option<String> {
    match value {
        WireValue::String(v) => Some(v.clone()),
        WireValue::Integer(v) => Some(v.to_string()),
        WireValue::Float(v) => Some(v.to_string()),
        WireValue::Bool(v) => Some(v.to_string()),
        _ => None,
    }
}

fn to_char(value: &WireValue) -> Option<char> {
    match value {
        WireValue::String(v) => {
            let mut chars = v.chars();
            let c = chars.next()?;
            chars.next().is_none().then_some(c)
        }
        WireValue::Integer(v) => u32::try_from(*v).ok().and_then(char::from_u32),
        _ => None,
    }
}

macro_rules! read_int {
    ($ty:expr, $value:expr; $($t:ty),+) => {{
        let ty = $ty;
        let value: i64 = $value;
        $(
            if ty == TypeId::of::<$t>() {
                return <$t>::try_from(value)
                    .map(|v| Box::new(v) as Box<dyn Reflect>)
                    .map_err(|_| {
                        Error::deserialization(format!(
                            "Value {value} is out of range for type {}",
                            stringify!($t)
                        ))
                    });
            }
        )+
    }};
}

fn build_int(ty: TypeId, value: i64) -> Result<Box<dyn Reflect>, Error> {
    read_int!(ty, value; i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
    Err(Error::deserialization("Unknown integer type"))
}

// -----------------------------------------------------------------------------
// Writing

macro_rules! write_int {
    ($value:expr; $($t:ty),+) => {{
        let value: &dyn Reflect = $value;
        $(
            if let Some(v) = value.downcast_ref::<$t>() {
                return i64::try_from(*v).map(WireValue::Integer).map_err(|_| {
                    Error::serialization(format!(
                        "Value {v} of type {} does not fit into a 64 bit integer",
                        stringify!($t)
                    ))
                });
            }
        )+
    }};
}

fn write(scalar: Scalar, value: &dyn Reflect) -> Result<WireValue, Error> {
    match scalar {
        Scalar::Unit => Ok(WireValue::Null),
        Scalar::Bool => Ok(WireValue::Bool(*expect_value::<bool>(value)?)),
        Scalar::Int => {
            write_int!(value; i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
            Err(Error::serialization("Unknown integer type"))
        }
        Scalar::Float => match value.downcast_ref::<f32>() {
            Some(v) => Ok(WireValue::Float(f64::from(*v))),
            None => Ok(WireValue::Float(*expect_value::<f64>(value)?)),
        },
        Scalar::Char => Ok(WireValue::String(expect_value::<char>(value)?.to_string())),
        Scalar::String => Ok(WireValue::String(expect_value::<String>(value)?.clone())),
    }
}

// -----------------------------------------------------------------------------
// Converter

impl ScalarConverter {
    fn read(
        &self,
        ty: TypeId,
        value: &WireValue,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        let scalar = classify(ty)
            .ok_or_else(|| Error::deserialization(format!("{} is not a scalar", helper.type_name(ty))))?;
        let inner = value.untagged();

        let strict = helper
            .validation_flags()
            .contains(ValidationFlags::STRICT_BASIC_TYPES);
        if strict && !scalar.strict_kinds().contains(&inner.kind()) {
            return Err(Error::deserialization(format!(
                "Failed to deserialze {}-value to type {} because the given {}-value failed strict validation",
                if helper.is_json_mode() { "JSON" } else { "CBOR" },
                helper.type_name(ty),
                if helper.is_json_mode() { "JSON" } else { "CBOR" },
            )));
        }

        let failed = || {
            Error::deserialization(format!(
                "Cannot convert a {} value to type {}",
                inner.kind(),
                helper.type_name(ty)
            ))
        };
        match scalar {
            Scalar::Unit if inner.is_null() => Ok(Box::new(())),
            Scalar::Unit => Err(failed()),
            Scalar::Bool => Ok(Box::new(to_bool(inner).ok_or_else(failed)?)),
            Scalar::Int => build_int(ty, to_i64(inner).ok_or_else(failed)?),
            Scalar::Float => {
                let v = to_f64(inner).ok_or_else(failed)?;
                if ty == TypeId::of::<f32>() {
                    Ok(Box::new(v as f32))
                } else {
                    Ok(Box::new(v))
                }
            }
            Scalar::Char => Ok(Box::new(to_char(inner).ok_or_else(failed)?)),
            Scalar::String => Ok(Box::new(to_string(inner).ok_or_else(failed)?)),
        }
    }
}

impl TypeConverter for ScalarConverter {
    fn name(&self) -> &'static str {
        "ScalarConverter"
    }

    fn can_convert(&self, ty: TypeId, _helper: &dyn SerializationHelper) -> bool {
        classify(ty).is_some()
    }

    fn allowed_kinds(
        &self,
        ty: TypeId,
        _tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        match classify(ty) {
            Some(Scalar::Unit) => vec![WireKind::Null],
            Some(_) => vec![
                WireKind::Bool,
                WireKind::Integer,
                WireKind::Float,
                WireKind::String,
            ],
            None => Vec::new(),
        }
    }

    fn guess_type(
        &self,
        tag: Option<Tag>,
        kind: WireKind,
        _helper: &dyn SerializationHelper,
    ) -> Option<TypeId> {
        if tag.is_some() {
            return None;
        }
        match kind {
            WireKind::Null => Some(TypeId::of::<()>()),
            WireKind::Bool => Some(TypeId::of::<bool>()),
            WireKind::Integer => Some(TypeId::of::<i64>()),
            WireKind::Float => Some(TypeId::of::<f64>()),
            WireKind::String => Some(TypeId::of::<String>()),
            _ => None,
        }
    }

    fn serialize(
        &self,
        ty: TypeId,
        value: &dyn Reflect,
        helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error> {
        let scalar = classify(ty)
            .ok_or_else(|| Error::serialization(format!("{} is not a scalar", helper.type_name(ty))))?;
        write(scalar, value)
    }

    fn deserialize_cbor(
        &self,
        ty: TypeId,
        value: &WireValue,
        _owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        self.read(ty, value, helper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serializer;

    #[test]
    fn lenient_conversions() {
        let serializer = serializer().build();
        assert_eq!(serializer.deserialize::<i32>(&WireValue::Float(4.0)).unwrap(), 4);
        assert_eq!(serializer.deserialize::<u8>(&WireValue::from(" 42 ")).unwrap(), 42);
        assert!(serializer.deserialize::<bool>(&WireValue::from("TRUE")).unwrap());
        assert_eq!(serializer.deserialize::<f32>(&WireValue::Integer(2)).unwrap(), 2.0);
        assert_eq!(serializer.deserialize::<String>(&WireValue::Integer(7)).unwrap(), "7");
        assert_eq!(serializer.deserialize::<char>(&WireValue::from("x")).unwrap(), 'x');
    }

    #[test]
    fn out_of_range() {
        let serializer = serializer().build();
        let err = serializer.deserialize::<u8>(&WireValue::Integer(300)).unwrap_err();
        assert_eq!(err.message(), "Value 300 is out of range for type u8");

        let err = serializer.serialize(&u64::MAX).unwrap_err();
        assert!(err.is_serialization());
    }

    #[test]
    fn strict_rejects_other_kinds() {
        let serializer = serializer()
            .validation_flags(ValidationFlags::STRICT_BASIC_TYPES)
            .build();
        let err = serializer.deserialize::<i32>(&WireValue::Float(4.0)).unwrap_err();
        assert_eq!(
            err.message(),
            "Failed to deserialze CBOR-value to type i32 because the given CBOR-value failed strict validation"
        );
        assert_eq!(serializer.deserialize::<f64>(&WireValue::Integer(4)).unwrap(), 4.0);

        let err = serializer.from_json_str::<String>("12").unwrap_err();
        assert!(err.message().contains("JSON-value"));
    }

    #[test]
    fn erased_values_are_guessed() {
        let serializer = serializer().build();
        let value: crate::Dynamic = serializer.deserialize(&WireValue::Integer(5)).unwrap();
        assert_eq!(value.downcast_ref::<i64>(), Some(&5));
        let value: crate::Dynamic = serializer.deserialize(&WireValue::from("s")).unwrap();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("s"));
    }
}
