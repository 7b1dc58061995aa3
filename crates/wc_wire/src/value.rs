use core::fmt;

use crate::{Tag, WireMap};

// -----------------------------------------------------------------------------
// WireKind

/// The structural kind of a [`WireValue`], ignoring any tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireKind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Bytes,
    Array,
    Map,
    /// A tag wrapping another tag.
    Tagged,
}

impl WireKind {
    /// Human readable name, used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            WireKind::Null => "null",
            WireKind::Bool => "bool",
            WireKind::Integer => "integer",
            WireKind::Float => "float",
            WireKind::String => "string",
            WireKind::Bytes => "bytes",
            WireKind::Array => "array",
            WireKind::Map => "map",
            WireKind::Tagged => "tagged",
        }
    }
}

impl fmt::Display for WireKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// -----------------------------------------------------------------------------
// WireValue

/// A node of the tagged wire tree.
///
/// Values are created fresh by every conversion and are never mutated by
/// the engine after being returned.
///
/// # Examples
///
/// ```
/// use wc_wire::{Tag, WireKind, WireValue};
///
/// let value = WireValue::tagged(Tag::GEOM_SIZE, WireValue::from(vec![
///     WireValue::from(4),
///     WireValue::from(2),
/// ]));
///
/// assert_eq!(value.tag(), Some(Tag::GEOM_SIZE));
/// assert_eq!(value.untagged().kind(), WireKind::Array);
/// assert_eq!(value.to_string(), "10110([4, 2])");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WireValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<WireValue>),
    Map(WireMap),
    Tagged(Tag, Box<WireValue>),
}

impl WireValue {
    /// Wraps `inner` into a tagged value.
    #[inline]
    pub fn tagged(tag: Tag, inner: impl Into<WireValue>) -> Self {
        WireValue::Tagged(tag, Box::new(inner.into()))
    }

    /// Returns the structural kind of this node.
    pub const fn kind(&self) -> WireKind {
        match self {
            WireValue::Null => WireKind::Null,
            WireValue::Bool(_) => WireKind::Bool,
            WireValue::Integer(_) => WireKind::Integer,
            WireValue::Float(_) => WireKind::Float,
            WireValue::String(_) => WireKind::String,
            WireValue::Bytes(_) => WireKind::Bytes,
            WireValue::Array(_) => WireKind::Array,
            WireValue::Map(_) => WireKind::Map,
            WireValue::Tagged(..) => WireKind::Tagged,
        }
    }

    /// Returns the outermost tag, if any.
    #[inline]
    pub const fn tag(&self) -> Option<Tag> {
        match self {
            WireValue::Tagged(tag, _) => Some(*tag),
            _ => None,
        }
    }

    /// Strips the outermost tag, if any.
    #[inline]
    pub fn untagged(&self) -> &WireValue {
        match self {
            WireValue::Tagged(_, inner) => inner,
            other => other,
        }
    }

    /// Consumes the value and strips the outermost tag, if any.
    pub fn into_untagged(self) -> WireValue {
        match self {
            WireValue::Tagged(_, inner) => *inner,
            other => other,
        }
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, WireValue::Null)
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            WireValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            WireValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a float, widening integers.
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            WireValue::Float(v) => Some(*v),
            WireValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            WireValue::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[WireValue]> {
        match self {
            WireValue::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&WireMap> {
        match self {
            WireValue::Map(v) => Some(v),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Conversions

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {$(
        impl From<$ty> for WireValue {
            #[inline]
            fn from(value: $ty) -> Self {
                WireValue::Integer(i64::from(value))
            }
        }
    )*};
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for WireValue {
    #[inline]
    fn from(value: bool) -> Self {
        WireValue::Bool(value)
    }
}

impl From<f64> for WireValue {
    #[inline]
    fn from(value: f64) -> Self {
        WireValue::Float(value)
    }
}

impl From<&str> for WireValue {
    #[inline]
    fn from(value: &str) -> Self {
        WireValue::String(value.to_owned())
    }
}

impl From<String> for WireValue {
    #[inline]
    fn from(value: String) -> Self {
        WireValue::String(value)
    }
}

impl From<Vec<WireValue>> for WireValue {
    #[inline]
    fn from(value: Vec<WireValue>) -> Self {
        WireValue::Array(value)
    }
}

impl From<WireMap> for WireValue {
    #[inline]
    fn from(value: WireMap) -> Self {
        WireValue::Map(value)
    }
}

impl FromIterator<WireValue> for WireValue {
    fn from_iter<I: IntoIterator<Item = WireValue>>(iter: I) -> Self {
        WireValue::Array(iter.into_iter().collect())
    }
}

// -----------------------------------------------------------------------------
// Display

/// Diagnostic notation, close to RFC 8949 section 8.
impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireValue::Null => f.write_str("null"),
            WireValue::Bool(v) => write!(f, "{v}"),
            WireValue::Integer(v) => write!(f, "{v}"),
            WireValue::Float(v) => write!(f, "{v:?}"),
            WireValue::String(v) => write!(f, "{v:?}"),
            WireValue::Bytes(v) => {
                f.write_str("h'")?;
                for byte in v {
                    write!(f, "{byte:02x}")?;
                }
                f.write_str("'")
            }
            WireValue::Array(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            WireValue::Map(map) => {
                f.write_str("{")?;
                for (idx, (key, value)) in map.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            WireValue::Tagged(tag, inner) => write!(f, "{tag}({inner})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_strips_one_level() {
        let inner = WireValue::tagged(Tag::SET, WireValue::Array(vec![]));
        let outer = WireValue::tagged(Tag::HOMOGENEOUS, inner.clone());

        assert_eq!(outer.tag(), Some(Tag::HOMOGENEOUS));
        assert_eq!(outer.untagged(), &inner);
        assert_eq!(outer.untagged().kind(), WireKind::Tagged);
        assert_eq!(inner.untagged().kind(), WireKind::Array);
    }

    #[test]
    fn float_accessor_widens_integers() {
        assert_eq!(WireValue::from(3).as_f64(), Some(3.0));
        assert_eq!(WireValue::from(2.5).as_f64(), Some(2.5));
        assert_eq!(WireValue::from(2.5).as_integer(), None);
    }

    #[test]
    fn diagnostic_notation() {
        let mut map = WireMap::new();
        map.insert("key", 1);
        let value: WireValue = vec![
            WireValue::Bytes(vec![0xde, 0xad]),
            WireValue::from(map),
            WireValue::tagged(Tag::UNIX_TIME, 5),
        ]
        .into();

        assert_eq!(value.to_string(), r#"[h'dead', {"key": 1}, 1(5)]"#);
    }
}
