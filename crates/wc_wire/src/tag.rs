use core::fmt;

/// A semantic tag attached to a [`WireValue`](crate::WireValue).
///
/// Tags are the compatibility contract of the binary format: once assigned,
/// a number keeps its meaning forever.
///
/// The associated constants cover the standard CBOR tags used by the
/// converters, the extended set registered with IANA, and the private range
/// starting at `10000` that `wirecast` reserves for its own value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub u64);

impl Tag {
    // Standard tags (RFC 8949)

    pub const DATE_TIME_STRING: Tag = Tag(0);
    pub const UNIX_TIME: Tag = Tag(1);
    pub const EXPECTED_BASE64URL: Tag = Tag(21);
    pub const EXPECTED_BASE64: Tag = Tag(22);
    pub const EXPECTED_BASE16: Tag = Tag(23);
    pub const REGULAR_EXPRESSION: Tag = Tag(35);

    // Extended tags

    pub const GENERIC_OBJECT: Tag = Tag(27);
    pub const HOMOGENEOUS: Tag = Tag(41);
    pub const SET: Tag = Tag(258);
    pub const EXPLICIT_MAP: Tag = Tag(259);

    // Private tags

    pub const ENUM: Tag = Tag(10002);
    pub const FLAGS: Tag = Tag(10003);
    pub const CONSTRUCTED_OBJECT: Tag = Tag(10004);
    pub const PAIR: Tag = Tag(10005);
    pub const MULTI_MAP: Tag = Tag(10006);
    pub const VERSION_NUMBER: Tag = Tag(10007);
    pub const TUPLE: Tag = Tag(10008);
    pub const BIT_ARRAY: Tag = Tag(10009);
    pub const DATE: Tag = Tag(10010);
    pub const TIME: Tag = Tag(10011);

    pub const LOCALE_ISO: Tag = Tag(10100);
    pub const LOCALE_BCP47: Tag = Tag(10101);

    pub const GEOM_SIZE: Tag = Tag(10110);
    pub const GEOM_POINT: Tag = Tag(10111);
    pub const GEOM_LINE: Tag = Tag(10112);
    pub const GEOM_RECT: Tag = Tag(10113);

    pub const CHRONO_NANOSECONDS: Tag = Tag(10120);
    pub const CHRONO_MICROSECONDS: Tag = Tag(10121);
    pub const CHRONO_MILLISECONDS: Tag = Tag(10122);
    pub const CHRONO_SECONDS: Tag = Tag(10123);
    pub const CHRONO_MINUTES: Tag = Tag(10124);
    pub const CHRONO_HOURS: Tag = Tag(10125);

    /// Returns the raw tag number.
    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for Tag {
    #[inline]
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
