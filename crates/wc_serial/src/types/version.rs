use core::fmt;
use core::str::FromStr;

use wc_reflect::registry::{GetTypeMeta, TypeMeta};

/// A dotted version number like `1.12.3`.
///
/// The empty version has no segments and is what an empty string parses
/// to. Text after the last numeric segment is not part of the version.
///
/// # Examples
///
/// ```
/// use wc_serial::types::VersionNumber;
///
/// let (version, suffix) = VersionNumber::parse_with_suffix("5.12.1-beta").unwrap();
/// assert_eq!(version.segments(), [5, 12, 1]);
/// assert_eq!(suffix, "-beta");
/// assert_eq!(version.to_string(), "5.12.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VersionNumber {
    segments: Vec<u32>,
}

/// Text that starts with no version segment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid version number, no segments found")]
pub struct VersionParseError;

impl VersionNumber {
    pub fn new(segments: impl Into<Vec<u32>>) -> Self {
        Self {
            segments: segments.into(),
        }
    }

    #[inline]
    pub fn segments(&self) -> &[u32] {
        &self.segments
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn major(&self) -> u32 {
        self.segments.first().copied().unwrap_or(0)
    }

    pub fn minor(&self) -> u32 {
        self.segments.get(1).copied().unwrap_or(0)
    }

    pub fn micro(&self) -> u32 {
        self.segments.get(2).copied().unwrap_or(0)
    }

    /// Parses the leading segments of `s` and returns the rest.
    pub fn parse_with_suffix(s: &str) -> Result<(Self, &str), VersionParseError> {
        let mut segments = Vec::new();
        let mut rest = s;
        loop {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            let Ok(segment) = rest[..digits].parse::<u32>() else {
                break;
            };
            segments.push(segment);
            rest = &rest[digits..];
            match rest.strip_prefix('.') {
                Some(next) if next.starts_with(|c: char| c.is_ascii_digit()) => rest = next,
                _ => break,
            }
        }
        if segments.is_empty() {
            return Err(VersionParseError);
        }
        Ok((Self { segments }, rest))
    }
}

impl FromStr for VersionNumber {
    type Err = VersionParseError;

    /// Parses a complete version; the empty string is the null version.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::default());
        }
        match Self::parse_with_suffix(s)? {
            (version, "") => Ok(version),
            _ => Err(VersionParseError),
        }
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                f.write_str(".")?;
            }
            first = false;
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl GetTypeMeta for VersionNumber {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::opaque::<Self>().with_default::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_complete() {
        let version: VersionNumber = "1.2.3".parse().unwrap();
        assert_eq!((version.major(), version.minor(), version.micro()), (1, 2, 3));
        assert!("".parse::<VersionNumber>().unwrap().is_null());
        assert_eq!("1.2.x".parse::<VersionNumber>(), Err(VersionParseError));
        assert_eq!("beta".parse::<VersionNumber>(), Err(VersionParseError));
    }

    #[test]
    fn suffix_stops_at_non_digits() {
        let (version, rest) = VersionNumber::parse_with_suffix("4.0.").unwrap();
        assert_eq!(version, VersionNumber::new([4, 0]));
        assert_eq!(rest, ".");
    }

    #[test]
    fn ordering() {
        assert!(VersionNumber::new([1, 10]) > VersionNumber::new([1, 9, 9]));
    }
}
