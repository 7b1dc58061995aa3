use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::Reflect;

/// Named integer values of an enum or a flag set.
///
/// For flag sets the keys are single bits (or named combinations), and a
/// value is any bitwise union of them.
///
/// # Examples
///
/// ```
/// use wc_reflect::info::EnumInfo;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Level { Low = 0, High = 5 }
///
/// let info = EnumInfo::new::<Level>(
///     "Level",
///     &[("Low", 0), ("High", 5)],
///     |v| *v as i64,
///     |i| match i { 0 => Some(Level::Low), 5 => Some(Level::High), _ => None },
/// );
///
/// assert_eq!(info.value_of("High"), Some(5));
/// assert_eq!(info.key_of(0), Some("Low"));
/// assert!(info.from_integer(3).is_none());
/// ```
pub struct EnumInfo {
    name: &'static str,
    flags: bool,
    keys: Vec<(&'static str, i64)>,
    to_int: Box<dyn Fn(&dyn Reflect) -> Option<i64> + Send + Sync>,
    from_int: Box<dyn Fn(i64) -> Option<Box<dyn Reflect>> + Send + Sync>,
}

impl EnumInfo {
    /// Describes a plain enum.
    pub fn new<T: Reflect>(
        name: &'static str,
        keys: &[(&'static str, i64)],
        to_int: fn(&T) -> i64,
        from_int: fn(i64) -> Option<T>,
    ) -> Self {
        Self::build(name, false, keys, to_int, from_int)
    }

    /// Describes a flag set; `from_bits` must accept every union of keys.
    pub fn flags<T: Reflect>(
        name: &'static str,
        keys: &[(&'static str, i64)],
        to_bits: fn(&T) -> i64,
        from_bits: fn(i64) -> Option<T>,
    ) -> Self {
        Self::build(name, true, keys, to_bits, from_bits)
    }

    fn build<T: Reflect>(
        name: &'static str,
        flags: bool,
        keys: &[(&'static str, i64)],
        to_int: fn(&T) -> i64,
        from_int: fn(i64) -> Option<T>,
    ) -> Self {
        Self {
            name,
            flags,
            keys: keys.to_vec(),
            to_int: Box::new(move |v: &dyn Reflect| v.downcast_ref::<T>().map(to_int)),
            from_int: Box::new(move |i: i64| {
                from_int(i).map(|v| Box::new(v) as Box<dyn Reflect>)
            }),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn is_flags(&self) -> bool {
        self.flags
    }

    /// Declared keys in declaration order.
    #[inline]
    pub fn keys(&self) -> &[(&'static str, i64)] {
        &self.keys
    }

    pub fn value_of(&self, key: &str) -> Option<i64> {
        self.keys.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    pub fn key_of(&self, value: i64) -> Option<&'static str> {
        self.keys.iter().find(|(_, v)| *v == value).map(|(k, _)| *k)
    }

    /// Reads the integer value of `value`, which must be the described type.
    pub fn to_integer(&self, value: &dyn Reflect) -> Option<i64> {
        (self.to_int)(value)
    }

    /// Builds a value from its integer, `None` if it is not a valid value.
    pub fn from_integer(&self, value: i64) -> Option<Box<dyn Reflect>> {
        (self.from_int)(value)
    }
}

impl core::fmt::Debug for EnumInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EnumInfo")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("keys", &self.keys)
            .finish()
    }
}
