//! Descriptions of the shape of registered types.
//!
//! - [`Type`]: identity of a type: its [`TypeId`], full path and short name.
//! - [`TypeInfo`]: what the engine knows about the structure of a type.
//! - [`BaseKind`]: the coarse family a type belongs to.
//! - [`ObjectInfo`]: fields, constructor and inheritance of record types.
//! - [`EnumInfo`]: named values of enums and flag sets.

// -----------------------------------------------------------------------------
// Modules

mod enum_info;
mod object_info;

// -----------------------------------------------------------------------------
// Exports

pub use enum_info::EnumInfo;
pub use object_info::{BaseLink, FieldInfo, ObjectBuilder, ObjectInfo};

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::TypeId;
use core::fmt;

use crate::extract::{Extractor, ExtractorKind};

// -----------------------------------------------------------------------------
// Type

/// Identity of a registered type.
#[derive(Clone)]
pub struct Type {
    id: TypeId,
    path: &'static str,
    name: Cow<'static, str>,
}

impl Type {
    /// Describes `T`, deriving the short name from its type path.
    ///
    /// ```
    /// use wc_reflect::info::Type;
    ///
    /// let ty = Type::of::<Vec<Option<String>>>();
    /// assert_eq!(ty.name(), "Vec<Option<String>>");
    /// assert_eq!(ty.path(), "alloc::vec::Vec<core::option::Option<alloc::string::String>>");
    /// ```
    pub fn of<T: ?Sized + 'static>() -> Self {
        let path = core::any::type_name::<T>();
        Self {
            id: TypeId::of::<T>(),
            path,
            name: Cow::Owned(short_name(path)),
        }
    }

    /// Describes `T` under an explicit short name.
    pub fn named<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: core::any::type_name::<T>(),
            name: Cow::Borrowed(name),
        }
    }

    /// The same type under another short name.
    pub fn with_name(self, name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            ..self
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn path(&self) -> &'static str {
        self.path
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

/// Strips module paths from every segment of a type path.
fn short_name(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut segment_start = 0;
    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                out.truncate(segment_start);
            }
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&' | '*' => {
                out.push(c);
                segment_start = out.len();
            }
            _ => out.push(c),
        }
    }
    out
}

// -----------------------------------------------------------------------------
// TypeInfo

/// Structural description of a registered type.
#[derive(Clone)]
pub enum TypeInfo {
    /// A leaf value handled by a dedicated converter.
    Opaque,
    /// A record that may take part in a polymorphic hierarchy.
    Object(Arc<ObjectInfo>),
    /// A plain record without polymorphism.
    Gadget(Arc<ObjectInfo>),
    /// An enum or flag set with named values.
    Enum(Arc<EnumInfo>),
    /// A generic wrapper or container decomposed by an [`Extractor`].
    Container(Arc<dyn Extractor>),
}

impl TypeInfo {
    pub fn base_kind(&self) -> BaseKind {
        match self {
            TypeInfo::Opaque => BaseKind::Scalar,
            TypeInfo::Object(_) => BaseKind::Object,
            TypeInfo::Gadget(_) => BaseKind::Gadget,
            TypeInfo::Enum(info) if info.is_flags() => BaseKind::Flags,
            TypeInfo::Enum(_) => BaseKind::Enum,
            TypeInfo::Container(extractor) => BaseKind::from(extractor.kind()),
        }
    }

    /// Returns the record description of objects and gadgets.
    pub fn as_object(&self) -> Option<&ObjectInfo> {
        match self {
            TypeInfo::Object(info) | TypeInfo::Gadget(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumInfo> {
        match self {
            TypeInfo::Enum(info) => Some(info),
            _ => None,
        }
    }

    pub fn extractor(&self) -> Option<&Arc<dyn Extractor>> {
        match self {
            TypeInfo::Container(extractor) => Some(extractor),
            _ => None,
        }
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.base_kind(), f)
    }
}

// -----------------------------------------------------------------------------
// BaseKind

/// The coarse family of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseKind {
    Scalar,
    Object,
    Gadget,
    Enum,
    Flags,
    Pointer,
    WeakPointer,
    Optional,
    Variant,
    Pair,
    Tuple,
    List,
    Set,
    Map,
    MultiMap,
}

impl From<ExtractorKind> for BaseKind {
    fn from(kind: ExtractorKind) -> Self {
        match kind {
            ExtractorKind::Pointer => BaseKind::Pointer,
            ExtractorKind::WeakPointer => BaseKind::WeakPointer,
            ExtractorKind::Optional => BaseKind::Optional,
            ExtractorKind::Variant => BaseKind::Variant,
            ExtractorKind::Pair => BaseKind::Pair,
            ExtractorKind::Tuple => BaseKind::Tuple,
            ExtractorKind::List => BaseKind::List,
            ExtractorKind::Set => BaseKind::Set,
            ExtractorKind::Map => BaseKind::Map,
            ExtractorKind::MultiMap => BaseKind::MultiMap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::short_name;

    #[test]
    fn short_names() {
        assert_eq!(short_name("i32"), "i32");
        assert_eq!(short_name("alloc::string::String"), "String");
        assert_eq!(
            short_name("std::collections::hash::map::HashMap<alloc::string::String, i32>"),
            "HashMap<String, i32>"
        );
        assert_eq!(
            short_name("alloc::boxed::Box<dyn my_crate::shapes::Shape>"),
            "Box<dyn Shape>"
        );
        assert_eq!(short_name("(u8, &str)"), "(u8, &str)");
    }
}
