use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::TypeId;
use core::ops::Deref;

use wc_utils::TypeIdMap;

use crate::Reflect;
use crate::extract::Extractor;
use crate::info::{BaseKind, EnumInfo, ObjectInfo, Type, TypeInfo};
use crate::registry::{FromType, TypeRegistry, TypeTrait, TypeTraitDefault};

// -----------------------------------------------------------------------------
// TypeMeta

/// Runtime metadata of one type, registered into the [`TypeRegistry`].
///
/// This includes the [`Type`] identity, a [`TypeInfo`] and a
/// [`TypeTrait`] table.
///
/// # Example
///
/// ```
/// use wc_reflect::registry::{TypeMeta, TypeTraitDefault};
///
/// let meta = TypeMeta::opaque::<String>().with_default::<String>();
///
/// let f = meta.get_trait::<TypeTraitDefault>().unwrap();
/// assert_eq!(f.default().take::<String>().unwrap(), "");
/// ```
pub struct TypeMeta {
    ty: Type,
    info: TypeInfo,
    trait_table: TypeIdMap<Box<dyn TypeTrait>>,
}

impl TypeMeta {
    fn with_info(ty: Type, info: TypeInfo) -> Self {
        Self {
            ty,
            info,
            trait_table: TypeIdMap::new(),
        }
    }

    /// A leaf type that only a dedicated converter understands.
    #[inline]
    pub fn opaque<T: Reflect>() -> Self {
        Self::with_info(Type::of::<T>(), TypeInfo::Opaque)
    }

    /// A record taking part in polymorphism, named after its class name.
    pub fn object<T: Reflect + Default>(info: ObjectInfo) -> Self {
        Self::with_info(
            Type::named::<T>(info.name()),
            TypeInfo::Object(Arc::new(info)),
        )
        .with_default::<T>()
    }

    /// A plain record, named after its class name.
    pub fn gadget<T: Reflect + Default>(info: ObjectInfo) -> Self {
        Self::with_info(
            Type::named::<T>(info.name()),
            TypeInfo::Gadget(Arc::new(info)),
        )
        .with_default::<T>()
    }

    pub fn enumeration<T: Reflect>(info: EnumInfo) -> Self {
        Self::with_info(Type::named::<T>(info.name()), TypeInfo::Enum(Arc::new(info)))
    }

    pub fn container<T: Reflect>(extractor: impl Extractor) -> Self {
        Self::with_info(Type::of::<T>(), TypeInfo::Container(Arc::new(extractor)))
    }

    /// Replaces the short name of the type.
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.ty = self.ty.with_name(name);
        self
    }

    /// Attaches [`TypeTraitDefault`] of `T`.
    #[inline]
    pub fn with_default<T: Reflect + Default>(self) -> Self {
        self.with_trait(<TypeTraitDefault as FromType<T>>::from_type())
    }

    #[inline]
    pub fn with_trait<T: TypeTrait>(mut self, data: T) -> Self {
        self.insert_trait(data);
        self
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.ty.id()
    }

    #[inline]
    pub fn type_path(&self) -> &'static str {
        self.ty.path()
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.ty.name()
    }

    #[inline]
    pub fn info(&self) -> &TypeInfo {
        &self.info
    }

    #[inline]
    pub fn base_kind(&self) -> BaseKind {
        self.info.base_kind()
    }

    /// Insert a new [`TypeTrait`], replacing one of the same type.
    #[inline]
    pub fn insert_trait<T: TypeTrait>(&mut self, data: T) {
        self.trait_table.insert(TypeId::of::<T>(), Box::new(data));
    }

    /// Get a [`TypeTrait`] reference, or return `None` if it doesn't exist.
    #[inline]
    pub fn get_trait<T: TypeTrait>(&self) -> Option<&T> {
        self.trait_table
            .get(&TypeId::of::<T>())
            .and_then(|data| <dyn TypeTrait>::downcast_ref(data.deref()))
    }

    #[inline]
    pub fn has_trait<T: TypeTrait>(&self) -> bool {
        self.trait_table.contains(&TypeId::of::<T>())
    }
}

impl Clone for TypeMeta {
    fn clone(&self) -> Self {
        let mut trait_table = TypeIdMap::with_capacity(self.trait_table.len());
        for (id, data) in self.trait_table.iter() {
            trait_table.insert(*id, (**data).clone_type_trait());
        }
        Self {
            ty: self.ty.clone(),
            info: self.info.clone(),
            trait_table,
        }
    }
}

impl core::fmt::Debug for TypeMeta {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeMeta")
            .field("ty", &self.ty)
            .field("info", &self.info)
            .field("traits", &self.trait_table.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// GetTypeMeta

/// A type that can describe itself for registration into the
/// [`TypeRegistry`].
///
/// Generic containers implement it for any element type that does;
/// records implement it by hand:
///
/// ```
/// use wc_reflect::info::ObjectBuilder;
/// use wc_reflect::registry::{GetTypeMeta, TypeMeta, TypeRegistry};
///
/// #[derive(Debug, Default)]
/// struct Point { x: i32, tags: Vec<String> }
///
/// impl GetTypeMeta for Point {
///     fn get_type_meta() -> TypeMeta {
///         TypeMeta::gadget::<Self>(
///             ObjectBuilder::<Self>::new("Point")
///                 .field("x", |p| &p.x, |p, v| p.x = v)
///                 .field("tags", |p| &p.tags, |p, v| p.tags = v)
///                 .build(),
///         )
///     }
///
///     fn register_dependencies(registry: &mut TypeRegistry) {
///         registry.register::<Vec<String>>();
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Point>();
/// assert!(registry.get_with_type_name("Point").is_some());
/// assert!(registry.get_with_type_name("Vec<String>").is_some());
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `GetTypeMeta` so cannot provide type registration information",
    note = "implement `GetTypeMeta` for `{Self}` or insert its `TypeMeta` by hand"
)]
pub trait GetTypeMeta: Reflect + Sized {
    /// Returns the [`TypeMeta`] for this type.
    fn get_type_meta() -> TypeMeta;

    /// Registers other types needed by this type.
    fn register_dependencies(_registry: &mut TypeRegistry) {}
}
