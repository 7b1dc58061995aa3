use alloc::string::{String, ToString};
use core::any::TypeId;

use wc_utils::TypeIdMap;
use wc_utils::hash::{HashMap, HashSet};

use crate::Reflect;
use crate::info::{BaseKind, ObjectInfo, TypeInfo};
use crate::registry::{GetTypeMeta, TypeMeta, TypeTrait};

// -----------------------------------------------------------------------------
// TypeRegistry

/// The central store of [`TypeMeta`]s.
///
/// [Registering] a type generates its [`TypeMeta`] through [`GetTypeMeta`]
/// and indexes it by [`TypeId`], full type path and short name. Types of
/// foreign crates, which cannot implement [`GetTypeMeta`] here, are added
/// with [`insert_type_meta`](Self::insert_type_meta).
///
/// The registry also knows the base chain of records, which is what
/// polymorphic deserialization checks `"@class"` markers against.
///
/// # Example
///
/// ```
/// use core::any::TypeId;
/// use wc_reflect::registry::TypeRegistry;
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Vec<Option<i32>>>();
///
/// assert!(registry.contains(TypeId::of::<Option<i32>>()));
/// assert_eq!(
///     registry.type_name(TypeId::of::<Vec<Option<i32>>>()),
///     Some("Vec<Option<i32>>"),
/// );
/// ```
///
/// [Registering]: TypeRegistry::register
pub struct TypeRegistry {
    type_meta_table: TypeIdMap<TypeMeta>,
    type_path_to_id: HashMap<&'static str, TypeId>,
    type_name_to_id: HashMap<String, TypeId>,
    ambiguous_names: HashSet<String>,
}

impl Default for TypeRegistry {
    /// See [`TypeRegistry::new`] .
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create an empty [`TypeRegistry`].
    pub fn empty() -> Self {
        Self {
            type_meta_table: TypeIdMap::new(),
            type_path_to_id: HashMap::default(),
            type_name_to_id: HashMap::default(),
            ambiguous_names: HashSet::default(),
        }
    }

    /// Create a type registry with default registrations for primitive types.
    ///
    /// - `()` `bool` `char`
    /// - `i8 - i64` `isize`
    /// - `u8 - u64` `usize`
    /// - `f32` `f64`
    /// - `String`
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<()>();
        registry.register::<bool>();
        registry.register::<char>();
        registry.register::<u8>();
        registry.register::<u16>();
        registry.register::<u32>();
        registry.register::<u64>();
        registry.register::<usize>();
        registry.register::<i8>();
        registry.register::<i16>();
        registry.register::<i32>();
        registry.register::<i64>();
        registry.register::<isize>();
        registry.register::<f32>();
        registry.register::<f64>();
        registry.register::<String>();
        registry
    }

    // The type must not already exist.
    fn add_new_type_indices(
        type_meta: &TypeMeta,
        type_path_to_id: &mut HashMap<&'static str, TypeId>,
        type_name_to_id: &mut HashMap<String, TypeId>,
        ambiguous_names: &mut HashSet<String>,
    ) {
        let ty = type_meta.ty();
        let type_name = ty.name();

        if !ambiguous_names.contains(type_name) {
            if type_name_to_id.contains_key(type_name) {
                type_name_to_id.remove(type_name);
                ambiguous_names.insert(type_name.to_string());
                log::debug!("type name `{type_name}` is ambiguous, `{}` shares it", ty.path());
            } else {
                type_name_to_id.insert(type_name.to_string(), ty.id());
            }
        }

        type_path_to_id.insert(ty.path(), ty.id());
    }

    fn register_internal(
        &mut self,
        type_id: TypeId,
        get_type_meta: impl FnOnce() -> TypeMeta,
    ) -> bool {
        self.type_meta_table.try_insert(type_id, || {
            let meta = get_type_meta();
            Self::add_new_type_indices(
                &meta,
                &mut self.type_path_to_id,
                &mut self.type_name_to_id,
                &mut self.ambiguous_names,
            );
            meta
        })
    }

    /// Inserts `type_meta` unless its type is already registered.
    ///
    /// Returns `true` if it was inserted. Dependencies are not registered.
    pub fn try_insert_type_meta(&mut self, type_meta: TypeMeta) -> bool {
        self.register_internal(type_meta.type_id(), || type_meta)
    }

    /// Inserts or **overwrites** the metadata of a type.
    ///
    /// An overwritten type keeps its original path and name indices.
    /// Dependencies are not registered.
    pub fn insert_type_meta(&mut self, type_meta: TypeMeta) {
        if !self.type_meta_table.contains(&type_meta.type_id()) {
            Self::add_new_type_indices(
                &type_meta,
                &mut self.type_path_to_id,
                &mut self.type_name_to_id,
                &mut self.ambiguous_names,
            );
        }
        self.type_meta_table.insert(type_meta.type_id(), type_meta);
    }

    /// Registers `T` and, recursively, its dependencies.
    ///
    /// Does nothing if `T` is already registered.
    pub fn register<T: GetTypeMeta>(&mut self) {
        if self.register_internal(TypeId::of::<T>(), T::get_type_meta) {
            T::register_dependencies(self);
        }
    }

    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.type_meta_table.contains(&type_id)
    }

    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&TypeMeta> {
        self.type_meta_table.get(&type_id)
    }

    #[inline]
    pub fn get_mut(&mut self, type_id: TypeId) -> Option<&mut TypeMeta> {
        self.type_meta_table.get_mut(&type_id)
    }

    pub fn get_with_type_path(&self, type_path: &str) -> Option<&TypeMeta> {
        match self.type_path_to_id.get(type_path) {
            Some(id) => self.get(*id),
            None => None,
        }
    }

    /// Looks a type up by short name, `None` if unknown or ambiguous.
    pub fn get_with_type_name(&self, type_name: &str) -> Option<&TypeMeta> {
        match self.type_name_to_id.get(type_name) {
            Some(id) => self.get(*id),
            None => None,
        }
    }

    /// Returns `true` if several registered types share the short name.
    pub fn is_ambiguous(&self, type_name: &str) -> bool {
        self.ambiguous_names.contains(type_name)
    }

    pub fn get_type_trait<T: TypeTrait>(&self, type_id: TypeId) -> Option<&T> {
        match self.get(type_id) {
            Some(type_meta) => type_meta.get_trait::<T>(),
            None => None,
        }
    }

    pub fn get_type_info(&self, type_id: TypeId) -> Option<&TypeInfo> {
        self.get(type_id).map(TypeMeta::info)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TypeMeta> {
        self.type_meta_table.values()
    }

    /// Short name of a registered type.
    pub fn type_name(&self, type_id: TypeId) -> Option<&str> {
        self.get(type_id).map(TypeMeta::name)
    }

    pub fn base_kind(&self, type_id: TypeId) -> Option<BaseKind> {
        self.get(type_id).map(TypeMeta::base_kind)
    }

    /// Record description of a registered object or gadget.
    pub fn object_info(&self, type_id: TypeId) -> Option<&ObjectInfo> {
        self.get(type_id)?.info().as_object()
    }

    /// Whether the class takes part in polymorphism.
    ///
    /// A class that does not decide inherits the decision of its nearest
    /// deciding base, and defaults to `false`.
    pub fn is_polymorphic(&self, type_id: TypeId) -> bool {
        let mut current = self.object_info(type_id);
        while let Some(info) = current {
            if let Some(polymorphic) = info.polymorphic() {
                return polymorphic;
            }
            current = info.base().and_then(|base| self.object_info(base.type_id()));
        }
        false
    }

    /// Whether `derived` is `base` or has it somewhere up its base chain.
    pub fn inherits(&self, derived: TypeId, base: TypeId) -> bool {
        let mut current = Some(derived);
        while let Some(id) = current {
            if id == base {
                return true;
            }
            current = self
                .object_info(id)
                .and_then(ObjectInfo::base)
                .map(|link| link.type_id());
        }
        false
    }

    /// Views `value` as its embedded base record `target`.
    pub fn upcast<'a>(&self, value: &'a dyn Reflect, target: TypeId) -> Option<&'a dyn Reflect> {
        let id = value.ty_id();
        if id == target {
            return Some(value);
        }
        let base = self.object_info(id)?.base()?.upcast(value).ok()?;
        self.upcast(base, target)
    }

    pub fn upcast_mut<'a>(
        &self,
        value: &'a mut dyn Reflect,
        target: TypeId,
    ) -> Option<&'a mut dyn Reflect> {
        let id = (*value).ty_id();
        if id == target {
            return Some(value);
        }
        let base = self.object_info(id)?.base()?.upcast_mut(value).ok()?;
        self.upcast_mut(base, target)
    }
}

impl core::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.type_path_to_id.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::ObjectBuilder;
    use crate::ReflectError;
    use crate::registry::TypeTraitDefault;

    #[derive(Debug, Default)]
    struct Base {
        key: i32,
    }

    #[derive(Debug, Default)]
    struct Middle {
        base: Base,
    }

    #[derive(Debug, Default)]
    struct Leaf {
        middle: Middle,
        extra: u8,
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.insert_type_meta(TypeMeta::object::<Base>(
            ObjectBuilder::<Base>::new("Base")
                .field("key", |b| &b.key, |b, v| b.key = v)
                .polymorphic(false)
                .build(),
        ));
        registry.insert_type_meta(TypeMeta::object::<Middle>(
            ObjectBuilder::<Middle>::new("Middle")
                .base::<Base>(|m| &m.base, |m| &mut m.base)
                .polymorphic(true)
                .build(),
        ));
        registry.insert_type_meta(TypeMeta::object::<Leaf>(
            ObjectBuilder::<Leaf>::new("Leaf")
                .base::<Middle>(|l| &l.middle, |l| &mut l.middle)
                .field("extra", |l| &l.extra, |l, v| l.extra = v)
                .build(),
        ));
        registry
    }

    #[test]
    fn polymorphism_is_inherited() {
        let registry = registry();
        assert!(!registry.is_polymorphic(TypeId::of::<Base>()));
        assert!(registry.is_polymorphic(TypeId::of::<Middle>()));
        assert!(registry.is_polymorphic(TypeId::of::<Leaf>()));
        assert!(!registry.is_polymorphic(TypeId::of::<i32>()));
    }

    #[test]
    fn inheritance_walks_the_chain() {
        let registry = registry();
        assert!(registry.inherits(TypeId::of::<Leaf>(), TypeId::of::<Base>()));
        assert!(registry.inherits(TypeId::of::<Leaf>(), TypeId::of::<Leaf>()));
        assert!(!registry.inherits(TypeId::of::<Base>(), TypeId::of::<Leaf>()));
    }

    #[test]
    fn upcast_reaches_base_fields() {
        let registry = registry();
        let mut leaf = Leaf::default();

        let base = registry
            .upcast_mut(&mut leaf, TypeId::of::<Base>())
            .unwrap();
        let info = registry.object_info(TypeId::of::<Base>()).unwrap();
        info.field("key")
            .unwrap()
            .set(base, Box::new(42_i32))
            .unwrap();
        assert_eq!(leaf.middle.base.key, 42);

        let base = registry.upcast(&leaf, TypeId::of::<Base>()).unwrap();
        assert_eq!(base.downcast_ref::<Base>().unwrap().key, 42);
        assert!(registry.upcast(&leaf, TypeId::of::<u8>()).is_none());
    }

    #[test]
    fn mismatched_writes_name_the_runtime_type() {
        let registry = registry();
        let mut leaf = Leaf::default();
        let info = registry.object_info(TypeId::of::<Base>()).unwrap();

        let err = info
            .field("key")
            .unwrap()
            .set(&mut leaf, Box::new(1_i32))
            .unwrap_err();
        match err {
            ReflectError::TypeMismatch { expected, found } => {
                assert!(expected.ends_with("Base"));
                assert!(found.ends_with("Leaf"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let middle = registry
            .upcast_mut(&mut leaf, TypeId::of::<Middle>())
            .unwrap();
        assert_eq!((*middle).ty_id(), TypeId::of::<Middle>());
    }

    #[test]
    fn records_are_named_by_class() {
        let registry = registry();
        let meta = registry.get_with_type_name("Leaf").unwrap();
        assert_eq!(meta.type_id(), TypeId::of::<Leaf>());
        assert!(meta.has_trait::<TypeTraitDefault>());
        assert!(!registry.is_ambiguous("Leaf"));
    }

    #[test]
    fn duplicate_short_names_are_ambiguous() {
        mod a {
            #[derive(Debug)]
            pub struct Same;
        }
        mod b {
            #[derive(Debug)]
            pub struct Same;
        }

        let mut registry = TypeRegistry::empty();
        registry.insert_type_meta(TypeMeta::opaque::<a::Same>());
        registry.insert_type_meta(TypeMeta::opaque::<b::Same>());
        assert!(registry.is_ambiguous("Same"));
        assert!(registry.get_with_type_name("Same").is_none());
        assert!(registry.get_with_type_path(core::any::type_name::<a::Same>()).is_some());
    }
}
