use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::{TypeId, type_name};
use core::marker::PhantomData;

use crate::info::Type;
use crate::{Reflect, ReflectError};

// -----------------------------------------------------------------------------
// Accessors

trait FieldAccessor: Send + Sync {
    fn get<'a>(&self, obj: &'a dyn Reflect) -> Result<&'a dyn Reflect, ReflectError>;
    fn set(&self, obj: &mut dyn Reflect, value: Box<dyn Reflect>) -> Result<(), ReflectError>;
}

struct TypedField<T, F> {
    get: fn(&T) -> &F,
    set: fn(&mut T, F),
}

impl<T: Reflect, F: Reflect> FieldAccessor for TypedField<T, F> {
    fn get<'a>(&self, obj: &'a dyn Reflect) -> Result<&'a dyn Reflect, ReflectError> {
        match obj.downcast_ref::<T>() {
            Some(obj) => Ok((self.get)(obj)),
            None => Err(ReflectError::mismatch::<T>(obj)),
        }
    }

    fn set(&self, obj: &mut dyn Reflect, value: Box<dyn Reflect>) -> Result<(), ReflectError> {
        let found = (*obj).reflect_type_path();
        let target = obj.downcast_mut::<T>().ok_or(ReflectError::TypeMismatch {
            expected: type_name::<T>(),
            found,
        })?;
        let value = value
            .take::<F>()
            .map_err(|v| ReflectError::mismatch::<F>(&*v))?;
        (self.set)(target, value);
        Ok(())
    }
}

trait Upcast: Send + Sync {
    fn upcast<'a>(&self, obj: &'a dyn Reflect) -> Result<&'a dyn Reflect, ReflectError>;
    fn upcast_mut<'a>(&self, obj: &'a mut dyn Reflect)
    -> Result<&'a mut dyn Reflect, ReflectError>;
}

struct TypedUpcast<D, B> {
    get: fn(&D) -> &B,
    get_mut: fn(&mut D) -> &mut B,
}

impl<D: Reflect, B: Reflect> Upcast for TypedUpcast<D, B> {
    fn upcast<'a>(&self, obj: &'a dyn Reflect) -> Result<&'a dyn Reflect, ReflectError> {
        match obj.downcast_ref::<D>() {
            Some(obj) => Ok((self.get)(obj)),
            None => Err(ReflectError::mismatch::<D>(obj)),
        }
    }

    fn upcast_mut<'a>(
        &self,
        obj: &'a mut dyn Reflect,
    ) -> Result<&'a mut dyn Reflect, ReflectError> {
        let found = (*obj).reflect_type_path();
        match obj.downcast_mut::<D>() {
            Some(obj) => Ok((self.get_mut)(obj)),
            None => Err(ReflectError::TypeMismatch {
                expected: type_name::<D>(),
                found,
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// FieldInfo

/// A stored property of a record type.
pub struct FieldInfo {
    name: &'static str,
    ty: Type,
    stored: bool,
    accessor: Box<dyn FieldAccessor>,
}

impl FieldInfo {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The declared type of the field.
    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.ty.id()
    }

    /// Whether the field takes part in serialization by default.
    #[inline]
    pub fn is_stored(&self) -> bool {
        self.stored
    }

    /// Borrows the field out of `obj`, which must be the declaring type.
    #[inline]
    pub fn get<'a>(&self, obj: &'a dyn Reflect) -> Result<&'a dyn Reflect, ReflectError> {
        self.accessor.get(obj)
    }

    /// Moves `value` into the field of `obj`, which must be the declaring type.
    #[inline]
    pub fn set(&self, obj: &mut dyn Reflect, value: Box<dyn Reflect>) -> Result<(), ReflectError> {
        self.accessor.set(obj, value)
    }
}

impl core::fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("stored", &self.stored)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// BaseLink

/// Composition link from a record to the record it extends.
///
/// Rust has no class inheritance; a derived record embeds its base and
/// exposes it through this link so base fields can be read and written.
pub struct BaseLink {
    type_id: TypeId,
    upcast: Box<dyn Upcast>,
}

impl BaseLink {
    /// The [`TypeId`] of the base record.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn upcast<'a>(&self, obj: &'a dyn Reflect) -> Result<&'a dyn Reflect, ReflectError> {
        self.upcast.upcast(obj)
    }

    #[inline]
    pub fn upcast_mut<'a>(
        &self,
        obj: &'a mut dyn Reflect,
    ) -> Result<&'a mut dyn Reflect, ReflectError> {
        self.upcast.upcast_mut(obj)
    }
}

// -----------------------------------------------------------------------------
// ObjectInfo

/// Description of a record type: its fields, how to construct it, and
/// where it sits in a polymorphic hierarchy.
///
/// Built with [`ObjectBuilder`].
pub struct ObjectInfo {
    name: &'static str,
    type_id: TypeId,
    construct: fn() -> Box<dyn Reflect>,
    fields: Vec<FieldInfo>,
    base: Option<BaseLink>,
    polymorphic: Option<bool>,
    instance_polymorphic: Option<Box<dyn Fn(&dyn Reflect) -> Option<bool> + Send + Sync>>,
    object_name: Option<Box<dyn FieldAccessor>>,
}

impl ObjectInfo {
    /// The class name used as polymorphism marker.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fields declared by this type itself, excluding those of its base.
    #[inline]
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[inline]
    pub fn base(&self) -> Option<&BaseLink> {
        self.base.as_ref()
    }

    /// The class-level polymorphism opt-in, `None` if the type inherits it.
    #[inline]
    pub fn polymorphic(&self) -> Option<bool> {
        self.polymorphic
    }

    /// Per-instance polymorphism override.
    pub fn instance_polymorphic(&self, obj: &dyn Reflect) -> Option<bool> {
        self.instance_polymorphic.as_ref().and_then(|f| f(obj))
    }

    /// Whether the type carries a diagnostic `objectName`.
    #[inline]
    pub fn has_object_name(&self) -> bool {
        self.object_name.is_some()
    }

    pub fn object_name<'a>(&self, obj: &'a dyn Reflect) -> Option<&'a str> {
        let accessor = self.object_name.as_ref()?;
        accessor.get(obj).ok()?.downcast_ref::<String>().map(String::as_str)
    }

    pub fn set_object_name(&self, obj: &mut dyn Reflect, name: String) -> Result<(), ReflectError> {
        match &self.object_name {
            Some(accessor) => accessor.set(obj, Box::new(name)),
            None => Ok(()),
        }
    }

    /// Creates a default instance.
    #[inline]
    pub fn new_instance(&self) -> Box<dyn Reflect> {
        (self.construct)()
    }
}

impl core::fmt::Debug for ObjectInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObjectInfo")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("polymorphic", &self.polymorphic)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ObjectBuilder

/// Builds the [`ObjectInfo`] of `T`.
///
/// # Examples
///
/// ```
/// use wc_reflect::info::ObjectBuilder;
///
/// #[derive(Debug, Default)]
/// struct Sample {
///     key: i32,
///     cache: i32,
/// }
///
/// let info = ObjectBuilder::<Sample>::new("Sample")
///     .field("key", |s| &s.key, |s, v| s.key = v)
///     .unstored_field("cache", |s| &s.cache, |s, v| s.cache = v)
///     .build();
///
/// assert_eq!(info.name(), "Sample");
/// assert_eq!(info.fields().len(), 2);
/// assert!(!info.field("cache").unwrap().is_stored());
/// ```
pub struct ObjectBuilder<T> {
    info: ObjectInfo,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflect + Default> ObjectBuilder<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            info: ObjectInfo {
                name,
                type_id: TypeId::of::<T>(),
                construct: || Box::<T>::default(),
                fields: Vec::new(),
                base: None,
                polymorphic: None,
                instance_polymorphic: None,
                object_name: None,
            },
            _marker: PhantomData,
        }
    }

    fn push_field<F: Reflect>(
        mut self,
        name: &'static str,
        stored: bool,
        get: fn(&T) -> &F,
        set: fn(&mut T, F),
    ) -> Self {
        self.info.fields.push(FieldInfo {
            name,
            ty: Type::of::<F>(),
            stored,
            accessor: Box::new(TypedField { get, set }),
        });
        self
    }

    /// Declares a stored field.
    pub fn field<F: Reflect>(self, name: &'static str, get: fn(&T) -> &F, set: fn(&mut T, F)) -> Self {
        self.push_field(name, true, get, set)
    }

    /// Declares a field skipped unless stored attributes are ignored.
    pub fn unstored_field<F: Reflect>(
        self,
        name: &'static str,
        get: fn(&T) -> &F,
        set: fn(&mut T, F),
    ) -> Self {
        self.push_field(name, false, get, set)
    }

    /// Declares the diagnostic name, written as `objectName` on request.
    pub fn object_name(mut self, get: fn(&T) -> &String, set: fn(&mut T, String)) -> Self {
        self.info.object_name = Some(Box::new(TypedField { get, set }));
        self
    }

    /// Declares the embedded base record `B`.
    pub fn base<B: Reflect>(mut self, get: fn(&T) -> &B, get_mut: fn(&mut T) -> &mut B) -> Self {
        self.info.base = Some(BaseLink {
            type_id: TypeId::of::<B>(),
            upcast: Box::new(TypedUpcast { get, get_mut }),
        });
        self
    }

    /// Opts the class in or out of polymorphic marking.
    pub fn polymorphic(mut self, polymorphic: bool) -> Self {
        self.info.polymorphic = Some(polymorphic);
        self
    }

    /// Lets individual instances override the class-level opt-in.
    pub fn instance_polymorphic(mut self, f: fn(&T) -> Option<bool>) -> Self {
        self.info.instance_polymorphic = Some(Box::new(move |obj: &dyn Reflect| {
            obj.downcast_ref::<T>().and_then(f)
        }));
        self
    }

    #[inline]
    pub fn build(self) -> ObjectInfo {
        self.info
    }
}
