use alloc::boxed::Box;
use core::any::Any;

use crate::Reflect;

// -----------------------------------------------------------------------------
// TypeTrait

/// A capability stored in the trait table of a [`TypeMeta`].
///
/// Implemented for every cloneable `'static + Send + Sync` type.
///
/// [`TypeMeta`]: crate::registry::TypeMeta
pub trait TypeTrait: Any + Send + Sync {
    fn clone_type_trait(&self) -> Box<dyn TypeTrait>;
}

impl<T: Clone + Any + Send + Sync> TypeTrait for T {
    fn clone_type_trait(&self) -> Box<dyn TypeTrait> {
        Box::new(self.clone())
    }
}

impl dyn TypeTrait {
    #[inline]
    pub fn downcast_ref<T: TypeTrait>(&self) -> Option<&T> {
        <dyn Any>::downcast_ref(self)
    }

    #[inline]
    pub fn downcast_mut<T: TypeTrait>(&mut self) -> Option<&mut T> {
        <dyn Any>::downcast_mut(self)
    }
}

/// Creates a [`TypeTrait`] for the type `T`.
pub trait FromType<T> {
    fn from_type() -> Self;
}

// -----------------------------------------------------------------------------
// TypeTraitDefault

/// Creates default values of a registered type.
///
/// The engine falls back to it when `null` is decoded into a type no
/// converter accepts `null` for.
///
/// # Examples
///
/// ```
/// use wc_reflect::registry::{TypeRegistry, TypeTraitDefault};
///
/// let registry = TypeRegistry::new();
///
/// let generator = registry
///     .get_with_type_name("String").unwrap()
///     .get_trait::<TypeTraitDefault>().unwrap();
///
/// assert_eq!(generator.default().take::<String>().unwrap(), "");
/// ```
#[derive(Clone)]
pub struct TypeTraitDefault {
    func: fn() -> Box<dyn Reflect>,
}

impl TypeTraitDefault {
    #[inline]
    pub const fn new(func: fn() -> Box<dyn Reflect>) -> Self {
        Self { func }
    }

    #[inline(always)]
    pub fn default(&self) -> Box<dyn Reflect> {
        (self.func)()
    }
}

impl<T: Default + Reflect> FromType<T> for TypeTraitDefault {
    fn from_type() -> Self {
        Self {
            func: || Box::<T>::default(),
        }
    }
}
