use core::any::{Any, TypeId};
use core::fmt::Debug;

// -----------------------------------------------------------------------------
// Reflect

/// A type-erased value the conversion engine can pass around.
///
/// `Reflect` is implemented for every `'static + Send + Sync + Debug` type.
/// The engine only needs identity and downcasting; structure is described
/// separately by the [`TypeMeta`](crate::registry::TypeMeta) registered for
/// the type.
///
/// ## Type Identification
///
/// [`Any::type_id`] on a `Box<dyn Reflect>` returns the id of the box itself.
/// Use [`Reflect::ty_id`] on the dereferenced value instead:
///
/// ```
/// use core::any::TypeId;
/// use wc_reflect::Reflect;
///
/// let x: Box<dyn Reflect> = Box::new(32_i32);
///
/// assert!((*x).ty_id() == TypeId::of::<i32>());
/// assert!(x.is::<i32>());
/// ```
pub trait Reflect: Any + Send + Sync + Debug + 'static {
    /// Returns the [`TypeId`] of the underlying concrete type.
    fn ty_id(&self) -> TypeId;

    /// Returns the full type path of the underlying concrete type.
    fn reflect_type_path(&self) -> &'static str;

    fn as_reflect(&self) -> &dyn Reflect;

    fn as_reflect_mut(&mut self) -> &mut dyn Reflect;

    fn into_reflect(self: Box<Self>) -> Box<dyn Reflect>;
}

impl<T: Any + Send + Sync + Debug> Reflect for T {
    #[inline(always)]
    fn ty_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    #[inline(always)]
    fn reflect_type_path(&self) -> &'static str {
        core::any::type_name::<T>()
    }

    #[inline(always)]
    fn as_reflect(&self) -> &dyn Reflect {
        self
    }

    #[inline(always)]
    fn as_reflect_mut(&mut self) -> &mut dyn Reflect {
        self
    }

    #[inline(always)]
    fn into_reflect(self: Box<Self>) -> Box<dyn Reflect> {
        self
    }
}

impl dyn Reflect {
    /// Returns `true` if the underlying value is of type `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.ty_id() == TypeId::of::<T>()
    }

    /// Downcasts the value to type `T` by reference.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        <dyn Any>::downcast_ref(self)
    }

    /// Downcasts the value to type `T` by mutable reference.
    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        <dyn Any>::downcast_mut(self)
    }

    /// Downcasts the value to type `T`, consuming the trait object.
    ///
    /// If the underlying value is not of type `T`, returns `Err(self)`.
    ///
    /// ```
    /// use wc_reflect::Reflect;
    ///
    /// let x: Box<dyn Reflect> = Box::new(String::from("wire"));
    /// let x = x.downcast::<u8>().unwrap_err();
    /// assert_eq!(*x.downcast::<String>().unwrap(), "wire");
    /// ```
    pub fn downcast<T: Any>(self: Box<dyn Reflect>) -> Result<Box<T>, Box<dyn Reflect>> {
        if !self.is::<T>() {
            return Err(self);
        }
        let any: Box<dyn Any> = self;
        match any.downcast::<T>() {
            Ok(value) => Ok(value),
            Err(_) => unreachable!("type is already checked"),
        }
    }

    /// Downcasts the value to type `T`, unboxing and consuming the trait object.
    ///
    /// If the underlying value is not of type `T`, returns `Err(self)`.
    #[inline]
    pub fn take<T: Any>(self: Box<dyn Reflect>) -> Result<T, Box<dyn Reflect>> {
        self.downcast::<T>().map(|value| *value)
    }
}

#[cfg(test)]
mod tests {
    use super::Reflect;
    use core::any::TypeId;

    #[derive(Debug, PartialEq)]
    struct Unit;

    #[test]
    fn boxed_identity_is_concrete() {
        let value: Box<dyn Reflect> = Box::new(Unit);
        assert_eq!((*value).ty_id(), TypeId::of::<Unit>());
        assert!(value.reflect_type_path().contains("Box<dyn"));
        assert!((*value).reflect_type_path().ends_with("Unit"));
    }

    #[test]
    fn take_round_trip() {
        let value: Box<dyn Reflect> = Box::new(7_u16);
        let value = value.take::<i16>().unwrap_err();
        assert_eq!(value.take::<u16>().unwrap(), 7);
    }

    #[test]
    fn downcast_mut_writes_through() {
        let mut value: Box<dyn Reflect> = Box::new(1_i64);
        *value.downcast_mut::<i64>().unwrap() += 1;
        assert_eq!(value.downcast_ref::<i64>(), Some(&2));
    }
}
