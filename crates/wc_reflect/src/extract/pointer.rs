use alloc::boxed::Box;
use alloc::sync::{Arc, Weak};
use alloc::vec;
use alloc::vec::Vec;
use core::any::{TypeId, type_name};
use core::marker::PhantomData;

use crate::extract::{Extractor, ExtractorKind, Part, expect_ref};
use crate::registry::{GetTypeMeta, TypeMeta, TypeRegistry};
use crate::{Owner, Reflect, ReflectError};

/// Returns the single part of a pointer-like value, `None` if empty.
fn pointee<P: ?Sized>(mut parts: Vec<Box<dyn Reflect>>) -> Result<Option<Box<dyn Reflect>>, ReflectError> {
    match parts.len() {
        0 => Ok(None),
        1 => Ok(parts.pop()),
        n => Err(ReflectError::part_count::<P>(1, n)),
    }
}

fn downcast_pointee<T: Reflect>(part: Box<dyn Reflect>) -> Result<Box<T>, ReflectError> {
    part.downcast::<T>()
        .map_err(|part| ReflectError::mismatch::<T>(&*part))
}

// -----------------------------------------------------------------------------
// Box

/// Extractor of `Box<T>`. A box is never empty.
pub struct BoxExtractor<T> {
    subtypes: [TypeId; 1],
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflect> BoxExtractor<T> {
    pub fn new() -> Self {
        Self {
            subtypes: [TypeId::of::<T>()],
            _marker: PhantomData,
        }
    }
}

impl<T: Reflect> Extractor for BoxExtractor<T> {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Pointer
    }

    fn subtypes(&self) -> &[TypeId] {
        &self.subtypes
    }

    fn extract<'a>(&self, value: &'a dyn Reflect) -> Result<Vec<Part<'a>>, ReflectError> {
        let boxed = expect_ref::<Box<T>>(value)?;
        Ok(vec![Part::Borrowed(&**boxed)])
    }

    fn emplace(
        &self,
        parts: Vec<Box<dyn Reflect>>,
        _owner: Option<&Owner>,
    ) -> Result<Box<dyn Reflect>, ReflectError> {
        match pointee::<Box<T>>(parts)? {
            Some(part) => Ok(Box::new(downcast_pointee::<T>(part)?)),
            None => Err(ReflectError::EmptyValue(type_name::<Box<T>>())),
        }
    }
}

impl<T: GetTypeMeta> GetTypeMeta for Box<T> {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::container::<Self>(BoxExtractor::<T>::new())
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }
}

// -----------------------------------------------------------------------------
// Arc

/// Extractor of `Arc<T>`. Rebuilt pointers are never shared.
pub struct ArcExtractor<T> {
    subtypes: [TypeId; 1],
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflect> ArcExtractor<T> {
    pub fn new() -> Self {
        Self {
            subtypes: [TypeId::of::<T>()],
            _marker: PhantomData,
        }
    }
}

impl<T: Reflect> Extractor for ArcExtractor<T> {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Pointer
    }

    fn subtypes(&self) -> &[TypeId] {
        &self.subtypes
    }

    fn extract<'a>(&self, value: &'a dyn Reflect) -> Result<Vec<Part<'a>>, ReflectError> {
        let shared = expect_ref::<Arc<T>>(value)?;
        Ok(vec![Part::Borrowed(&**shared)])
    }

    fn emplace(
        &self,
        parts: Vec<Box<dyn Reflect>>,
        _owner: Option<&Owner>,
    ) -> Result<Box<dyn Reflect>, ReflectError> {
        match pointee::<Arc<T>>(parts)? {
            Some(part) => Ok(Box::new(Arc::<T>::from(downcast_pointee::<T>(part)?))),
            None => Err(ReflectError::EmptyValue(type_name::<Arc<T>>())),
        }
    }
}

impl<T: GetTypeMeta> GetTypeMeta for Arc<T> {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::container::<Self>(ArcExtractor::<T>::new())
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }
}

// -----------------------------------------------------------------------------
// Weak

/// Extractor of `sync::Weak<T>`.
///
/// A dangling weak pointer extracts as empty. Rebuilding a non-empty one
/// hands the strong reference to the [`Owner`].
pub struct WeakExtractor<T> {
    subtypes: [TypeId; 1],
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflect> WeakExtractor<T> {
    pub fn new() -> Self {
        Self {
            subtypes: [TypeId::of::<T>()],
            _marker: PhantomData,
        }
    }
}

impl<T: Reflect> Extractor for WeakExtractor<T> {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::WeakPointer
    }

    fn subtypes(&self) -> &[TypeId] {
        &self.subtypes
    }

    fn extract<'a>(&self, value: &'a dyn Reflect) -> Result<Vec<Part<'a>>, ReflectError> {
        let weak = expect_ref::<Weak<T>>(value)?;
        Ok(weak.upgrade().map(|strong| Part::Shared(strong)).into_iter().collect())
    }

    fn emplace(
        &self,
        parts: Vec<Box<dyn Reflect>>,
        owner: Option<&Owner>,
    ) -> Result<Box<dyn Reflect>, ReflectError> {
        let Some(part) = pointee::<Weak<T>>(parts)? else {
            return Ok(Box::new(Weak::<T>::new()));
        };
        let owner = owner.ok_or(ReflectError::MissingOwner(type_name::<Weak<T>>()))?;
        let strong = Arc::<T>::from(downcast_pointee::<T>(part)?);
        let weak = Arc::downgrade(&strong);
        owner.adopt(strong);
        Ok(Box::new(weak))
    }
}

impl<T: GetTypeMeta> GetTypeMeta for Weak<T> {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::container::<Self>(WeakExtractor::<T>::new())
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }
}

// -----------------------------------------------------------------------------
// Box<dyn Trait>

type Cast<D> = Box<dyn Fn(Box<dyn Reflect>) -> Result<Box<D>, Box<dyn Reflect>> + Send + Sync>;

/// Extractor of boxed trait objects, the carrier of polymorphic records.
///
/// The declared subtype is the base record of the hierarchy. Each concrete
/// record that may be stored in the box registers a cast with
/// [`with`](Self::with).
///
/// # Examples
///
/// ```
/// use wc_reflect::Reflect;
/// use wc_reflect::extract::{DynBoxExtractor, Extractor};
///
/// trait Shape: Reflect {}
///
/// #[derive(Debug, Default)]
/// struct Circle;
/// impl Shape for Circle {}
///
/// let extractor = DynBoxExtractor::<dyn Shape>::new::<Circle>()
///     .with::<Circle>(|c| c);
///
/// let rebuilt = extractor.emplace(vec![Box::new(Circle)], None).unwrap();
/// assert!(rebuilt.is::<Box<dyn Shape>>());
/// ```
pub struct DynBoxExtractor<D: ?Sized> {
    subtypes: [TypeId; 1],
    casts: Vec<(TypeId, Cast<D>)>,
}

impl<D: ?Sized + Reflect> DynBoxExtractor<D> {
    /// Creates an extractor whose declared pointee is the record `B`.
    pub fn new<B: Reflect>() -> Self {
        Self {
            subtypes: [TypeId::of::<B>()],
            casts: Vec::new(),
        }
    }

    /// Allows boxes holding an `S`.
    pub fn with<S: Reflect>(mut self, cast: fn(Box<S>) -> Box<D>) -> Self {
        self.casts.push((
            TypeId::of::<S>(),
            Box::new(move |value: Box<dyn Reflect>| value.downcast::<S>().map(cast)),
        ));
        self
    }
}

impl<D: ?Sized + Reflect> Extractor for DynBoxExtractor<D> {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Pointer
    }

    fn subtypes(&self) -> &[TypeId] {
        &self.subtypes
    }

    fn extract<'a>(&self, value: &'a dyn Reflect) -> Result<Vec<Part<'a>>, ReflectError> {
        let boxed = expect_ref::<Box<D>>(value)?;
        Ok(vec![Part::Borrowed((**boxed).as_reflect())])
    }

    fn emplace(
        &self,
        parts: Vec<Box<dyn Reflect>>,
        _owner: Option<&Owner>,
    ) -> Result<Box<dyn Reflect>, ReflectError> {
        let Some(part) = pointee::<Box<D>>(parts)? else {
            return Err(ReflectError::EmptyValue(type_name::<Box<D>>()));
        };
        let found = (*part).ty_id();
        let no_cast = ReflectError::NoCast {
            target: type_name::<Box<D>>(),
            found: (*part).reflect_type_path(),
        };
        let Some((_, cast)) = self.casts.iter().find(|(id, _)| *id == found) else {
            return Err(no_cast);
        };
        match cast(part) {
            Ok(boxed) => Ok(Box::new(boxed)),
            Err(_) => Err(no_cast),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_round_trip() {
        let extractor = BoxExtractor::<i32>::new();
        let value: Box<i32> = Box::new(5);
        let parts = extractor.extract(&value).unwrap();
        assert_eq!(parts[0].downcast_ref::<i32>(), Some(&5));

        let rebuilt = extractor.emplace(vec![Box::new(6_i32)], None).unwrap();
        assert_eq!(*rebuilt.take::<Box<i32>>().unwrap(), 6);
    }

    #[test]
    fn empty_box_is_rejected() {
        let extractor = BoxExtractor::<i32>::new();
        assert!(matches!(
            extractor.emplace(vec![], None),
            Err(ReflectError::EmptyValue(_))
        ));
    }

    #[test]
    fn weak_needs_owner() {
        let extractor = WeakExtractor::<u8>::new();
        let err = extractor.emplace(vec![Box::new(1_u8)], None).unwrap_err();
        assert!(matches!(err, ReflectError::MissingOwner(_)));

        let owner = Owner::new();
        let rebuilt = extractor.emplace(vec![Box::new(1_u8)], Some(&owner)).unwrap();
        let weak = rebuilt.take::<Weak<u8>>().unwrap();
        assert_eq!(weak.upgrade().as_deref(), Some(&1));
        assert_eq!(owner.len(), 1);
    }

    #[test]
    fn dangling_weak_extracts_empty() {
        let extractor = WeakExtractor::<u8>::new();
        let weak = Arc::downgrade(&Arc::new(3_u8));
        assert!(extractor.extract(&weak).unwrap().is_empty());
    }
}
