use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::any::TypeId;

use crate::extract::{Extractor, ExtractorKind, Part, expect_ref, take_part};
use crate::registry::{GetTypeMeta, TypeMeta, TypeRegistry};
use crate::{Owner, Reflect, ReflectError};

// -----------------------------------------------------------------------------
// Pair

/// Extractor of two-element values.
///
/// The declared element order is `(A, B)` and need not follow the layout
/// of `T`.
///
/// # Examples
///
/// ```
/// use wc_reflect::extract::{Extractor, PairExtractor};
///
/// #[derive(Debug)]
/// struct Entry { value: i32, key: String }
///
/// let extractor = PairExtractor::<Entry, String, i32>::new(
///     |e| &e.key,
///     |e| &e.value,
///     |key, value| Entry { value, key },
/// );
///
/// let entry = Entry { value: 4, key: "four".into() };
/// let parts = extractor.extract(&entry).unwrap();
/// assert!(parts[0].is::<String>());
/// ```
pub struct PairExtractor<T, A, B> {
    subtypes: [TypeId; 2],
    first: fn(&T) -> &A,
    second: fn(&T) -> &B,
    build: fn(A, B) -> T,
}

impl<T: Reflect, A: Reflect, B: Reflect> PairExtractor<T, A, B> {
    pub fn new(first: fn(&T) -> &A, second: fn(&T) -> &B, build: fn(A, B) -> T) -> Self {
        Self {
            subtypes: [TypeId::of::<A>(), TypeId::of::<B>()],
            first,
            second,
            build,
        }
    }
}

impl<T: Reflect, A: Reflect, B: Reflect> Extractor for PairExtractor<T, A, B> {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Pair
    }

    fn subtypes(&self) -> &[TypeId] {
        &self.subtypes
    }

    fn extract<'a>(&self, value: &'a dyn Reflect) -> Result<Vec<Part<'a>>, ReflectError> {
        let pair = expect_ref::<T>(value)?;
        Ok(vec![
            Part::Borrowed((self.first)(pair)),
            Part::Borrowed((self.second)(pair)),
        ])
    }

    fn emplace(
        &self,
        parts: Vec<Box<dyn Reflect>>,
        _owner: Option<&Owner>,
    ) -> Result<Box<dyn Reflect>, ReflectError> {
        let [a, b] = <[Box<dyn Reflect>; 2]>::try_from(parts)
            .map_err(|parts| ReflectError::part_count::<T>(2, parts.len()))?;
        Ok(Box::new((self.build)(take_part::<A>(a)?, take_part::<B>(b)?)))
    }
}

impl<A: GetTypeMeta, B: GetTypeMeta> GetTypeMeta for (A, B) {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::container::<Self>(PairExtractor::<Self, A, B>::new(
            |p| &p.0,
            |p| &p.1,
            |a, b| (a, b),
        ))
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<A>();
        registry.register::<B>();
    }
}

// -----------------------------------------------------------------------------
// Tuple

/// Fixed-size heterogeneous tuples of three or more elements.
pub trait TupleLike: Reflect + Sized {
    fn element_types() -> Vec<TypeId>;

    fn elements(&self) -> Vec<&dyn Reflect>;

    fn from_elements(parts: Vec<Box<dyn Reflect>>) -> Result<Self, ReflectError>;
}

/// Extractor of any [`TupleLike`].
pub struct TupleExtractor<T> {
    subtypes: Vec<TypeId>,
    _marker: core::marker::PhantomData<fn() -> T>,
}

impl<T: TupleLike> TupleExtractor<T> {
    pub fn new() -> Self {
        Self {
            subtypes: T::element_types(),
            _marker: core::marker::PhantomData,
        }
    }
}

impl<T: TupleLike> Extractor for TupleExtractor<T> {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Tuple
    }

    fn subtypes(&self) -> &[TypeId] {
        &self.subtypes
    }

    fn extract<'a>(&self, value: &'a dyn Reflect) -> Result<Vec<Part<'a>>, ReflectError> {
        let tuple = expect_ref::<T>(value)?;
        Ok(tuple.elements().into_iter().map(Part::Borrowed).collect())
    }

    fn emplace(
        &self,
        parts: Vec<Box<dyn Reflect>>,
        _owner: Option<&Owner>,
    ) -> Result<Box<dyn Reflect>, ReflectError> {
        Ok(Box::new(T::from_elements(parts)?))
    }
}

macro_rules! impl_tuple_like {
    ($len:literal: $($name:ident $var:ident $idx:tt),+) => {
        impl<$($name: Reflect),+> TupleLike for ($($name,)+) {
            fn element_types() -> Vec<TypeId> {
                vec![$(TypeId::of::<$name>()),+]
            }

            fn elements(&self) -> Vec<&dyn Reflect> {
                vec![$(&self.$idx as &dyn Reflect),+]
            }

            fn from_elements(parts: Vec<Box<dyn Reflect>>) -> Result<Self, ReflectError> {
                let [$($var),+] = <[Box<dyn Reflect>; $len]>::try_from(parts)
                    .map_err(|parts| ReflectError::part_count::<Self>($len, parts.len()))?;
                Ok(($(take_part::<$name>($var)?,)+))
            }
        }

        impl<$($name: GetTypeMeta),+> GetTypeMeta for ($($name,)+) {
            fn get_type_meta() -> TypeMeta {
                TypeMeta::container::<Self>(TupleExtractor::<Self>::new())
            }

            fn register_dependencies(registry: &mut TypeRegistry) {
                $(registry.register::<$name>();)+
            }
        }
    };
}

impl_tuple_like!(3: A a 0, B b 1, C c 2);
impl_tuple_like!(4: A a 0, B b 1, C c 2, D d 3);

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    #[test]
    fn pair_of_tuple() {
        let meta = <(String, u8)>::get_type_meta();
        let extractor = meta.info().extractor().unwrap();
        assert_eq!(extractor.kind(), ExtractorKind::Pair);
        assert_eq!(
            extractor.subtypes(),
            [TypeId::of::<String>(), TypeId::of::<u8>()]
        );
    }

    #[test]
    fn triple_needs_three_parts() {
        let extractor = TupleExtractor::<(u8, bool, String)>::new();
        let err = extractor
            .emplace(vec![Box::new(1_u8), Box::new(true)], None)
            .unwrap_err();
        assert!(matches!(
            err,
            ReflectError::PartCount {
                expected: 3,
                found: 2,
                ..
            }
        ));

        let rebuilt = extractor
            .emplace(
                vec![Box::new(1_u8), Box::new(true), Box::new(String::from("x"))],
                None,
            )
            .unwrap();
        let (a, b, c) = rebuilt.take::<(u8, bool, String)>().unwrap();
        assert_eq!((a, b, c.as_str()), (1, true, "x"));
    }
}
