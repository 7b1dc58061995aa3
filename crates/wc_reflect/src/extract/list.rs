use alloc::boxed::Box;
use alloc::collections::{BTreeSet, VecDeque};
use alloc::vec::Vec;
use core::any::TypeId;
use core::hash::Hash;
use core::marker::PhantomData;
use std::collections::HashSet;

use crate::extract::{Extractor, ExtractorKind, Part, expect_ref, take_part};
use crate::registry::{GetTypeMeta, TypeMeta, TypeRegistry};
use crate::{Owner, Reflect, ReflectError};

// -----------------------------------------------------------------------------
// Sequence

/// A collection of homogeneous items that can be walked and refilled.
///
/// Lists keep their items in order. Sets report [`ExtractorKind::Set`] and
/// may drop duplicates when refilled.
pub trait Sequence: Reflect + Default {
    type Item: Reflect;

    const KIND: ExtractorKind = ExtractorKind::List;

    fn items(&self) -> impl Iterator<Item = &Self::Item>;

    fn push_item(&mut self, item: Self::Item);
}

impl<T: Reflect> Sequence for Vec<T> {
    type Item = T;

    fn items(&self) -> impl Iterator<Item = &T> {
        self.iter()
    }

    #[inline]
    fn push_item(&mut self, item: T) {
        self.push(item);
    }
}

impl<T: Reflect> Sequence for VecDeque<T> {
    type Item = T;

    fn items(&self) -> impl Iterator<Item = &T> {
        self.iter()
    }

    #[inline]
    fn push_item(&mut self, item: T) {
        self.push_back(item);
    }
}

impl<T: Reflect + Ord> Sequence for BTreeSet<T> {
    type Item = T;

    const KIND: ExtractorKind = ExtractorKind::Set;

    fn items(&self) -> impl Iterator<Item = &T> {
        self.iter()
    }

    #[inline]
    fn push_item(&mut self, item: T) {
        self.insert(item);
    }
}

impl<T: Reflect + Eq + Hash> Sequence for HashSet<T> {
    type Item = T;

    const KIND: ExtractorKind = ExtractorKind::Set;

    fn items(&self) -> impl Iterator<Item = &T> {
        self.iter()
    }

    #[inline]
    fn push_item(&mut self, item: T) {
        self.insert(item);
    }
}

// -----------------------------------------------------------------------------
// SeqExtractor

/// Extractor of any [`Sequence`].
pub struct SeqExtractor<C> {
    subtypes: [TypeId; 1],
    _marker: PhantomData<fn() -> C>,
}

impl<C: Sequence> SeqExtractor<C> {
    pub fn new() -> Self {
        Self {
            subtypes: [TypeId::of::<C::Item>()],
            _marker: PhantomData,
        }
    }
}

impl<C: Sequence> Extractor for SeqExtractor<C> {
    fn kind(&self) -> ExtractorKind {
        C::KIND
    }

    fn subtypes(&self) -> &[TypeId] {
        &self.subtypes
    }

    fn extract<'a>(&self, value: &'a dyn Reflect) -> Result<Vec<Part<'a>>, ReflectError> {
        let seq = expect_ref::<C>(value)?;
        Ok(seq.items().map(|item| Part::Borrowed(item)).collect())
    }

    fn emplace(
        &self,
        parts: Vec<Box<dyn Reflect>>,
        _owner: Option<&Owner>,
    ) -> Result<Box<dyn Reflect>, ReflectError> {
        let mut seq = C::default();
        for part in parts {
            seq.push_item(take_part::<C::Item>(part)?);
        }
        Ok(Box::new(seq))
    }
}

macro_rules! impl_sequence_meta {
    ($ty:ident $(: $($bound:path),+)?) => {
        impl<T: GetTypeMeta $($(+ $bound)+)?> GetTypeMeta for $ty<T> {
            fn get_type_meta() -> TypeMeta {
                TypeMeta::container::<Self>(SeqExtractor::<Self>::new()).with_default::<Self>()
            }

            fn register_dependencies(registry: &mut TypeRegistry) {
                registry.register::<T>();
            }
        }
    };
}

impl_sequence_meta!(Vec);
impl_sequence_meta!(VecDeque);
impl_sequence_meta!(BTreeSet: Ord);
impl_sequence_meta!(HashSet: Eq, Hash);

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn list_keeps_order() {
        let extractor = SeqExtractor::<Vec<i32>>::new();
        assert_eq!(extractor.kind(), ExtractorKind::List);

        let value = vec![3, 1, 2];
        let parts = extractor.extract(&value).unwrap();
        let items: Vec<i32> = parts
            .iter()
            .map(|p| *p.downcast_ref::<i32>().unwrap())
            .collect();
        assert_eq!(items, [3, 1, 2]);

        let rebuilt = extractor
            .emplace(vec![Box::new(4_i32), Box::new(5_i32)], None)
            .unwrap();
        assert_eq!(rebuilt.take::<Vec<i32>>().unwrap(), [4, 5]);
    }

    #[test]
    fn set_drops_duplicates() {
        let extractor = SeqExtractor::<BTreeSet<u8>>::new();
        assert_eq!(extractor.kind(), ExtractorKind::Set);

        let rebuilt = extractor
            .emplace(vec![Box::new(2_u8), Box::new(1_u8), Box::new(2_u8)], None)
            .unwrap();
        let set = rebuilt.take::<BTreeSet<u8>>().unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), [1, 2]);
    }

    #[test]
    fn wrong_item_type() {
        let extractor = SeqExtractor::<VecDeque<u8>>::new();
        let err = extractor
            .emplace(vec![Box::new(1_u8), Box::new(1_i8)], None)
            .unwrap_err();
        assert_eq!(
            err,
            ReflectError::TypeMismatch {
                expected: "u8",
                found: "i8"
            }
        );
    }
}
