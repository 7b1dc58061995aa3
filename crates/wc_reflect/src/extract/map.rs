use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::any::TypeId;
use core::hash::Hash;
use core::marker::PhantomData;
use std::collections::HashMap;

use crate::extract::{Extractor, ExtractorKind, Part, expect_ref, take_part};
use crate::registry::{GetTypeMeta, TypeMeta, TypeRegistry};
use crate::{Owner, Reflect, ReflectError};

// -----------------------------------------------------------------------------
// Mapping

/// A key/value collection that can be walked and refilled.
///
/// Implementors that keep several values per key report
/// [`ExtractorKind::MultiMap`] and must keep every inserted entry.
pub trait Mapping: Reflect + Default {
    type Key: Reflect;
    type Value: Reflect;

    const KIND: ExtractorKind = ExtractorKind::Map;

    fn entries(&self) -> impl Iterator<Item = (&Self::Key, &Self::Value)>;

    fn insert_entry(&mut self, key: Self::Key, value: Self::Value);
}

impl<K: Reflect + Ord, V: Reflect> Mapping for BTreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        self.iter()
    }

    #[inline]
    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

impl<K: Reflect + Eq + Hash, V: Reflect> Mapping for HashMap<K, V> {
    type Key = K;
    type Value = V;

    fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        self.iter()
    }

    #[inline]
    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

// -----------------------------------------------------------------------------
// MapExtractor

/// Extractor of any [`Mapping`]. Parts alternate key and value.
pub struct MapExtractor<M> {
    subtypes: [TypeId; 2],
    _marker: PhantomData<fn() -> M>,
}

impl<M: Mapping> MapExtractor<M> {
    pub fn new() -> Self {
        Self {
            subtypes: [TypeId::of::<M::Key>(), TypeId::of::<M::Value>()],
            _marker: PhantomData,
        }
    }
}

impl<M: Mapping> Extractor for MapExtractor<M> {
    fn kind(&self) -> ExtractorKind {
        M::KIND
    }

    fn subtypes(&self) -> &[TypeId] {
        &self.subtypes
    }

    fn extract<'a>(&self, value: &'a dyn Reflect) -> Result<Vec<Part<'a>>, ReflectError> {
        let map = expect_ref::<M>(value)?;
        let mut parts = Vec::new();
        for (key, value) in map.entries() {
            parts.push(Part::Borrowed(key));
            parts.push(Part::Borrowed(value));
        }
        Ok(parts)
    }

    fn emplace(
        &self,
        parts: Vec<Box<dyn Reflect>>,
        _owner: Option<&Owner>,
    ) -> Result<Box<dyn Reflect>, ReflectError> {
        if parts.len() % 2 != 0 {
            return Err(ReflectError::part_count::<M>(parts.len() + 1, parts.len()));
        }
        let mut map = M::default();
        let mut parts = parts.into_iter();
        while let (Some(key), Some(value)) = (parts.next(), parts.next()) {
            map.insert_entry(take_part::<M::Key>(key)?, take_part::<M::Value>(value)?);
        }
        Ok(Box::new(map))
    }
}

impl<K: GetTypeMeta + Ord, V: GetTypeMeta> GetTypeMeta for BTreeMap<K, V> {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::container::<Self>(MapExtractor::<Self>::new()).with_default::<Self>()
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<K>();
        registry.register::<V>();
    }
}

impl<K: GetTypeMeta + Eq + Hash, V: GetTypeMeta> GetTypeMeta for HashMap<K, V> {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::container::<Self>(MapExtractor::<Self>::new()).with_default::<Self>()
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<K>();
        registry.register::<V>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec;

    #[test]
    fn parts_alternate() {
        let extractor = MapExtractor::<BTreeMap<String, i32>>::new();
        let mut map = BTreeMap::new();
        map.insert(String::from("a"), 1);
        map.insert(String::from("b"), 2);

        let parts = extractor.extract(&map).unwrap();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[2].downcast_ref::<String>().map(String::as_str), Some("b"));
        assert_eq!(parts[3].downcast_ref::<i32>(), Some(&2));
    }

    #[test]
    fn odd_parts_are_rejected() {
        let extractor = MapExtractor::<HashMap<String, i32>>::new();
        let err = extractor
            .emplace(vec![Box::new(String::from("a"))], None)
            .unwrap_err();
        assert!(matches!(err, ReflectError::PartCount { found: 1, .. }));

        let rebuilt = extractor
            .emplace(vec![Box::new(String::from("a")), Box::new(7_i32)], None)
            .unwrap();
        let map = rebuilt.take::<HashMap<String, i32>>().unwrap();
        assert_eq!(map.get("a"), Some(&7));
    }
}
