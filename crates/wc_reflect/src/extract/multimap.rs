use alloc::vec::Vec;

use crate::Reflect;
use crate::extract::{ExtractorKind, MapExtractor, Mapping};
use crate::registry::{GetTypeMeta, TypeMeta, TypeRegistry};

/// An insertion-ordered map allowing several values per key.
///
/// # Examples
///
/// ```
/// use wc_reflect::extract::MultiMap;
///
/// let mut map = MultiMap::new();
/// map.insert("a", 1);
/// map.insert("b", 2);
/// map.insert("a", 3);
///
/// assert_eq!(map.len(), 3);
/// assert_eq!(map.get_all(&"a").copied().collect::<Vec<_>>(), [1, 3]);
/// assert_eq!(map.unique_keys().collect::<Vec<_>>(), [&"a", &"b"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiMap<K, V> {
    entries: Vec<(K, V)>,
}

impl<K, V> Default for MultiMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K, V> MultiMap<K, V> {
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends an entry, keeping earlier values of the same key.
    #[inline]
    pub fn insert(&mut self, key: K, value: V) {
        self.entries.push((key, value));
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl<K: PartialEq, V> MultiMap<K, V> {
    /// All values of `key` in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a K) -> impl Iterator<Item = &'a V> {
        self.entries
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Each distinct key once, in order of first insertion.
    pub fn unique_keys(&self) -> impl Iterator<Item = &K> {
        let entries = &self.entries;
        entries
            .iter()
            .enumerate()
            .filter(move |(i, (k, _))| !entries[..*i].iter().any(|(prev, _)| prev == k))
            .map(|(_, (k, _))| k)
    }
}

impl<K, V> FromIterator<(K, V)> for MultiMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<K, V> IntoIterator for MultiMap<K, V> {
    type Item = (K, V);
    type IntoIter = alloc::vec::IntoIter<(K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Reflect, V: Reflect> Mapping for MultiMap<K, V> {
    type Key = K;
    type Value = V;

    const KIND: ExtractorKind = ExtractorKind::MultiMap;

    fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        self.iter()
    }

    #[inline]
    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

impl<K: GetTypeMeta, V: GetTypeMeta> GetTypeMeta for MultiMap<K, V> {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::container::<Self>(MapExtractor::<Self>::new()).with_default::<Self>()
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<K>();
        registry.register::<V>();
    }
}
