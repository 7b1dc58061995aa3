use crate::WireValue;

/// A map of wire values with CBOR semantics.
///
/// Keys are arbitrary [`WireValue`]s and unique. Insertion order is kept for
/// stable output but ignored by equality.
#[derive(Debug, Clone, Default)]
pub struct WireMap {
    entries: Vec<(WireValue, WireValue)>,
}

impl WireMap {
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
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

    /// Inserts an entry, replacing and returning the value of an equal key.
    pub fn insert(
        &mut self,
        key: impl Into<WireValue>,
        value: impl Into<WireValue>,
    ) -> Option<WireValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(core::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Looks up a value by key.
    pub fn get(&self, key: &WireValue) -> Option<&WireValue> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Looks up a value by string key.
    pub fn get_str(&self, key: &str) -> Option<&WireValue> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k.as_str() == Some(key)).then_some(v))
    }

    pub fn contains_key(&self, key: &WireValue) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &WireValue) -> Option<WireValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&WireValue, &WireValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &WireValue> {
        self.entries.iter().map(|(k, _)| k)
    }
}

impl PartialEq for WireMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

impl IntoIterator for WireMap {
    type Item = (WireValue, WireValue);
    type IntoIter = alloc::vec::IntoIter<(WireValue, WireValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<WireValue>, V: Into<WireValue>> FromIterator<(K, V)> for WireMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = WireMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::WireMap;
    use crate::WireValue;

    #[test]
    fn insert_replaces_equal_keys() {
        let mut map = WireMap::new();
        assert_eq!(map.insert("a", 1), None);
        assert_eq!(map.insert("a", 2), Some(WireValue::from(1)));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get_str("a"), Some(&WireValue::from(2)));
    }

    #[test]
    fn equality_ignores_order() {
        let left: WireMap = [("a", 1), ("b", 2)].into_iter().collect();
        let right: WireMap = [("b", 2), ("a", 1)].into_iter().collect();
        assert_eq!(left, right);

        let other: WireMap = [("b", 2), ("a", 3)].into_iter().collect();
        assert_ne!(left, other);
    }
}
