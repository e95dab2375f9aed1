//! A map from keys to non-empty, insertion-ordered sets of values.

use core::{
    fmt,
    hash::{BuildHasher, Hash},
};

use indexmap::{Equivalent, IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;

/// The set type stored for every key of a [`MapOfSets`].
///
/// Values iterate in insertion order.
pub type ValueSet<V, S = FxBuildHasher> = IndexSet<V, S>;

/// A map from keys to sets of values.
///
/// You can think of a [`MapOfSets<K, V>`] as an `IndexMap<K, IndexSet<V>>`
/// with one extra guarantee: a key that is present always maps to a non-empty
/// set. Emptying a set, either by [`set`](Self::set)ting it to nothing or by
/// [`remove_value`](Self::remove_value)ing its last member, removes the key.
///
/// Cloning is deep: the sets of the clone are independent copies.
///
/// # Examples
///
/// ```
/// use typeledger_internals::MapOfSets;
///
/// let mut map: MapOfSets<&str, &str> = MapOfSets::new();
/// map.add("value", "number");
/// map.add("value", "string");
/// map.add("value", "number");
///
/// assert!(map.has("value"));
/// assert_eq!(map.get("value").map(|set| set.len()), Some(2));
///
/// map.set("value", []);
/// assert!(!map.has("value"));
/// ```
#[derive(Clone)]
pub struct MapOfSets<K, V, S = FxBuildHasher> {
    /// # Invariant
    ///
    /// No set stored in this map is empty.
    storage: IndexMap<K, IndexSet<V, S>, S>,
}

impl<K, V, S> Default for MapOfSets<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self {
            storage: IndexMap::default(),
        }
    }
}

impl<K, V, S> fmt::Debug for MapOfSets<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.storage.iter()).finish()
    }
}

impl<K, V, S> PartialEq for MapOfSets<K, V, S>
where
    K: Hash + Eq,
    V: Hash + Eq,
    S: BuildHasher,
{
    /// Two maps are equal when they hold the same keys mapped to the same
    /// sets, regardless of order.
    fn eq(&self, other: &Self) -> bool {
        self.storage == other.storage
    }
}

impl<K, V, S> Eq for MapOfSets<K, V, S>
where
    K: Hash + Eq,
    V: Hash + Eq,
    S: BuildHasher,
{
}

impl<K, V, S> MapOfSets<K, V, S>
where
    S: Default,
{
    /// Creates an empty map. It will not allocate until values are added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, V, S> MapOfSets<K, V, S> {
    /// Returns the number of keys in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns `true` if the map holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Iterates over the keys in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, K, IndexSet<V, S>> {
        self.storage.keys()
    }

    /// Iterates over `(key, set)` pairs in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, K, IndexSet<V, S>> {
        self.storage.iter()
    }

    /// Calls `callback` once for every value of every key, passing the value
    /// and the key it belongs to.
    pub fn for_each(&self, mut callback: impl FnMut(&V, &K)) {
        for (key, values) in &self.storage {
            for value in values {
                callback(value, key);
            }
        }
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.storage.clear();
    }
}

impl<K, V, S> MapOfSets<K, V, S>
where
    K: Hash + Eq,
    V: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Returns `true` if `key` maps to a non-empty set.
    #[must_use]
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.storage.get(key).is_some_and(|values| !values.is_empty())
    }

    /// Returns `true` if the set stored for `key` contains `value`.
    #[must_use]
    pub fn has_value<Q, R>(&self, key: &Q, value: &R) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
        R: ?Sized + Hash + Equivalent<V>,
    {
        self.storage
            .get(key)
            .is_some_and(|values| values.contains(value))
    }

    /// Returns the set stored for `key`, if any.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&IndexSet<V, S>>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.storage.get(key)
    }

    /// Calls `callback` once for every value stored for `key`, in set order.
    /// Does nothing when the key is absent.
    pub fn each_value<Q>(&self, key: &Q, mut callback: impl FnMut(&V, &K))
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        if let Some((key, values)) = self.storage.get_key_value(key) {
            for value in values {
                callback(value, key);
            }
        }
    }

    /// Adds `value` to the set of `key`, creating the set when needed.
    ///
    /// Returns `true` if the value was not present before.
    pub fn add(&mut self, key: K, value: V) -> bool {
        self.storage.entry(key).or_default().insert(value)
    }

    /// Replaces the set of `key` with the collected `values`.
    ///
    /// An empty `values` removes the key.
    pub fn set<I>(&mut self, key: K, values: I)
    where
        I: IntoIterator<Item = V>,
    {
        let values: IndexSet<V, S> = values.into_iter().collect();
        if values.is_empty() {
            self.storage.shift_remove(&key);
        } else {
            self.storage.insert(key, values);
        }
    }

    /// Removes `key` and returns its set, if any.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<IndexSet<V, S>>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.storage.shift_remove(key)
    }

    /// Removes `value` from the set of `key`. Removing the last value removes
    /// the key.
    ///
    /// Returns `true` if the value was present.
    pub fn remove_value<Q, R>(&mut self, key: &Q, value: &R) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
        R: ?Sized + Hash + Equivalent<V>,
    {
        let Some(values) = self.storage.get_mut(key) else {
            return false;
        };

        let removed = values.shift_remove(value);
        if values.is_empty() {
            self.storage.shift_remove(key);
        }
        removed
    }

    /// Runs `update` on the set stored for `key` in place. If the set is empty
    /// afterwards, the key is removed.
    ///
    /// Returns `false` without calling `update` when the key is absent.
    pub fn update<Q>(&mut self, key: &Q, update: impl FnOnce(&mut IndexSet<V, S>)) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let Some(values) = self.storage.get_mut(key) else {
            return false;
        };

        update(values);
        if values.is_empty() {
            self.storage.shift_remove(key);
        }
        true
    }
}

impl<'a, K, V, S> IntoIterator for &'a MapOfSets<K, V, S> {
    type Item = (&'a K, &'a IndexSet<V, S>);
    type IntoIter = indexmap::map::Iter<'a, K, IndexSet<V, S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.storage.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_of_sets_send_sync() {
        static_assertions::assert_impl_all!(MapOfSets<u32, u32>: Send, Sync, Clone, Default);
        static_assertions::assert_not_impl_any!(MapOfSets<u32, u32>: Copy);
    }

    #[test]
    fn test_update_removes_emptied_set() {
        let mut map: MapOfSets<u8, u8> = MapOfSets::new();
        map.add(1, 10);

        assert!(map.update(&1, |values| values.clear()));
        assert!(!map.has(&1));
        assert!(map.is_empty());
        assert!(!map.update(&1, |_| unreachable!()));
    }
}
