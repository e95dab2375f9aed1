//! The type registry: a map from keys to the type tags observed for them.
//!
//! How a new observation changes the registry depends on the [`Level`] in
//! effect for its key. The level can be passed directly ([`add`], [`set`]) or
//! resolved against a [`Target`] through the process-wide policy
//! ([`add_for`], [`set_for`]).
//!
//! [`add`]: TypeRegistry::add
//! [`set`]: TypeRegistry::set
//! [`add_for`]: TypeRegistry::add_for
//! [`set_for`]: TypeRegistry::set_for
//!
//! # Examples
//!
//! ```
//! use typeledger::{level::Level, registry::TypeRegistry};
//!
//! let mut registry: TypeRegistry<&str, &str> = TypeRegistry::new();
//! registry.add("count", "number", Level::Once);
//! registry.add("count", "string", Level::Once);
//!
//! let mut seen = Vec::new();
//! registry.get("count", |ty| seen.push(*ty));
//! assert_eq!(seen, ["number", "string"]);
//! ```

use core::{fmt, hash::Hash};

use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use typeledger_internals::{Equivalent, MapOfSets};

use crate::{
    level::Level,
    policy::{global_level, resolve_level},
    target::Target,
};

/// The set of type tags recorded for one key. Iterates in insertion order.
pub type TypeSet<T> = IndexSet<T, FxBuildHasher>;

/// Merges the types of a source registry into an existing destination set.
///
/// Unions `source` into `target`: members already in `target` keep their
/// position, new members are appended in source order.
pub fn default_merge<K, T>(_key: &K, target: &mut TypeSet<T>, source: &TypeSet<T>, _level: Level)
where
    T: Hash + Eq + Clone,
{
    for ty in source {
        if !target.contains(ty) {
            target.insert(ty.clone());
        }
    }
}

/// A registry of the type tags observed per key.
///
/// Every key present maps to a non-empty [`TypeSet`]; emptying a set removes
/// its key. Cloning a registry copies every set, so the clone can be mutated
/// independently.
#[derive(Clone)]
pub struct TypeRegistry<K, T> {
    storage: MapOfSets<K, T>,
}

impl<K, T> Default for TypeRegistry<K, T> {
    fn default() -> Self {
        Self {
            storage: MapOfSets::new(),
        }
    }
}

impl<K, T> fmt::Debug for TypeRegistry<K, T>
where
    K: fmt::Debug,
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeRegistry").field(&self.storage).finish()
    }
}

impl<K, T> PartialEq for TypeRegistry<K, T>
where
    K: Hash + Eq,
    T: Hash + Eq,
{
    fn eq(&self, other: &Self) -> bool {
        self.storage == other.storage
    }
}

impl<K, T> Eq for TypeRegistry<K, T>
where
    K: Hash + Eq,
    T: Hash + Eq,
{
}

impl<K, T> TypeRegistry<K, T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys with recorded types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns `true` if no types are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Iterates over the keys with recorded types.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.storage.keys()
    }

    /// Iterates over `(key, types)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &TypeSet<T>)> {
        self.storage.iter()
    }

    /// Forgets every recorded type.
    pub fn clear(&mut self) {
        self.storage.clear();
    }
}

impl<K, T> TypeRegistry<K, T>
where
    K: Hash + Eq,
    T: Hash + Eq,
{
    /// Returns `true` if at least one type is recorded for `key`.
    #[must_use]
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.storage.has(key)
    }

    /// Returns `true` if `ty` is recorded for `key`.
    #[must_use]
    pub fn has_type<Q, R>(&self, key: &Q, ty: &R) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
        R: ?Sized + Hash + Equivalent<T>,
    {
        self.storage.has_value(key, ty)
    }

    /// Calls `visit` once for every type recorded for `key`, in set order.
    /// Does nothing when nothing is recorded.
    pub fn get<Q>(&self, key: &Q, mut visit: impl FnMut(&T))
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.storage.each_value(key, |ty, _| visit(ty));
    }

    /// Returns the types recorded for `key`, if any.
    #[must_use]
    pub fn types<Q>(&self, key: &Q) -> Option<&TypeSet<T>>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.storage.get(key)
    }

    /// Records an observation of `ty` for `key` under `level`.
    ///
    /// Nothing happens when `ty` is `None`. Otherwise:
    ///
    /// - [`Level::Never`] removes everything recorded for `key`.
    /// - [`Level::Once`] adds `ty` unless it is already recorded.
    /// - [`Level::All`] records `ty` only if nothing is recorded for `key` yet.
    ///   Later observations are ignored, so the first type wins permanently.
    ///
    /// ```
    /// use typeledger::{level::Level, registry::TypeRegistry};
    ///
    /// let mut registry: TypeRegistry<&str, &str> = TypeRegistry::new();
    /// registry.add("x", "number", Level::All);
    /// registry.add("x", "string", Level::All);
    /// assert!(registry.has_type("x", "number"));
    /// assert!(!registry.has_type("x", "string"));
    ///
    /// registry.add("x", None, Level::Never);
    /// assert!(registry.has("x"));
    /// registry.add("x", "string", Level::Never);
    /// assert!(!registry.has("x"));
    /// ```
    pub fn add(&mut self, key: K, ty: impl Into<Option<T>>, level: Level) {
        let Some(ty) = ty.into() else {
            return;
        };

        match level {
            Level::Never => {
                if self.storage.remove(&key).is_some() {
                    tracing::trace!(%level, "discarded recorded types");
                }
            }
            Level::Once => {
                self.storage.add(key, ty);
            }
            Level::All => {
                if !self.storage.has(&key) {
                    self.storage.set(key, [ty]);
                }
            }
        }
    }

    /// Replaces the types recorded for `key` with `types`.
    ///
    /// The key is removed instead when `types` is empty or `level` is
    /// [`Level::Never`].
    pub fn set<I>(&mut self, key: K, types: I, level: Level)
    where
        I: IntoIterator<Item = T>,
    {
        if level == Level::Never {
            self.storage.remove(&key);
        } else {
            self.storage.set(key, types);
        }
    }

    /// Removes `key`, returning the types that were recorded for it.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<TypeSet<T>>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.storage.remove(key)
    }

    /// Removes a single type from `key`. Removing the last type removes the
    /// key. Returns `true` if the type was recorded.
    pub fn remove_type<Q, R>(&mut self, key: &Q, ty: &R) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
        R: ?Sized + Hash + Equivalent<T>,
    {
        self.storage.remove_value(key, ty)
    }
}

impl<K, T> TypeRegistry<K, T>
where
    K: Hash + Eq + AsRef<str>,
    T: Hash + Eq,
{
    /// Like [`add`](Self::add), with the level resolved for `key` on `target`
    /// through the process-wide policy.
    pub fn add_for<R>(&mut self, key: K, ty: impl Into<Option<T>>, target: &R)
    where
        R: Target + ?Sized,
    {
        let level = resolve_level(target, key.as_ref());
        self.add(key, ty, level);
    }

    /// Like [`set`](Self::set), with the level resolved for `key` on `target`
    /// through the process-wide policy.
    pub fn set_for<I, R>(&mut self, key: K, types: I, target: &R)
    where
        I: IntoIterator<Item = T>,
        R: Target + ?Sized,
    {
        let level = resolve_level(target, key.as_ref());
        self.set(key, types, level);
    }
}

impl<K, T> TypeRegistry<K, T>
where
    K: Hash + Eq + Clone + AsRef<str>,
    T: Hash + Eq + Clone,
{
    /// Copies every key of this registry into `destination`, merging with
    /// [`default_merge`] where the destination already has types for a key.
    ///
    /// See [`copy_to_with`](Self::copy_to_with).
    pub fn copy_to(&self, destination: &mut TypeRegistry<K, T>, target: Option<&dyn Target>) {
        self.copy_to_with(destination, target, default_merge);
    }

    /// Copies every key of this registry into `destination`.
    ///
    /// For each key the level is resolved against `target`, or taken from the
    /// process-wide global level when there is no target. Keys resolving to
    /// [`Level::Never`] are skipped. Otherwise the source types are handed to
    /// `merge` together with the destination set when the destination already
    /// has the key, or copied as a fresh set when it does not. A merge that
    /// empties the destination set removes the key.
    ///
    /// Unlike [`add_for`](Self::add_for), the target is a trait object so that
    /// a bare `None` needs no type annotation. Any `&impl Target` coerces to it.
    ///
    /// ```
    /// use typeledger::{
    ///     level::Level,
    ///     registry::{TypeRegistry, TypeSet},
    /// };
    ///
    /// let mut source = TypeRegistry::new();
    /// source.set("a", [1, 2], Level::All);
    ///
    /// let mut destination = TypeRegistry::new();
    /// destination.set("a", [2, 3], Level::All);
    ///
    /// // Replace instead of union.
    /// source.copy_to_with(
    ///     &mut destination,
    ///     None,
    ///     |_key, target: &mut TypeSet<i32>, source: &TypeSet<i32>, _level| {
    ///         *target = source.clone();
    ///     },
    /// );
    /// let types: Vec<_> = destination.types("a").into_iter().flatten().copied().collect();
    /// assert_eq!(types, [1, 2]);
    /// ```
    pub fn copy_to_with<M>(
        &self,
        destination: &mut TypeRegistry<K, T>,
        target: Option<&dyn Target>,
        mut merge: M,
    ) where
        M: FnMut(&K, &mut TypeSet<T>, &TypeSet<T>, Level),
    {
        for (key, types) in &self.storage {
            let level = match target {
                Some(target) => resolve_level(target, key.as_ref()),
                None => global_level(),
            };

            match level {
                Level::Never => {
                    tracing::trace!(key = key.as_ref(), "skipped copying types");
                }
                Level::Once | Level::All => {
                    let merged = destination
                        .storage
                        .update(key, |existing| merge(key, existing, types, level));
                    if !merged {
                        destination.storage.set(key.clone(), types.iter().cloned());
                    }
                }
            }
        }
    }
}
