//! Per-target reporting level annotations.
//!
//! A *target* is any value against which reporting levels can be overridden,
//! typically the object whose properties are being type-checked. Every target
//! carries [`Annotations`]: an optional general [`Level`] and an optional set
//! of per-property overrides ([`PropertyLevels`]). A target may also name a
//! class whose annotations act as a fallback; see
//! [`resolve_level`](crate::policy::resolve_level) for the lookup order.
//!
//! # Examples
//!
//! ```
//! use typeledger::{
//!     level::Level,
//!     target::{Annotated, PropertyLevels, set_level},
//! };
//!
//! struct User {
//!     name: String,
//! }
//!
//! let mut user = Annotated::new(User {
//!     name: "ada".to_string(),
//! });
//! set_level(
//!     &mut user,
//!     Some(Level::Once),
//!     Some(PropertyLevels::from_iter([("name", Level::Never)])),
//! );
//!
//! assert_eq!(user.name, "ada");
//! assert_eq!(user.annotations().level_for("name"), Some(Level::Never));
//! assert_eq!(user.annotations().level_for("age"), Some(Level::Once));
//! ```

use alloc::boxed::Box;
use core::{
    any::{Any, TypeId},
    ops::{Deref, DerefMut},
};

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

use crate::level::{Level, validate_level};

/// Per-property reporting level overrides, keyed by property name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyLevels(HashMap<Box<str>, Level, FxBuildHasher>);

impl PropertyLevels {
    /// Creates an empty set of overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds overrides from textual levels, normalizing each value with
    /// [`validate_level`].
    ///
    /// ```
    /// use typeledger::{level::Level, target::PropertyLevels};
    ///
    /// let levels = PropertyLevels::from_raw([("id", Some("never")), ("tags", Some("bogus")), ("x", None)]);
    /// assert_eq!(levels.get("id"), Some(Level::Never));
    /// assert_eq!(levels.get("tags"), Some(Level::All));
    /// assert_eq!(levels.get("x"), Some(Level::All));
    /// ```
    pub fn from_raw<'a, K, I>(levels: I) -> Self
    where
        K: Into<Box<str>>,
        I: IntoIterator<Item = (K, Option<&'a str>)>,
    {
        levels
            .into_iter()
            .map(|(key, raw)| (key, validate_level(raw)))
            .collect()
    }

    /// Sets the override for `key`, returning the previous one.
    pub fn insert(&mut self, key: impl Into<Box<str>>, level: Level) -> Option<Level> {
        self.0.insert(key.into(), level)
    }

    /// Removes the override for `key`, returning it.
    pub fn remove(&mut self, key: &str) -> Option<Level> {
        self.0.remove(key)
    }

    /// Returns the override for exactly `key`, if one is present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Level> {
        self.0.get(key).copied()
    }

    /// Returns `true` if an override exists for exactly `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no overrides.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(property, level)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Level)> {
        self.0.iter().map(|(key, level)| (&**key, *level))
    }
}

impl<K> FromIterator<(K, Level)> for PropertyLevels
where
    K: Into<Box<str>>,
{
    fn from_iter<I: IntoIterator<Item = (K, Level)>>(iter: I) -> Self {
        let mut levels = PropertyLevels::new();
        levels.extend(iter);
        levels
    }
}

impl<K> Extend<(K, Level)> for PropertyLevels
where
    K: Into<Box<str>>,
{
    fn extend<I: IntoIterator<Item = (K, Level)>>(&mut self, iter: I) {
        for (key, level) in iter {
            self.insert(key, level);
        }
    }
}

/// Reporting level state attached to a target or a class.
///
/// Both parts are optional. An absent part means "inherit": resolution moves
/// on to the next holder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Annotations {
    general: Option<Level>,
    properties: Option<PropertyLevels>,
}

impl Annotations {
    /// Creates annotations with nothing set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            general: None,
            properties: None,
        }
    }

    /// The general level, applying to every property without an override.
    #[must_use]
    pub fn general_level(&self) -> Option<Level> {
        self.general
    }

    /// The per-property overrides, if any are attached.
    #[must_use]
    pub fn property_levels(&self) -> Option<&PropertyLevels> {
        self.properties.as_ref()
    }

    /// Sets the general level. `None` clears it.
    pub fn set_general_level(&mut self, level: Option<Level>) {
        self.general = level;
    }

    /// Replaces the per-property overrides wholesale. `None` clears all of
    /// them.
    pub fn set_property_levels(&mut self, levels: Option<PropertyLevels>) {
        self.properties = levels;
    }

    /// Returns the level these annotations prescribe for `key`: the property
    /// override when one exists for exactly `key`, otherwise the general level.
    ///
    /// An explicit [`Level::Never`] is returned like any other level; only an
    /// absent value falls through.
    #[must_use]
    pub fn level_for(&self, key: &str) -> Option<Level> {
        self.properties
            .as_ref()
            .and_then(|properties| properties.get(key))
            .or(self.general)
    }

    /// Returns `true` when neither a general level nor overrides are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.general.is_none() && self.properties.is_none()
    }
}

/// A value that reporting levels can be attached to.
///
/// Implementors expose storage for their own [`Annotations`] and, optionally,
/// the identity of their class. Class annotations are registered separately
/// through [`policy`](crate::policy) and consulted when the target itself has
/// nothing to say about a key.
///
/// ```
/// use typeledger::target::{Annotations, Target};
///
/// struct Shape {
///     annotations: Annotations,
/// }
///
/// impl Target for Shape {
///     fn annotations(&self) -> &Annotations {
///         &self.annotations
///     }
///
///     fn annotations_mut(&mut self) -> &mut Annotations {
///         &mut self.annotations
///     }
/// }
/// ```
pub trait Target: Any {
    /// The annotations attached to this target.
    fn annotations(&self) -> &Annotations;

    /// Mutable access to the annotations attached to this target.
    fn annotations_mut(&mut self) -> &mut Annotations;

    /// The class whose annotations act as a fallback for this target.
    ///
    /// Defaults to the concrete type of the target. Returning `None` skips the
    /// class lookup entirely.
    fn class_id(&self) -> Option<TypeId> {
        Some(TypeId::of::<Self>())
    }
}

/// Free-standing annotations are a target without a class.
impl Target for Annotations {
    fn annotations(&self) -> &Annotations {
        self
    }

    fn annotations_mut(&mut self) -> &mut Annotations {
        self
    }

    fn class_id(&self) -> Option<TypeId> {
        None
    }
}

/// Wraps any value to make it a [`Target`] whose class is `T`.
///
/// The wrapper dereferences to the inner value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Annotated<T> {
    value: T,
    annotations: Annotations,
}

impl<T> Annotated<T> {
    /// Wraps `value` with empty annotations.
    pub const fn new(value: T) -> Self {
        Self {
            value,
            annotations: Annotations::new(),
        }
    }

    /// Wraps `value` with the given annotations.
    pub const fn with_annotations(value: T, annotations: Annotations) -> Self {
        Self { value, annotations }
    }

    /// The annotations of the wrapper.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Unwraps the inner value, discarding the annotations.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Annotated<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Annotated<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: 'static> Target for Annotated<T> {
    fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }

    fn class_id(&self) -> Option<TypeId> {
        Some(TypeId::of::<T>())
    }
}

/// Sets the general level of `target`. `None` clears it, so the target
/// inherits again.
pub fn set_general_level<T>(target: &mut T, level: Option<Level>)
where
    T: Target + ?Sized,
{
    target.annotations_mut().set_general_level(level);
}

/// Replaces the per-property overrides of `target`. `None` clears all of them.
pub fn set_property_levels<T>(target: &mut T, levels: Option<PropertyLevels>)
where
    T: Target + ?Sized,
{
    target.annotations_mut().set_property_levels(levels);
}

/// Sets both the general level and the per-property overrides of `target`.
pub fn set_level<T>(target: &mut T, general: Option<Level>, properties: Option<PropertyLevels>)
where
    T: Target + ?Sized,
{
    set_general_level(target, general);
    set_property_levels(target, properties);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotations_send_sync() {
        static_assertions::assert_impl_all!(Annotations: Send, Sync, Clone, Default);
        static_assertions::assert_impl_all!(Annotated<u8>: Target);
        static_assertions::assert_obj_safe!(Target);
    }

    #[test]
    fn test_property_override_beats_general() {
        let mut annotations = Annotations::new();
        set_level(
            &mut annotations,
            Some(Level::All),
            Some(PropertyLevels::from_iter([("x", Level::Never)])),
        );

        assert_eq!(annotations.level_for("x"), Some(Level::Never));
        assert_eq!(annotations.level_for("y"), Some(Level::All));

        set_property_levels(&mut annotations, None);
        assert_eq!(annotations.level_for("x"), Some(Level::All));

        set_general_level(&mut annotations, None);
        assert_eq!(annotations.level_for("x"), None);
        assert!(annotations.is_empty());
    }

    #[test]
    fn test_class_ids() {
        assert_eq!(Annotations::new().class_id(), None);
        assert_eq!(Annotated::new(1u8).class_id(), Some(TypeId::of::<u8>()));
    }
}
