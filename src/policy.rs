//! Reporting level resolution.
//!
//! The level applying to a `(target, key)` pair is resolved in this order:
//!
//! 1. the per-property override on the target,
//! 2. the general level on the target,
//! 3. the per-property override on the target's class,
//! 4. the general level on the target's class,
//! 5. the global default level.
//!
//! The global default and the class annotations form a [`LevelPolicy`]. A
//! policy can be passed around explicitly, or the process-wide instance can be
//! used through the free functions of this module. The process-wide global
//! level starts out as [`Level::All`].
//!
//! # Examples
//!
//! ```
//! use typeledger::{
//!     level::Level,
//!     policy::LevelPolicy,
//!     target::{Annotated, PropertyLevels},
//! };
//!
//! struct Point;
//!
//! let mut policy = LevelPolicy::new().with_global_level(Level::Once);
//! policy.set_class_level::<Point>(
//!     None,
//!     Some(PropertyLevels::from_iter([("x", Level::Never)])),
//! );
//!
//! let point = Annotated::new(Point);
//! assert_eq!(policy.resolve(&point, "x"), Level::Never);
//! assert_eq!(policy.resolve(&point, "y"), Level::Once);
//! ```

use core::any::TypeId;

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;
use triomphe::Arc;

use crate::{
    level::Level,
    lock::StateLock,
    target::{Annotations, PropertyLevels, Target},
};

type ClassTable = HashMap<TypeId, Arc<Annotations>, FxBuildHasher>;

/// Name of the environment variable read by [`init_global_level_from_env`].
#[cfg(feature = "std")]
pub const LEVEL_ENV_VAR: &str = "TYPELEDGER_LEVEL";

/// A global default level together with the annotations registered for
/// classes.
///
/// Cloning is cheap: class annotations are shared until one of the clones
/// modifies them.
#[derive(Clone, Debug, Default)]
pub struct LevelPolicy {
    global: Level,
    classes: ClassTable,
}

impl LevelPolicy {
    /// Creates a policy with [`Level::All`] as the global level and no class
    /// annotations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the policy with its global level replaced.
    #[must_use]
    pub fn with_global_level(mut self, level: Level) -> Self {
        self.global = level;
        self
    }

    /// The level used when neither the target nor its class prescribe one.
    #[must_use]
    pub fn global_level(&self) -> Level {
        self.global
    }

    /// Sets the global level.
    pub fn set_global_level(&mut self, level: Level) {
        self.global = level;
    }

    /// Returns the annotations registered for the class `C`, if any.
    #[must_use]
    pub fn class_annotations<C: ?Sized + 'static>(&self) -> Option<&Annotations> {
        self.annotations_of(TypeId::of::<C>())
    }

    /// Returns the annotations registered for the class identified by `class`.
    #[must_use]
    pub fn annotations_of(&self, class: TypeId) -> Option<&Annotations> {
        self.classes.get(&class).map(|annotations| &**annotations)
    }

    /// Sets the general level of the class `C`. `None` clears it.
    pub fn set_class_general_level<C: ?Sized + 'static>(&mut self, level: Option<Level>) {
        self.update_class(TypeId::of::<C>(), |annotations| {
            annotations.set_general_level(level);
        });
    }

    /// Replaces the per-property overrides of the class `C`. `None` clears all
    /// of them.
    pub fn set_class_property_levels<C: ?Sized + 'static>(
        &mut self,
        levels: Option<PropertyLevels>,
    ) {
        self.update_class(TypeId::of::<C>(), |annotations| {
            annotations.set_property_levels(levels);
        });
    }

    /// Sets both the general level and the per-property overrides of the class
    /// `C`.
    pub fn set_class_level<C: ?Sized + 'static>(
        &mut self,
        general: Option<Level>,
        properties: Option<PropertyLevels>,
    ) {
        self.update_class(TypeId::of::<C>(), |annotations| {
            annotations.set_general_level(general);
            annotations.set_property_levels(properties);
        });
    }

    /// Runs `update` on the annotations of `class`, creating them when needed.
    /// Annotations left empty are dropped from the table.
    ///
    /// Returns `true` if the class was left without annotations.
    pub fn update_class(
        &mut self,
        class: TypeId,
        update: impl FnOnce(&mut Annotations),
    ) -> bool {
        let entry = self.classes.entry(class).or_default();
        let annotations = Arc::make_mut(entry);
        update(annotations);

        let cleared = annotations.is_empty();
        if cleared {
            self.classes.remove(&class);
        }
        cleared
    }

    /// Resolves the level applying to `key` on `target`.
    ///
    /// This never fails. A target without a class only consults its own
    /// annotations and the global level.
    #[must_use]
    pub fn resolve<T>(&self, target: &T, key: &str) -> Level
    where
        T: Target + ?Sized,
    {
        target
            .annotations()
            .level_for(key)
            .unwrap_or_else(|| self.resolve_for_class(target.class_id(), key))
    }

    fn resolve_for_class(&self, class: Option<TypeId>, key: &str) -> Level {
        class
            .and_then(|class| self.annotations_of(class))
            .and_then(|annotations| annotations.level_for(key))
            .unwrap_or(self.global)
    }
}

static POLICY: StateLock<LevelPolicy> = StateLock::new();

/// Returns the process-wide global level.
#[must_use]
pub fn global_level() -> Level {
    POLICY.read(|policy| policy.map_or(Level::default(), LevelPolicy::global_level))
}

/// Sets the process-wide global level.
pub fn set_global_level(level: Level) {
    POLICY.update(|policy| policy.set_global_level(level));
    tracing::debug!(%level, "set global reporting level");
}

/// Returns the annotations registered process-wide for the class `C`.
#[must_use]
pub fn class_annotations<C: ?Sized + 'static>() -> Option<Arc<Annotations>> {
    POLICY.read(|policy| policy?.classes.get(&TypeId::of::<C>()).cloned())
}

/// Sets the process-wide general level of the class `C`. `None` clears it.
pub fn set_class_general_level<C: ?Sized + 'static>(level: Option<Level>) {
    update_class::<C>(|annotations| annotations.set_general_level(level));
}

/// Replaces the process-wide per-property overrides of the class `C`. `None`
/// clears all of them.
pub fn set_class_property_levels<C: ?Sized + 'static>(levels: Option<PropertyLevels>) {
    update_class::<C>(|annotations| annotations.set_property_levels(levels));
}

/// Sets both the process-wide general level and per-property overrides of the
/// class `C`.
pub fn set_class_level<C: ?Sized + 'static>(
    general: Option<Level>,
    properties: Option<PropertyLevels>,
) {
    update_class::<C>(|annotations| {
        annotations.set_general_level(general);
        annotations.set_property_levels(properties);
    });
}

fn update_class<C: ?Sized + 'static>(update: impl FnOnce(&mut Annotations)) {
    let class = TypeId::of::<C>();
    let cleared = POLICY.update(|policy| policy.update_class(class, update));
    // Logged after the lock is released so subscribers may query the policy.
    tracing::debug!(?class, cleared, "updated class reporting levels");
}

/// Resolves the level applying to `key` on `target` using the process-wide
/// policy.
///
/// ```
/// use typeledger::{
///     level::Level,
///     policy::resolve_level,
///     target::{Annotations, set_general_level},
/// };
///
/// let mut target = Annotations::new();
/// assert_eq!(resolve_level(&target, "x"), Level::All);
///
/// set_general_level(&mut target, Some(Level::Never));
/// assert_eq!(resolve_level(&target, "x"), Level::Never);
/// ```
#[must_use]
pub fn resolve_level<T>(target: &T, key: &str) -> Level
where
    T: Target + ?Sized,
{
    if let Some(level) = target.annotations().level_for(key) {
        return level;
    }

    let class = target.class_id();
    POLICY.read(|policy| match policy {
        Some(policy) => policy.resolve_for_class(class, key),
        None => Level::default(),
    })
}

/// Returns a copy of the process-wide policy.
#[must_use]
pub fn snapshot() -> LevelPolicy {
    POLICY.read(|policy| policy.cloned().unwrap_or_default())
}

/// Replaces the process-wide policy, returning the previous one.
pub fn install(policy: LevelPolicy) -> LevelPolicy {
    let global = policy.global;
    let previous = POLICY.replace(Some(policy)).unwrap_or_default();
    tracing::debug!(%global, "installed reporting level policy");
    previous
}

/// Restores the process-wide policy to its initial state.
pub fn reset() {
    POLICY.replace(None);
}

/// Sets the process-wide global level from the [`LEVEL_ENV_VAR`] environment
/// variable and returns it.
///
/// The value is normalized like any other textual level, so an unset or
/// unrecognized variable yields [`Level::All`].
#[cfg(feature = "std")]
pub fn init_global_level_from_env() -> Level {
    let raw = std::env::var(LEVEL_ENV_VAR).ok();
    let level = crate::level::validate_level(raw.as_deref());
    set_global_level(level);
    tracing::debug!(%level, raw = ?raw, "initialized global reporting level from environment");
    level
}
