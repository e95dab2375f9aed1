//! Integration tests for level resolution through the process-wide policy.
//!
//! The policy is global state, so every test holds [`POLICY_GUARD`] and starts
//! from [`policy::reset`].

use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicUsize, Ordering},
};

use tracing_subscriber::{
    Layer, Registry,
    layer::{Context, SubscriberExt},
};
use typeledger::{
    Annotated, Annotations, Level, LevelPolicy, PropertyLevels, Target, TypeRegistry,
    policy::{
        self, global_level, resolve_level, set_class_general_level, set_class_level,
        set_class_property_levels, set_global_level,
    },
    target::{set_general_level, set_level, set_property_levels},
};

static POLICY_GUARD: Mutex<()> = Mutex::new(());

fn fresh_policy() -> MutexGuard<'static, ()> {
    let guard = POLICY_GUARD
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    policy::reset();
    guard
}

fn overrides<const N: usize>(levels: [(&str, Level); N]) -> Option<PropertyLevels> {
    Some(PropertyLevels::from_iter(levels))
}

struct Account;

struct Session;

#[test]
fn test_global_level_defaults_to_all() {
    let _guard = fresh_policy();
    assert_eq!(global_level(), Level::All);

    set_global_level(Level::Never);
    assert_eq!(global_level(), Level::Never);
}

#[test]
fn test_unannotated_target_uses_global_level() {
    let _guard = fresh_policy();
    set_global_level(Level::Once);

    let target = Annotated::new(Account);
    assert_eq!(resolve_level(&target, "x"), Level::Once);
    assert_eq!(resolve_level(&Annotations::new(), "x"), Level::Once);
}

#[test]
fn test_resolution_order() {
    let _guard = fresh_policy();
    set_global_level(Level::Never);
    set_class_level::<Account>(
        Some(Level::Once),
        overrides([("class_key", Level::All), ("shared", Level::Never)]),
    );

    let mut target = Annotated::new(Account);
    set_level(
        &mut target,
        None,
        overrides([("instance_key", Level::Once), ("shared", Level::All)]),
    );

    // (a) per-key override on the target wins over everything else.
    assert_eq!(resolve_level(&target, "instance_key"), Level::Once);
    assert_eq!(resolve_level(&target, "shared"), Level::All);
    // (c) per-key override on the class.
    assert_eq!(resolve_level(&target, "class_key"), Level::All);
    // (d) general level on the class.
    assert_eq!(resolve_level(&target, "other"), Level::Once);

    // (b) general level on the target shadows everything on the class.
    set_general_level(&mut target, Some(Level::All));
    assert_eq!(resolve_level(&target, "other"), Level::All);
    assert_eq!(resolve_level(&target, "class_key"), Level::All);
    assert_eq!(resolve_level(&target, "instance_key"), Level::Once);

    // (e) the global level once nothing else applies.
    set_general_level(&mut target, None);
    set_class_level::<Account>(None, None);
    assert!(policy::class_annotations::<Account>().is_none());
    assert_eq!(resolve_level(&target, "other"), Level::Never);
}

#[test]
fn test_explicit_never_does_not_fall_through() {
    let _guard = fresh_policy();
    set_class_level::<Account>(Some(Level::Once), None);

    let mut target = Annotated::new(Account);
    set_general_level(&mut target, Some(Level::Never));
    assert_eq!(resolve_level(&target, "x"), Level::Never);

    set_general_level(&mut target, None);
    set_property_levels(&mut target, overrides([("x", Level::Never)]));
    assert_eq!(resolve_level(&target, "x"), Level::Never);
    assert_eq!(resolve_level(&target, "y"), Level::Once);
}

#[test]
fn test_class_annotations_are_per_class() {
    let _guard = fresh_policy();
    set_class_level::<Account>(Some(Level::Never), None);

    assert_eq!(resolve_level(&Annotated::new(Account), "x"), Level::Never);
    assert_eq!(resolve_level(&Annotated::new(Session), "x"), Level::All);

    // Free-standing annotations have no class at all.
    set_class_level::<Annotations>(Some(Level::Never), None);
    assert_eq!(resolve_level(&Annotations::new(), "x"), Level::All);
}

#[test]
fn test_custom_target_class() {
    struct Record {
        annotations: Annotations,
    }

    impl Target for Record {
        fn annotations(&self) -> &Annotations {
            &self.annotations
        }

        fn annotations_mut(&mut self) -> &mut Annotations {
            &mut self.annotations
        }
    }

    let _guard = fresh_policy();
    set_class_level::<Record>(None, overrides([("id", Level::Once)]));

    let record = Record {
        annotations: Annotations::new(),
    };
    let target: &dyn Target = &record;
    assert_eq!(resolve_level(target, "id"), Level::Once);
    assert_eq!(resolve_level(target, "name"), Level::All);
}

#[test]
fn test_install_snapshot_and_reset() {
    let _guard = fresh_policy();

    let mut explicit = LevelPolicy::new().with_global_level(Level::Once);
    explicit.set_class_general_level::<Session>(Some(Level::Never));

    let previous = policy::install(explicit.clone());
    assert_eq!(previous.global_level(), Level::All);
    assert_eq!(global_level(), Level::Once);
    assert_eq!(resolve_level(&Annotated::new(Session), "x"), Level::Never);

    let snapshot = policy::snapshot();
    assert_eq!(snapshot.global_level(), Level::Once);
    assert_eq!(
        snapshot.class_annotations::<Session>().and_then(Annotations::general_level),
        Some(Level::Never)
    );

    policy::reset();
    assert_eq!(global_level(), Level::All);
    assert_eq!(resolve_level(&Annotated::new(Session), "x"), Level::All);
    // The explicit policy is unaffected by the process-wide reset.
    assert_eq!(explicit.resolve(&Annotated::new(Session), "x"), Level::Never);
}

#[test]
fn test_registry_follows_global_level() {
    let _guard = fresh_policy();
    let target = Annotated::new(Account);
    let mut registry: TypeRegistry<&str, &str> = TypeRegistry::new();

    set_global_level(Level::Once);
    registry.add_for("value", "number", &target);
    registry.add_for("value", "string", &target);
    assert!(registry.has_type("value", "string"));

    set_global_level(Level::Never);
    registry.add_for("value", "boolean", &target);
    assert!(!registry.has("value"));

    let mut source: TypeRegistry<&str, &str> = TypeRegistry::new();
    source.add("value", "number", Level::All);
    source.copy_to(&mut registry, None);
    assert!(registry.is_empty());

    set_global_level(Level::All);
    source.copy_to(&mut registry, None);
    assert!(registry.has_type("value", "number"));
}

#[test]
fn test_registry_falls_back_to_class_levels() {
    let _guard = fresh_policy();
    set_class_level::<Account>(
        Some(Level::Never),
        Some(PropertyLevels::from_iter([("tags", Level::Once)])),
    );
    let account = Annotated::new(Account);
    let mut registry: TypeRegistry<&str, &str> = TypeRegistry::new();

    registry.add_for("name", "string", &account);
    assert!(!registry.has("name"));

    registry.add_for("tags", "array", &account);
    registry.add_for("tags", "string", &account);
    assert!(registry.has_type("tags", "array"));
    assert!(registry.has_type("tags", "string"));

    registry.set_for("name", ["string"], &account);
    assert!(!registry.has("name"));
    registry.set_for("tags", ["null"], &account);
    assert!(registry.has_type("tags", "null"));

    let mut source: TypeRegistry<&str, &str> = TypeRegistry::new();
    source.set("name", ["string"], Level::All);
    source.set("tags", ["array"], Level::All);
    source.copy_to(&mut registry, Some(&account));
    assert!(!registry.has("name"));
    assert!(registry.has_type("tags", "array"));

    // A class without annotations falls through to the global level.
    let mut fresh: TypeRegistry<&str, &str> = TypeRegistry::new();
    source.copy_to(&mut fresh, Some(&Annotated::new(Session)));
    assert!(fresh.has_type("name", "string"));
}

/// Queries the process-wide policy from inside every event it receives.
struct PolicyReadingLayer {
    events: Arc<AtomicUsize>,
}

impl<S: tracing::Subscriber> Layer<S> for PolicyReadingLayer {
    fn on_event(&self, _event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let _ = global_level();
        let _ = resolve_level(&Annotated::new(Account), "x");
        let _ = policy::snapshot();
        self.events.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_policy_events_are_emitted_outside_the_lock() {
    let _guard = fresh_policy();
    let events = Arc::new(AtomicUsize::new(0));
    let subscriber = Registry::default().with(PolicyReadingLayer {
        events: events.clone(),
    });

    tracing::subscriber::with_default(subscriber, || {
        set_global_level(Level::Once);
        set_class_general_level::<Account>(Some(Level::Never));
        set_class_property_levels::<Account>(None);
        set_class_level::<Session>(Some(Level::Once), None);
        policy::install(LevelPolicy::new());
    });

    assert_eq!(events.load(Ordering::SeqCst), 5);
    assert_eq!(global_level(), Level::All);
}

#[cfg(feature = "std")]
#[test]
fn test_init_global_level_from_env() {
    let _guard = fresh_policy();

    // SAFETY: Tests touching the environment hold the policy guard.
    unsafe { std::env::set_var(policy::LEVEL_ENV_VAR, "once") };
    assert_eq!(policy::init_global_level_from_env(), Level::Once);
    assert_eq!(global_level(), Level::Once);

    // SAFETY: As above.
    unsafe { std::env::set_var(policy::LEVEL_ENV_VAR, "bogus") };
    assert_eq!(policy::init_global_level_from_env(), Level::All);

    // SAFETY: As above.
    unsafe { std::env::remove_var(policy::LEVEL_ENV_VAR) };
    assert_eq!(policy::init_global_level_from_env(), Level::All);
}
