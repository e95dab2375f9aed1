#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! An in-memory registry of observed type tags, for detecting values whose
//! type changes over time.
//!
//! ## Overview
//!
//! A type checker that watches, say, the properties of an object records the
//! type of every value it sees. When a property later holds a value of a
//! different type, that inconsistency can be reported. This crate provides the
//! bookkeeping for that: a [`TypeRegistry`] mapping each key to the set of
//! type tags observed for it, and a reporting-level policy deciding how new
//! observations are retained.
//!
//! ## Quick Example
//!
//! ```
//! use typeledger::prelude::*;
//!
//! let mut registry: TypeRegistry<&str, &str> = TypeRegistry::new();
//!
//! registry.add("age", "number", Level::All);
//! registry.add("age", "string", Level::All);
//!
//! // Under `Level::All` the first observed type is the reference type.
//! assert!(registry.has_type("age", "number"));
//! assert!(!registry.has_type("age", "string"));
//! ```
//!
//! ## Core Concepts
//!
//! - A **[`Level`]** is one of [`Never`], [`Once`] or [`All`]. It decides what
//!   [`TypeRegistry::add`] does: discard everything, accumulate every distinct
//!   type, or keep only the first type. Unrecognized textual levels normalize
//!   to [`All`] through [`validate_level`].
//! - A **[`Target`]** is the object levels are attached to. Each target has
//!   [`Annotations`]: a general level and per-property overrides.
//! - The **[`policy`]** resolves the level for a `(target, key)` pair: target
//!   override, target general level, class override, class general level,
//!   and finally the global level.
//!
//! The level names are historical and do not describe the retention behavior
//! literally. In particular [`All`] keeps only the *first* type ever recorded
//! for a key, not every type; [`Once`] is the level that accumulates.
//!
//! ## Features
//!
//! - `std`: uses `std::sync::RwLock` for the process-wide policy instead of a
//!   spin lock, and enables `policy::init_global_level_from_env`.
//!
//! ## Logging
//!
//! Policy changes are emitted as `debug` events and registry removals as
//! `trace` events through [`tracing`]. No subscriber is installed.
//!
//! [`Never`]: Level::Never
//! [`Once`]: Level::Once
//! [`All`]: Level::All

extern crate alloc;

#[cfg(all(feature = "std", not(doc)))]
extern crate std;

pub mod level;
pub mod policy;
pub mod prelude;
pub mod registry;
pub mod target;

mod lock;

pub use self::{
    level::{Level, ParseLevelError, validate_level},
    policy::LevelPolicy,
    registry::{TypeRegistry, TypeSet, default_merge},
    target::{Annotated, Annotations, PropertyLevels, Target},
};
