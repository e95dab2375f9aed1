#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_docs_in_private_items,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
//! Internal implementation crate for [`typeledger`].
//!
//! # Overview
//!
//! This crate contains the level-agnostic storage layer that the
//! [`typeledger`] type registry is built on: a map from keys to ordered sets of
//! values, [`MapOfSets`]. It knows nothing about reporting levels, targets or
//! policies; those live in the main crate.
//!
//! **This crate is an implementation detail.** No semantic versioning guarantees
//! are provided. Users should depend on the [`typeledger`] crate, not this one.
//!
//! # Invariants
//!
//! [`MapOfSets`] upholds a single structural invariant: a key that is present
//! always maps to a non-empty set. Every mutating method that could leave a set
//! empty removes the key instead. The fields are module-private so that the
//! invariant is locally verifiable within [`map_of_sets`].
//!
//! # Ordering
//!
//! Both the outer map and the inner sets are [`indexmap`] collections, so keys
//! and values iterate in insertion order. Removal uses the order-preserving
//! `shift_remove` variants.
//!
//! [`typeledger`]: https://docs.rs/typeledger/latest/typeledger/

pub mod map_of_sets;

pub use indexmap::Equivalent;
pub use map_of_sets::{MapOfSets, ValueSet};
