//! Commonly used items for convenient importing.
//!
//! # Usage
//!
//! ```rust
//! use typeledger::prelude::*;
//!
//! let mut user = Annotated::new("user");
//! set_general_level(&mut user, Some(Level::Once));
//!
//! let mut registry: TypeRegistry<&str, &str> = TypeRegistry::new();
//! registry.add_for("name", "string", &user);
//! registry.add_for("name", "number", &user);
//! assert_eq!(registry.types("name").map(|types| types.len()), Some(2));
//! ```
//!
//! # What's Included
//!
//! - **[`Level`]** and **[`validate_level`]**
//! - **[`TypeRegistry`]** and its **[`TypeSet`]**
//! - **[`Target`]**, **[`Annotations`]**, **[`Annotated`]** and
//!   **[`PropertyLevels`]**, with the per-target setters
//! - **[`resolve_level`]**, **[`global_level`]** and **[`set_global_level`]**

pub use crate::{
    level::{Level, validate_level},
    policy::{global_level, resolve_level, set_global_level},
    registry::{TypeRegistry, TypeSet},
    target::{
        Annotated, Annotations, PropertyLevels, Target, set_general_level, set_level,
        set_property_levels,
    },
};
