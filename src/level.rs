//! Reporting levels and their textual names.
//!
//! A [`Level`] decides what a [`TypeRegistry`](crate::TypeRegistry) does with
//! a newly observed type tag. Levels usually arrive from configuration as
//! text, so this module also provides the permissive [`validate_level`]
//! normalization and a strict [`FromStr`] implementation.
//!
//! # Examples
//!
//! ```
//! use typeledger::level::{Level, validate_level};
//!
//! assert_eq!(validate_level(Some("once")), Level::Once);
//! assert_eq!(validate_level(Some("bogus")), Level::All);
//! assert_eq!(validate_level(None), Level::All);
//!
//! assert_eq!("never".parse::<Level>(), Ok(Level::Never));
//! assert!("bogus".parse::<Level>().is_err());
//! ```

use core::{fmt, str::FromStr};

/// Textual name of [`Level::Never`].
pub const REPORT_NEVER: &str = "never";
/// Textual name of [`Level::Once`].
pub const REPORT_ONCE: &str = "once";
/// Textual name of [`Level::All`].
pub const REPORT_ALL: &str = "all";

/// Policy controlling whether and how repeated type observations for a key are
/// retained.
///
/// Note that the names do not describe the retention behavior literally:
///
/// | Level    | Effect of [`TypeRegistry::add`]                        |
/// |----------|--------------------------------------------------------|
/// | `Never`  | discards everything recorded for the key               |
/// | `Once`   | accumulates every distinct type                        |
/// | `All`    | records the first type only; later types are ignored   |
///
/// [`TypeRegistry::add`]: crate::TypeRegistry::add
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Level {
    /// Do not check or report type inconsistency for the key.
    Never,
    /// Record every distinct type observed, so that each new type can be
    /// reported the first time it shows up.
    Once,
    /// Report whenever a type differs from the initial one. Only the first
    /// type is ever retained.
    #[default]
    All,
}

impl Level {
    /// Every level, in declaration order.
    pub const VARIANTS: [Level; 3] = [Level::Never, Level::Once, Level::All];

    /// Normalizes a textual level: `"never"` and `"once"` map to their levels,
    /// anything else maps to [`Level::All`].
    ///
    /// ```
    /// use typeledger::level::Level;
    ///
    /// assert_eq!(Level::validate("never"), Level::Never);
    /// assert_eq!(Level::validate("NEVER"), Level::All);
    /// ```
    #[must_use]
    pub fn validate(raw: &str) -> Level {
        match raw {
            REPORT_NEVER => Level::Never,
            REPORT_ONCE => Level::Once,
            _ => Level::All,
        }
    }

    /// Returns the textual name of the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Never => REPORT_NEVER,
            Level::Once => REPORT_ONCE,
            Level::All => REPORT_ALL,
        }
    }
}

/// Normalizes an optional textual level. Absent and unrecognized values both
/// yield [`Level::All`]; this never fails.
#[must_use]
pub fn validate_level(raw: Option<&str>) -> Level {
    raw.map_or(Level::All, Level::validate)
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by the strict [`FromStr`] implementation of [`Level`] when
/// the input is not one of `"never"`, `"once"` or `"all"`.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct ParseLevelError(());

impl fmt::Debug for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseLevelError").finish()
    }
}

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown reporting level, expected one of `{REPORT_NEVER}`, `{REPORT_ONCE}` or `{REPORT_ALL}`"
        )
    }
}

impl core::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            REPORT_NEVER => Ok(Level::Never),
            REPORT_ONCE => Ok(Level::Once),
            REPORT_ALL => Ok(Level::All),
            _ => Err(ParseLevelError(())),
        }
    }
}
