//! Value types with a dedicated wire representation.
//!
//! These are plain data types. Their converters live in
//! [`converters`](crate::converters); the builder registers all of them.

// -----------------------------------------------------------------------------
// Modules

pub mod duration;
pub mod geometry;

mod locale;
mod version;

// -----------------------------------------------------------------------------
// Exports

pub use locale::{Locale, LocaleParseError};
pub use version::{VersionNumber, VersionParseError};
