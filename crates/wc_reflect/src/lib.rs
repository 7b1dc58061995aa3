//! Runtime introspection for the conversion engine.
//!
//! Types are described at registration time rather than derived:
//!
//! - [`Reflect`]: type-erased values with identity and downcasting.
//! - [`info`]: the shape of a type ([`ObjectInfo`](info::ObjectInfo) for
//!   records, [`EnumInfo`](info::EnumInfo) for enums and flag sets).
//! - [`extract`]: decomposition of generic wrappers and containers.
//! - [`registry`]: the [`TypeRegistry`](registry::TypeRegistry) holding
//!   all of the above per type.
//! - [`Owner`]: keeps the pointees of rebuilt weak pointers alive.

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod owner;
mod reflection;

pub mod extract;
pub mod info;
pub mod registry;

// -----------------------------------------------------------------------------
// Exports

pub use error::ReflectError;
pub use owner::Owner;
pub use reflection::Reflect;
