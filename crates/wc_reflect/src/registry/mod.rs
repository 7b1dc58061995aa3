//! Registry of type metadata.
//!
//! - [`TypeMeta`]: the [`Type`], [`TypeInfo`] and [`TypeTrait`] table of
//!   one type.
//! - [`GetTypeMeta`]: lets a type describe itself for registration.
//! - [`TypeRegistry`]: the store of [`TypeMeta`]s, indexed by id, path and
//!   short name, which also answers inheritance questions for records.
//! - [`TypeTrait`]: a capability attached to a registered type, such as
//!   [`TypeTraitDefault`].
//!
//! [`Type`]: crate::info::Type
//! [`TypeInfo`]: crate::info::TypeInfo

// -----------------------------------------------------------------------------
// Modules

mod impls;
mod type_meta;
mod type_registry;
mod type_trait;

// -----------------------------------------------------------------------------
// Exports

pub use type_meta::{GetTypeMeta, TypeMeta};
pub use type_registry::TypeRegistry;
pub use type_trait::{FromType, TypeTrait, TypeTraitDefault};
