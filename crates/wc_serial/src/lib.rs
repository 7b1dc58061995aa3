//! The conversion engine of `wirecast`.
//!
//! A [`Serializer`] turns reflected values into [`WireValue`](wc_wire::WireValue)
//! trees and back, using a priority ordered [`ConverterRegistry`]:
//!
//! - Serializing asks every [`TypeConverter`] in priority order whether it
//!   handles the declared type and lets the first one convert.
//! - Deserializing also checks the tag and kind of the wire value, see
//!   [`ConverterRegistry::select`].
//! - Converters recurse through the [`SerializationHelper`], which keeps the
//!   property trace attached to every [`Error`].
//!
//! The JSON projection runs the same converters in JSON mode, where tags are
//! not available and byte arrays travel as text.
//!
//! ## Values of unknown type
//!
//! A [`Dynamic`] field holds any registered value. It is written with the
//! converter of its runtime type and read back with the converter guessing
//! the type from the wire value, or as the raw wire value if none does.

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod config;
mod converter;
mod error;
mod helper;
mod polymorphism;
mod registry;
mod serializer;
mod trace;
mod validation;

pub mod converters;
pub mod types;

#[cfg(test)]
mod testing;

// -----------------------------------------------------------------------------
// Exports

pub use config::{ByteArrayFormat, Config, MultiMapMode, Polymorphing};
pub use converter::{ANY_KIND, Capability, Priority, TypeConverter};
pub use error::{Error, PropertyTrace, TraceEntry};
pub use helper::SerializationHelper;
pub use polymorphism::CLASS_KEY;
pub use registry::{ConverterRegistry, Selection};
pub use serializer::{Serializer, SerializerBuilder};
pub use validation::ValidationFlags;

/// A value whose type is only known at runtime.
pub type Dynamic = Box<dyn wc_reflect::Reflect>;
