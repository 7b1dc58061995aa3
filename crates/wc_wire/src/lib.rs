//! The wire model shared by every `wirecast` crate.
//!
//! ## Overview
//!
//! A [`WireValue`] is a tagged tree in the spirit of CBOR:
//!
//! - scalars: `Null`, `Bool`, `Integer`, `Float`, `String`, `Bytes`
//! - containers: `Array` and [`WireMap`]
//! - `Tagged(tag, inner)`, where the [`Tag`] disambiguates the semantic type
//!   of the inner value beyond its structural [`WireKind`].
//!
//! JSON is a lossy projection of this model: [`WireValue::to_json`] drops
//! tags and encodes byte strings as text, [`WireValue::from_json`] never
//! produces tags or byte strings.
//!
//! Encoding the tree into bytes is left to a CBOR library; [`WireValue`]
//! implements `serde::Serialize` and `serde::Deserialize` so any serde format
//! can carry the untagged projection.

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod json;
mod map;
mod serde_impls;
mod tag;
mod value;

// -----------------------------------------------------------------------------
// Exports

pub use map::WireMap;
pub use tag::Tag;
pub use value::{WireKind, WireValue};
