//! The standard converter families.
//!
//! [`register_standard`] adds all of them to a registry at their default
//! priorities. They are exported so they can be registered selectively, at
//! another priority, or next to custom converters.
//!
//! | converter | types |
//! |---|---|
//! | [`ScalarConverter`] | `bool`, integers, floats, `char`, `String`, `()` |
//! | [`EnumConverter`] | registered enums and flag sets |
//! | [`ObjectConverter`], [`GadgetConverter`] | registered records |
//! | [`ListConverter`], [`MapConverter`], [`MultiMapConverter`] | collections |
//! | [`PairConverter`], [`TupleConverter`] | fixed arity values |
//! | [`OptionalConverter`], [`PointerConverter`], [`VariantConverter`] | wrappers |
//! | [`ByteArrayConverter`], [`BitArrayConverter`] | `Vec<u8>`, `FixedBitSet` |
//! | [`DateTimeConverter`], [`DurationConverter`] | `chrono` types, [`types::duration`](crate::types::duration) |
//! | [`LocaleConverter`], [`VersionConverter`], [`RegexConverter`] | domain values |
//! | [`GeometryConverter`], [`LegacyGeometryConverter`] | [`types::geometry`](crate::types::geometry) |
//! | [`WireConverter`], [`JsonConverter`] | raw `WireValue` and `serde_json::Value` |

// -----------------------------------------------------------------------------
// Modules

mod bitarray;
mod bytes;
mod datetime;
mod duration;
mod enums;
mod geometry;
mod legacy_geometry;
mod list;
mod locale;
mod map;
mod multimap;
mod object;
mod optional;
mod pair;
mod pointer;
mod regex;
mod scalar;
mod tuple;
mod variant;
mod version;
mod wire;

// -----------------------------------------------------------------------------
// Exports

pub use bitarray::BitArrayConverter;
pub use bytes::ByteArrayConverter;
pub use datetime::DateTimeConverter;
pub use duration::DurationConverter;
pub use enums::EnumConverter;
pub use geometry::GeometryConverter;
pub use legacy_geometry::LegacyGeometryConverter;
pub use list::ListConverter;
pub use locale::LocaleConverter;
pub use map::MapConverter;
pub use multimap::MultiMapConverter;
pub use object::{GadgetConverter, ObjectConverter};
pub use optional::OptionalConverter;
pub use pair::PairConverter;
pub use pointer::PointerConverter;
pub use regex::RegexConverter;
pub use scalar::ScalarConverter;
pub use tuple::TupleConverter;
pub use variant::VariantConverter;
pub use version::VersionConverter;
pub use wire::{JsonConverter, WireConverter};

use alloc::collections::BTreeMap;
use core::any::TypeId;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use fixedbitset::FixedBitSet;
use wc_reflect::extract::{Extractor, MapExtractor, Part, SeqExtractor};
use wc_reflect::info::BaseKind;
use wc_reflect::registry::{TypeMeta, TypeRegistry, TypeTraitDefault};
use wc_reflect::{Owner, Reflect};
use wc_wire::WireValue;

use crate::types::{Locale, VersionNumber};
use crate::{ConverterRegistry, Dynamic, Error, SerializationHelper};

// -----------------------------------------------------------------------------
// Registration

/// Adds every standard converter at its default priority.
pub fn register_standard(converters: &mut ConverterRegistry) {
    converters.add(ByteArrayConverter);
    converters.add(BitArrayConverter);
    converters.add(WireConverter);
    converters.add(JsonConverter);
    converters.add(DateTimeConverter);
    converters.add(DurationConverter);
    converters.add(EnumConverter);
    converters.add(GadgetConverter);
    converters.add(ObjectConverter);
    converters.add(GeometryConverter);
    converters.add(ListConverter);
    converters.add(LocaleConverter);
    converters.add(MapConverter);
    converters.add(MultiMapConverter);
    converters.add(PairConverter);
    converters.add(PointerConverter);
    converters.add(OptionalConverter);
    converters.add(TupleConverter);
    converters.add(VariantConverter);
    converters.add(VersionConverter);
    converters.add(RegexConverter);
    converters.add(ScalarConverter);
    converters.add(LegacyGeometryConverter);
}

/// Registers the value types the standard converters handle, including
/// the containers erased values are read into.
pub fn register_value_types(registry: &mut TypeRegistry) {
    registry.register::<Vec<u8>>();
    registry.register::<Locale>();
    registry.register::<VersionNumber>();
    crate::types::geometry::register_types(registry);
    crate::types::duration::register_types(registry);

    registry.try_insert_type_meta(
        TypeMeta::opaque::<DateTime<FixedOffset>>()
            .with_name("DateTime")
            .with_trait(TypeTraitDefault::new(|| {
                Box::new(DateTime::<Utc>::UNIX_EPOCH.fixed_offset())
            })),
    );
    registry.try_insert_type_meta(
        TypeMeta::opaque::<NaiveDate>()
            .with_trait(TypeTraitDefault::new(|| Box::new(DateTime::<Utc>::UNIX_EPOCH.date_naive()))),
    );
    registry.try_insert_type_meta(
        TypeMeta::opaque::<NaiveTime>()
            .with_trait(TypeTraitDefault::new(|| Box::new(DateTime::<Utc>::UNIX_EPOCH.time()))),
    );
    registry.try_insert_type_meta(TypeMeta::opaque::<::regex::Regex>());
    registry.try_insert_type_meta(TypeMeta::opaque::<FixedBitSet>().with_default::<FixedBitSet>());
    registry.try_insert_type_meta(TypeMeta::opaque::<WireValue>().with_default::<WireValue>());
    registry.try_insert_type_meta(
        TypeMeta::opaque::<serde_json::Value>()
            .with_name("JsonValue")
            .with_default::<serde_json::Value>(),
    );

    registry.try_insert_type_meta(
        TypeMeta::opaque::<Dynamic>()
            .with_name("Dynamic")
            .with_trait(TypeTraitDefault::new(|| {
                Box::new(Box::new(WireValue::Null) as Dynamic)
            })),
    );
    registry.try_insert_type_meta(
        TypeMeta::container::<Vec<Dynamic>>(SeqExtractor::<Vec<Dynamic>>::new())
            .with_name("Vec<Dynamic>")
            .with_default::<Vec<Dynamic>>(),
    );
    registry.try_insert_type_meta(
        TypeMeta::container::<BTreeMap<String, Dynamic>>(
            MapExtractor::<BTreeMap<String, Dynamic>>::new(),
        )
        .with_name("BTreeMap<String, Dynamic>")
        .with_default::<BTreeMap<String, Dynamic>>(),
    );
}

// -----------------------------------------------------------------------------
// Shared helpers

fn base_kind(helper: &dyn SerializationHelper, ty: TypeId) -> Option<BaseKind> {
    helper.registry().base_kind(ty)
}

fn extractor(helper: &dyn SerializationHelper, ty: TypeId) -> Option<&dyn Extractor> {
    helper
        .registry()
        .get_type_info(ty)?
        .extractor()
        .map(|extractor| &**extractor)
}

/// The extractor of `ty` and the parts of `value`.
fn extract<'h, 'v>(
    helper: &'h dyn SerializationHelper,
    ty: TypeId,
    value: &'v dyn Reflect,
) -> Result<(&'h dyn Extractor, Vec<Part<'v>>), Error> {
    let extractor = extractor(helper, ty).ok_or_else(|| {
        Error::serialization(format!("Type {} has no registered extractor", helper.type_name(ty)))
    })?;
    let parts = extractor
        .extract(value)
        .map_err(|err| Error::serialization(err.to_string()))?;
    Ok((extractor, parts))
}

/// Rebuilds a value of `ty` from deserialized parts.
fn emplace(
    helper: &dyn SerializationHelper,
    ty: TypeId,
    parts: Vec<Box<dyn Reflect>>,
    owner: Option<&Owner>,
) -> Result<Box<dyn Reflect>, Error> {
    let extractor = extractor(helper, ty).ok_or_else(|| {
        Error::deserialization(format!("Type {} has no registered extractor", helper.type_name(ty)))
    })?;
    extractor
        .emplace(parts, owner)
        .map_err(|err| Error::deserialization(err.to_string()))
}

/// The subtypes of `ty`, if it is a container.
fn subtypes(helper: &dyn SerializationHelper, ty: TypeId) -> &[TypeId] {
    extractor(helper, ty).map_or(&[], |extractor| extractor.subtypes())
}

/// The guessed type if registered.
fn registered(helper: &dyn SerializationHelper, ty: TypeId) -> Option<TypeId> {
    helper.registry().contains(ty).then_some(ty)
}

/// The untagged string of `value`, or an error naming what was expected.
fn expect_str<'a>(value: &'a WireValue, what: &str) -> Result<&'a str, Error> {
    value.untagged().as_str().ok_or_else(|| {
        Error::deserialization(format!(
            "Expected a string for {what}, but got {}",
            value.untagged().kind()
        ))
    })
}
