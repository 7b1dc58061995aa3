//! Records: objects, which take part in polymorphism, and gadgets, which
//! do not.
//!
//! A record is written as a map from field name to value, covering the
//! fields of its whole base chain. Objects may additionally carry the
//! `"@class"` marker and their `objectName`.

use core::any::TypeId;

use wc_reflect::info::{BaseKind, FieldInfo, ObjectInfo};
use wc_reflect::registry::TypeRegistry;
use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireMap, WireValue};

use super::map::string_entries;
use super::{base_kind, expect_str};
use crate::converter::expect_array;
use crate::polymorphism::{CLASS_KEY, PolymorphismResolver};
use crate::validation::PropertyCheck;
use crate::{Error, Polymorphing, SerializationHelper, TypeConverter};

const OBJECT_NAME_KEY: &str = "objectName";

/// Converts [`BaseKind::Object`] records.
///
/// Besides plain maps, objects can be read from a `GenericObject` tagged
/// array naming the class, and from a `ConstructedObject` tagged pair of
/// such an array and a property map.
pub struct ObjectConverter;

/// Converts [`BaseKind::Gadget`] records.
pub struct GadgetConverter;

// -----------------------------------------------------------------------------
// Shared record handling

/// The record descriptions of `class` and its bases, base first.
fn class_chain(registry: &TypeRegistry, class: TypeId) -> Vec<&ObjectInfo> {
    let mut chain = Vec::new();
    let mut current = registry.object_info(class);
    while let Some(info) = current {
        chain.push(info);
        current = info
            .base()
            .and_then(|base| registry.object_info(base.type_id()));
    }
    chain.reverse();
    chain
}

fn object_info(helper: &dyn SerializationHelper, ty: TypeId) -> Result<&ObjectInfo, Error> {
    helper.registry().object_info(ty).ok_or_else(|| {
        Error::deserialization(format!(
            "Unable to get record description for type {}",
            helper.type_name(ty)
        ))
    })
}

/// The fields written for records of `class`, with the class declaring them.
fn written_fields<'r>(
    chain: &[&'r ObjectInfo],
    helper: &dyn SerializationHelper,
) -> Vec<(TypeId, &'r FieldInfo)> {
    let all = helper.config().ignore_stored_attribute;
    chain
        .iter()
        .flat_map(|info| info.fields().iter().map(|field| (info.type_id(), field)))
        .filter(|(_, field)| all || field.is_stored())
        .collect()
}

/// The description in `chain` holding the object name, if any.
fn named<'r>(chain: &[&'r ObjectInfo]) -> Option<&'r ObjectInfo> {
    chain.iter().copied().find(|info| info.has_object_name())
}

struct Record<'a> {
    helper: &'a dyn SerializationHelper,
    /// Whether the record is an object rather than a gadget.
    object: bool,
}

impl Record<'_> {
    fn serialize(&self, ty: TypeId, value: &dyn Reflect) -> Result<WireValue, Error> {
        let helper = self.helper;
        let registry = helper.registry();
        let (class, marked) = if self.object {
            PolymorphismResolver::new(registry, helper.config().polymorphing)
                .serialization_class(ty, value)
        } else {
            (ty, false)
        };
        let Some(record) = registry.upcast(value, class) else {
            return Err(Error::serialization(format!(
                "Data is not of the required {} type {}",
                if self.object { "object" } else { "gadget" },
                helper.type_name(class)
            )));
        };
        let chain = class_chain(registry, class);

        let mut map = WireMap::new();
        if marked {
            map.insert(CLASS_KEY, helper.type_name(class));
        }
        if self.object && helper.config().keep_object_name {
            if let Some(info) = named(&chain) {
                let name = registry
                    .upcast(record, info.type_id())
                    .and_then(|owner| info.object_name(owner))
                    .unwrap_or_default();
                map.insert(OBJECT_NAME_KEY, name);
            }
        }

        for (declaring, field) in written_fields(&chain, helper) {
            let Some(owner) = registry.upcast(record, declaring) else {
                return Err(Error::serialization(format!(
                    "Data is not of the required type {}",
                    helper.type_name(declaring)
                )));
            };
            let data = field
                .get(owner)
                .map_err(|err| Error::serialization(err.to_string()))?;
            let data = helper.serialize_subtype(field.type_id(), data, field.name())?;
            map.insert(field.name(), data);
        }
        Ok(WireValue::Map(map))
    }

    /// Writes the entries of `map` onto `record`, an instance of `class`.
    fn deserialize_properties(
        &self,
        class: TypeId,
        record: &mut dyn Reflect,
        map: &WireMap,
        owner: Option<&Owner>,
    ) -> Result<(), Error> {
        let helper = self.helper;
        let registry = helper.registry();
        let config = helper.config();
        let chain = class_chain(registry, class);
        let info = object_info(helper, class)?;
        let name_holder = named(&chain).filter(|_| self.object);

        let keep_name = name_holder.is_some() && config.keep_object_name;
        let required = written_fields(&chain, helper)
            .into_iter()
            .map(|(_, field)| field.name())
            .chain(keep_name.then_some(OBJECT_NAME_KEY));
        let mut check = PropertyCheck::new(helper.validation_flags(), info.name(), required);
        let skip_marker = self.object && config.polymorphing != Polymorphing::Disabled;

        for entry in string_entries(map) {
            let (key, value) = entry?;
            if skip_marker && key == CLASS_KEY {
                continue;
            }

            if let (OBJECT_NAME_KEY, Some(holder)) = (key, name_holder) {
                let name = expect_str(value, OBJECT_NAME_KEY)?.to_owned();
                let target = upcast_mut(registry, record, holder.type_id())?;
                holder
                    .set_object_name(target, name)
                    .map_err(|err| write_error(key, err))?;
                check.found(key);
                continue;
            }

            let field = chain
                .iter()
                .find_map(|info| info.field(key).map(|field| (info.type_id(), field)));
            let Some((declaring, field)) = field else {
                check.extra(key)?;
                continue;
            };
            let data = helper.deserialize_subtype(field.type_id(), value, owner, key)?;
            let target = upcast_mut(registry, record, declaring)?;
            field.set(target, data).map_err(|err| write_error(key, err))?;
            check.found(key);
        }
        check.finish()
    }
}

fn upcast_mut<'a>(
    registry: &TypeRegistry,
    record: &'a mut dyn Reflect,
    target: TypeId,
) -> Result<&'a mut dyn Reflect, Error> {
    let found = (*record).reflect_type_path();
    registry.upcast_mut(record, target).ok_or_else(|| {
        Error::deserialization(format!(
            "Value of type {found} does not extend {}",
            registry.type_name(target).unwrap_or("<unregistered>")
        ))
    })
}

fn write_error(key: &str, err: impl core::fmt::Display) -> Error {
    Error::deserialization(format!("Failed to write property {key}: {err}"))
}

fn expect_map<'v>(value: &'v WireValue, helper: &dyn SerializationHelper, ty: TypeId) -> Result<&'v WireMap, Error> {
    value.untagged().as_map().ok_or_else(|| {
        Error::deserialization(format!(
            "Expected a map for {}, but got {}",
            helper.type_name(ty),
            value.untagged().kind()
        ))
    })
}

// -----------------------------------------------------------------------------
// ObjectConverter

impl ObjectConverter {
    fn null_object(&self, ty: TypeId, helper: &dyn SerializationHelper) -> Result<Box<dyn Reflect>, Error> {
        if helper.config().allow_default_null {
            return Ok(object_info(helper, ty)?.new_instance());
        }
        Err(Error::deserialization(format!(
            "Cannot deserialize null into object type {} unless null defaults are allowed",
            helper.type_name(ty)
        )))
    }

    /// Builds the class named by a `GenericObject` array.
    fn generic_object(
        &self,
        ty: TypeId,
        value: &WireValue,
        helper: &dyn SerializationHelper,
    ) -> Result<(TypeId, Box<dyn Reflect>), Error> {
        let items = expect_array(value, "a GenericObject")?;
        let Some((name, arguments)) = items.split_first() else {
            return Err(Error::deserialization(
                "A GenericObject requires at least one argument, specifying the object name",
            ));
        };
        let name = expect_str(name, "the GenericObject class name")?;
        let registry = helper.registry();
        let class = registry
            .get_with_type_name(name)
            .map(|meta| meta.type_id())
            .filter(|&class| registry.object_info(class).is_some())
            .ok_or_else(|| {
                Error::deserialization(format!(
                    "Unable to find class requested from GenericObject tagged array: {name}"
                ))
            })?;
        if !registry.inherits(class, ty) {
            return Err(Error::deserialization(format!(
                "Requested class from GenericObject tagged array, {name}, does not inherit the property type {}",
                helper.type_name(ty)
            )));
        }
        if !arguments.is_empty() {
            return Err(Error::deserialization(format!(
                "Unable to find any constructor for {name} with {} arguments and matching types!",
                arguments.len()
            )));
        }
        Ok((class, object_info(helper, class)?.new_instance()))
    }
}

impl TypeConverter for ObjectConverter {
    fn name(&self) -> &'static str {
        "ObjectConverter"
    }

    fn can_convert(&self, ty: TypeId, helper: &dyn SerializationHelper) -> bool {
        base_kind(helper, ty) == Some(BaseKind::Object)
    }

    fn allowed_tags(&self, _ty: TypeId, _helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
        vec![None, Some(Tag::GENERIC_OBJECT), Some(Tag::CONSTRUCTED_OBJECT)]
    }

    fn allowed_kinds(
        &self,
        _ty: TypeId,
        tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        match tag {
            Some(Tag::GENERIC_OBJECT) => vec![WireKind::Array],
            Some(Tag::CONSTRUCTED_OBJECT) => vec![WireKind::Array, WireKind::Null],
            _ => vec![WireKind::Map, WireKind::Null],
        }
    }

    fn serialize(
        &self,
        ty: TypeId,
        value: &dyn Reflect,
        helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error> {
        Record { helper, object: true }.serialize(ty, value)
    }

    fn deserialize_cbor(
        &self,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        if value.untagged().is_null() {
            return self.null_object(ty, helper);
        }
        let record = Record { helper, object: true };

        match value.tag() {
            Some(Tag::GENERIC_OBJECT) => Ok(self.generic_object(ty, value, helper)?.1),
            Some(Tag::CONSTRUCTED_OBJECT) => {
                let Some([generic, properties]) = value.untagged().as_array() else {
                    return Err(Error::deserialization(
                        "The ConstructedObject tagged array must have exactly two elements!",
                    ));
                };
                let (class, mut object) = self.generic_object(ty, generic, helper)?;
                if !properties.is_null() {
                    let map = expect_map(properties, helper, class)?;
                    record.deserialize_properties(class, &mut *object, map, owner)?;
                }
                Ok(object)
            }
            _ => {
                let map = expect_map(value, helper, ty)?;
                let class = PolymorphismResolver::new(helper.registry(), helper.config().polymorphing)
                    .deserialization_class(ty, map)?;
                let mut object = object_info(helper, class)?.new_instance();
                record.deserialize_properties(class, &mut *object, map, owner)?;
                Ok(object)
            }
        }
    }
}

// -----------------------------------------------------------------------------
// GadgetConverter

impl TypeConverter for GadgetConverter {
    fn name(&self) -> &'static str {
        "GadgetConverter"
    }

    fn can_convert(&self, ty: TypeId, helper: &dyn SerializationHelper) -> bool {
        base_kind(helper, ty) == Some(BaseKind::Gadget)
    }

    fn allowed_tags(&self, _ty: TypeId, _helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
        vec![None]
    }

    fn allowed_kinds(
        &self,
        _ty: TypeId,
        _tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        vec![WireKind::Map]
    }

    fn serialize(
        &self,
        ty: TypeId,
        value: &dyn Reflect,
        helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error> {
        Record { helper, object: false }.serialize(ty, value)
    }

    fn deserialize_cbor(
        &self,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        let map = expect_map(value, helper, ty)?;
        let mut gadget = object_info(helper, ty)?.new_instance();
        Record { helper, object: false }.deserialize_properties(ty, &mut *gadget, map, owner)?;
        Ok(gadget)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::*;
    use crate::{Serializer, ValidationFlags};

    fn sample() -> TestObject {
        TestObject {
            key: 42,
            value: 4.2,
            zhidden: 11,
            name: "sample".to_owned(),
        }
    }

    #[test]
    fn stored_fields_only() {
        let serializer = serializer().build();
        let json = serializer.to_json(&sample()).unwrap();
        assert_eq!(json, json!({"key": 42, "value": 4.2}));

        let serializer = serializer_with(|b| b.ignore_stored_attribute(true).keep_object_name(true));
        let json = serializer.to_json(&sample()).unwrap();
        assert_eq!(
            json,
            json!({"objectName": "sample", "key": 42, "value": 4.2, "zhidden": 11})
        );
        assert_eq!(serializer.from_json::<TestObject>(&json).unwrap(), sample());
    }

    #[test]
    fn base_fields_come_first() {
        let serializer = serializer().build();
        let value = DerivedTestObject {
            base: StaticPolyObject {
                base: TestObject { key: 1, ..TestObject::default() },
                extra1: true,
            },
            extra4: "four".to_owned(),
        };
        let wire = serializer.serialize(&value).unwrap();
        let keys: Vec<_> = wire.as_map().unwrap().keys().filter_map(WireValue::as_str).collect();
        assert_eq!(keys, ["key", "value", "extra1", "extra4"]);
        assert_eq!(serializer.deserialize::<DerivedTestObject>(&wire).unwrap(), value);
    }

    #[test]
    fn polymorphic_holders() {
        let serializer = serializer().build();
        let holder = ApiHolder {
            api: Box::new(StaticPolyObject { extra1: true, ..StaticPolyObject::default() }),
        };
        let json = serializer.to_json(&holder).unwrap();
        assert_eq!(
            json,
            json!({"api": {"@class": "StaticPolyObject", "key": 0, "value": 0.0, "extra1": true}})
        );

        let back = serializer.from_json::<ApiHolder>(&json).unwrap();
        let api: &dyn Reflect = (*back.api).as_reflect();
        assert_eq!(
            api.downcast_ref::<StaticPolyObject>().map(|o| o.extra1),
            Some(true)
        );

        let plain = ApiHolder {
            api: Box::new(StaticNonPolyObject::default()),
        };
        let json = serializer.to_json(&plain).unwrap();
        assert_eq!(json, json!({"api": {"key": 0, "value": 0.0}}));

        let disabled = serializer_with(|b| b.polymorphing(Polymorphing::Disabled));
        let json = disabled.to_json(&holder).unwrap();
        assert_eq!(json, json!({"api": {"key": 0, "value": 0.0}}));
    }

    #[test]
    fn forced_polymorphism_requires_marker() {
        let serializer = serializer_with(|b| b.polymorphing(Polymorphing::Forced));
        let json = serializer.to_json(&TestObject::default()).unwrap();
        assert_eq!(json["@class"], "TestObject");

        let err = serializer
            .from_json::<TestObject>(&json!({"key": 1, "value": 2.0}))
            .unwrap_err();
        assert!(err.message().contains("forced polymorphism requires it"));
    }

    #[test]
    fn property_validation() {
        let serializer = serializer_with(|b| {
            b.validation_flags(ValidationFlags::NO_EXTRA_PROPERTIES | ValidationFlags::ALL_PROPERTIES)
        });
        let err = serializer
            .from_json::<TestObject>(&json!({"key": 1, "value": 2.0, "other": 3}))
            .unwrap_err();
        assert_eq!(
            err.message(),
            "Found extra property other but extra properties are not allowed"
        );

        let err = serializer.from_json::<TestObject>(&json!({"key": 1})).unwrap_err();
        assert_eq!(
            err.message(),
            "Not all properties for TestObject are present in the json object Missing properties: value"
        );

        let mut lenient = Serializer::builder();
        register_fixtures(lenient.registry_mut());
        let value = lenient
            .build()
            .from_json::<TestObject>(&json!({"key": 1, "other": 3}))
            .unwrap();
        assert_eq!(value.key, 1);
    }

    #[test]
    fn nested_objects_skip_property_checks() {
        let shallow = serializer_with(|b| b.validation_flags(ValidationFlags::NO_EXTRA_PROPERTIES));
        let json = json!({"child": {"data": 1, "extra": true}, "children": []});
        assert!(shallow.from_json::<ParentGadget>(&json).is_ok());

        let deep = serializer_with(|b| {
            b.validation_flags(
                ValidationFlags::NO_EXTRA_PROPERTIES | ValidationFlags::DEEP_VALIDATE_NESTED_OBJECTS,
            )
        });
        let err = deep.from_json::<ParentGadget>(&json).unwrap_err();
        assert_eq!(err.trace()[0].name, "child");
    }

    #[test]
    fn property_errors_carry_the_trace() {
        let serializer = serializer().build();
        let json = json!({"child": {"data": 1}, "children": [{"data": 2}, {"data": "x"}]});
        let err = serializer.from_json::<ParentGadget>(&json).unwrap_err();
        let trace: Vec<_> = err.trace().iter().map(|e| (e.name.as_str(), e.type_name.as_str())).collect();
        assert_eq!(
            trace,
            [("children", "Vec<ChildGadget>"), ("[1]", "ChildGadget"), ("data", "i32")]
        );
    }

    #[test]
    fn null_objects() {
        let serializer = serializer().build();
        assert!(serializer.deserialize::<TestObject>(&WireValue::Null).is_err());

        let serializer = serializer_with(|b| b.allow_default_null(true));
        let value = serializer.deserialize::<TestObject>(&WireValue::Null).unwrap();
        assert_eq!(value, TestObject::default());
    }

    #[test]
    fn generic_and_constructed_objects() {
        let serializer = serializer().build();
        let generic = WireValue::tagged(Tag::GENERIC_OBJECT, vec![WireValue::from("StaticPolyObject")]);
        let holder: WireMap = [("api", generic.clone())].into_iter().collect();
        let back = serializer.deserialize::<ApiHolder>(&WireValue::Map(holder)).unwrap();
        assert!((*back.api).as_reflect().is::<StaticPolyObject>());

        let props: WireMap = [("key", 5)].into_iter().collect();
        let constructed = WireValue::tagged(
            Tag::CONSTRUCTED_OBJECT,
            vec![generic.into_untagged(), WireValue::Map(props)],
        );
        let value = serializer
            .deserialize_dyn(TypeId::of::<TestObject>(), &constructed, None)
            .unwrap();
        let value = value.downcast_ref::<StaticPolyObject>().unwrap();
        assert_eq!(value.base.key, 5);

        let with_args = WireValue::tagged(
            Tag::GENERIC_OBJECT,
            vec![WireValue::from("TestObject"), WireValue::from(1)],
        );
        let err = serializer.deserialize::<TestObject>(&with_args).unwrap_err();
        assert_eq!(
            err.message(),
            "Unable to find any constructor for TestObject with 1 arguments and matching types!"
        );
    }
}
