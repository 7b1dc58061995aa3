//! Records, enums and registries shared by the unit tests.

use wc_reflect::Reflect;
use wc_reflect::extract::DynBoxExtractor;
use wc_reflect::info::{EnumInfo, ObjectBuilder};
use wc_reflect::registry::{GetTypeMeta, TypeMeta, TypeRegistry};

use crate::{Serializer, SerializerBuilder};

// -----------------------------------------------------------------------------
// Object hierarchy

/// Interface implemented by every record of the `TestObject` hierarchy.
pub trait Api: Reflect {}

#[derive(Debug, Clone, PartialEq)]
pub struct TestObject {
    pub key: i32,
    pub value: f64,
    pub zhidden: i32,
    pub name: String,
}

impl Default for TestObject {
    fn default() -> Self {
        Self {
            key: 0,
            value: 0.0,
            zhidden: 11,
            name: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticPolyObject {
    pub base: TestObject,
    pub extra1: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticNonPolyObject {
    pub base: TestObject,
    pub extra2: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicPolyObject {
    pub base: TestObject,
    pub extra3: i32,
    pub poly: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedTestObject {
    pub base: StaticPolyObject,
    pub extra4: String,
}

impl Api for TestObject {}
impl Api for StaticPolyObject {}
impl Api for StaticNonPolyObject {}
impl Api for DynamicPolyObject {}
impl Api for DerivedTestObject {}

impl GetTypeMeta for TestObject {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::object::<Self>(
            ObjectBuilder::<Self>::new("TestObject")
                .field("key", |o| &o.key, |o, v| o.key = v)
                .field("value", |o| &o.value, |o, v| o.value = v)
                .unstored_field("zhidden", |o| &o.zhidden, |o, v| o.zhidden = v)
                .object_name(|o| &o.name, |o, v| o.name = v)
                .build(),
        )
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<i32>();
        registry.register::<f64>();
        registry.register::<String>();
    }
}

impl GetTypeMeta for StaticPolyObject {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::object::<Self>(
            ObjectBuilder::<Self>::new("StaticPolyObject")
                .base(|o| &o.base, |o| &mut o.base)
                .field("extra1", |o| &o.extra1, |o, v| o.extra1 = v)
                .polymorphic(true)
                .build(),
        )
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<TestObject>();
        registry.register::<bool>();
    }
}

impl GetTypeMeta for StaticNonPolyObject {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::object::<Self>(
            ObjectBuilder::<Self>::new("StaticNonPolyObject")
                .base(|o| &o.base, |o| &mut o.base)
                .field("extra2", |o| &o.extra2, |o, v| o.extra2 = v)
                .polymorphic(false)
                .build(),
        )
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<TestObject>();
    }
}

impl GetTypeMeta for DynamicPolyObject {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::object::<Self>(
            ObjectBuilder::<Self>::new("DynamicPolyObject")
                .base(|o| &o.base, |o| &mut o.base)
                .field("extra3", |o| &o.extra3, |o, v| o.extra3 = v)
                .polymorphic(false)
                .instance_polymorphic(|o| Some(o.poly))
                .build(),
        )
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<TestObject>();
    }
}

impl GetTypeMeta for DerivedTestObject {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::object::<Self>(
            ObjectBuilder::<Self>::new("DerivedTestObject")
                .base(|o| &o.base, |o| &mut o.base)
                .field("extra4", |o| &o.extra4, |o, v| o.extra4 = v)
                .build(),
        )
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<StaticPolyObject>();
    }
}

/// Holds any record of the hierarchy behind its interface.
#[derive(Debug)]
pub struct ApiHolder {
    pub api: Box<dyn Api>,
}

impl Default for ApiHolder {
    fn default() -> Self {
        Self {
            api: Box::new(TestObject::default()),
        }
    }
}

fn api_meta() -> TypeMeta {
    let extractor = DynBoxExtractor::<dyn Api>::new::<TestObject>()
        .with::<TestObject>(|o| o)
        .with::<StaticPolyObject>(|o| o)
        .with::<StaticNonPolyObject>(|o| o)
        .with::<DynamicPolyObject>(|o| o)
        .with::<DerivedTestObject>(|o| o);
    TypeMeta::container::<Box<dyn Api>>(extractor).with_name("Box<dyn Api>")
}

impl GetTypeMeta for ApiHolder {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::gadget::<Self>(
            ObjectBuilder::<Self>::new("ApiHolder")
                .field("api", |h| &h.api, |h, v| h.api = v)
                .build(),
        )
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.try_insert_type_meta(api_meta());
        registry.register::<StaticPolyObject>();
        registry.register::<StaticNonPolyObject>();
        registry.register::<DynamicPolyObject>();
        registry.register::<DerivedTestObject>();
    }
}

// -----------------------------------------------------------------------------
// Gadgets

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildGadget {
    pub data: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParentGadget {
    pub child: ChildGadget,
    pub children: Vec<ChildGadget>,
}

impl GetTypeMeta for ChildGadget {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::gadget::<Self>(
            ObjectBuilder::<Self>::new("ChildGadget")
                .field("data", |g| &g.data, |g, v| g.data = v)
                .build(),
        )
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<i32>();
    }
}

impl GetTypeMeta for ParentGadget {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::gadget::<Self>(
            ObjectBuilder::<Self>::new("ParentGadget")
                .field("child", |g| &g.child, |g, v| g.child = v)
                .field("children", |g| &g.children, |g, v| g.children = v)
                .build(),
        )
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<ChildGadget>();
        registry.register::<Vec<ChildGadget>>();
    }
}

// -----------------------------------------------------------------------------
// Enums

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low = 0,
    High = 5,
}

impl GetTypeMeta for Level {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::enumeration::<Self>(EnumInfo::new(
            "Level",
            &[("Low", 0), ("High", 5)],
            |level: &Level| *level as i64,
            |value| match value {
                0 => Some(Level::Low),
                5 => Some(Level::High),
                _ => None,
            },
        ))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions(pub i64);

impl Permissions {
    pub const READ: i64 = 1;
    pub const WRITE: i64 = 2;
}

impl GetTypeMeta for Permissions {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::enumeration::<Self>(EnumInfo::flags(
            "Permissions",
            &[("Read", Self::READ), ("Write", Self::WRITE)],
            |p: &Permissions| p.0,
            |bits| (bits & !(Self::READ | Self::WRITE) == 0).then_some(Permissions(bits)),
        ))
    }
}

// -----------------------------------------------------------------------------
// Registries

pub fn register_fixtures(registry: &mut TypeRegistry) {
    registry.register::<TestObject>();
    registry.register::<StaticPolyObject>();
    registry.register::<StaticNonPolyObject>();
    registry.register::<DynamicPolyObject>();
    registry.register::<DerivedTestObject>();
    registry.register::<ApiHolder>();
    registry.register::<ParentGadget>();
    registry.register::<Level>();
    registry.register::<Permissions>();
}

/// A builder with the standard converters and every fixture registered.
pub fn serializer() -> SerializerBuilder {
    let mut builder = Serializer::builder();
    register_fixtures(builder.registry_mut());
    builder
}

pub fn serializer_with(f: impl FnOnce(SerializerBuilder) -> SerializerBuilder) -> Serializer {
    f(serializer()).build()
}
