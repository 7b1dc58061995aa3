use core::any::TypeId;

use wc_reflect::Reflect;
use wc_reflect::registry::TypeRegistry;
use wc_wire::WireMap;

use crate::{Error, Polymorphing};

/// Key of the class marker in serialized objects.
pub const CLASS_KEY: &str = "@class";

/// Decides which class an object is written and read as.
pub(crate) struct PolymorphismResolver<'a> {
    registry: &'a TypeRegistry,
    mode: Polymorphing,
}

impl<'a> PolymorphismResolver<'a> {
    pub fn new(registry: &'a TypeRegistry, mode: Polymorphing) -> Self {
        Self { registry, mode }
    }

    /// The class to write `value` as, and whether to mark it.
    pub fn serialization_class(&self, declared: TypeId, value: &dyn Reflect) -> (TypeId, bool) {
        let runtime = value.ty_id();
        match self.mode {
            Polymorphing::Disabled => (declared, false),
            Polymorphing::Forced => (runtime, true),
            Polymorphing::Enabled => {
                if runtime != declared && self.opted_in(runtime, value) {
                    (runtime, true)
                } else {
                    (declared, false)
                }
            }
        }
    }

    fn opted_in(&self, runtime: TypeId, value: &dyn Reflect) -> bool {
        self.registry
            .object_info(runtime)
            .and_then(|info| info.instance_polymorphic(value))
            .unwrap_or_else(|| self.registry.is_polymorphic(runtime))
    }

    /// The class to build from `map`, declared as `declared`.
    pub fn deserialization_class(&self, declared: TypeId, map: &WireMap) -> Result<TypeId, Error> {
        if self.mode == Polymorphing::Disabled {
            return Ok(declared);
        }

        let marker = map.get_str(CLASS_KEY);
        let Some(marker) = marker else {
            if self.mode == Polymorphing::Forced {
                return Err(Error::deserialization(
                    "Json does not contain the \"@class\" field, but forced polymorphism requires it",
                ));
            }
            return Ok(declared);
        };

        let Some(name) = marker.untagged().as_str() else {
            return Err(Error::deserialization(format!(
                "The \"@class\" field must be a string, but got {}",
                marker.untagged().kind()
            )));
        };
        let Some(meta) = self.registry.get_with_type_name(name) else {
            return Err(Error::deserialization(format!(
                "Unable to find class requested from json \"@class\" property: {name}"
            )));
        };
        let found = meta.type_id();
        if !self.registry.inherits(found, declared) {
            return Err(Error::deserialization(format!(
                "Requested class from \"@class\" field, {name}, does not inherit the property type {}",
                self.registry.type_name(declared).unwrap_or("<unregistered>"),
            )));
        }
        log::trace!("resolved class marker {name} below {}", self.registry.type_name(declared).unwrap_or("<unregistered>"));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use wc_wire::WireValue;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        register_fixtures(&mut registry);
        registry
    }

    fn marked(name: &str) -> WireMap {
        WireMap::from_iter([(CLASS_KEY, WireValue::from(name))])
    }

    #[test]
    fn enabled_marks_opted_in_subclasses_only() {
        let registry = registry();
        let resolver = PolymorphismResolver::new(&registry, Polymorphing::Enabled);
        let base = TypeId::of::<TestObject>();

        let poly = StaticPolyObject::default();
        assert_eq!(
            resolver.serialization_class(base, &poly),
            (TypeId::of::<StaticPolyObject>(), true)
        );
        let plain = StaticNonPolyObject::default();
        assert_eq!(resolver.serialization_class(base, &plain), (base, false));
        let same = TestObject::default();
        assert_eq!(resolver.serialization_class(base, &same), (base, false));
    }

    #[test]
    fn instances_override_the_class() {
        let registry = registry();
        let resolver = PolymorphismResolver::new(&registry, Polymorphing::Enabled);
        let base = TypeId::of::<TestObject>();

        let mut value = DynamicPolyObject::default();
        assert_eq!(resolver.serialization_class(base, &value), (base, false));
        value.poly = true;
        assert!(resolver.serialization_class(base, &value).1);
    }

    #[test]
    fn disabled_and_forced() {
        let registry = registry();
        let base = TypeId::of::<TestObject>();
        let poly = StaticPolyObject::default();

        let disabled = PolymorphismResolver::new(&registry, Polymorphing::Disabled);
        assert_eq!(disabled.serialization_class(base, &poly), (base, false));
        assert_eq!(
            disabled.deserialization_class(base, &marked("StaticPolyObject")).unwrap(),
            base
        );

        let forced = PolymorphismResolver::new(&registry, Polymorphing::Forced);
        assert_eq!(
            forced.serialization_class(base, &TestObject::default()),
            (base, true)
        );
        let err = forced.deserialization_class(base, &WireMap::new()).unwrap_err();
        assert!(err.message().contains("forced polymorphism requires it"));
    }

    #[test]
    fn markers_must_name_registered_subclasses() {
        let registry = registry();
        let resolver = PolymorphismResolver::new(&registry, Polymorphing::Enabled);
        let base = TypeId::of::<TestObject>();

        assert_eq!(
            resolver.deserialization_class(base, &marked("DerivedTestObject")).unwrap(),
            TypeId::of::<DerivedTestObject>()
        );
        assert_eq!(resolver.deserialization_class(base, &WireMap::new()).unwrap(), base);

        let err = resolver.deserialization_class(base, &marked("Nope")).unwrap_err();
        assert_eq!(
            err.message(),
            "Unable to find class requested from json \"@class\" property: Nope"
        );

        let err = resolver
            .deserialization_class(TypeId::of::<StaticPolyObject>(), &marked("TestObject"))
            .unwrap_err();
        assert_eq!(
            err.message(),
            "Requested class from \"@class\" field, TestObject, does not inherit the property type StaticPolyObject"
        );
    }
}
