use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::TypeId;
use core::marker::PhantomData;

use crate::extract::{Extractor, ExtractorKind, Part, expect_ref, take_part};
use crate::registry::{GetTypeMeta, TypeMeta, TypeRegistry};
use crate::{Owner, Reflect, ReflectError};

/// Extractor of `Option<T>`; `None` has no parts.
pub struct OptionExtractor<T> {
    subtypes: [TypeId; 1],
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflect> OptionExtractor<T> {
    pub fn new() -> Self {
        Self {
            subtypes: [TypeId::of::<T>()],
            _marker: PhantomData,
        }
    }
}

impl<T: Reflect> Extractor for OptionExtractor<T> {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Optional
    }

    fn subtypes(&self) -> &[TypeId] {
        &self.subtypes
    }

    fn extract<'a>(&self, value: &'a dyn Reflect) -> Result<Vec<Part<'a>>, ReflectError> {
        let option = expect_ref::<Option<T>>(value)?;
        Ok(option
            .iter()
            .map(|inner| Part::Borrowed(inner))
            .collect())
    }

    fn emplace(
        &self,
        mut parts: Vec<Box<dyn Reflect>>,
        _owner: Option<&Owner>,
    ) -> Result<Box<dyn Reflect>, ReflectError> {
        match parts.len() {
            0 => Ok(Box::new(None::<T>)),
            1 => match parts.pop() {
                Some(part) => Ok(Box::new(Some(take_part::<T>(part)?))),
                None => Ok(Box::new(None::<T>)),
            },
            n => Err(ReflectError::part_count::<Option<T>>(1, n)),
        }
    }
}

impl<T: GetTypeMeta> GetTypeMeta for Option<T> {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::container::<Self>(OptionExtractor::<T>::new())
            .with_default::<Self>()
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec;

    #[test]
    fn none_has_no_parts() {
        let extractor = OptionExtractor::<String>::new();
        assert!(extractor.extract(&None::<String>).unwrap().is_empty());

        let rebuilt = extractor.emplace(vec![], None).unwrap();
        assert_eq!(rebuilt.take::<Option<String>>().unwrap(), None);
    }

    #[test]
    fn some_wraps_the_part() {
        let extractor = OptionExtractor::<String>::new();
        let rebuilt = extractor
            .emplace(vec![Box::new(String::from("x"))], None)
            .unwrap();
        assert_eq!(
            rebuilt.take::<Option<String>>().unwrap().as_deref(),
            Some("x")
        );

        let err = extractor.emplace(vec![Box::new(1_u8)], None).unwrap_err();
        assert!(matches!(err, ReflectError::TypeMismatch { .. }));
    }
}
