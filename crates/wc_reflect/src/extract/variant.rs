use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::any::{TypeId, type_name};

use crate::extract::{Extractor, ExtractorKind, Part, expect_ref};
use crate::{Owner, Reflect, ReflectError};

trait Alternative<T>: Send + Sync {
    fn type_id(&self) -> TypeId;
    fn get<'a>(&self, value: &'a T) -> Option<&'a dyn Reflect>;
    fn wrap(&self, part: Box<dyn Reflect>) -> Result<T, Box<dyn Reflect>>;
}

struct TypedAlternative<T, A> {
    get: fn(&T) -> Option<&A>,
    wrap: fn(A) -> T,
}

impl<T: Reflect, A: Reflect> Alternative<T> for TypedAlternative<T, A> {
    fn type_id(&self) -> TypeId {
        TypeId::of::<A>()
    }

    fn get<'a>(&self, value: &'a T) -> Option<&'a dyn Reflect> {
        (self.get)(value).map(|a| a as &dyn Reflect)
    }

    fn wrap(&self, part: Box<dyn Reflect>) -> Result<T, Box<dyn Reflect>> {
        part.take::<A>().map(self.wrap)
    }
}

/// Extractor of sum types holding exactly one of several alternatives.
///
/// # Examples
///
/// ```
/// use wc_reflect::extract::{Extractor, VariantExtractor};
///
/// #[derive(Debug, PartialEq)]
/// enum Value { Int(i32), Text(String) }
///
/// let extractor = VariantExtractor::<Value>::new()
///     .alternative::<i32>(|v| match v { Value::Int(i) => Some(i), _ => None }, Value::Int)
///     .alternative::<String>(|v| match v { Value::Text(s) => Some(s), _ => None }, Value::Text);
///
/// let rebuilt = extractor.emplace(vec![Box::new(String::from("x"))], None).unwrap();
/// assert_eq!(rebuilt.take::<Value>().unwrap(), Value::Text("x".into()));
/// ```
pub struct VariantExtractor<T> {
    subtypes: Vec<TypeId>,
    alternatives: Vec<Box<dyn Alternative<T>>>,
}

impl<T: Reflect> VariantExtractor<T> {
    pub fn new() -> Self {
        Self {
            subtypes: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    /// Adds an alternative. Declaration order is the order converters try.
    pub fn alternative<A: Reflect>(mut self, get: fn(&T) -> Option<&A>, wrap: fn(A) -> T) -> Self {
        self.subtypes.push(TypeId::of::<A>());
        self.alternatives.push(Box::new(TypedAlternative { get, wrap }));
        self
    }
}

impl<T: Reflect> Extractor for VariantExtractor<T> {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Variant
    }

    fn subtypes(&self) -> &[TypeId] {
        &self.subtypes
    }

    fn extract<'a>(&self, value: &'a dyn Reflect) -> Result<Vec<Part<'a>>, ReflectError> {
        let variant = expect_ref::<T>(value)?;
        self.alternatives
            .iter()
            .find_map(|alt| alt.get(variant))
            .map(|held| vec![Part::Borrowed(held)])
            .ok_or(ReflectError::EmptyValue(type_name::<T>()))
    }

    fn emplace(
        &self,
        mut parts: Vec<Box<dyn Reflect>>,
        _owner: Option<&Owner>,
    ) -> Result<Box<dyn Reflect>, ReflectError> {
        if parts.len() != 1 {
            return Err(ReflectError::part_count::<T>(1, parts.len()));
        }
        let Some(part) = parts.pop() else {
            return Err(ReflectError::EmptyValue(type_name::<T>()));
        };
        let found = (*part).ty_id();
        let no_cast = ReflectError::NoCast {
            target: type_name::<T>(),
            found: (*part).reflect_type_path(),
        };
        let Some(alt) = self.alternatives.iter().find(|alt| alt.type_id() == found) else {
            return Err(no_cast);
        };
        match alt.wrap(part) {
            Ok(value) => Ok(Box::new(value)),
            Err(_) => Err(no_cast),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Number {
        Small(u8),
        Wide(i64),
    }

    fn extractor() -> VariantExtractor<Number> {
        VariantExtractor::new()
            .alternative::<u8>(
                |n| match n {
                    Number::Small(v) => Some(v),
                    _ => None,
                },
                Number::Small,
            )
            .alternative::<i64>(
                |n| match n {
                    Number::Wide(v) => Some(v),
                    _ => None,
                },
                Number::Wide,
            )
    }

    #[test]
    fn extracts_held_alternative() {
        let value = Number::Wide(-3);
        let parts = extractor().extract(&value).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].downcast_ref::<i64>(), Some(&-3));
    }

    #[test]
    fn unknown_alternative_is_rejected() {
        let err = extractor()
            .emplace(vec![Box::new(1.5_f64)], None)
            .unwrap_err();
        assert!(matches!(err, ReflectError::NoCast { found: "f64", .. }));
    }
}
