use core::any::TypeId;

use wc_reflect::info::BaseKind;
use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireValue};

use super::{base_kind, emplace, extract, subtypes};
use crate::{ANY_KIND, Error, SerializationHelper, TypeConverter};

/// Converts owning and weak pointers as their pointee.
///
/// A dangling weak pointer is written as null and null reads back as an
/// empty weak pointer. Rebuilt weak pointers hand their pointee to the
/// [`Owner`] passed to the call.
pub struct PointerConverter;

impl TypeConverter for PointerConverter {
    fn name(&self) -> &'static str {
        "PointerConverter"
    }

    fn can_convert(&self, ty: TypeId, helper: &dyn SerializationHelper) -> bool {
        matches!(
            base_kind(helper, ty),
            Some(BaseKind::Pointer | BaseKind::WeakPointer)
        )
    }

    fn allowed_kinds(
        &self,
        _ty: TypeId,
        _tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        ANY_KIND.to_vec()
    }

    fn serialize(
        &self,
        ty: TypeId,
        value: &dyn Reflect,
        helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error> {
        let (extractor, parts) = extract(helper, ty, value)?;
        match parts.first() {
            Some(pointee) => helper.serialize_subtype(extractor.subtypes()[0], &**pointee, "data"),
            None => Ok(WireValue::Null),
        }
    }

    fn deserialize_cbor(
        &self,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        if value.is_null() && base_kind(helper, ty) == Some(BaseKind::WeakPointer) {
            return emplace(helper, ty, Vec::new(), owner);
        }
        let Some(&pointee) = subtypes(helper, ty).first() else {
            return Err(Error::deserialization(format!(
                "Pointer type {} has no pointee type",
                helper.type_name(ty)
            )));
        };
        let pointee = helper.deserialize_subtype(pointee, value, owner, "data")?;
        emplace(helper, ty, vec![pointee], owner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Weak};

    use super::*;
    use crate::testing::*;

    #[test]
    fn owning_pointers() {
        let serializer = serializer()
            .register::<Box<i32>>()
            .register::<Arc<String>>()
            .build();
        assert_eq!(serializer.serialize(&Box::new(7)).unwrap(), WireValue::Integer(7));
        let value = serializer.deserialize::<Arc<String>>(&WireValue::from("x")).unwrap();
        assert_eq!(value.as_str(), "x");
    }

    #[test]
    fn weak_pointers_need_an_owner() {
        let serializer = serializer().register::<Weak<i32>>().build();
        let strong = Arc::new(3);
        let wire = serializer.serialize(&Arc::downgrade(&strong)).unwrap();
        assert_eq!(wire, WireValue::Integer(3));
        drop(strong);

        assert!(serializer.deserialize::<Weak<i32>>(&wire).is_err());

        let owner = Owner::new();
        let weak = serializer.deserialize_with_owner::<Weak<i32>>(&wire, &owner).unwrap();
        assert_eq!(weak.upgrade().as_deref(), Some(&3));
        assert_eq!(owner.len(), 1);
    }

    #[test]
    fn dangling_weak_is_null() {
        let serializer = serializer().register::<Weak<i32>>().build();
        assert_eq!(serializer.serialize(&Weak::<i32>::new()).unwrap(), WireValue::Null);
        let weak = serializer.deserialize::<Weak<i32>>(&WireValue::Null).unwrap();
        assert!(weak.upgrade().is_none());
    }
}
