use core::any::TypeId;
use alloc::sync::Arc;

use wc_wire::{Tag, WireKind};

use crate::converter::describe_tag;
use crate::{Capability, Error, Priority, SerializationHelper, TypeConverter};

struct Entry {
    priority: Priority,
    converter: Arc<dyn TypeConverter>,
}

/// The converter chosen to deserialize a value.
pub struct Selection<'a> {
    pub converter: &'a dyn TypeConverter,
    /// The declared type, or the guessed one for erased values.
    pub ty: TypeId,
}

/// Converters sorted by descending priority.
///
/// Converters of equal priority keep their registration order, so the
/// earlier one wins ties.
///
/// # Examples
///
/// ```
/// use wc_serial::{ConverterRegistry, Priority};
/// use wc_serial::converters::{ListConverter, ScalarConverter};
///
/// let mut converters = ConverterRegistry::new();
/// converters.add(ScalarConverter);
/// converters.add_with_priority(ListConverter, Priority::HIGH);
///
/// let names: Vec<_> = converters.iter().map(|c| c.name()).collect();
/// assert_eq!(names, ["ListConverter", "ScalarConverter"]);
/// ```
#[derive(Default)]
pub struct ConverterRegistry {
    entries: Vec<Entry>,
}

impl ConverterRegistry {
    /// An empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a converter at its own priority.
    pub fn add(&mut self, converter: impl TypeConverter) {
        let priority = converter.priority();
        self.add_with_priority(converter, priority);
    }

    /// Adds a converter at `priority`.
    pub fn add_with_priority(&mut self, converter: impl TypeConverter, priority: Priority) {
        self.add_shared(Arc::new(converter), priority);
    }

    pub fn add_shared(&mut self, converter: Arc<dyn TypeConverter>, priority: Priority) {
        let idx = self.entries.partition_point(|entry| entry.priority >= priority);
        log::debug!("added converter {} at priority {}", converter.name(), priority.0);
        self.entries.insert(
            idx,
            Entry {
                priority,
                converter,
            },
        );
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converters in selection order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &dyn TypeConverter> {
        self.entries.iter().map(|entry| &*entry.converter)
    }

    /// The first converter able to serialize `ty`.
    pub fn find_serializer(
        &self,
        ty: TypeId,
        helper: &dyn SerializationHelper,
    ) -> Option<&dyn TypeConverter> {
        let found = self.iter().find(|converter| converter.can_convert(ty, helper));
        match found {
            Some(converter) => log::trace!(
                "found serialization converter {} for type {}",
                converter.name(),
                helper.type_name(ty)
            ),
            None => log::trace!(
                "unable to find serialization converter for type {}",
                helper.type_name(ty)
            ),
        }
        found
    }

    /// Selects the converter for a value of declared type `ty`.
    ///
    /// - An erased type with a tag first tries the types registered for it.
    /// - The first `Positive` converter wins.
    /// - Otherwise the first `Guessed` one.
    /// - Otherwise, if a converter handles the type but not the tag, the
    ///   mismatch is an error rather than a reason to look further.
    /// - Otherwise there is no converter.
    pub fn select<'a>(
        &'a self,
        ty: Option<TypeId>,
        tag: Option<Tag>,
        kind: WireKind,
        helper: &dyn SerializationHelper,
    ) -> Result<Option<Selection<'a>>, Error> {
        if let (None, Some(tag)) = (ty, tag) {
            for &candidate in helper.types_for_tag(tag) {
                if let Some(selection) = self.select(Some(candidate), Some(tag), kind, helper)? {
                    return Ok(Some(selection));
                }
            }
        }

        let mut guessed = None;
        let mut wrong_tag = false;
        for converter in self.iter() {
            match converter.can_deserialize(ty, tag, kind, helper) {
                Capability::Negative => {}
                Capability::WrongTag => wrong_tag = true,
                Capability::Guessed(guess) => {
                    if guessed.is_none() {
                        guessed = Some(Selection {
                            converter,
                            ty: guess,
                        });
                    }
                }
                Capability::Positive => {
                    // `Positive` is only reported for a known type.
                    let Some(ty) = ty else { continue };
                    log::trace!(
                        "found deserialization converter {} for type {} with tag {} and kind {kind}",
                        converter.name(),
                        helper.type_name(ty),
                        describe_tag(tag),
                    );
                    return Ok(Some(Selection { converter, ty }));
                }
            }
        }

        if let Some(selection) = guessed {
            log::trace!(
                "guessed deserialization converter {} for data with tag {} and kind {kind} to be of type {}",
                selection.converter.name(),
                describe_tag(tag),
                helper.type_name(selection.ty),
            );
            return Ok(Some(selection));
        }

        if let (true, Some(ty)) = (wrong_tag, ty) {
            return Err(Error::deserialization(format!(
                "Found converter able to handle data of type {}, but the given CBOR tag {} is not convertible to that type.",
                helper.type_name(ty),
                describe_tag(tag),
            )));
        }

        log::trace!(
            "unable to find deserialization converter for type {} with tag {} and kind {kind}",
            ty.map_or("<erased>", |ty| helper.type_name(ty)),
            describe_tag(tag),
        );
        Ok(None)
    }
}

impl core::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.converter.name(), e.priority.0)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use wc_reflect::{Owner, Reflect};
    use wc_wire::WireValue;

    use super::*;
    use crate::{Dynamic, Serializer, SerializerBuilder};

    #[derive(Debug, Default, PartialEq)]
    struct Code(i64);

    /// Writes and reads `Code(output)` whatever the input, so tests can see
    /// which converter ran.
    struct Fixed {
        name: &'static str,
        output: i64,
        tags: Vec<Option<Tag>>,
        guess: Option<Tag>,
    }

    fn fixed(name: &'static str, output: i64) -> Fixed {
        Fixed {
            name,
            output,
            tags: Vec::new(),
            guess: None,
        }
    }

    impl TypeConverter for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn can_convert(&self, ty: TypeId, _helper: &dyn SerializationHelper) -> bool {
            ty == TypeId::of::<Code>()
        }

        fn allowed_tags(&self, _ty: TypeId, _helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
            self.tags.clone()
        }

        fn allowed_kinds(
            &self,
            _ty: TypeId,
            _tag: Option<Tag>,
            _helper: &dyn SerializationHelper,
        ) -> Vec<WireKind> {
            vec![WireKind::Integer]
        }

        fn guess_type(
            &self,
            tag: Option<Tag>,
            kind: WireKind,
            _helper: &dyn SerializationHelper,
        ) -> Option<TypeId> {
            (self.guess.is_some() && tag == self.guess && kind == WireKind::Integer)
                .then(TypeId::of::<Code>)
        }

        fn serialize(
            &self,
            _ty: TypeId,
            _value: &dyn Reflect,
            _helper: &dyn SerializationHelper,
        ) -> Result<WireValue, Error> {
            Ok(WireValue::Integer(self.output))
        }

        fn deserialize_cbor(
            &self,
            _ty: TypeId,
            _value: &WireValue,
            _owner: Option<&Owner>,
            _helper: &dyn SerializationHelper,
        ) -> Result<Box<dyn Reflect>, Error> {
            Ok(Box::new(Code(self.output)))
        }
    }

    fn builder() -> SerializerBuilder {
        SerializerBuilder::empty().opaque::<Code>()
    }

    #[test]
    fn ties_keep_registration_order() {
        let serializer = builder()
            .converter(fixed("first", 1))
            .converter(fixed("second", 2))
            .build();
        assert_eq!(serializer.serialize(&Code(0)).unwrap(), WireValue::Integer(1));
        assert_eq!(
            serializer.deserialize::<Code>(&WireValue::Integer(0)).unwrap(),
            Code(1)
        );
    }

    #[test]
    fn priority_beats_registration_order() {
        let serializer = builder()
            .converter_with_priority(fixed("low", 1), Priority::LOW)
            .converter(fixed("standard", 2))
            .converter_with_priority(fixed("high", 3), Priority::HIGH)
            .build();
        let names: Vec<_> = serializer.converters().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["high", "standard", "low"]);
        assert_eq!(serializer.serialize(&Code(0)).unwrap(), WireValue::Integer(3));
    }

    #[test]
    fn wrong_tags_fail_instead_of_falling_through() {
        let tagged = Fixed {
            tags: vec![Some(Tag(900))],
            ..fixed("tagged", 1)
        };
        let serializer = builder().converter(tagged).build();

        assert_eq!(
            serializer
                .deserialize::<Code>(&WireValue::tagged(Tag(900), 0))
                .unwrap(),
            Code(1)
        );
        let err = serializer
            .deserialize::<Code>(&WireValue::tagged(Tag(901), 0))
            .unwrap_err();
        assert_eq!(
            err.message(),
            "Found converter able to handle data of type Code, but the given CBOR tag 901 is not convertible to that type."
        );

        // JSON has no tags to check.
        assert_eq!(serializer.from_json::<Code>(&serde_json::json!(0)).unwrap(), Code(1));
    }

    #[test]
    fn positive_matches_beat_wrong_tags() {
        let tagged = Fixed {
            tags: vec![Some(Tag(900))],
            ..fixed("tagged", 1)
        };
        let serializer = builder()
            .converter_with_priority(tagged, Priority::HIGH)
            .converter(fixed("any", 2))
            .build();
        assert_eq!(
            serializer
                .deserialize::<Code>(&WireValue::tagged(Tag(901), 0))
                .unwrap(),
            Code(2)
        );
    }

    #[test]
    fn guesses_type_of_erased_values() {
        let guessing = Fixed {
            guess: Some(Tag(900)),
            ..fixed("guessing", 7)
        };
        let serializer = builder().converter(guessing).build();

        let value = serializer
            .deserialize::<Dynamic>(&WireValue::tagged(Tag(900), 0))
            .unwrap();
        assert_eq!(value.downcast_ref::<Code>(), Some(&Code(7)));

        let raw = WireValue::tagged(Tag(901), 0);
        let value = serializer.deserialize::<Dynamic>(&raw).unwrap();
        assert_eq!(value.downcast_ref::<WireValue>(), Some(&raw));
    }

    #[test]
    fn missing_converters() {
        let serializer = Serializer::builder().opaque::<Code>().build();
        let err = serializer.serialize(&Code(0)).unwrap_err();
        assert_eq!(err.message(), "Unable to find a converter for type Code");
        let err = serializer.deserialize::<Code>(&WireValue::Integer(0)).unwrap_err();
        assert_eq!(
            err.message(),
            "Unable to find a converter to deserialize a integer value with tag <none> into type Code"
        );
    }
}
