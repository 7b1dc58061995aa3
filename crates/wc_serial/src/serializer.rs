use core::any::TypeId;
use core::cell::Cell;
use alloc::sync::Arc;

use wc_reflect::info::BaseKind;
use wc_reflect::registry::{GetTypeMeta, TypeMeta, TypeRegistry, TypeTraitDefault};
use wc_reflect::{Owner, Reflect};
use wc_utils::TypeIdMap;
use wc_utils::hash::HashMap;
use wc_wire::{Tag, WireValue};

use crate::converters;
use crate::trace::Trace;
use crate::{
    ByteArrayFormat, Config, ConverterRegistry, Dynamic, Error, MultiMapMode, Polymorphing,
    Priority, SerializationHelper, TypeConverter, ValidationFlags,
};

// -----------------------------------------------------------------------------
// Serializer

/// Converts values to and from the wire model.
///
/// A serializer is assembled once with a [`SerializerBuilder`] and is
/// immutable afterwards, so it can be shared between threads. Every call
/// owns its own property trace.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use wc_serial::Serializer;
/// use wc_wire::WireValue;
///
/// let serializer = Serializer::builder()
///     .register::<BTreeMap<String, Vec<i32>>>()
///     .build();
///
/// let value = BTreeMap::from([("primes".to_owned(), vec![2, 3, 5])]);
/// let json = serializer.to_json_string(&value).unwrap();
/// assert_eq!(json, r#"{"primes":[2,3,5]}"#);
///
/// let back: BTreeMap<String, Vec<i32>> = serializer.from_json_str(&json).unwrap();
/// assert_eq!(back, value);
/// ```
pub struct Serializer {
    types: TypeRegistry,
    converters: ConverterRegistry,
    config: Config,
    type_tags: TypeIdMap<Tag>,
    tag_types: HashMap<Tag, Vec<TypeId>>,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    /// A serializer with the standard converters and default options.
    pub fn new() -> Self {
        SerializerBuilder::new().build()
    }

    pub fn builder() -> SerializerBuilder {
        SerializerBuilder::new()
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn registry(&self) -> &TypeRegistry {
        &self.types
    }

    #[inline]
    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// The tag override of `ty`, if any.
    pub fn type_tag(&self, ty: TypeId) -> Option<Tag> {
        self.type_tags.get(&ty).copied()
    }

    pub fn types_for_tag(&self, tag: Tag) -> &[TypeId] {
        self.tag_types.get(&tag).map_or(&[], Vec::as_slice)
    }

    // --- wire model ---

    /// Converts `value` into the full wire model.
    pub fn serialize<T: Reflect>(&self, value: &T) -> Result<WireValue, Error> {
        self.serialize_dyn(TypeId::of::<T>(), value)
    }

    /// Converts `value` of declared type `ty` into the full wire model.
    pub fn serialize_dyn(&self, ty: TypeId, value: &dyn Reflect) -> Result<WireValue, Error> {
        Context::new(self, false).serialize_value(ty, value)
    }

    /// Builds a `T` from the full wire model.
    pub fn deserialize<T: Reflect>(&self, value: &WireValue) -> Result<T, Error> {
        let value = self.deserialize_dyn(TypeId::of::<T>(), value, None)?;
        crate::converter::take_value(value)
    }

    /// Like [`deserialize`](Self::deserialize), keeping the pointees of
    /// weak pointers alive in `owner`.
    pub fn deserialize_with_owner<T: Reflect>(
        &self,
        value: &WireValue,
        owner: &Owner,
    ) -> Result<T, Error> {
        let value = self.deserialize_dyn(TypeId::of::<T>(), value, Some(owner))?;
        crate::converter::take_value(value)
    }

    pub fn deserialize_dyn(
        &self,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
    ) -> Result<Box<dyn Reflect>, Error> {
        Context::new(self, false).deserialize_value(ty, value, owner)
    }

    // --- JSON ---

    /// Converts `value` into JSON.
    pub fn to_json<T: Reflect>(&self, value: &T) -> Result<serde_json::Value, Error> {
        let wire = Context::new(self, true).serialize_value(TypeId::of::<T>(), value)?;
        Ok(wire.to_json())
    }

    /// Builds a `T` from JSON.
    pub fn from_json<T: Reflect>(&self, json: &serde_json::Value) -> Result<T, Error> {
        self.from_json_with_owner(json, None)
    }

    pub fn from_json_with_owner<T: Reflect>(
        &self,
        json: &serde_json::Value,
        owner: Option<&Owner>,
    ) -> Result<T, Error> {
        let wire = WireValue::from_json(json);
        let value = Context::new(self, true).deserialize_value(TypeId::of::<T>(), &wire, owner)?;
        crate::converter::take_value(value)
    }

    pub fn to_json_string<T: Reflect>(&self, value: &T) -> Result<String, Error> {
        let json = self.to_json(value)?;
        serde_json::to_string(&json).map_err(|e| Error::serialization(e.to_string()))
    }

    pub fn from_json_str<T: Reflect>(&self, text: &str) -> Result<T, Error> {
        let json: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| Error::deserialization(format!("Invalid JSON document: {e}")))?;
        self.from_json(&json)
    }
}

impl core::fmt::Debug for Serializer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Serializer")
            .field("config", &self.config)
            .field("converters", &self.converters)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// SerializerBuilder

/// Registers types, converters and options of a [`Serializer`].
///
/// [`new`](Self::new) starts from the standard converters and the types
/// they need; [`empty`](Self::empty) from nothing.
pub struct SerializerBuilder {
    types: TypeRegistry,
    converters: ConverterRegistry,
    config: Config,
    type_tags: TypeIdMap<Tag>,
    tag_types: HashMap<Tag, Vec<TypeId>>,
}

impl Default for SerializerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SerializerBuilder {
    pub fn new() -> Self {
        let mut builder = Self::empty();
        builder.types = TypeRegistry::new();
        converters::register_value_types(&mut builder.types);
        converters::register_standard(&mut builder.converters);
        builder
    }

    pub fn empty() -> Self {
        Self {
            types: TypeRegistry::empty(),
            converters: ConverterRegistry::new(),
            config: Config::default(),
            type_tags: TypeIdMap::new(),
            tag_types: HashMap::default(),
        }
    }

    // --- types ---

    /// Registers `T` and the types it depends on.
    pub fn register<T: GetTypeMeta>(mut self) -> Self {
        self.types.register::<T>();
        self
    }

    /// Registers a leaf type handled by a custom converter.
    pub fn opaque<T: Reflect + Default>(mut self) -> Self {
        self.types
            .try_insert_type_meta(TypeMeta::opaque::<T>().with_default::<T>());
        self
    }

    /// Inserts or replaces the metadata of a type.
    pub fn type_meta(mut self, meta: TypeMeta) -> Self {
        self.types.insert_type_meta(meta);
        self
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    /// Writes `T` with `tag` instead of its converter's tag, and resolves
    /// erased values carrying `tag` to `T`.
    pub fn type_tag<T: Reflect>(mut self, tag: Tag) -> Self {
        let ty = TypeId::of::<T>();
        self.type_tags.insert(ty, tag);
        let types = self.tag_types.entry(tag).or_default();
        if !types.contains(&ty) {
            types.push(ty);
        }
        self
    }

    // --- converters ---

    pub fn converter(mut self, converter: impl TypeConverter) -> Self {
        self.converters.add(converter);
        self
    }

    pub fn converter_with_priority(mut self, converter: impl TypeConverter, priority: Priority) -> Self {
        self.converters.add_with_priority(converter, priority);
        self
    }

    pub fn shared_converter(mut self, converter: Arc<dyn TypeConverter>) -> Self {
        let priority = converter.priority();
        self.converters.add_shared(converter, priority);
        self
    }

    // --- options ---

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn allow_default_null(mut self, enabled: bool) -> Self {
        self.config.allow_default_null = enabled;
        self
    }

    pub fn keep_object_name(mut self, enabled: bool) -> Self {
        self.config.keep_object_name = enabled;
        self
    }

    pub fn enum_as_string(mut self, enabled: bool) -> Self {
        self.config.enum_as_string = enabled;
        self
    }

    pub fn version_as_string(mut self, enabled: bool) -> Self {
        self.config.version_as_string = enabled;
        self
    }

    pub fn date_as_time_stamp(mut self, enabled: bool) -> Self {
        self.config.date_as_time_stamp = enabled;
        self
    }

    pub fn use_bcp47_locale(mut self, enabled: bool) -> Self {
        self.config.use_bcp47_locale = enabled;
        self
    }

    pub fn validation_flags(mut self, flags: ValidationFlags) -> Self {
        self.config.validation_flags = flags;
        self
    }

    pub fn polymorphing(mut self, mode: Polymorphing) -> Self {
        self.config.polymorphing = mode;
        self
    }

    pub fn multi_map_mode(mut self, mode: MultiMapMode) -> Self {
        self.config.multi_map_mode = mode;
        self
    }

    pub fn ignore_stored_attribute(mut self, enabled: bool) -> Self {
        self.config.ignore_stored_attribute = enabled;
        self
    }

    pub fn byte_array_format(mut self, format: ByteArrayFormat) -> Self {
        self.config.byte_array_format = format;
        self
    }

    pub fn validate_base64(mut self, enabled: bool) -> Self {
        self.config.validate_base64 = enabled;
        self
    }

    pub fn build(self) -> Serializer {
        log::debug!(
            "built serializer with {} types and {} converters",
            self.types.iter().len(),
            self.converters.len()
        );
        Serializer {
            types: self.types,
            converters: self.converters,
            config: self.config,
            type_tags: self.type_tags,
            tag_types: self.tag_types,
        }
    }
}

// -----------------------------------------------------------------------------
// Context

#[inline]
fn is_erased(ty: TypeId) -> bool {
    ty == TypeId::of::<Dynamic>()
}

/// State of one top-level call; the [`SerializationHelper`] converters see.
struct Context<'a> {
    serializer: &'a Serializer,
    json: bool,
    trace: Trace,
    object_depth: Cell<usize>,
}

/// Counts an object being converted for the duration of its converter.
struct ObjectScope<'a>(&'a Cell<usize>);

impl Drop for ObjectScope<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

impl<'a> Context<'a> {
    fn new(serializer: &'a Serializer, json: bool) -> Self {
        Self {
            serializer,
            json,
            trace: Trace::default(),
            object_depth: Cell::new(0),
        }
    }

    fn enter(&self, ty: TypeId) -> Option<ObjectScope<'_>> {
        match self.serializer.types.base_kind(ty) {
            Some(BaseKind::Object | BaseKind::Gadget) => {
                self.object_depth.set(self.object_depth.get() + 1);
                Some(ObjectScope(&self.object_depth))
            }
            _ => None,
        }
    }

    fn serialize_value(&self, ty: TypeId, value: &dyn Reflect) -> Result<WireValue, Error> {
        if is_erased(ty) {
            let Some(inner) = value.downcast_ref::<Dynamic>() else {
                return Err(Error::serialization(format!(
                    "Expected a dynamic value, but got {}",
                    value.reflect_type_path()
                )));
            };
            let inner: &dyn Reflect = &**inner;
            return self.serialize_value(inner.ty_id(), inner);
        }

        let Some(converter) = self.serializer.converters.find_serializer(ty, self) else {
            let err = Error::serialization(format!(
                "Unable to find a converter for type {}",
                self.type_name(ty)
            ));
            return Err(err.capture(|| self.trace.snapshot()));
        };

        let result = {
            let _scope = self.enter(ty);
            converter.serialize(ty, value, self)
        };
        let result = result.map_err(|err| err.capture(|| self.trace.snapshot()))?;

        Ok(match self.serializer.type_tag(ty) {
            Some(tag) => WireValue::tagged(tag, result.into_untagged()),
            None => result,
        })
    }

    fn deserialize_value(
        &self,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
    ) -> Result<Box<dyn Reflect>, Error> {
        self.deserialize_inner(ty, value, owner)
            .map_err(|err| err.capture(|| self.trace.snapshot()))
    }

    fn deserialize_inner(
        &self,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
    ) -> Result<Box<dyn Reflect>, Error> {
        let tag = value.tag();
        let kind = value.untagged().kind();

        if is_erased(ty) {
            let inner = match self.serializer.converters.select(None, tag, kind, self)? {
                Some(selection) => self.run(selection.converter, selection.ty, value, owner)?,
                None => Box::new(value.clone()),
            };
            return Ok(Box::new(inner));
        }

        let Some(selection) = self.serializer.converters.select(Some(ty), tag, kind, self)? else {
            if value.is_null() && self.serializer.config.allow_default_null {
                return self.default_value(ty);
            }
            return Err(Error::deserialization(format!(
                "Unable to find a converter to deserialize a {kind} value with tag {} into type {}",
                crate::converter::describe_tag(tag),
                self.type_name(ty),
            )));
        };

        let result = self.run(selection.converter, ty, value, owner)?;
        let found = (*result).ty_id();
        if found == ty || self.serializer.types.inherits(found, ty) {
            Ok(result)
        } else if value.is_null() && self.serializer.config.allow_default_null {
            self.default_value(ty)
        } else {
            Err(Error::deserialization(format!(
                "Failed to convert deserialized variant of type {} to property type {}",
                (*result).reflect_type_path(),
                self.type_name(ty),
            )))
        }
    }

    fn run(
        &self,
        converter: &dyn TypeConverter,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
    ) -> Result<Box<dyn Reflect>, Error> {
        let _scope = self.enter(ty);
        if self.json {
            converter.deserialize_json(ty, value, owner, self)
        } else {
            converter.deserialize_cbor(ty, value, owner, self)
        }
    }

    fn default_value(&self, ty: TypeId) -> Result<Box<dyn Reflect>, Error> {
        match self.serializer.types.get_type_trait::<TypeTraitDefault>(ty) {
            Some(generator) => Ok(generator.default()),
            None => Err(Error::deserialization(format!(
                "Type {} has no default value to replace null with",
                self.type_name(ty)
            ))),
        }
    }
}

impl SerializationHelper for Context<'_> {
    #[inline]
    fn is_json_mode(&self) -> bool {
        self.json
    }

    #[inline]
    fn config(&self) -> &Config {
        &self.serializer.config
    }

    fn validation_flags(&self) -> ValidationFlags {
        self.serializer
            .config
            .validation_flags
            .at_depth(self.object_depth.get())
    }

    fn type_tag(&self, ty: TypeId) -> Option<Tag> {
        self.serializer.type_tag(ty)
    }

    fn types_for_tag(&self, tag: Tag) -> &[TypeId] {
        self.serializer.types_for_tag(tag)
    }

    #[inline]
    fn registry(&self) -> &TypeRegistry {
        &self.serializer.types
    }

    fn serialize_subtype(
        &self,
        ty: TypeId,
        value: &dyn Reflect,
        trace_hint: &str,
    ) -> Result<WireValue, Error> {
        let _scope = self.trace.push(trace_hint, self.type_name(ty));
        log::trace!(
            "{}serializing subtype {trace_hint} of type {}",
            self.trace.indent(),
            self.type_name(ty)
        );
        let result = self.serialize_value(ty, value);
        log::trace!("{}done", self.trace.indent());
        result
    }

    fn deserialize_subtype(
        &self,
        ty: TypeId,
        value: &WireValue,
        owner: Option<&Owner>,
        trace_hint: &str,
    ) -> Result<Box<dyn Reflect>, Error> {
        let _scope = self.trace.push(trace_hint, self.type_name(ty));
        log::trace!(
            "{}deserializing subtype {trace_hint} of type {}",
            self.trace.indent(),
            self.type_name(ty)
        );
        let result = self.deserialize_value(ty, value, owner);
        log::trace!("{}done", self.trace.indent());
        result
    }
}
