use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::Error;

bitflags! {
    /// Extra checks applied while deserializing.
    ///
    /// The property checks apply to the outermost objects of a call only,
    /// unless [`DEEP_VALIDATE_NESTED_OBJECTS`](Self::DEEP_VALIDATE_NESTED_OBJECTS)
    /// is set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ValidationFlags: u8 {
        /// Reject keys without a matching field.
        const NO_EXTRA_PROPERTIES           = 1 << 0;
        /// Require a key for every stored field.
        const ALL_PROPERTIES                = 1 << 1;
        /// Require exact kinds and tags for basic types.
        const STRICT_BASIC_TYPES            = 1 << 2;
        /// Apply the property checks to nested objects as well.
        const DEEP_VALIDATE_NESTED_OBJECTS  = 1 << 3;

        const FULL_PROPERTY_VALIDATION = Self::NO_EXTRA_PROPERTIES.bits()
            | Self::ALL_PROPERTIES.bits()
            | Self::DEEP_VALIDATE_NESTED_OBJECTS.bits();
        const FULL_VALIDATION = Self::FULL_PROPERTY_VALIDATION.bits()
            | Self::STRICT_BASIC_TYPES.bits();
    }
}

impl ValidationFlags {
    /// No checks at all.
    pub const STANDARD_VALIDATION: Self = Self::empty();

    const PROPERTY_CHECKS: Self = Self::NO_EXTRA_PROPERTIES.union(Self::ALL_PROPERTIES);

    /// The flags in effect for an object at `object_depth`, counted from 1.
    pub fn at_depth(self, object_depth: usize) -> Self {
        if object_depth <= 1 || self.contains(Self::DEEP_VALIDATE_NESTED_OBJECTS) {
            self
        } else {
            self.difference(Self::PROPERTY_CHECKS)
        }
    }
}

// -----------------------------------------------------------------------------
// PropertyCheck

/// Tracks the property checks of one object being deserialized.
pub(crate) struct PropertyCheck<'a> {
    flags: ValidationFlags,
    class_name: &'a str,
    missing: Vec<&'a str>,
}

impl<'a> PropertyCheck<'a> {
    /// `required` are the keys the object would be serialized with.
    pub fn new(
        flags: ValidationFlags,
        class_name: &'a str,
        required: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let missing = if flags.contains(ValidationFlags::ALL_PROPERTIES) {
            required.into_iter().collect()
        } else {
            Vec::new()
        };
        Self {
            flags,
            class_name,
            missing,
        }
    }

    pub fn found(&mut self, key: &str) {
        self.missing.retain(|name| *name != key);
    }

    /// Reports a key without a matching field.
    pub fn extra(&self, key: &str) -> Result<(), Error> {
        if self.flags.contains(ValidationFlags::NO_EXTRA_PROPERTIES) {
            return Err(Error::deserialization(format!(
                "Found extra property {key} but extra properties are not allowed"
            )));
        }
        log::warn!("ignoring unknown property {key} of {}", self.class_name);
        Ok(())
    }

    pub fn finish(self) -> Result<(), Error> {
        if self.missing.is_empty() {
            return Ok(());
        }
        Err(Error::deserialization(format!(
            "Not all properties for {} are present in the json object Missing properties: {}",
            self.class_name,
            self.missing.join(", "),
        )))
    }
}
