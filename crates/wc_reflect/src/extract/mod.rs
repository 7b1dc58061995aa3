//! Decomposition of generic wrappers and containers.
//!
//! An [`Extractor`] describes how a value of a generic shape (pointer,
//! optional, tuple, list, map, ...) splits into sub-values of its
//! [`subtypes`](Extractor::subtypes), and how such sub-values are put back
//! together.
//!
//! Parts are laid out per [`ExtractorKind`]:
//!
//! | kind | `subtypes` | parts |
//! |---|---|---|
//! | `Pointer`, `WeakPointer`, `Optional` | `[T]` | zero (empty) or one |
//! | `Variant` | one per alternative | exactly one, of any alternative |
//! | `Pair`, `Tuple` | one per element | one per element |
//! | `List`, `Set` | `[T]` | one per element |
//! | `Map`, `MultiMap` | `[K, V]` | key, value, key, value, ... |

// -----------------------------------------------------------------------------
// Modules

mod list;
mod map;
mod multimap;
mod optional;
mod pointer;
mod tuple;
mod variant;

// -----------------------------------------------------------------------------
// Exports

pub use list::{SeqExtractor, Sequence};
pub use map::{MapExtractor, Mapping};
pub use multimap::MultiMap;
pub use optional::OptionExtractor;
pub use pointer::{ArcExtractor, BoxExtractor, DynBoxExtractor, WeakExtractor};
pub use tuple::{PairExtractor, TupleExtractor, TupleLike};
pub use variant::VariantExtractor;

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;
use core::ops::Deref;

use crate::{Owner, Reflect, ReflectError};

// -----------------------------------------------------------------------------
// ExtractorKind

/// The generic shape described by an [`Extractor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractorKind {
    Pointer,
    WeakPointer,
    Optional,
    Variant,
    Pair,
    Tuple,
    List,
    Set,
    Map,
    MultiMap,
}

// -----------------------------------------------------------------------------
// Part

/// A sub-value produced by [`Extractor::extract`].
///
/// Most parts borrow from the decomposed value. Weak pointers have to
/// upgrade first and hand out the strong reference instead.
pub enum Part<'a> {
    Borrowed(&'a dyn Reflect),
    Shared(Arc<dyn Reflect>),
}

impl Deref for Part<'_> {
    type Target = dyn Reflect;

    #[inline]
    fn deref(&self) -> &Self::Target {
        match self {
            Part::Borrowed(value) => *value,
            Part::Shared(value) => &**value,
        }
    }
}

impl core::fmt::Debug for Part<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&**self, f)
    }
}

// -----------------------------------------------------------------------------
// Extractor

/// Decomposes and rebuilds values of one generic type.
pub trait Extractor: Send + Sync + 'static {
    fn kind(&self) -> ExtractorKind;

    /// The types the shape is parameterized over, in part order.
    fn subtypes(&self) -> &[TypeId];

    /// Splits `value` into its parts.
    fn extract<'a>(&self, value: &'a dyn Reflect) -> Result<Vec<Part<'a>>, ReflectError>;

    /// Rebuilds a value from parts laid out as [`extract`](Self::extract)
    /// produces them.
    ///
    /// `owner` is only consulted by weak pointers.
    fn emplace(
        &self,
        parts: Vec<Box<dyn Reflect>>,
        owner: Option<&Owner>,
    ) -> Result<Box<dyn Reflect>, ReflectError>;
}

/// Downcasts the part at `T`, reporting the expected type on mismatch.
pub(crate) fn take_part<T: Reflect>(part: Box<dyn Reflect>) -> Result<T, ReflectError> {
    part.take::<T>()
        .map_err(|part| ReflectError::mismatch::<T>(&*part))
}

/// Downcasts the decomposed value itself.
pub(crate) fn expect_ref<T: Reflect>(value: &dyn Reflect) -> Result<&T, ReflectError> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| ReflectError::mismatch::<T>(value))
}
