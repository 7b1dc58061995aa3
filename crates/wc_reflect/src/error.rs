use thiserror::Error;

/// Failures raised while decomposing or rebuilding a value through its
/// type metadata.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReflectError {
    #[error("expected a value of type `{expected}`, found `{found}`")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("`{type_path}` expects {expected} part(s), but {found} were given")]
    PartCount {
        type_path: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("`{0}` cannot hold an empty value")]
    EmptyValue(&'static str),
    #[error("`{0}` needs an owner to keep its pointee alive")]
    MissingOwner(&'static str),
    #[error("`{target}` has no registered conversion from `{found}`")]
    NoCast {
        target: &'static str,
        found: &'static str,
    },
}

impl ReflectError {
    pub(crate) fn mismatch<T: ?Sized>(found: &dyn crate::Reflect) -> Self {
        ReflectError::TypeMismatch {
            expected: core::any::type_name::<T>(),
            found: found.reflect_type_path(),
        }
    }

    pub(crate) fn part_count<T: ?Sized>(expected: usize, found: usize) -> Self {
        ReflectError::PartCount {
            type_path: core::any::type_name::<T>(),
            expected,
            found,
        }
    }
}
