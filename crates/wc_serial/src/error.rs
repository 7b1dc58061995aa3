use core::fmt;

use thiserror::Error;

// -----------------------------------------------------------------------------
// PropertyTrace

/// One step of the path from the root value down to a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// Field name, index (`[3]`), tuple slot (`<1>`) or other hint.
    pub name: String,
    /// Short name of the declared type at that step.
    pub type_name: String,
}

/// The trace attached to an [`Error`], outer to inner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyTrace {
    entries: Vec<TraceEntry>,
    captured: bool,
}

impl PropertyTrace {
    #[inline]
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }
}

impl fmt::Display for PropertyTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str(" <root element>");
        }
        for entry in &self.entries {
            write!(f, "\n\t{} (Type: {})", entry.name, entry.type_name)?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Error

/// A failed conversion.
///
/// Converters create errors with a bare message. The engine records the
/// property trace the first time the error leaves a converter, which is the
/// innermost point the failure can be located at.
///
/// # Examples
///
/// ```
/// use wc_serial::Error;
///
/// let err = Error::deserialization("arity mismatch");
/// assert!(!err.is_serialization());
/// assert_eq!(
///     err.to_string(),
///     "Failed to deserialize with error: arity mismatch\nProperty Trace: <root element>",
/// );
/// ```
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("Failed to serialize with error: {message}\nProperty Trace:{trace}")]
    Serialization {
        message: String,
        trace: PropertyTrace,
    },
    #[error("Failed to deserialize with error: {message}\nProperty Trace:{trace}")]
    Deserialization {
        message: String,
        trace: PropertyTrace,
    },
}

impl Error {
    pub fn serialization(message: impl Into<String>) -> Self {
        Error::Serialization {
            message: message.into(),
            trace: PropertyTrace::default(),
        }
    }

    pub fn deserialization(message: impl Into<String>) -> Self {
        Error::Deserialization {
            message: message.into(),
            trace: PropertyTrace::default(),
        }
    }

    #[inline]
    pub fn is_serialization(&self) -> bool {
        matches!(self, Error::Serialization { .. })
    }

    /// The message without the trace.
    pub fn message(&self) -> &str {
        match self {
            Error::Serialization { message, .. } | Error::Deserialization { message, .. } => message,
        }
    }

    pub fn trace(&self) -> &[TraceEntry] {
        match self {
            Error::Serialization { trace, .. } | Error::Deserialization { trace, .. } => {
                trace.entries()
            }
        }
    }

    /// Records `entries` as the trace unless one was recorded before.
    pub(crate) fn capture(mut self, entries: impl FnOnce() -> Vec<TraceEntry>) -> Self {
        let (Error::Serialization { trace, .. } | Error::Deserialization { trace, .. }) = &mut self;
        if !trace.captured {
            trace.entries = entries();
            trace.captured = true;
        }
        self
    }
}
