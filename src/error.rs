//! Error types for the transform pipeline
//!
//! Malformed Markdown is never an error: the parser degrades it to literal
//! text. The only failures are sanitizer-internal ones and ABI misuse, and the
//! pipeline converts every one of them into an empty result.

use std::fmt;

/// Errors that can occur while sanitizing or at the C ABI boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The parsed HTML tree is nested deeper than the sanitizer allows
    NestingTooDeep {
        /// Depth at which the walk stopped
        depth: usize,
        /// Configured maximum
        max: usize,
    },
    /// Invalid input data (NULL pointers, non-UTF-8 bytes)
    InvalidInput(String),
    /// A panic was caught inside the sanitizer stage
    SanitizerPanic,
    /// Internal error
    InternalError(String),
}

impl TransformError {
    /// Get numeric error code for FFI
    pub fn code(&self) -> u32 {
        match self {
            TransformError::NestingTooDeep { .. } => 1,
            TransformError::InvalidInput(_) => 5,
            TransformError::SanitizerPanic => 98,
            TransformError::InternalError(_) => 99,
        }
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::NestingTooDeep { depth, max } => write!(
                f,
                "HTML nesting depth {} exceeds maximum allowed depth {}",
                depth, max
            ),
            TransformError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            TransformError::SanitizerPanic => write!(f, "Internal panic during sanitization"),
            TransformError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for TransformError {}
