//! Object-level error type shared by stores and managers.
//!
//! Identifiers are carried in rendered form so one error type serves
//! every key type (integers, composite keys, names).

use std::error::Error;
use std::fmt;

/// Errors from identifier-keyed stores and object managers.
///
/// Every operation that returns one of these has left its store and
/// manager untouched: store- and manager-level operations are atomic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectError {
    /// An object with this identifier is already stored.
    DuplicateIdentifier {
        /// The colliding identifier.
        identifier: String,
    },
    /// No object with this identifier is stored, or the handle passed in
    /// belongs to a different manager.
    NotFound {
        /// The identifier that failed to resolve.
        identifier: String,
    },
    /// The object is still held outside its manager and cannot be
    /// destroyed.
    InUse {
        /// Identifier of the object.
        identifier: String,
        /// Number of holders beyond the store entry and the caller.
        outstanding: usize,
    },
}

impl ObjectError {
    /// Shorthand for [`ObjectError::DuplicateIdentifier`].
    pub fn duplicate(identifier: impl fmt::Display) -> Self {
        Self::DuplicateIdentifier {
            identifier: identifier.to_string(),
        }
    }

    /// Shorthand for [`ObjectError::NotFound`].
    pub fn not_found(identifier: impl fmt::Display) -> Self {
        Self::NotFound {
            identifier: identifier.to_string(),
        }
    }
}

impl fmt::Display for ObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateIdentifier { identifier } => {
                write!(f, "duplicate identifier: {identifier}")
            }
            Self::NotFound { identifier } => write!(f, "object not found: {identifier}"),
            Self::InUse {
                identifier,
                outstanding,
            } => {
                write!(
                    f,
                    "object {identifier} is in use ({outstanding} outstanding handle(s))"
                )
            }
        }
    }
}

impl Error for ObjectError {}
