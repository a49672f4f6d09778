//! Identifier traits the generic manager is parameterised over.

use std::fmt;

/// A key usable in an identifier-keyed store.
///
/// Any totally ordered, clonable, printable type qualifies: integer
/// newtypes, composite keys, or name strings. Ordering defines the
/// store's iteration order.
pub trait Identifier: Clone + Ord + fmt::Debug + fmt::Display + 'static {}

impl<T> Identifier for T where T: Clone + Ord + fmt::Debug + fmt::Display + 'static {}

/// An identifier that maps one-to-one onto a non-negative integer index.
///
/// Managers keyed by a sequential identifier can assign identifiers
/// automatically: the smallest unused index at or above a floor.
pub trait SequentialIdentifier: Identifier {
    /// Build the identifier for an integer index.
    fn from_index(index: u32) -> Self;

    /// The integer index of this identifier.
    fn index(&self) -> u32;
}

impl SequentialIdentifier for u32 {
    fn from_index(index: u32) -> Self {
        index
    }

    fn index(&self) -> u32 {
        *self
    }
}
